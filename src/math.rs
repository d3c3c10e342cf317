//! The math intrinsic table.
//!
//! Every function here records a [`Call`](crate::ir::value::Value::Call)
//! node under a stable name; backends map the name and operand types to a
//! target builtin. The recorder does not check that a backend knows a
//! name.

use std::rc::Rc;

use crate::dsl::{Arith, IntoArith};
use crate::expr::{Expr, ExprRef};
use crate::scalar::{FloatScalar, MathScalar, Scalar};

/// Enumeration of the intrinsic math functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFunction {
    Abs,
    Mod,
    Remainder,
    Exp,
    Exp2,
    Exp10,
    Log,
    Log2,
    Log10,
    Pow,
    Sqrt,
    Rsqrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Ceil,
    Floor,
    Trunc,
    Round,
    IsFinite,
    IsInf,
    IsNan,
    Min,
    Max,
}

impl MathFunction {
    /// The wire name a `Call` node carries for this function.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Abs => "math.abs",
            Self::Mod => "math.mod",
            Self::Remainder => "math.remainder",
            Self::Exp => "math.exp",
            Self::Exp2 => "math.exp2",
            Self::Exp10 => "math.exp10",
            Self::Log => "math.log",
            Self::Log2 => "math.log2",
            Self::Log10 => "math.log10",
            Self::Pow => "math.pow",
            Self::Sqrt => "math.sqrt",
            Self::Rsqrt => "math.rsqrt",
            Self::Sin => "math.sin",
            Self::Cos => "math.cos",
            Self::Tan => "math.tan",
            Self::Asin => "math.asin",
            Self::Acos => "math.acos",
            Self::Atan => "math.atan",
            Self::Atan2 => "math.atan2",
            Self::Ceil => "math.ceil",
            Self::Floor => "math.floor",
            Self::Trunc => "math.trunc",
            Self::Round => "math.round",
            Self::IsFinite => "math.isfinite",
            Self::IsInf => "math.isinf",
            Self::IsNan => "math.isnan",
            Self::Min => "math.min",
            Self::Max => "math.max",
        }
    }
}

fn call<R: Scalar>(function: MathFunction, args: Vec<ExprRef>) -> Arith<R> {
    Arith::from_node(Rc::new(Expr::Call {
        name: function.name(),
        args,
        ret: R::KIND,
    }))
}

macro_rules! unary_float {
    ($($(#[$meta:meta])* $name:ident => $func:ident;)+) => {$(
        $(#[$meta])*
        pub fn $name<T: FloatScalar>(x: impl IntoArith<T>) -> Arith<T> {
            call(MathFunction::$func, vec![x.into_arith().into_node()])
        }
    )+};
}

unary_float! {
    exp => Exp;
    exp2 => Exp2;
    exp10 => Exp10;
    log => Log;
    log2 => Log2;
    log10 => Log10;
    sqrt => Sqrt;
    /// Reciprocal square root.
    rsqrt => Rsqrt;
    sin => Sin;
    cos => Cos;
    tan => Tan;
    asin => Asin;
    acos => Acos;
    atan => Atan;
    ceil => Ceil;
    floor => Floor;
    trunc => Trunc;
    round => Round;
}

macro_rules! binary_float {
    ($($(#[$meta:meta])* $name:ident => $func:ident;)+) => {$(
        $(#[$meta])*
        pub fn $name<T: FloatScalar>(x: impl IntoArith<T>, y: impl IntoArith<T>) -> Arith<T> {
            call(
                MathFunction::$func,
                vec![x.into_arith().into_node(), y.into_arith().into_node()],
            )
        }
    )+};
}

binary_float! {
    /// Floating-point modulus.
    mod_ => Mod;
    /// IEEE remainder.
    remainder => Remainder;
    pow => Pow;
    /// `atan2(y, x)`: the angle of the vector `(x, y)`.
    atan2 => Atan2;
}

macro_rules! classify_float {
    ($($name:ident => $func:ident;)+) => {$(
        /// Classification predicate; the result is `i32`, nonzero for true.
        pub fn $name<T: FloatScalar>(x: impl IntoArith<T>) -> Arith<i32> {
            call(MathFunction::$func, vec![x.into_arith().into_node()])
        }
    )+};
}

classify_float! {
    isfinite => IsFinite;
    isinf => IsInf;
    isnan => IsNan;
}

pub fn abs<T: MathScalar>(x: impl IntoArith<T>) -> Arith<T> {
    call(MathFunction::Abs, vec![x.into_arith().into_node()])
}

pub fn min<T: MathScalar>(x: impl IntoArith<T>, y: impl IntoArith<T>) -> Arith<T> {
    call(
        MathFunction::Min,
        vec![x.into_arith().into_node(), y.into_arith().into_node()],
    )
}

pub fn max<T: MathScalar>(x: impl IntoArith<T>, y: impl IntoArith<T>) -> Arith<T> {
    call(
        MathFunction::Max,
        vec![x.into_arith().into_node(), y.into_arith().into_node()],
    )
}

/// `max(lo, min(hi, x))`.
pub fn clamp<T: MathScalar>(
    x: impl IntoArith<T>,
    lo: impl IntoArith<T>,
    hi: impl IntoArith<T>,
) -> Arith<T> {
    max(lo, min(hi, x))
}
