//! Host scalar types usable inside recorded kernels, and the compile-time
//! arithmetic promotion table between them.

use crate::dsl::{Arith, Pointee};
use crate::ir::types::BuiltinType;
use crate::ir::value::Immediate;

/// A host scalar type with a builtin IR kind.
///
/// Host `usize` participates as a 64-bit unsigned kind; it is the index type
/// of pointer arithmetic.
pub trait Scalar: Copy + Pointee<Place = Arith<Self>> + 'static {
    const KIND: BuiltinType;

    fn immediate(self) -> Immediate;
}

/// Integer scalars; the only types accepted as shift and pointer-offset
/// operands.
pub trait IntScalar: Scalar {
    const ONE: Self;
}

/// Floating-point scalars.
pub trait FloatScalar: Scalar {}

/// The `{i32, i64, f32, f64}` overload set of the math intrinsic table.
pub trait MathScalar: Scalar {}

macro_rules! impl_scalar {
    ($($ty:ty => $kind:ident, $imm:ident;)+) => {$(
        impl Scalar for $ty {
            const KIND: BuiltinType = BuiltinType::$kind;

            fn immediate(self) -> Immediate {
                Immediate::$imm(self)
            }
        }
    )+};
}

impl_scalar! {
    bool => Bool, Bool;
    i8 => I8, I8;
    i16 => I16, I16;
    i32 => I32, I32;
    i64 => I64, I64;
    u8 => U8, U8;
    u16 => U16, U16;
    u32 => U32, U32;
    u64 => U64, U64;
    f32 => F32, F32;
    f64 => F64, F64;
}

// Addresses are 64-bit, so the host's pointer-sized integer records as u64.
impl Scalar for usize {
    const KIND: BuiltinType = BuiltinType::U64;

    fn immediate(self) -> Immediate {
        Immediate::U64(self as u64)
    }
}

macro_rules! impl_int_scalar {
    ($($ty:ty),+) => {$(
        impl IntScalar for $ty {
            const ONE: Self = 1;
        }
    )+};
}

impl_int_scalar!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl FloatScalar for f32 {}
impl FloatScalar for f64 {}

impl MathScalar for i32 {}
impl MathScalar for i64 {}
impl MathScalar for f32 {}
impl MathScalar for f64 {}

/// Usual arithmetic conversions between two scalar types, resolved at
/// compile time.
///
/// The table follows C: operands of rank below `i32` are promoted to `i32`
/// first, floats beat integers, and equal-rank mixed signedness resolves to
/// the unsigned type. `usize` ranks with `u64`.
pub trait Promote<R: Scalar>: Scalar {
    type Output: Scalar;
}

macro_rules! promote_table {
    ($($l:ty: $([$r:ty => $out:ty]),+;)+) => {$($(
        impl Promote<$r> for $l {
            type Output = $out;
        }
    )+)+};
}

promote_table! {
    bool: [bool => i32], [u8 => i32], [u16 => i32], [u32 => u32], [u64 => u64], [usize => usize], [i8 => i32], [i16 => i32], [i32 => i32], [i64 => i64], [f32 => f32], [f64 => f64];
    u8: [bool => i32], [u8 => i32], [u16 => i32], [u32 => u32], [u64 => u64], [usize => usize], [i8 => i32], [i16 => i32], [i32 => i32], [i64 => i64], [f32 => f32], [f64 => f64];
    u16: [bool => i32], [u8 => i32], [u16 => i32], [u32 => u32], [u64 => u64], [usize => usize], [i8 => i32], [i16 => i32], [i32 => i32], [i64 => i64], [f32 => f32], [f64 => f64];
    u32: [bool => u32], [u8 => u32], [u16 => u32], [u32 => u32], [u64 => u64], [usize => usize], [i8 => u32], [i16 => u32], [i32 => u32], [i64 => i64], [f32 => f32], [f64 => f64];
    u64: [bool => u64], [u8 => u64], [u16 => u64], [u32 => u64], [u64 => u64], [usize => u64], [i8 => u64], [i16 => u64], [i32 => u64], [i64 => u64], [f32 => f32], [f64 => f64];
    usize: [bool => usize], [u8 => usize], [u16 => usize], [u32 => usize], [u64 => u64], [usize => usize], [i8 => usize], [i16 => usize], [i32 => usize], [i64 => usize], [f32 => f32], [f64 => f64];
    i8: [bool => i32], [u8 => i32], [u16 => i32], [u32 => u32], [u64 => u64], [usize => usize], [i8 => i32], [i16 => i32], [i32 => i32], [i64 => i64], [f32 => f32], [f64 => f64];
    i16: [bool => i32], [u8 => i32], [u16 => i32], [u32 => u32], [u64 => u64], [usize => usize], [i8 => i32], [i16 => i32], [i32 => i32], [i64 => i64], [f32 => f32], [f64 => f64];
    i32: [bool => i32], [u8 => i32], [u16 => i32], [u32 => u32], [u64 => u64], [usize => usize], [i8 => i32], [i16 => i32], [i32 => i32], [i64 => i64], [f32 => f32], [f64 => f64];
    i64: [bool => i64], [u8 => i64], [u16 => i64], [u32 => i64], [u64 => u64], [usize => usize], [i8 => i64], [i16 => i64], [i32 => i64], [i64 => i64], [f32 => f32], [f64 => f64];
    f32: [bool => f32], [u8 => f32], [u16 => f32], [u32 => f32], [u64 => f32], [usize => f32], [i8 => f32], [i16 => f32], [i32 => f32], [i64 => f32], [f32 => f32], [f64 => f64];
    f64: [bool => f64], [u8 => f64], [u16 => f64], [u32 => f64], [u64 => f64], [usize => f64], [i8 => f64], [i16 => f64], [i32 => f64], [i64 => f64], [f32 => f64], [f64 => f64];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn promoted_kind<L, R>() -> BuiltinType
    where
        L: Promote<R>,
        R: Scalar,
    {
        <L as Promote<R>>::Output::KIND
    }

    #[test]
    fn test_small_integers_promote_to_i32() {
        assert_eq!(promoted_kind::<i8, i8>(), BuiltinType::I32);
        assert_eq!(promoted_kind::<u8, i16>(), BuiltinType::I32);
        assert_eq!(promoted_kind::<bool, bool>(), BuiltinType::I32);
    }

    #[test]
    fn test_float_beats_integer() {
        assert_eq!(promoted_kind::<f32, i64>(), BuiltinType::F32);
        assert_eq!(promoted_kind::<u64, f32>(), BuiltinType::F32);
        assert_eq!(promoted_kind::<f32, f64>(), BuiltinType::F64);
    }

    #[test]
    fn test_mixed_signedness() {
        // Equal rank goes unsigned; a wider signed type absorbs a narrower
        // unsigned one.
        assert_eq!(promoted_kind::<i32, u32>(), BuiltinType::U32);
        assert_eq!(promoted_kind::<i64, u32>(), BuiltinType::I64);
        assert_eq!(promoted_kind::<i32, u64>(), BuiltinType::U64);
    }

    #[test]
    fn test_usize_ranks_with_u64() {
        assert_eq!(promoted_kind::<usize, i32>(), BuiltinType::U64);
        assert_eq!(promoted_kind::<usize, u64>(), BuiltinType::U64);
        assert_eq!(usize::KIND, BuiltinType::U64);
    }
}
