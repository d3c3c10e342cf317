//! User-facing typed value wrappers.
//!
//! A wrapper is a cheap clonable handle to one expression node; operators
//! and methods never compute anything, they record new nodes. Evaluating
//! the same host expression twice therefore records two independent
//! sub-graphs.

use std::marker::PhantomData;
use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Shl, Shr, Sub};
use std::rc::Rc;

use crate::context::with_current;
use crate::expr::{self, Expr, ExprRef};
use crate::ir::types::{BuiltinType, TypeRef};
use crate::ir::value::BinaryOpKind;
use crate::record;
use crate::scalar::{IntScalar, Promote, Scalar};

/// A host type that can live in a kernel stack slot and behind a kernel
/// pointer. Implemented by scalars, [`Ptr`], `[T; N]` arrays and the
/// structs declared through [`kernel_struct!`](crate::kernel_struct).
pub trait Pointee: 'static {
    /// The wrapper handed out for a place of this type.
    type Place;

    fn ir_type() -> TypeRef;

    /// Bind a place wrapper to the address expression `addr`.
    fn wrap_place(addr: ExprRef) -> Self::Place;
}

/// Wrapper kinds that support whole-value assignment between two places.
pub trait AssignFrom {
    /// Record the stores that copy `src` into `self`.
    fn assign(&self, src: &Self);
}

/// An arithmetic value of scalar type `T`: either an rvalue expression or a
/// place that can also be written and have its address taken.
#[derive(Debug)]
pub struct Arith<T> {
    node: ExprRef,
    _ty: PhantomData<T>,
}

impl<T> Clone for Arith<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            _ty: PhantomData,
        }
    }
}

impl<T: Scalar> Arith<T> {
    pub(crate) fn from_node(node: ExprRef) -> Self {
        Self {
            node,
            _ty: PhantomData,
        }
    }

    /// A place of kind `T` living at `addr`.
    pub(crate) fn place(addr: ExprRef) -> Self {
        Self::from_node(Rc::new(Expr::LeftValue {
            ty: T::KIND,
            addr,
        }))
    }

    pub(crate) fn into_node(self) -> ExprRef {
        self.node
    }

    fn address_expr(&self) -> ExprRef {
        self.node
            .place_address()
            .cloned()
            .unwrap_or_else(|| panic!("taking the address of a right value"))
    }

    /// The address of this place as a typed pointer. Panics when the value
    /// is not backed by storage.
    #[must_use]
    pub fn address(&self) -> Ptr<T>
    where
        T: Pointee,
    {
        Ptr::from_address(self.address_expr())
    }

    /// Record a store of `value` into this place, casting to `T` when the
    /// source kind differs. Panics when the target is a right value.
    pub fn set<U: Scalar>(&self, value: impl IntoArith<U>) {
        let dst = self.address_expr();
        let src = value.into_arith().into_node();
        with_current(|f| {
            f.append_statement(record::Statement::Store {
                dst,
                dst_kind: T::KIND,
                src,
                src_kind: U::KIND,
            });
        });
    }
}

macro_rules! compare_methods {
    ($(($method:ident, $op:ident)),+ $(,)?) => {
        impl<L: Scalar> Arith<L> {
            $(
                /// Record a comparison; both operands are converted to
                /// their common arithmetic type and the result is `bool`.
                pub fn $method<R: Scalar>(&self, rhs: impl IntoArith<R>) -> Arith<bool>
                where
                    L: Promote<R>,
                {
                    let common = <<L as Promote<R>>::Output as Scalar>::KIND;
                    Arith::from_node(Rc::new(Expr::Binary {
                        op: BinaryOpKind::$op,
                        lhs: self.node.clone(),
                        lhs_kind: L::KIND,
                        rhs: rhs.into_arith().into_node(),
                        rhs_kind: R::KIND,
                        operand_kind: Some(common),
                        out: BuiltinType::Bool,
                    }))
                }
            )+
        }
    };
}

compare_methods! {
    (eq, Eq),
    (ne, Ne),
    (lt, Lt),
    (le, Le),
    (gt, Gt),
    (ge, Ge),
}

/// Conversion of operands into a typed arithmetic wrapper: wrappers pass
/// through, host scalars become literal nodes.
pub trait IntoArith<T: Scalar> {
    fn into_arith(self) -> Arith<T>;
}

impl<T: Scalar> IntoArith<T> for Arith<T> {
    fn into_arith(self) -> Arith<T> {
        self
    }
}

impl<T: Scalar> IntoArith<T> for &Arith<T> {
    fn into_arith(self) -> Arith<T> {
        self.clone()
    }
}

macro_rules! impl_into_arith {
    ($($ty:ty),+) => {$(
        impl IntoArith<$ty> for $ty {
            fn into_arith(self) -> Arith<$ty> {
                lit(self)
            }
        }
    )+};
}

impl_into_arith!(bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

/// A literal of scalar type `T`.
pub fn lit<T: Scalar>(value: T) -> Arith<T> {
    Arith::from_node(Expr::literal(value.immediate()))
}

/// An explicit conversion to scalar type `To`. Converting to the kind the
/// operand already has records nothing.
pub fn cast<To: Scalar, From: Scalar>(value: impl IntoArith<From>) -> Arith<To> {
    let node = value.into_arith().into_node();
    Arith::from_node(Expr::cast(node, From::KIND, To::KIND))
}

fn arith_binary<L, R>(op: BinaryOpKind, lhs: ExprRef, rhs: ExprRef) -> Arith<<L as Promote<R>>::Output>
where
    L: Scalar + Promote<R>,
    R: Scalar,
{
    let out = <<L as Promote<R>>::Output as Scalar>::KIND;
    Arith::from_node(Rc::new(Expr::Binary {
        op,
        lhs,
        lhs_kind: L::KIND,
        rhs,
        rhs_kind: R::KIND,
        operand_kind: Some(out),
        out,
    }))
}

fn shift_binary<L, R>(op: BinaryOpKind, lhs: ExprRef, rhs: ExprRef) -> Arith<L>
where
    L: IntScalar,
    R: IntScalar,
{
    // Shift operands keep their own widths; the result follows the left
    // operand.
    Arith::from_node(Rc::new(Expr::Binary {
        op,
        lhs,
        lhs_kind: L::KIND,
        rhs,
        rhs_kind: R::KIND,
        operand_kind: None,
        out: L::KIND,
    }))
}

fn logic_binary<L, R>(op: BinaryOpKind, lhs: ExprRef, rhs: ExprRef) -> Arith<bool>
where
    L: Scalar,
    R: Scalar,
{
    Arith::from_node(Rc::new(Expr::Binary {
        op,
        lhs,
        lhs_kind: L::KIND,
        rhs,
        rhs_kind: R::KIND,
        operand_kind: Some(BuiltinType::Bool),
        out: BuiltinType::Bool,
    }))
}

macro_rules! arith_ops {
    ($(($Trait:ident, $method:ident, $op:ident)),+ $(,)?) => {$(
        impl<L, R> $Trait<Arith<R>> for Arith<L>
        where
            L: Scalar + Promote<R>,
            R: Scalar,
        {
            type Output = Arith<<L as Promote<R>>::Output>;

            fn $method(self, rhs: Arith<R>) -> Self::Output {
                arith_binary::<L, R>(BinaryOpKind::$op, self.node, rhs.node)
            }
        }

        impl<L, R> $Trait<&Arith<R>> for Arith<L>
        where
            L: Scalar + Promote<R>,
            R: Scalar,
        {
            type Output = Arith<<L as Promote<R>>::Output>;

            fn $method(self, rhs: &Arith<R>) -> Self::Output {
                arith_binary::<L, R>(BinaryOpKind::$op, self.node, rhs.node.clone())
            }
        }

        impl<L, R> $Trait<Arith<R>> for &Arith<L>
        where
            L: Scalar + Promote<R>,
            R: Scalar,
        {
            type Output = Arith<<L as Promote<R>>::Output>;

            fn $method(self, rhs: Arith<R>) -> Self::Output {
                arith_binary::<L, R>(BinaryOpKind::$op, self.node.clone(), rhs.node)
            }
        }

        impl<L, R> $Trait<&Arith<R>> for &Arith<L>
        where
            L: Scalar + Promote<R>,
            R: Scalar,
        {
            type Output = Arith<<L as Promote<R>>::Output>;

            fn $method(self, rhs: &Arith<R>) -> Self::Output {
                arith_binary::<L, R>(BinaryOpKind::$op, self.node.clone(), rhs.node.clone())
            }
        }
    )+};
}

arith_ops! {
    (Add, add, Add),
    (Sub, sub, Sub),
    (Mul, mul, Mul),
    (Div, div, Div),
    (Rem, rem, Mod),
}

macro_rules! arith_ops_prim {
    ($($prim:ty),+) => {$(
        arith_ops_prim!(@one $prim, Add, add, Add);
        arith_ops_prim!(@one $prim, Sub, sub, Sub);
        arith_ops_prim!(@one $prim, Mul, mul, Mul);
        arith_ops_prim!(@one $prim, Div, div, Div);
        arith_ops_prim!(@one $prim, Rem, rem, Mod);
    )+};
    (@one $prim:ty, $Trait:ident, $method:ident, $op:ident) => {
        impl<L> $Trait<$prim> for Arith<L>
        where
            L: Scalar + Promote<$prim>,
        {
            type Output = Arith<<L as Promote<$prim>>::Output>;

            fn $method(self, rhs: $prim) -> Self::Output {
                arith_binary::<L, $prim>(BinaryOpKind::$op, self.node, lit(rhs).node)
            }
        }

        impl<L> $Trait<$prim> for &Arith<L>
        where
            L: Scalar + Promote<$prim>,
        {
            type Output = Arith<<L as Promote<$prim>>::Output>;

            fn $method(self, rhs: $prim) -> Self::Output {
                arith_binary::<L, $prim>(BinaryOpKind::$op, self.node.clone(), lit(rhs).node)
            }
        }
    };
}

arith_ops_prim!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

macro_rules! shift_ops {
    ($(($Trait:ident, $method:ident, $op:ident)),+ $(,)?) => {$(
        impl<L, R> $Trait<Arith<R>> for Arith<L>
        where
            L: IntScalar,
            R: IntScalar,
        {
            type Output = Arith<L>;

            fn $method(self, rhs: Arith<R>) -> Self::Output {
                shift_binary::<L, R>(BinaryOpKind::$op, self.node, rhs.node)
            }
        }

        impl<L, R> $Trait<&Arith<R>> for &Arith<L>
        where
            L: IntScalar,
            R: IntScalar,
        {
            type Output = Arith<L>;

            fn $method(self, rhs: &Arith<R>) -> Self::Output {
                shift_binary::<L, R>(BinaryOpKind::$op, self.node.clone(), rhs.node.clone())
            }
        }

        shift_ops!(@prim $Trait, $method, $op, i8 i16 i32 i64 u8 u16 u32 u64 usize);
    )+};
    (@prim $Trait:ident, $method:ident, $op:ident, $($prim:ty)+) => {$(
        impl<L: IntScalar> $Trait<$prim> for Arith<L> {
            type Output = Arith<L>;

            fn $method(self, rhs: $prim) -> Self::Output {
                shift_binary::<L, $prim>(BinaryOpKind::$op, self.node, lit(rhs).node)
            }
        }

        impl<L: IntScalar> $Trait<$prim> for &Arith<L> {
            type Output = Arith<L>;

            fn $method(self, rhs: $prim) -> Self::Output {
                shift_binary::<L, $prim>(BinaryOpKind::$op, self.node.clone(), lit(rhs).node)
            }
        }
    )+};
}

shift_ops! {
    (Shl, shl, Shl),
    (Shr, shr, Shr),
}

macro_rules! logic_ops {
    ($(($Trait:ident, $method:ident, $op:ident)),+ $(,)?) => {$(
        impl<L, R> $Trait<Arith<R>> for Arith<L>
        where
            L: Scalar,
            R: Scalar,
        {
            type Output = Arith<bool>;

            fn $method(self, rhs: Arith<R>) -> Self::Output {
                logic_binary::<L, R>(BinaryOpKind::$op, self.node, rhs.node)
            }
        }

        impl<L, R> $Trait<&Arith<R>> for &Arith<L>
        where
            L: Scalar,
            R: Scalar,
        {
            type Output = Arith<bool>;

            fn $method(self, rhs: &Arith<R>) -> Self::Output {
                logic_binary::<L, R>(BinaryOpKind::$op, self.node.clone(), rhs.node.clone())
            }
        }

        impl<L: Scalar> $Trait<bool> for Arith<L> {
            type Output = Arith<bool>;

            fn $method(self, rhs: bool) -> Self::Output {
                logic_binary::<L, bool>(BinaryOpKind::$op, self.node, lit(rhs).node)
            }
        }

        impl<L: Scalar> $Trait<bool> for &Arith<L> {
            type Output = Arith<bool>;

            fn $method(self, rhs: bool) -> Self::Output {
                logic_binary::<L, bool>(BinaryOpKind::$op, self.node.clone(), lit(rhs).node)
            }
        }
    )+};
}

logic_ops! {
    (BitAnd, bitand, And),
    (BitOr, bitor, Or),
    (BitXor, bitxor, XOr),
}

impl<T> Neg for Arith<T>
where
    T: Scalar + Promote<T>,
{
    type Output = Arith<<T as Promote<T>>::Output>;

    fn neg(self) -> Self::Output {
        let out = <<T as Promote<T>>::Output as Scalar>::KIND;
        Arith::from_node(Rc::new(Expr::Unary {
            op: crate::ir::value::UnaryOpKind::Neg,
            operand: self.node,
            in_kind: T::KIND,
            out,
        }))
    }
}

impl<T> Neg for &Arith<T>
where
    T: Scalar + Promote<T>,
{
    type Output = Arith<<T as Promote<T>>::Output>;

    fn neg(self) -> Self::Output {
        self.clone().neg()
    }
}

impl Not for Arith<bool> {
    type Output = Arith<bool>;

    fn not(self) -> Self::Output {
        Arith::from_node(Rc::new(Expr::Unary {
            op: crate::ir::value::UnaryOpKind::LogicalNot,
            operand: self.node,
            in_kind: BuiltinType::Bool,
            out: BuiltinType::Bool,
        }))
    }
}

impl Not for &Arith<bool> {
    type Output = Arith<bool>;

    fn not(self) -> Self::Output {
        self.clone().not()
    }
}

macro_rules! bitnot_ops {
    ($($ty:ty),+) => {$(
        impl Not for Arith<$ty> {
            type Output = Arith<<$ty as Promote<$ty>>::Output>;

            fn not(self) -> Self::Output {
                let out = <<$ty as Promote<$ty>>::Output as Scalar>::KIND;
                Arith::from_node(Rc::new(Expr::Unary {
                    op: crate::ir::value::UnaryOpKind::BitNot,
                    operand: self.node,
                    in_kind: <$ty as Scalar>::KIND,
                    out,
                }))
            }
        }

        impl Not for &Arith<$ty> {
            type Output = Arith<<$ty as Promote<$ty>>::Output>;

            fn not(self) -> Self::Output {
                self.clone().not()
            }
        }
    )+};
}

bitnot_ops!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl<T: Scalar> AssignFrom for Arith<T> {
    fn assign(&self, src: &Self) {
        self.set(src);
    }
}

macro_rules! impl_scalar_pointee {
    ($($ty:ty),+) => {$(
        impl Pointee for $ty {
            type Place = Arith<$ty>;

            fn ir_type() -> TypeRef {
                crate::ir::types::Type::builtin(<$ty as Scalar>::KIND)
            }

            fn wrap_place(addr: ExprRef) -> Self::Place {
                Arith::place(addr)
            }
        }
    )+};
}

impl_scalar_pointee!(bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

/// A typed pointer. The wrapper holds an address expression of `usize`
/// kind; dereferencing binds the pointee's place wrapper to it.
#[derive(Debug)]
pub struct Ptr<T> {
    value: ExprRef,
    _ty: PhantomData<T>,
}

impl<T> Clone for Ptr<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _ty: PhantomData,
        }
    }
}

impl<T: Pointee> Ptr<T> {
    pub(crate) fn from_address(value: ExprRef) -> Self {
        Self {
            value,
            _ty: PhantomData,
        }
    }

    /// The pointer `self + index`, scaled by the pointee size.
    pub fn offset<I: IntScalar>(&self, index: impl IntoArith<I>) -> Ptr<T> {
        Ptr::from_address(Rc::new(Expr::PointerOffset {
            pointee: T::ir_type(),
            base: self.value.clone(),
            index: index.into_arith().into_node(),
        }))
    }

    /// The place this pointer refers to.
    pub fn deref(&self) -> T::Place {
        T::wrap_place(self.value.clone())
    }

    /// `self.offset(index).deref()`.
    pub fn at<I: IntScalar>(&self, index: impl IntoArith<I>) -> T::Place {
        self.offset(index).deref()
    }

    /// The address of the pointer variable itself. Panics when the pointer
    /// is not backed by storage.
    #[must_use]
    pub fn address(&self) -> Ptr<Ptr<T>> {
        let addr = self
            .value
            .place_address()
            .cloned()
            .unwrap_or_else(|| panic!("taking the address of a right-value pointer"));
        Ptr::from_address(addr)
    }
}

impl<T: Pointee> AssignFrom for Ptr<T> {
    fn assign(&self, src: &Self) {
        let dst = self
            .value
            .place_address()
            .cloned()
            .unwrap_or_else(|| panic!("assigning to a right-value pointer"));
        let src = src.value.clone();
        with_current(|f| {
            f.append_statement(record::Statement::Store {
                dst,
                dst_kind: BuiltinType::U64,
                src,
                src_kind: BuiltinType::U64,
            });
        });
    }
}

impl<T: Pointee, I: IntScalar> Add<Arith<I>> for Ptr<T> {
    type Output = Ptr<T>;

    fn add(self, rhs: Arith<I>) -> Self::Output {
        self.offset(rhs)
    }
}

impl<T: Pointee, I: IntScalar> Add<Arith<I>> for &Ptr<T> {
    type Output = Ptr<T>;

    fn add(self, rhs: Arith<I>) -> Self::Output {
        self.offset(rhs)
    }
}

impl<T: Pointee, I: IntScalar> Add<&Arith<I>> for &Ptr<T> {
    type Output = Ptr<T>;

    fn add(self, rhs: &Arith<I>) -> Self::Output {
        self.offset(rhs)
    }
}

impl<T: Pointee> Pointee for Ptr<T> {
    type Place = Ptr<T>;

    fn ir_type() -> TypeRef {
        crate::ir::types::Type::pointer(T::ir_type())
    }

    fn wrap_place(addr: ExprRef) -> Self::Place {
        // The slot holds an address; the pointer's value is the place
        // reading that slot.
        Ptr::from_address(Rc::new(Expr::LeftValue {
            ty: BuiltinType::U64,
            addr,
        }))
    }
}

/// A fixed-length array value: a typed pointer to element 0 of the backing
/// storage.
#[derive(Debug)]
pub struct ArrayVal<T, const N: usize> {
    data_ptr: Ptr<T>,
}

impl<T, const N: usize> Clone for ArrayVal<T, N> {
    fn clone(&self) -> Self {
        Self {
            data_ptr: self.data_ptr.clone(),
        }
    }
}

impl<T: Pointee, const N: usize> ArrayVal<T, N> {
    /// The element place at `index`.
    pub fn at<I: IntScalar>(&self, index: impl IntoArith<I>) -> T::Place {
        self.data_ptr.at(index)
    }

    /// Pointer to element 0.
    #[must_use]
    pub fn data_ptr(&self) -> Ptr<T> {
        self.data_ptr.clone()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}

impl<T: Pointee, const N: usize> Pointee for [T; N] {
    type Place = ArrayVal<T, N>;

    fn ir_type() -> TypeRef {
        crate::ir::types::Type::array(T::ir_type(), N as u64)
    }

    fn wrap_place(addr: ExprRef) -> Self::Place {
        // The slot address is also the address of element 0. A pointer
        // place flowing in is read as its value, never written through.
        ArrayVal {
            data_ptr: Ptr::from_address(expr::to_right(&addr)),
        }
    }
}

impl<T, const N: usize> AssignFrom for ArrayVal<T, N>
where
    T: Pointee,
    T::Place: AssignFrom,
{
    fn assign(&self, src: &Self) {
        // Element-wise copy, unrolled at record time.
        for index in 0..N {
            self.at(index).assign(&src.at(index));
        }
    }
}

/// Allocate a stack slot of type `T` in the function being recorded and
/// return its place wrapper. Emits no statements.
pub fn create_stack_var<T: Pointee>() -> T::Place {
    let addr = with_current(|f| f.alloc_on_stack(T::ir_type()));
    T::wrap_place(addr)
}

/// [`create_stack_var`] followed by an initializing store.
pub fn create_stack_var_init<T: Scalar, U: Scalar>(value: impl IntoArith<U>) -> Arith<T> {
    let var = create_stack_var::<T>();
    var.set(value);
    var
}

/// Allocate the next argument slot of the function being recorded.
pub fn create_arg<T: Pointee>() -> T::Place {
    let addr = with_current(|f| f.alloc_arg(T::ir_type()));
    T::wrap_place(addr)
}
