//! Aggregate values.
//!
//! A struct usable inside kernels is declared with [`kernel_struct!`];
//! the macro generates a field bundle whose members are place wrappers
//! bound to member-pointer offsets from the aggregate's base address.

use std::ops::Deref;

use crate::dsl::{AssignFrom, Pointee, Ptr};
use crate::expr::ExprRef;
use crate::ir::types::TypeRef;

/// A struct type declared through [`kernel_struct!`](crate::kernel_struct).
pub trait StructType: Sized + 'static {
    /// The interned IR descriptor of this struct.
    fn struct_type() -> TypeRef;

    /// Bind one place wrapper per field to offsets from `addr`.
    fn bind(addr: &ExprRef) -> Self;

    /// Record the stores copying every field of `src` into `dst`.
    fn assign_fields(dst: &Self, src: &Self);
}

/// An aggregate place: the base address of a struct plus its bound field
/// bundle. Field access goes through [`Deref`], so `value.field` reads
/// naturally.
#[derive(Debug)]
pub struct ClassValue<T> {
    addr: ExprRef,
    object: T,
}

impl<T: StructType> ClassValue<T> {
    /// Bind an aggregate place to the address expression `addr`.
    pub fn bind(addr: ExprRef) -> Self {
        let object = T::bind(&addr);
        Self { addr, object }
    }

    /// The address of the aggregate.
    #[must_use]
    pub fn address(&self) -> Ptr<T>
    where
        T: Pointee,
    {
        Ptr::from_address(self.addr.clone())
    }
}

impl<T: StructType> Clone for ClassValue<T> {
    fn clone(&self) -> Self {
        Self::bind(self.addr.clone())
    }
}

impl<T> Deref for ClassValue<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.object
    }
}

impl<T: StructType> AssignFrom for ClassValue<T> {
    fn assign(&self, src: &Self) {
        T::assign_fields(&self.object, &src.object);
    }
}

/// Declare a struct usable as a kernel value type.
///
/// ```
/// use kernel_dsl::kernel_struct;
///
/// kernel_struct! {
///     struct Vec3 {
///         x: f32,
///         y: f32,
///         z: f32,
///     }
/// }
/// ```
///
/// `Vec3` then works everywhere a value type does: stack variables,
/// function arguments, pointees and fields of other kernel structs. Fields
/// may be scalars, pointers, arrays or previously declared kernel structs.
#[macro_export]
macro_rules! kernel_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($field:ident : $fty:ty),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(pub $field: <$fty as $crate::dsl::Pointee>::Place,)+
        }

        impl $crate::class::StructType for $name {
            fn struct_type() -> $crate::ir::types::TypeRef {
                $crate::ir::types::Type::structure(
                    stringify!($name),
                    vec![
                        $((
                            stringify!($field).to_owned(),
                            <$fty as $crate::dsl::Pointee>::ir_type(),
                        ),)+
                    ],
                )
            }

            fn bind(addr: &$crate::expr::ExprRef) -> Self {
                let ty = <Self as $crate::class::StructType>::struct_type();
                let mut index = 0usize;
                let member = |index: &mut usize| {
                    let current = *index;
                    *index += 1;
                    $crate::expr::Expr::member_ptr(ty, addr.clone(), current)
                };
                Self {
                    $($field: <$fty as $crate::dsl::Pointee>::wrap_place(
                        member(&mut index),
                    ),)+
                }
            }

            fn assign_fields(dst: &Self, src: &Self) {
                $($crate::dsl::AssignFrom::assign(&dst.$field, &src.$field);)+
            }
        }

        impl $crate::dsl::Pointee for $name {
            type Place = $crate::class::ClassValue<$name>;

            fn ir_type() -> $crate::ir::types::TypeRef {
                <$name as $crate::class::StructType>::struct_type()
            }

            fn wrap_place(addr: $crate::expr::ExprRef) -> Self::Place {
                $crate::class::ClassValue::bind($crate::expr::to_right(&addr))
            }
        }
    };
}
