use derive_more::Display;
use internment::Intern;

/// Primitive value kinds known to the IR.
///
/// Host `usize` values are recorded as [`BuiltinType::U64`]; addresses are
/// 64-bit in the emitted IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum BuiltinType {
    #[display("bool")]
    Bool,
    #[display("i8")]
    I8,
    #[display("i16")]
    I16,
    #[display("i32")]
    I32,
    #[display("i64")]
    I64,
    #[display("u8")]
    U8,
    #[display("u16")]
    U16,
    #[display("u32")]
    U32,
    #[display("u64")]
    U64,
    #[display("f32")]
    F32,
    #[display("f64")]
    F64,
    #[display("void")]
    Void,
}

impl BuiltinType {
    #[must_use]
    pub fn is_integer(self) -> bool {
        use BuiltinType::*;

        matches!(self, I8 | I16 | I32 | I64 | U8 | U16 | U32 | U64)
    }

    #[must_use]
    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    #[must_use]
    pub fn is_signed(self) -> bool {
        use BuiltinType::*;

        matches!(self, I8 | I16 | I32 | I64)
    }
}

/// A type descriptor in the IR.
///
/// Descriptors are interned by structural identity; use the constructors on
/// [`Type`] to obtain a stable [`TypeRef`] handle. Two structurally equal
/// types always intern to the same reference, so handle comparison is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Builtin(BuiltinType),
    Array { element: TypeRef, length: u64 },
    Pointer { pointee: TypeRef },
    Struct { name: String, fields: Vec<(String, TypeRef)> },
}

/// Stable handle to an interned [`Type`].
pub type TypeRef = Intern<Type>;

impl Type {
    #[must_use]
    pub fn builtin(kind: BuiltinType) -> TypeRef {
        Intern::new(Type::Builtin(kind))
    }

    #[must_use]
    pub fn array(element: TypeRef, length: u64) -> TypeRef {
        Intern::new(Type::Array { element, length })
    }

    #[must_use]
    pub fn pointer(pointee: TypeRef) -> TypeRef {
        Intern::new(Type::Pointer { pointee })
    }

    #[must_use]
    pub fn structure(name: impl Into<String>, fields: Vec<(String, TypeRef)>) -> TypeRef {
        Intern::new(Type::Struct {
            name: name.into(),
            fields,
        })
    }

    /// The builtin kind of this type, if it is a builtin.
    #[must_use]
    pub fn as_builtin(&self) -> Option<BuiltinType> {
        match self {
            Type::Builtin(kind) => Some(*kind),
            _ => None,
        }
    }
}

#[test]
fn test_interning_is_structural() {
    let a = Type::builtin(BuiltinType::F32);
    let b = Type::builtin(BuiltinType::F32);
    assert_eq!(a, b);

    let p = Type::pointer(a);
    let q = Type::pointer(b);
    assert_eq!(p, q);
    assert_ne!(p, Type::pointer(Type::builtin(BuiltinType::F64)));

    let s = Type::structure("vec2", vec![("x".into(), a), ("y".into(), a)]);
    let t = Type::structure("vec2", vec![("x".into(), b), ("y".into(), b)]);
    assert_eq!(s, t);
}

#[test]
fn test_builtin_classification() {
    assert!(BuiltinType::U8.is_integer());
    assert!(!BuiltinType::Bool.is_integer());
    assert!(BuiltinType::F64.is_float());
    assert!(BuiltinType::I64.is_signed());
    assert!(!BuiltinType::U64.is_signed());
}
