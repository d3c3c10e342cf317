use derive_more::Display;

use crate::ir::types::{BuiltinType, Type, TypeRef};

/// A literal value together with its builtin kind.
#[derive(Debug, Clone, Copy, PartialEq, Display)]
pub enum Immediate {
    #[display("{_0}")]
    Bool(bool),
    #[display("{_0}")]
    I8(i8),
    #[display("{_0}")]
    I16(i16),
    #[display("{_0}")]
    I32(i32),
    #[display("{_0}")]
    I64(i64),
    #[display("{_0}")]
    U8(u8),
    #[display("{_0}")]
    U16(u16),
    #[display("{_0}")]
    U32(u32),
    #[display("{_0}")]
    U64(u64),
    #[display("{_0}")]
    F32(f32),
    #[display("{_0}")]
    F64(f64),
}

impl Immediate {
    #[must_use]
    pub fn kind(&self) -> BuiltinType {
        match self {
            Self::Bool(_) => BuiltinType::Bool,
            Self::I8(_) => BuiltinType::I8,
            Self::I16(_) => BuiltinType::I16,
            Self::I32(_) => BuiltinType::I32,
            Self::I64(_) => BuiltinType::I64,
            Self::U8(_) => BuiltinType::U8,
            Self::U16(_) => BuiltinType::U16,
            Self::U32(_) => BuiltinType::U32,
            Self::U64(_) => BuiltinType::U64,
            Self::F32(_) => BuiltinType::F32,
            Self::F64(_) => BuiltinType::F64,
        }
    }
}

/// A single-assignment temporary naming the result of one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempValue {
    pub id: u32,
    pub ty: TypeRef,
}

/// The operand form of the IR: an immediate, a temporary reference, or the
/// address of a stack allocation. Basic values are immutable and cheap to
/// copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BasicValue {
    Temp(TempValue),
    Immediate(Immediate),
    AllocAddr(usize),
}

impl BasicValue {
    /// The IR type this operand evaluates to. Allocation addresses are
    /// 64-bit like every address in the IR.
    #[must_use]
    pub fn ty(&self) -> TypeRef {
        match self {
            Self::Temp(t) => t.ty,
            Self::Immediate(imm) => Type::builtin(imm.kind()),
            Self::AllocAddr(_) => Type::builtin(BuiltinType::U64),
        }
    }

    #[must_use]
    pub fn as_temp(&self) -> Option<TempValue> {
        match self {
            Self::Temp(t) => Some(*t),
            _ => None,
        }
    }
}

/// Binary operator kinds. `And`, `Or` and `XOr` are the logical operators:
/// their operands are always `bool` in well-formed IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BinaryOpKind {
    #[display("add")]
    Add,
    #[display("sub")]
    Sub,
    #[display("mul")]
    Mul,
    #[display("div")]
    Div,
    #[display("mod")]
    Mod,
    #[display("and")]
    And,
    #[display("or")]
    Or,
    #[display("xor")]
    XOr,
    #[display("shl")]
    Shl,
    #[display("shr")]
    Shr,
    #[display("eq")]
    Eq,
    #[display("ne")]
    Ne,
    #[display("lt")]
    Lt,
    #[display("le")]
    Le,
    #[display("gt")]
    Gt,
    #[display("ge")]
    Ge,
}

impl BinaryOpKind {
    #[must_use]
    pub fn is_arithmetic(self) -> bool {
        use BinaryOpKind::*;

        matches!(self, Add | Sub | Mul | Div | Mod)
    }

    #[must_use]
    pub fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or | Self::XOr)
    }

    #[must_use]
    pub fn is_shift(self) -> bool {
        matches!(self, Self::Shl | Self::Shr)
    }

    #[must_use]
    pub fn is_comparison(self) -> bool {
        use BinaryOpKind::*;

        matches!(self, Eq | Ne | Lt | Le | Gt | Ge)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum UnaryOpKind {
    #[display("neg")]
    Neg,
    #[display("not")]
    Not,
    #[display("bitnot")]
    BitNot,
    #[display("lnot")]
    LogicalNot,
}

/// The right-hand side of an [`Assign`](crate::ir::stat::Statement::Assign):
/// either a basic value or one operator applied to basic values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Basic(BasicValue),
    Load {
        ty: TypeRef,
        addr: BasicValue,
    },
    Binary {
        op: BinaryOpKind,
        lhs: BasicValue,
        rhs: BasicValue,
        ty: TypeRef,
    },
    Unary {
        op: UnaryOpKind,
        operand: BasicValue,
        ty: TypeRef,
    },
    Cast {
        from: TypeRef,
        to: TypeRef,
        operand: BasicValue,
    },
    PointerOffset {
        pointee: TypeRef,
        base: BasicValue,
        index: BasicValue,
    },
    MemberPtr {
        object: TypeRef,
        base: BasicValue,
        member: usize,
    },
    Call {
        name: String,
        args: Vec<BasicValue>,
        ret: TypeRef,
    },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Immediate::Bool(true), BuiltinType::Bool)]
    #[case(Immediate::I32(-7), BuiltinType::I32)]
    #[case(Immediate::U64(3), BuiltinType::U64)]
    #[case(Immediate::F32(0.5), BuiltinType::F32)]
    #[case(Immediate::F64(2.0), BuiltinType::F64)]
    fn test_immediate_kind(#[case] imm: Immediate, #[case] kind: BuiltinType) {
        assert_eq!(imm.kind(), kind);
        assert_eq!(BasicValue::Immediate(imm).ty(), Type::builtin(kind));
    }

    #[rstest]
    #[case(BinaryOpKind::Add, "add")]
    #[case(BinaryOpKind::Mod, "mod")]
    #[case(BinaryOpKind::XOr, "xor")]
    #[case(BinaryOpKind::Le, "le")]
    fn test_op_mnemonics(#[case] op: BinaryOpKind, #[case] name: &str) {
        assert_eq!(op.to_string(), name);
    }

    #[test]
    fn test_op_classification() {
        assert!(BinaryOpKind::Mod.is_arithmetic());
        assert!(BinaryOpKind::XOr.is_logical());
        assert!(BinaryOpKind::Shr.is_shift());
        assert!(BinaryOpKind::Ne.is_comparison());
        assert!(!BinaryOpKind::Lt.is_arithmetic());
    }
}
