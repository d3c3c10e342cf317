//! Internal expression nodes.
//!
//! Expressions form a DAG shared through [`ExprRef`] handles; construction
//! is strictly bottom-up so no cycles can arise. A node never computes
//! anything at construction time: it is emitted into an [`IrBuilder`] when
//! the statement that consumes it is serialized, yielding the
//! [`BasicValue`] holding its result.

use std::rc::Rc;

use crate::ir::builder::IrBuilder;
use crate::ir::types::{BuiltinType, Type, TypeRef};
use crate::ir::value::{BasicValue, BinaryOpKind, Immediate, UnaryOpKind, Value};

/// Shared handle to an expression node.
pub type ExprRef = Rc<Expr>;

#[derive(Debug)]
pub enum Expr {
    /// A literal, emitted as an immediate.
    Literal(Immediate),
    /// The address of a stack allocation of the enclosing function.
    AllocAddr(usize),
    /// A place: a scalar of kind `ty` living at `addr`. Reading it loads
    /// through the address; the assignment and address operations of the
    /// facade require their operand to be this variant.
    LeftValue { ty: BuiltinType, addr: ExprRef },
    /// An rvalue load through a computed address.
    Load { ty: BuiltinType, addr: ExprRef },
    Cast {
        from: BuiltinType,
        to: BuiltinType,
        operand: ExprRef,
    },
    Binary {
        op: BinaryOpKind,
        lhs: ExprRef,
        lhs_kind: BuiltinType,
        rhs: ExprRef,
        rhs_kind: BuiltinType,
        /// Kind both operands are cast to before the operation; `None` for
        /// shifts, whose operands keep their own widths.
        operand_kind: Option<BuiltinType>,
        out: BuiltinType,
    },
    Unary {
        op: UnaryOpKind,
        operand: ExprRef,
        in_kind: BuiltinType,
        out: BuiltinType,
    },
    /// `base + index * sizeof(pointee)`, producing a new address.
    PointerOffset {
        pointee: TypeRef,
        base: ExprRef,
        index: ExprRef,
    },
    /// The address of field `member` of the struct at `base`.
    MemberPtr {
        object: TypeRef,
        base: ExprRef,
        member: usize,
    },
    /// A math-intrinsic call.
    Call {
        name: &'static str,
        args: Vec<ExprRef>,
        ret: BuiltinType,
    },
}

impl Expr {
    pub fn literal(imm: Immediate) -> ExprRef {
        Rc::new(Expr::Literal(imm))
    }

    pub fn member_ptr(object: TypeRef, base: ExprRef, member: usize) -> ExprRef {
        Rc::new(Expr::MemberPtr { object, base, member })
    }

    /// Wrap `operand` in a cast node, or return it unchanged when the kinds
    /// already match. Repeated casts to the same kind therefore collapse to
    /// a single node.
    pub fn cast(operand: ExprRef, from: BuiltinType, to: BuiltinType) -> ExprRef {
        if from == to {
            operand
        } else {
            Rc::new(Expr::Cast { from, to, operand })
        }
    }

    /// The address backing this node, if it is a place.
    #[must_use]
    pub fn place_address(&self) -> Option<&ExprRef> {
        match self {
            Expr::LeftValue { addr, .. } => Some(addr),
            _ => None,
        }
    }
}

/// Place-to-value conversion: a place becomes a load through its address,
/// anything else is already a value.
pub fn to_right(value: &ExprRef) -> ExprRef {
    match &**value {
        Expr::LeftValue { ty, addr } => Rc::new(Expr::Load {
            ty: *ty,
            addr: addr.clone(),
        }),
        _ => value.clone(),
    }
}

/// Emit one expression tree into the builder, appending the temporaries it
/// needs to the currently open block and returning the basic value holding
/// the result. Traversal is left-to-right post-order, so temp ids are
/// assigned deterministically.
pub(crate) fn emit(expr: &Expr, builder: &mut IrBuilder) -> BasicValue {
    match expr {
        Expr::Literal(imm) => BasicValue::Immediate(*imm),

        Expr::AllocAddr(index) => BasicValue::AllocAddr(*index),

        // Reading a place is an implicit place-to-value conversion.
        Expr::LeftValue { ty, addr } | Expr::Load { ty, addr } => {
            let addr = emit(addr, builder);
            let ty = Type::builtin(*ty);
            let temp = builder.gen_temp_value(ty);
            builder.append_assign(temp, Value::Load { ty, addr });
            BasicValue::Temp(temp)
        }

        Expr::Cast { from, to, operand } => {
            let value = emit(operand, builder);
            emit_cast(value, *from, *to, builder)
        }

        Expr::Binary {
            op,
            lhs,
            lhs_kind,
            rhs,
            rhs_kind,
            operand_kind,
            out,
        } => {
            let mut lhs = emit(lhs, builder);
            let mut rhs = emit(rhs, builder);
            if let Some(kind) = operand_kind {
                lhs = emit_cast(lhs, *lhs_kind, *kind, builder);
                rhs = emit_cast(rhs, *rhs_kind, *kind, builder);
            }
            let ty = Type::builtin(*out);
            let temp = builder.gen_temp_value(ty);
            builder.append_assign(temp, Value::Binary { op: *op, lhs, rhs, ty });
            BasicValue::Temp(temp)
        }

        Expr::Unary {
            op,
            operand,
            in_kind,
            out,
        } => {
            let value = emit(operand, builder);
            let value = emit_cast(value, *in_kind, *out, builder);
            let ty = Type::builtin(*out);
            let temp = builder.gen_temp_value(ty);
            builder.append_assign(temp, Value::Unary { op: *op, operand: value, ty });
            BasicValue::Temp(temp)
        }

        Expr::PointerOffset { pointee, base, index } => {
            let base = emit(base, builder);
            let index = emit(index, builder);
            let temp = builder.gen_temp_value(Type::builtin(BuiltinType::U64));
            builder.append_assign(
                temp,
                Value::PointerOffset {
                    pointee: *pointee,
                    base,
                    index,
                },
            );
            BasicValue::Temp(temp)
        }

        Expr::MemberPtr { object, base, member } => {
            let base = emit(base, builder);
            let temp = builder.gen_temp_value(Type::builtin(BuiltinType::U64));
            builder.append_assign(
                temp,
                Value::MemberPtr {
                    object: *object,
                    base,
                    member: *member,
                },
            );
            BasicValue::Temp(temp)
        }

        Expr::Call { name, args, ret } => {
            let args = args.iter().map(|arg| emit(arg, builder)).collect();
            let ret = Type::builtin(*ret);
            let temp = builder.gen_temp_value(ret);
            builder.append_assign(
                temp,
                Value::Call {
                    name: (*name).to_owned(),
                    args,
                    ret,
                },
            );
            BasicValue::Temp(temp)
        }
    }
}

/// Emit a cast of `value` between two builtin kinds; identical kinds emit
/// nothing.
pub(crate) fn emit_cast(
    value: BasicValue,
    from: BuiltinType,
    to: BuiltinType,
    builder: &mut IrBuilder,
) -> BasicValue {
    if from == to {
        return value;
    }
    let to_ty = Type::builtin(to);
    let temp = builder.gen_temp_value(to_ty);
    builder.append_assign(
        temp,
        Value::Cast {
            from: Type::builtin(from),
            to: to_ty,
            operand: value,
        },
    );
    BasicValue::Temp(temp)
}
