//! Structural validation of recorded programs.
//!
//! The recorder itself only asserts what it can see locally; the checks a
//! backend relies on (single-assignment temps, allocation indices, cast
//! and operand typing) live here so they can run over any `Program`,
//! whether freshly recorded or handed in from elsewhere.

use std::collections::HashSet;
use std::{error, fmt};

use crate::ir::func::{Function, Program};
use crate::ir::stat::{Block, Statement};
use crate::ir::types::{BuiltinType, Type, TypeRef};
use crate::ir::value::{BasicValue, BinaryOpKind, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    TempRedefined { id: u32 },
    TempUsedBeforeDefinition { id: u32 },
    TempIdsNotDense { defined: usize, highest: u32 },
    UnknownAllocation { index: usize },
    IdentityCast { ty: TypeRef },
    ArithmeticOperandMismatch {
        op: BinaryOpKind,
        expected: TypeRef,
        found: TypeRef,
    },
    LogicalOperandNotBool { op: BinaryOpKind, found: TypeRef },
    EmptyIf,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TempRedefined { id } => write!(f, "temp t{id} is assigned more than once"),
            Self::TempUsedBeforeDefinition { id } => {
                write!(f, "temp t{id} is used before its definition")
            }
            Self::TempIdsNotDense { defined, highest } => write!(
                f,
                "{defined} temps defined but the highest id is t{highest}"
            ),
            Self::UnknownAllocation { index } => {
                write!(f, "address of undeclared stack allocation @{index}")
            }
            Self::IdentityCast { ty } => write!(f, "cast from {ty:?} to itself"),
            Self::ArithmeticOperandMismatch { op, expected, found } => write!(
                f,
                "operand of arithmetic `{op}` has type {found:?}, result type is {expected:?}"
            ),
            Self::LogicalOperandNotBool { op, found } => {
                write!(f, "operand of logical `{op}` has type {found:?}, not bool")
            }
            Self::EmptyIf => write!(f, "if statement without arms"),
        }
    }
}

impl error::Error for Error {}

/// Check every function of `program`.
pub fn verify_program(program: &Program) -> Result<(), Error> {
    program.functions.iter().try_for_each(verify_function)
}

/// Check one function: definition-before-use and single assignment of
/// temps, dense temp ids, declared allocation indices, no identity casts,
/// operand typing of arithmetic and logical operators, non-empty `if`
/// statements.
pub fn verify_function(function: &Function) -> Result<(), Error> {
    let mut verifier = Verifier {
        function,
        defined: HashSet::new(),
        highest: None,
    };
    verifier.block(&function.body)?;
    match verifier.highest {
        Some(highest) if verifier.defined.len() != highest as usize + 1 => {
            Err(Error::TempIdsNotDense {
                defined: verifier.defined.len(),
                highest,
            })
        }
        _ => Ok(()),
    }
}

struct Verifier<'a> {
    function: &'a Function,
    defined: HashSet<u32>,
    highest: Option<u32>,
}

impl Verifier<'_> {
    fn block(&mut self, block: &Block) -> Result<(), Error> {
        block.stats.iter().try_for_each(|stat| self.statement(stat))
    }

    fn statement(&mut self, stat: &Statement) -> Result<(), Error> {
        match stat {
            Statement::Store { dst, src } => {
                self.operand(dst)?;
                self.operand(src)
            }
            Statement::Assign { lhs, rhs } => {
                // Uses are checked before the definition becomes visible.
                self.value(rhs)?;
                if !self.defined.insert(lhs.id) {
                    return Err(Error::TempRedefined { id: lhs.id });
                }
                self.highest = Some(self.highest.map_or(lhs.id, |h| h.max(lhs.id)));
                Ok(())
            }
            Statement::Break | Statement::Continue => Ok(()),
            Statement::Block(block) => self.block(block),
            Statement::If(if_stat) => {
                if if_stat.arms.is_empty() {
                    return Err(Error::EmptyIf);
                }
                for arm in &if_stat.arms {
                    self.operand(&arm.cond)?;
                    self.block(&arm.block)?;
                }
                if let Some(else_block) = &if_stat.else_block {
                    self.block(else_block)?;
                }
                Ok(())
            }
            Statement::While(while_stat) => {
                self.block(&while_stat.cond_block)?;
                self.operand(&while_stat.cond)?;
                self.block(&while_stat.body)
            }
        }
    }

    fn value(&mut self, value: &Value) -> Result<(), Error> {
        match value {
            Value::Basic(v) | Value::Load { addr: v, .. } => self.operand(v),
            Value::Binary { op, lhs, rhs, ty } => {
                self.operand(lhs)?;
                self.operand(rhs)?;
                if op.is_arithmetic() {
                    for operand in [lhs, rhs] {
                        if operand.ty() != *ty {
                            return Err(Error::ArithmeticOperandMismatch {
                                op: *op,
                                expected: *ty,
                                found: operand.ty(),
                            });
                        }
                    }
                }
                if op.is_logical() {
                    let bool_ty = Type::builtin(BuiltinType::Bool);
                    for operand in [lhs, rhs] {
                        if operand.ty() != bool_ty {
                            return Err(Error::LogicalOperandNotBool {
                                op: *op,
                                found: operand.ty(),
                            });
                        }
                    }
                }
                Ok(())
            }
            Value::Unary { operand, .. } => self.operand(operand),
            Value::Cast { from, to, operand } => {
                if from == to {
                    return Err(Error::IdentityCast { ty: *from });
                }
                self.operand(operand)
            }
            Value::PointerOffset { base, index, .. } => {
                self.operand(base)?;
                self.operand(index)
            }
            Value::MemberPtr { base, .. } => self.operand(base),
            Value::Call { args, .. } => args.iter().try_for_each(|arg| self.operand(arg)),
        }
    }

    fn operand(&mut self, value: &BasicValue) -> Result<(), Error> {
        match value {
            BasicValue::Temp(t) => {
                if !self.defined.contains(&t.id) {
                    return Err(Error::TempUsedBeforeDefinition { id: t.id });
                }
                Ok(())
            }
            BasicValue::Immediate(_) => Ok(()),
            BasicValue::AllocAddr(index) => {
                if !self.function.allocations.contains_key(index) {
                    return Err(Error::UnknownAllocation { index: *index });
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::func::FunctionType;
    use crate::ir::value::{Immediate, TempValue};

    fn empty_function() -> Function {
        Function {
            ty: FunctionType::Default,
            name: "f".to_owned(),
            args: Vec::new(),
            allocations: Default::default(),
            body: Block::default(),
        }
    }

    #[test]
    fn test_empty_function_verifies() {
        assert_eq!(verify_function(&empty_function()), Ok(()));
    }

    #[test]
    fn test_use_before_definition() {
        let i32_ty = Type::builtin(BuiltinType::I32);
        let mut function = empty_function();
        function.body.stats.push(Statement::Store {
            dst: BasicValue::Temp(TempValue { id: 0, ty: i32_ty }),
            src: BasicValue::Immediate(Immediate::I32(1)),
        });
        assert_eq!(
            verify_function(&function),
            Err(Error::TempUsedBeforeDefinition { id: 0 })
        );
    }

    #[test]
    fn test_identity_cast_rejected() {
        let i32_ty = Type::builtin(BuiltinType::I32);
        let mut function = empty_function();
        function.body.stats.push(Statement::Assign {
            lhs: TempValue { id: 0, ty: i32_ty },
            rhs: Value::Cast {
                from: i32_ty,
                to: i32_ty,
                operand: BasicValue::Immediate(Immediate::I32(1)),
            },
        });
        assert_eq!(
            verify_function(&function),
            Err(Error::IdentityCast { ty: i32_ty })
        );
    }

    #[test]
    fn test_sparse_temp_ids_rejected() {
        let i32_ty = Type::builtin(BuiltinType::I32);
        let mut function = empty_function();
        function.body.stats.push(Statement::Assign {
            lhs: TempValue { id: 1, ty: i32_ty },
            rhs: Value::Basic(BasicValue::Immediate(Immediate::I32(1))),
        });
        assert_eq!(
            verify_function(&function),
            Err(Error::TempIdsNotDense { defined: 1, highest: 1 })
        );
    }

    #[test]
    fn test_unknown_allocation_rejected() {
        let mut function = empty_function();
        function.body.stats.push(Statement::Store {
            dst: BasicValue::AllocAddr(3),
            src: BasicValue::Immediate(Immediate::I32(0)),
        });
        assert_eq!(
            verify_function(&function),
            Err(Error::UnknownAllocation { index: 3 })
        );
    }
}
