//! Recording-level statements.
//!
//! While a function is being recorded its statements hold unevaluated
//! expression trees and shared, still-growing blocks. Serialization into
//! the flat [`ir`](crate::ir) form happens in one pass at function
//! finalization.

use std::cell::RefCell;
use std::rc::Rc;

use crate::expr::{self, ExprRef};
use crate::ir;
use crate::ir::builder::IrBuilder;
use crate::ir::types::BuiltinType;

/// A block still open for appending.
pub type BlockRef = Rc<RefCell<Block>>;

#[derive(Debug, Default)]
pub struct Block {
    stats: Vec<Statement>,
}

impl Block {
    pub fn append(&mut self, stat: Statement) {
        self.stats.push(stat);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Serialize every statement of this block into the builder's
    /// currently open block.
    pub fn gen_ir(&self, builder: &mut IrBuilder) {
        for stat in &self.stats {
            stat.gen_ir(builder);
        }
    }
}

#[derive(Debug)]
pub enum Statement {
    /// Write `src` through the address `dst`; the source is cast to the
    /// destination kind when they differ.
    Store {
        dst: ExprRef,
        dst_kind: BuiltinType,
        src: ExprRef,
        src_kind: BuiltinType,
    },
    If {
        arms: Vec<(ExprRef, BlockRef)>,
        else_block: Option<BlockRef>,
    },
    While {
        cond_block: BlockRef,
        cond: ExprRef,
        body: BlockRef,
    },
    Break,
    Continue,
}

impl Statement {
    fn gen_ir(&self, builder: &mut IrBuilder) {
        match self {
            Statement::Store {
                dst,
                dst_kind,
                src,
                src_kind,
            } => {
                let dst = expr::emit(dst, builder);
                let src = expr::emit(src, builder);
                let src = expr::emit_cast(src, *src_kind, *dst_kind, builder);
                builder.append_statement(ir::stat::Statement::Store { dst, src });
            }

            Statement::If { arms, else_block } => {
                // Arm conditions are computed in the enclosing block, in
                // arm order, before the `If` itself.
                let arms = arms
                    .iter()
                    .map(|(cond, block)| {
                        let cond = expr::emit(cond, builder);
                        ir::stat::ThenArm {
                            cond,
                            block: gen_child(block, builder),
                        }
                    })
                    .collect();
                let else_block = else_block.as_ref().map(|block| gen_child(block, builder));
                builder.append_statement(ir::stat::Statement::If(ir::stat::If { arms, else_block }));
            }

            Statement::While { cond_block, cond, body } => {
                builder.push_block();
                cond_block.borrow().gen_ir(builder);
                let cond = expr::emit(cond, builder);
                let cond_block = builder.pop_block();
                let body = gen_child(body, builder);
                builder.append_statement(ir::stat::Statement::While(ir::stat::While {
                    cond_block,
                    cond,
                    body,
                }));
            }

            Statement::Break => builder.append_statement(ir::stat::Statement::Break),
            Statement::Continue => builder.append_statement(ir::stat::Statement::Continue),
        }
    }
}

fn gen_child(block: &BlockRef, builder: &mut IrBuilder) -> ir::stat::Block {
    builder.push_block();
    block.borrow().gen_ir(builder);
    builder.pop_block()
}
