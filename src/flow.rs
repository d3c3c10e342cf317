//! Structured control flow.
//!
//! Every builder follows the same two-phase contract: pre-condition
//! expressions are recorded against the block that is currently open, then
//! a fresh child block is pushed, the user closure records the body into
//! it, and the block is popped and attached to the composed statement. The
//! push/pop pairing holds on every exit path, including unwinds out of the
//! user closure.

use std::mem;

use crate::context::with_current;
use crate::dsl::{create_stack_var, lit, Arith, IntoArith};
use crate::expr::{Expr, ExprRef};
use crate::ir::value::Immediate;
use crate::record::{BlockRef, Statement};
use crate::scalar::{IntScalar, Promote};

/// Pops the recorder's open block when dropped.
struct BlockScope;

impl BlockScope {
    fn open(block: BlockRef) -> Self {
        with_current(|f| f.push_block(block));
        BlockScope
    }
}

impl Drop for BlockScope {
    fn drop(&mut self) {
        with_current(|f| f.pop_block());
    }
}

/// Run `body` against a fresh child block and return the closed block.
fn record_block(body: impl FnOnce()) -> BlockRef {
    let block = BlockRef::default();
    let _scope = BlockScope::open(block.clone());
    body();
    block
}

/// Builder accumulating the arms of one conditional statement.
///
/// The composed `If` is appended when the builder is dropped, so both a
/// bare `if_(…)` expression statement and an `if_(…).elif(…).else_(…)`
/// chain emit exactly one statement.
pub struct IfBuilder {
    arms: Vec<(ExprRef, BlockRef)>,
    else_block: Option<BlockRef>,
}

/// Open a conditional with its first arm.
pub fn if_(cond: impl IntoArith<bool>, then: impl FnOnce()) -> IfBuilder {
    let cond = cond.into_arith().into_node();
    let block = record_block(then);
    IfBuilder {
        arms: vec![(cond, block)],
        else_block: None,
    }
}

impl IfBuilder {
    /// Add another condition/body arm.
    #[must_use]
    pub fn elif(mut self, cond: impl IntoArith<bool>, then: impl FnOnce()) -> Self {
        let cond = cond.into_arith().into_node();
        let block = record_block(then);
        self.arms.push((cond, block));
        self
    }

    /// Close the conditional with an else block.
    pub fn else_(mut self, body: impl FnOnce()) {
        self.else_block = Some(record_block(body));
    }
}

impl Drop for IfBuilder {
    fn drop(&mut self) {
        let arms = mem::take(&mut self.arms);
        let else_block = self.else_block.take();
        with_current(|f| f.append_statement(Statement::If { arms, else_block }));
    }
}

/// Record a `while` loop. The condition closure runs once, against a
/// dedicated condition block, so statements it records are replayed before
/// every iteration's test; its return value is the condition.
pub fn while_(cond: impl FnOnce() -> Arith<bool>, body: impl FnOnce()) {
    let cond_block = BlockRef::default();
    let cond = {
        let _scope = BlockScope::open(cond_block.clone());
        cond().into_node()
    };
    let body = record_block(body);
    with_current(|f| {
        f.append_statement(Statement::While {
            cond_block,
            cond,
            body,
        });
    });
}

/// Record an infinite loop: a `while` whose condition is the constant
/// `true` and whose condition block is empty.
pub fn loop_(body: impl FnOnce()) {
    let body = record_block(body);
    with_current(|f| {
        f.append_statement(Statement::While {
            cond_block: BlockRef::default(),
            cond: Expr::literal(Immediate::Bool(true)),
            body,
        });
    });
}

/// Record a counted loop over `begin..end`.
///
/// Lowered to a stack-allocated counter initialized to `begin` and a
/// `while (i < end)` whose body runs the user closure and then increments
/// the counter once.
pub fn for_range<T>(
    begin: impl IntoArith<T>,
    end: impl IntoArith<T>,
    body: impl FnOnce(&Arith<T>),
) where
    T: IntScalar + Promote<T>,
{
    let index = create_stack_var::<T>();
    index.set(begin);
    let end = end.into_arith();
    while_(
        || index.lt(&end),
        || {
            body(&index);
            index.set(index.clone() + lit(T::ONE));
        },
    );
}

/// Append a `break` statement. Whether an enclosing loop exists is not
/// checked here; backends validate placement.
pub fn break_() {
    with_current(|f| f.append_statement(Statement::Break));
}

/// Append a `continue` statement. Placement is validated by backends.
pub fn continue_() {
    with_current(|f| f.append_statement(Statement::Continue));
}
