use crate::ir::value::{BasicValue, TempValue, Value};

/// An ordered sequence of statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub stats: Vec<Statement>,
}

/// One condition/body pair of an [`If`] statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ThenArm {
    pub cond: BasicValue,
    pub block: Block,
}

/// A conditional with one or more arms and an optional trailing else block.
/// Arm conditions are computed in the enclosing block before the statement.
#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub arms: Vec<ThenArm>,
    pub else_block: Option<Block>,
}

/// A loop. `cond_block` recomputes the condition value on every iteration;
/// `cond` is the basic value the loop tests after running it.
#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub cond_block: Block,
    pub cond: BasicValue,
    pub body: Block,
}

/// A statement in a function body.
///
/// Statements after a `Break` or `Continue` in the same block are
/// unreachable but still well-formed; consumers must not rely on
/// reachability.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Store { dst: BasicValue, src: BasicValue },
    Assign { lhs: TempValue, rhs: Value },
    Break,
    Continue,
    Block(Block),
    If(If),
    While(While),
}
