// Sorted maps keep allocation listings in index order for deterministic
// printing and comparison.
use std::collections::BTreeMap;

use derive_more::Display;

use crate::ir::stat::Block;
use crate::ir::types::TypeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum FunctionType {
    #[default]
    #[display("default")]
    Default,
    #[display("host")]
    Host,
    #[display("device")]
    Device,
    #[display("kernel")]
    Kernel,
}

/// One stack slot of a function. `index` is the slot's dense 0-based
/// identifier within the function.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub ty: TypeRef,
    pub index: usize,
}

/// A finished function record.
///
/// `args` lists allocation indices in argument order; every index it
/// mentions is also a key of `allocations`.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub ty: FunctionType,
    pub name: String,
    pub args: Vec<usize>,
    pub allocations: BTreeMap<usize, Allocation>,
    pub body: Block,
}

/// A whole recorded program: functions in recording order plus the struct
/// types they reference, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub functions: Vec<Function>,
    pub structs: Vec<TypeRef>,
}
