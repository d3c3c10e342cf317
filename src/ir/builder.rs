use std::collections::BTreeMap;

use tracing::trace;

use crate::ir::func::{Allocation, Function, FunctionType};
use crate::ir::stat::{Block, Statement};
use crate::ir::types::TypeRef;
use crate::ir::value::{TempValue, Value};

/// A function whose body is still being written.
#[derive(Debug)]
struct Frame {
    ty: FunctionType,
    name: String,
    args: Vec<usize>,
    allocations: BTreeMap<usize, Allocation>,
    /// Stack of open blocks; index 0 is the function body and statements
    /// are appended to the last entry.
    blocks: Vec<Block>,
    next_temp: u32,
}

/// The stateful writer the expression layer serializes recorded functions
/// into.
///
/// Exactly one function is under construction at a time; `begin_function`
/// and `end_function` bracket it, and all other operations require the
/// bracket to be open. Misuse is a programming error and panics.
#[derive(Debug, Default)]
pub struct IrBuilder {
    functions: Vec<Function>,
    frame: Option<Frame>,
}

impl IrBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_function(&mut self, name: &str, ty: FunctionType) {
        assert!(
            self.frame.is_none(),
            "begin_function while another function is under construction"
        );
        trace!(name, %ty, "begin function");
        self.frame = Some(Frame {
            ty,
            name: name.to_owned(),
            args: Vec::new(),
            allocations: BTreeMap::new(),
            blocks: vec![Block::default()],
            next_temp: 0,
        });
    }

    /// Close the current function; its single remaining open block becomes
    /// the function body.
    pub fn end_function(&mut self) {
        let mut frame = self.frame.take().expect("end_function without begin_function");
        assert_eq!(
            frame.blocks.len(),
            1,
            "end_function with unclosed blocks in `{}`",
            frame.name
        );
        let body = frame.blocks.pop().unwrap_or_default();
        self.functions.push(Function {
            ty: frame.ty,
            name: frame.name,
            args: frame.args,
            allocations: frame.allocations,
            body,
        });
    }

    pub fn add_alloc(&mut self, index: usize, ty: TypeRef) {
        let prev = self
            .frame_mut()
            .allocations
            .insert(index, Allocation { ty, index });
        assert!(prev.is_none(), "allocation index {index} declared twice");
    }

    pub fn add_function_arg(&mut self, index: usize) {
        let frame = self.frame_mut();
        assert!(
            frame.allocations.contains_key(&index),
            "argument refers to undeclared allocation {index}"
        );
        frame.args.push(index);
    }

    /// Allocate a fresh temporary of the given type. Ids are dense from 0
    /// within each function.
    pub fn gen_temp_value(&mut self, ty: TypeRef) -> TempValue {
        let frame = self.frame_mut();
        let id = frame.next_temp;
        frame.next_temp += 1;
        TempValue { id, ty }
    }

    pub fn append_assign(&mut self, lhs: TempValue, rhs: Value) {
        self.append_statement(Statement::Assign { lhs, rhs });
    }

    /// Append a statement to the innermost open block.
    pub fn append_statement(&mut self, stat: Statement) {
        let frame = self.frame_mut();
        let block = frame.blocks.last_mut().expect("builder block stack is empty");
        block.stats.push(stat);
    }

    /// Open a nested block; statements are appended to it until the
    /// matching [`pop_block`](Self::pop_block).
    pub fn push_block(&mut self) {
        self.frame_mut().blocks.push(Block::default());
    }

    pub fn pop_block(&mut self) -> Block {
        let frame = self.frame_mut();
        assert!(frame.blocks.len() >= 2, "pop_block on the function body");
        frame.blocks.pop().unwrap_or_default()
    }

    /// Number of blocks currently open in the function under construction.
    #[must_use]
    pub fn open_blocks(&self) -> usize {
        self.frame.as_ref().map_or(0, |f| f.blocks.len())
    }

    /// All functions finished so far, in completion order.
    #[must_use]
    pub fn finish(self) -> Vec<Function> {
        assert!(
            self.frame.is_none(),
            "finish with a function still under construction"
        );
        self.functions
    }

    fn frame_mut(&mut self) -> &mut Frame {
        self.frame
            .as_mut()
            .expect("no function is under construction")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::types::{BuiltinType, Type};
    use crate::ir::value::BasicValue;

    #[test]
    fn test_temp_ids_are_dense_per_function() {
        let i32_ty = Type::builtin(BuiltinType::I32);
        let mut b = IrBuilder::new();

        b.begin_function("first", FunctionType::Default);
        assert_eq!(b.gen_temp_value(i32_ty).id, 0);
        assert_eq!(b.gen_temp_value(i32_ty).id, 1);
        b.end_function();

        b.begin_function("second", FunctionType::Kernel);
        assert_eq!(b.gen_temp_value(i32_ty).id, 0);
        b.end_function();

        let funcs = b.finish();
        assert_eq!(funcs.len(), 2);
        assert_eq!(funcs[1].ty, FunctionType::Kernel);
    }

    #[test]
    fn test_nested_blocks_round_trip() {
        let mut b = IrBuilder::new();
        b.begin_function("f", FunctionType::Default);
        b.push_block();
        b.append_statement(Statement::Break);
        let inner = b.pop_block();
        assert_eq!(inner.stats.len(), 1);
        b.append_statement(Statement::Block(inner));
        b.end_function();

        let funcs = b.finish();
        assert!(matches!(funcs[0].body.stats[0], Statement::Block(_)));
    }

    #[test]
    #[should_panic(expected = "pop_block")]
    fn test_popping_the_body_panics() {
        let mut b = IrBuilder::new();
        b.begin_function("f", FunctionType::Default);
        b.pop_block();
    }

    #[test]
    #[should_panic(expected = "undeclared allocation")]
    fn test_arg_requires_declared_alloc() {
        let mut b = IrBuilder::new();
        b.begin_function("f", FunctionType::Default);
        b.add_function_arg(0);
    }

    #[test]
    fn test_store_uses_alloc_address() {
        let i32_ty = Type::builtin(BuiltinType::I32);
        let mut b = IrBuilder::new();
        b.begin_function("f", FunctionType::Default);
        b.add_alloc(0, i32_ty);
        let t = b.gen_temp_value(i32_ty);
        b.append_assign(t, Value::Load { ty: i32_ty, addr: BasicValue::AllocAddr(0) });
        b.end_function();

        let funcs = b.finish();
        assert_eq!(funcs[0].allocations.len(), 1);
        assert_eq!(funcs[0].body.stats.len(), 1);
    }
}
