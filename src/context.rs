//! Recording contexts and the per-function recorder.
//!
//! Recording is single-threaded and cooperative: the active context and the
//! function under construction live in a thread-local stack, and every
//! facade operation runs against the innermost entry. Context and function
//! scopes are strictly nested and unwind-safe; abandoning a partially
//! recorded function simply drops it.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::expr::{Expr, ExprRef};
use crate::ir::builder::IrBuilder;
use crate::ir::func::{FunctionType, Program};
use crate::ir::types::{Type, TypeRef};
use crate::record::{self, BlockRef};

thread_local! {
    static CONTEXTS: RefCell<Vec<Rc<RefCell<Context>>>> = const { RefCell::new(Vec::new()) };
}

/// Per-function recording state: the statements, stack allocations and
/// argument slots collected while the host closure runs.
#[derive(Debug)]
pub struct FunctionRecorder {
    name: String,
    ty: FunctionType,
    /// Slot types in allocation order; a slot's index is its position.
    stack_allocs: Vec<TypeRef>,
    /// Subset of slot indices that are arguments, in argument order.
    arg_indices: Vec<usize>,
    /// Stack of open blocks; never empty, entry 0 is the function body.
    blocks: Vec<BlockRef>,
}

impl FunctionRecorder {
    fn new(name: impl Into<String>, ty: FunctionType) -> Self {
        Self {
            name: name.into(),
            ty,
            stack_allocs: Vec::new(),
            arg_indices: Vec::new(),
            blocks: vec![BlockRef::default()],
        }
    }

    /// Reserve a stack slot and return the expression node holding its
    /// address. The block stack is not touched.
    pub fn alloc_on_stack(&mut self, ty: TypeRef) -> ExprRef {
        let index = self.stack_allocs.len();
        self.stack_allocs.push(ty);
        Rc::new(Expr::AllocAddr(index))
    }

    /// Reserve a stack slot that doubles as the next function argument.
    pub fn alloc_arg(&mut self, ty: TypeRef) -> ExprRef {
        let addr = self.alloc_on_stack(ty);
        if let Expr::AllocAddr(index) = *addr {
            self.arg_indices.push(index);
        }
        addr
    }

    /// Append a statement to the innermost open block.
    pub fn append_statement(&mut self, stat: record::Statement) {
        self.blocks
            .last()
            .expect("function recorder has no open block")
            .borrow_mut()
            .append(stat);
    }

    pub fn push_block(&mut self, block: BlockRef) {
        self.blocks.push(block);
    }

    pub fn pop_block(&mut self) {
        assert!(self.blocks.len() >= 2, "pop_block on the function body");
        self.blocks.pop();
    }

    /// Depth of the open-block stack; 1 outside any control-flow builder.
    #[must_use]
    pub fn open_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Serialize the finished recording into the builder: function header,
    /// stack allocations in insertion order, arguments in argument order,
    /// then the body block.
    pub fn gen_ir(&self, builder: &mut IrBuilder) {
        assert_eq!(
            self.blocks.len(),
            1,
            "function `{}` finalized with unclosed blocks",
            self.name
        );
        builder.begin_function(&self.name, self.ty);
        for (index, ty) in self.stack_allocs.iter().enumerate() {
            builder.add_alloc(index, *ty);
        }
        for index in &self.arg_indices {
            builder.add_function_arg(*index);
        }
        self.blocks[0].borrow().gen_ir(builder);
        builder.end_function();
    }
}

/// A recording context: the functions recorded so far plus the one
/// currently under construction, if any.
#[derive(Debug, Default)]
pub struct Context {
    functions: Vec<Rc<RefCell<FunctionRecorder>>>,
    current: Option<Rc<RefCell<FunctionRecorder>>>,
}

/// RAII handle making a [`Context`] the innermost one on this thread for
/// its lifetime.
#[derive(Debug)]
pub struct ScopedContext {
    context: Rc<RefCell<Context>>,
}

impl ScopedContext {
    #[must_use]
    pub fn new() -> Self {
        let context = Rc::new(RefCell::new(Context::default()));
        CONTEXTS.with(|stack| stack.borrow_mut().push(context.clone()));
        Self { context }
    }

    /// Record one function: `body` runs with the new function current, so
    /// facade operations inside it append to this function. A panic inside
    /// `body` drops the partial recording.
    pub fn record_function(&self, name: &str, ty: FunctionType, body: impl FnOnce()) {
        trace!(name, %ty, "record function");
        {
            let mut context = self.context.borrow_mut();
            assert!(
                context.current.is_none(),
                "record_function(`{name}`) while another function is being recorded"
            );
            context.current = Some(Rc::new(RefCell::new(FunctionRecorder::new(name, ty))));
        }
        let guard = AbandonGuard {
            context: self.context.clone(),
        };
        body();
        let recorder = {
            let mut context = self.context.borrow_mut();
            context
                .current
                .take()
                .expect("current function vanished during recording")
        };
        drop(guard);
        assert_eq!(
            recorder.borrow().open_blocks(),
            1,
            "function `{name}` recorded with unclosed blocks"
        );
        self.context.borrow_mut().functions.push(recorder);
    }

    /// Serialize every recorded function and assemble the final program.
    #[must_use]
    pub fn gen_program(&self) -> Program {
        let context = self.context.borrow();
        let mut builder = IrBuilder::new();
        for function in &context.functions {
            function.borrow().gen_ir(&mut builder);
        }
        let functions = builder.finish();
        let mut structs = Vec::new();
        for function in &functions {
            for alloc in function.allocations.values() {
                collect_structs(alloc.ty, &mut structs);
            }
        }
        debug!(
            functions = functions.len(),
            structs = structs.len(),
            "generated ir program"
        );
        Program { functions, structs }
    }
}

impl Default for ScopedContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScopedContext {
    fn drop(&mut self) {
        CONTEXTS.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert!(
                popped.is_some_and(|ctx| Rc::ptr_eq(&ctx, &self.context)),
                "context scopes dropped out of order"
            );
        });
    }
}

/// Clears the current function if `record_function` unwinds.
struct AbandonGuard {
    context: Rc<RefCell<Context>>,
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        if let Ok(mut context) = self.context.try_borrow_mut() {
            context.current = None;
        }
    }
}

/// Structs referenced by `ty`, dependencies first, deduplicated in
/// first-appearance order.
fn collect_structs(ty: TypeRef, out: &mut Vec<TypeRef>) {
    match &*ty {
        Type::Builtin(_) => {}
        Type::Array { element, .. } => collect_structs(*element, out),
        Type::Pointer { pointee } => collect_structs(*pointee, out),
        Type::Struct { fields, .. } => {
            if out.contains(&ty) {
                return;
            }
            for (_, field_ty) in fields {
                collect_structs(*field_ty, out);
            }
            out.push(ty);
        }
    }
}

/// Run `f` against the function currently being recorded on this thread.
///
/// Panics when called outside [`ScopedContext::record_function`]; every
/// facade operation requires exactly one active context and one current
/// function.
pub(crate) fn with_current<R>(f: impl FnOnce(&mut FunctionRecorder) -> R) -> R {
    let current = CONTEXTS.with(|stack| {
        let stack = stack.borrow();
        let context = stack
            .last()
            .unwrap_or_else(|| panic!("no recording context is active on this thread"));
        let current = context.borrow().current.clone();
        current.unwrap_or_else(|| panic!("no kernel function is being recorded"))
    });
    f(&mut current.borrow_mut())
}
