//! Two-phase evaluation of Quill programs.
//!
//! Every block is first prepared against a probe scope: declarations are
//! registered, type specifiers resolved and checked, and return coverage
//! computed. Preparing yields a [`PreparedBlock`] that execution consumes;
//! nothing runs unless the whole program prepared without errors.
//!
//! Runtime scopes are separate from probe scopes. A block's runtime scope is
//! created on entry and dropped on exit, which is what releases the weak
//! captures of closures created inside it.

mod call;
mod declare;
mod expr;
mod stmt;

pub use stmt::{Coverage, Prepared, PreparedArm, PreparedBlock};

use quill_ast::ast::Program;
use quill_ast::span::Span;
use quill_ast::FunctionSignature;
use quill_types::prelude::*;
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, instrument};

/// Maximum call depth to prevent stack overflow from deep recursion
pub const MAX_CALL_DEPTH: u32 = 1000;

#[derive(Clone, Copy, Debug)]
pub struct Limits {
    pub max_call_depth: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_call_depth: MAX_CALL_DEPTH,
        }
    }
}

pub struct Interpreter {
    limits: Limits,
    depth: Cell<u32>,
    /// Holds host-provided symbols; the parent of every program scope.
    globals: Rc<ExecutionContext>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        Interpreter {
            limits,
            depth: Cell::new(0),
            globals: ExecutionContext::root(TypeTable::root()),
        }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn globals(&self) -> &Rc<ExecutionContext> {
        &self.globals
    }

    /// Expose a host function to every program this interpreter runs.
    pub fn define_native(
        &self,
        name: &str,
        signature: FunctionSignature,
        func: NativeFn,
    ) -> Result<(), ErrorKind> {
        let value = FunctionValue::native(name, signature.clone(), func);
        let symbol = Symbol::new(
            quill_ast::TypeSpecifier::function(signature),
            Value::Function(Rc::new(value)),
        );
        match self.globals.insert_symbol(name, symbol) {
            InsertResult::Success => Ok(()),
            InsertResult::SymbolExists => Err(ErrorKind::PreviousDeclaration {
                name: name.to_string(),
            }),
        }
    }

    /// Prepare `program` without running it.
    #[instrument(skip_all, fields(statements = program.statements.len()))]
    pub fn check(&self, program: &Program) -> ErrorList {
        let probe = self.program_probe();
        let errors = match self.prepare_in(&program.statements, &probe, None) {
            Ok(_) => ErrorList::new(),
            Err(errors) => errors,
        };
        probe.clear();
        debug!(errors = errors.len(), "program checked");
        errors
    }

    /// Prepare and, when that succeeds, execute `program`.
    #[instrument(skip_all, fields(statements = program.statements.len()))]
    pub fn run(&self, program: &Program) -> Checked<ProgramContext> {
        let probe = self.program_probe();
        let prepared = self.prepare_in(&program.statements, &probe, None);
        probe.clear();
        let (statements, _) = prepared?;
        debug!("program prepared");

        let context =
            ExecutionContext::child_with_types(&self.globals, probe.types().clone(), LifeTime::Root);
        let program = ProgramContext { context };
        self.execute_in(&statements, &program.context)?;
        debug!("program executed");
        Ok(program)
    }

    fn program_probe(&self) -> Rc<ExecutionContext> {
        ExecutionContext::child_with_types(
            &self.globals,
            TypeTable::child(self.globals.types()),
            LifeTime::Root,
        )
    }

    fn enter_call(&self, span: Span) -> Checked<CallGuard<'_>> {
        let depth = self.depth.get() + 1;
        if depth > self.limits.max_call_depth {
            return Err(ErrorKind::CallDepthExceeded {
                limit: self.limits.max_call_depth,
            }
            .at(span)
            .into());
        }
        self.depth.set(depth);
        Ok(CallGuard { depth: &self.depth })
    }
}

/// Finish a step that collected errors while computing an optional value.
fn settle<T>(errors: ErrorList, value: Option<T>) -> Checked<T> {
    match value {
        Some(value) => errors.into_result(value),
        None => Err(errors),
    }
}

/// Restores the call depth when an invocation returns, on every path.
struct CallGuard<'a> {
    depth: &'a Cell<u32>,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

/// The root scope of a finished program. Closures declared at the top level
/// hold this scope strongly, so it is cleared when dropped.
#[derive(Debug)]
pub struct ProgramContext {
    context: Rc<ExecutionContext>,
}

impl ProgramContext {
    pub fn get(&self, name: &str) -> Option<Value> {
        self.context.get_symbol(name).map(Symbol::into_value)
    }

    pub fn symbol(&self, name: &str) -> Option<Symbol> {
        self.context.get_symbol(name)
    }

    pub fn context(&self) -> &Rc<ExecutionContext> {
        &self.context
    }
}

impl Drop for ProgramContext {
    fn drop(&mut self) {
        self.context.clear();
    }
}
