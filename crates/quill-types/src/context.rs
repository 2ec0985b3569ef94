//! Execution contexts: runtime scopes chained to their parents.
//!
//! Every edge between contexts is tagged with its ownership. A nested scope
//! keeps its parent alive; a closure keeps its defining scope alive only
//! when that scope is the root, which outlives everything created under it.
//! Any other capture is weak and is re-resolved at call time.

use crate::diagnostics::ErrorKind;
use crate::symbol::{InsertResult, Symbol, SymbolContext};
use crate::table::TypeTable;
use crate::value::Value;
use indexmap::IndexSet;
use quill_ast::ast::Modifier;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::trace;

/// How long a context is expected to live relative to its children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifeTime {
    /// Program scope; torn down explicitly with [`ExecutionContext::clear`].
    Root,
    /// Function invocation scope.
    Persistent,
    /// Block and loop-body scope.
    Temporary,
}

#[derive(Clone)]
pub enum ContextLink {
    Strong(Rc<ExecutionContext>),
    Weak(Weak<ExecutionContext>),
}

impl ContextLink {
    pub fn upgrade(&self) -> Option<Rc<ExecutionContext>> {
        match self {
            ContextLink::Strong(rc) => Some(rc.clone()),
            ContextLink::Weak(weak) => weak.upgrade(),
        }
    }

    pub fn is_weak(&self) -> bool {
        matches!(self, ContextLink::Weak(_))
    }
}

impl fmt::Debug for ContextLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextLink::Strong(_) => write!(f, "Strong"),
            ContextLink::Weak(w) => {
                if w.strong_count() > 0 {
                    write!(f, "Weak")
                } else {
                    write!(f, "Weak(released)")
                }
            }
        }
    }
}

pub struct ExecutionContext {
    symbols: RefCell<SymbolContext>,
    /// Names whose declaration in this scope failed and was reported.
    failed: RefCell<IndexSet<String>>,
    types: Rc<TypeTable>,
    return_value: RefCell<Option<Value>>,
    parent: RefCell<Option<ContextLink>>,
    lifetime: LifeTime,
}

impl ExecutionContext {
    fn build(types: Rc<TypeTable>, parent: Option<ContextLink>, lifetime: LifeTime) -> Rc<Self> {
        Rc::new(ExecutionContext {
            symbols: RefCell::new(SymbolContext::new(Modifier::Mutable)),
            failed: RefCell::new(IndexSet::new()),
            types,
            return_value: RefCell::new(None),
            parent: RefCell::new(parent),
            lifetime,
        })
    }

    pub fn root(types: Rc<TypeTable>) -> Rc<Self> {
        Self::build(types, None, LifeTime::Root)
    }

    /// Nested scope sharing the parent's type table.
    pub fn child(parent: &Rc<ExecutionContext>, lifetime: LifeTime) -> Rc<Self> {
        Self::build(
            parent.types.clone(),
            Some(ContextLink::Strong(parent.clone())),
            lifetime,
        )
    }

    /// Nested scope with a type table of its own.
    pub fn child_with_types(
        parent: &Rc<ExecutionContext>,
        types: Rc<TypeTable>,
        lifetime: LifeTime,
    ) -> Rc<Self> {
        Self::build(types, Some(ContextLink::Strong(parent.clone())), lifetime)
    }

    /// A context whose parent is not known yet; see [`Self::link_to_parent`].
    pub fn detached(types: Rc<TypeTable>, lifetime: LifeTime) -> Rc<Self> {
        Self::build(types, None, lifetime)
    }

    /// Bind a detached context to its enclosing scope. A context is linked at
    /// most once.
    pub fn link_to_parent(&self, link: ContextLink) -> Result<(), ErrorKind> {
        let mut parent = self.parent.borrow_mut();
        if parent.is_some() {
            return Err(ErrorKind::InvariantViolation(
                "execution context is already linked to a parent".into(),
            ));
        }
        *parent = Some(link);
        Ok(())
    }

    pub fn parent(&self) -> Option<Rc<ExecutionContext>> {
        self.parent.borrow().as_ref().and_then(ContextLink::upgrade)
    }

    pub fn types(&self) -> &Rc<TypeTable> {
        &self.types
    }

    pub fn lifetime(&self) -> LifeTime {
        self.lifetime
    }

    /// The link a closure created in this scope holds.
    pub fn capture(self: &Rc<Self>) -> ContextLink {
        match self.lifetime {
            LifeTime::Root => ContextLink::Strong(self.clone()),
            LifeTime::Persistent | LifeTime::Temporary => ContextLink::Weak(Rc::downgrade(self)),
        }
    }

    /// Declare `name` in this scope. Shadowing an outer scope is allowed;
    /// redeclaring in the same scope is not.
    pub fn insert_symbol(&self, name: &str, symbol: Symbol) -> InsertResult {
        self.symbols.borrow_mut().insert(name, symbol)
    }

    /// Whether `name` is declared directly in this scope.
    pub fn has_local_symbol(&self, name: &str) -> bool {
        self.symbols.borrow().contains(name)
    }

    /// Remember that declaring `name` here failed. The name stays unbound but
    /// counts as declared in this scope.
    pub fn mark_failed_declaration(&self, name: &str) {
        self.failed.borrow_mut().insert(name.to_string());
    }

    /// Whether `name` was declared directly in this scope, successfully or not.
    pub fn has_local_declaration(&self, name: &str) -> bool {
        self.has_local_symbol(name) || self.failed.borrow().contains(name)
    }

    /// Whether the nearest scope declaring `name` failed to declare it.
    pub fn declaration_failed(&self, name: &str) -> bool {
        if self.has_local_symbol(name) {
            return false;
        }
        if self.failed.borrow().contains(name) {
            return true;
        }
        let mut current = self.parent();
        while let Some(ctx) = current {
            if ctx.has_local_symbol(name) {
                return false;
            }
            if ctx.failed.borrow().contains(name) {
                return true;
            }
            current = ctx.parent();
        }
        false
    }

    /// Nearest visible declaration of `name`.
    pub fn get_symbol(&self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.symbols.borrow().get(name) {
            return Some(symbol.clone());
        }
        let mut current = self.parent();
        while let Some(ctx) = current {
            if let Some(symbol) = ctx.symbols.borrow().get(name) {
                return Some(symbol.clone());
            }
            current = ctx.parent();
        }
        None
    }

    /// Store `value` into the nearest declaration of `name`. Returns false
    /// when no scope declares it.
    pub fn set_symbol(&self, name: &str, value: Value) -> bool {
        if self.symbols.borrow_mut().update(name, value.clone()) {
            return true;
        }
        let mut current = self.parent();
        while let Some(ctx) = current {
            if ctx.symbols.borrow_mut().update(name, value.clone()) {
                return true;
            }
            current = ctx.parent();
        }
        false
    }

    /// Names declared directly in this scope.
    pub fn local_names(&self) -> Vec<String> {
        self.symbols.borrow().names()
    }

    pub fn set_return_value(&self, value: Value) {
        *self.return_value.borrow_mut() = Some(value);
    }

    pub fn take_return_value(&self) -> Option<Value> {
        self.return_value.borrow_mut().take()
    }

    pub fn has_return(&self) -> bool {
        self.return_value.borrow().is_some()
    }

    /// Drop every symbol. Closures declared in the root hold it strongly, so
    /// the root is cleared when its program finishes.
    pub fn clear(&self) {
        let dropped = self.symbols.borrow_mut().take_all();
        trace!(symbols = dropped.len(), "context cleared");
        drop(dropped);
        self.failed.borrow_mut().clear();
        self.return_value.borrow_mut().take();
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        trace!(lifetime = ?self.lifetime, "execution context released");
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("lifetime", &self.lifetime)
            .field("symbols", &self.local_names())
            .field("parent", &*self.parent.borrow())
            .finish()
    }
}
