//! Named, typed bindings and the maps that hold them.

use crate::value::Value;
use indexmap::IndexMap;
use quill_ast::ast::Modifier;
use quill_ast::TypeSpecifier;

/// An immutable binding of a value to its declared type. Updating a variable
/// replaces its symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    ty: TypeSpecifier,
    value: Value,
}

impl Symbol {
    pub fn new(ty: TypeSpecifier, value: Value) -> Self {
        Symbol { ty, value }
    }

    pub fn ty(&self) -> &TypeSpecifier {
        &self.ty
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Same declared type, new value.
    pub fn with_value(&self, value: Value) -> Symbol {
        Symbol {
            ty: self.ty.clone(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    Success,
    SymbolExists,
}

/// Ordered name -> symbol map; also the field storage of record instances,
/// which is why it carries the record's mutability modifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolContext {
    modifier: Modifier,
    symbols: IndexMap<String, Symbol>,
}

impl SymbolContext {
    pub fn new(modifier: Modifier) -> Self {
        SymbolContext {
            modifier,
            symbols: IndexMap::new(),
        }
    }

    pub fn modifier(&self) -> Modifier {
        self.modifier
    }

    /// Never overwrites an existing entry.
    pub fn insert(&mut self, name: impl Into<String>, symbol: Symbol) -> InsertResult {
        match self.symbols.entry(name.into()) {
            indexmap::map::Entry::Occupied(_) => InsertResult::SymbolExists,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(symbol);
                InsertResult::Success
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Replace the value of an existing entry. Returns false when `name` is
    /// not present.
    pub fn update(&mut self, name: &str, value: Value) -> bool {
        match self.symbols.get_mut(name) {
            Some(symbol) => {
                *symbol = symbol.with_value(value);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Symbol)> {
        self.symbols.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.symbols.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Drop every entry, returning them in declaration order.
    pub fn take_all(&mut self) -> Vec<(String, Symbol)> {
        self.symbols.drain(..).collect()
    }
}
