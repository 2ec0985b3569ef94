//! Type definitions: what a type name means once it has been resolved.

use crate::table::TypeTable;
use crate::value::Value;
use indexmap::IndexMap;
use quill_ast::ast::Modifier;
use quill_ast::{ArrayMode, FunctionSignature, NamedType, PrimitiveKind, TypeSpecifier};
use std::fmt;
use std::rc::Rc;

/// Variant names of a Maybe's backing sum.
pub const MAYBE_VALUE: &str = "value";
pub const MAYBE_EMPTY: &str = "empty";

#[derive(Debug)]
pub enum TypeDefinition {
    Primitive(PrimitiveKind),
    Array(ArrayType),
    Record(RecordType),
    Sum(SumType),
    Maybe(MaybeType),
    Function(FunctionType),
    Alias(AliasDefinition),
    Placeholder(PlaceholderType),
    Nil,
    /// What a nested specifier resolves to when the parent has no such member.
    Absent,
}

impl TypeDefinition {
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeDefinition::Primitive(_) => "primitive",
            TypeDefinition::Array(_) => "array",
            TypeDefinition::Record(_) => "record",
            TypeDefinition::Sum(_) => "sum",
            TypeDefinition::Maybe(_) => "maybe",
            TypeDefinition::Function(_) => "function",
            TypeDefinition::Alias(_) => "alias",
            TypeDefinition::Placeholder(_) => "placeholder",
            TypeDefinition::Nil => "nil",
            TypeDefinition::Absent => "absent",
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, TypeDefinition::Placeholder(_))
    }
}

#[derive(Debug, Clone)]
pub struct ArrayType {
    pub element: TypeSpecifier,
    pub mode: ArrayMode,
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub ty: TypeSpecifier,
    /// Value of the field's initializer, evaluated when the record was declared.
    pub default: Option<Value>,
}

#[derive(Debug)]
pub struct RecordType {
    /// Qualified name of the declaration (container chain included).
    pub specifier: NamedType,
    pub type_params: Vec<String>,
    pub modifier: Modifier,
    pub fields: IndexMap<String, FieldDef>,
    /// Scope of the declaration: type parameters and nested names live here.
    pub table: Rc<TypeTable>,
}

#[derive(Debug)]
pub struct SumType {
    pub specifier: NamedType,
    pub type_params: Vec<String>,
    /// Declaration order is authoritative; the first entry is the default.
    pub variants: IndexMap<String, TypeSpecifier>,
    pub table: Rc<TypeTable>,
}

impl SumType {
    pub fn first_variant(&self) -> Option<(&String, &TypeSpecifier)> {
        self.variants.first()
    }
}

/// `T?`: a two-variant sum of `value: T` and `empty: nil`.
#[derive(Debug, Clone)]
pub struct MaybeType {
    pub base: TypeSpecifier,
}

impl MaybeType {
    pub fn variants(&self) -> [(&'static str, TypeSpecifier); 2] {
        [
            (MAYBE_VALUE, self.base.clone()),
            (MAYBE_EMPTY, TypeSpecifier::nil()),
        ]
    }

    pub fn variant(&self, name: &str) -> Option<TypeSpecifier> {
        match name {
            MAYBE_VALUE => Some(self.base.clone()),
            MAYBE_EMPTY => Some(TypeSpecifier::nil()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionType {
    pub signature: FunctionSignature,
}

/// How an alias's origin is looked up.
#[derive(Debug, Clone)]
pub enum AliasKind {
    /// A declared `type Name = ...`: the origin is resolved in the table that
    /// holds the alias.
    Direct,
    /// A type-parameter binding created for a generic instantiation: the
    /// origin is a type argument written in another table, and resolution
    /// recurses into that table.
    Recursive { table: Rc<TypeTable> },
}

#[derive(Debug, Clone)]
pub struct AliasDefinition {
    pub name: String,
    pub origin: TypeSpecifier,
    pub kind: AliasKind,
    pub type_params: Vec<String>,
    /// Overrides the origin's default value.
    pub default: Option<Value>,
}

impl AliasDefinition {
    pub fn direct(name: impl Into<String>, origin: TypeSpecifier) -> Self {
        AliasDefinition {
            name: name.into(),
            origin,
            kind: AliasKind::Direct,
            type_params: Vec::new(),
            default: None,
        }
    }

    pub fn binding(name: impl Into<String>, origin: TypeSpecifier, table: Rc<TypeTable>) -> Self {
        AliasDefinition {
            name: name.into(),
            origin,
            kind: AliasKind::Recursive { table },
            type_params: Vec::new(),
            default: None,
        }
    }

    pub fn is_binding(&self) -> bool {
        matches!(self.kind, AliasKind::Recursive { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// A record, sum or alias whose declaration has not completed yet.
    Declaration,
    /// An unbound type parameter inside a generic declaration.
    TypeParameter,
}

#[derive(Debug, Clone)]
pub struct PlaceholderType {
    pub name: String,
    pub kind: PlaceholderKind,
}

impl PlaceholderType {
    pub fn declaration(name: impl Into<String>) -> Self {
        PlaceholderType {
            name: name.into(),
            kind: PlaceholderKind::Declaration,
        }
    }

    pub fn type_parameter(name: impl Into<String>) -> Self {
        PlaceholderType {
            name: name.into(),
            kind: PlaceholderKind::TypeParameter,
        }
    }
}

impl fmt::Display for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDefinition::Primitive(kind) => write!(f, "{}", kind.name()),
            TypeDefinition::Array(a) => {
                write!(f, "{}", TypeSpecifier::array(a.element.clone(), a.mode))
            }
            TypeDefinition::Record(r) => write!(f, "record {}", r.specifier.qualified_name()),
            TypeDefinition::Sum(s) => write!(f, "sum {}", s.specifier.qualified_name()),
            TypeDefinition::Maybe(m) => write!(f, "{}?", m.base),
            TypeDefinition::Function(func) => write!(f, "{}", func.signature),
            TypeDefinition::Alias(a) => write!(f, "alias {} = {}", a.name, a.origin),
            TypeDefinition::Placeholder(p) => write!(f, "{} (incomplete)", p.name),
            TypeDefinition::Nil => write!(f, "nil"),
            TypeDefinition::Absent => write!(f, "<no type>"),
        }
    }
}
