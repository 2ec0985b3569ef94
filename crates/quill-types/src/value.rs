//! Runtime values.

use crate::context::ContextLink;
use crate::definition::{MAYBE_EMPTY, MAYBE_VALUE};
use crate::symbol::SymbolContext;
use crate::table::TypeTable;
use quill_ast::ast::FunctionLiteral;
use quill_ast::{ArrayMode, FunctionSignature, TypeSpecifier};
use std::fmt;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    Nil,
    Array(ArrayValue),
    /// Record instance: Point { x: 1, y: 2 }
    Record(RecordValue),
    /// Sum or Maybe instance tagged with the variant it holds.
    Sum(SumValue),
    Function(Rc<FunctionValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub element: TypeSpecifier,
    pub mode: ArrayMode,
    pub items: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordValue {
    pub ty: TypeSpecifier,
    pub fields: SymbolContext,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SumValue {
    /// The sum (or Maybe) type itself.
    pub ty: TypeSpecifier,
    pub tag: String,
    /// Type of the variant named by `tag`; never the sum's own type.
    pub tag_type: TypeSpecifier,
    /// Present for every tag except a Maybe's `empty`.
    pub value: Option<Box<Value>>,
}

impl SumValue {
    pub fn new(
        ty: TypeSpecifier,
        tag: impl Into<String>,
        tag_type: TypeSpecifier,
        value: Value,
    ) -> Self {
        SumValue {
            ty,
            tag: tag.into(),
            tag_type,
            value: Some(Box::new(value)),
        }
    }

    pub fn empty(ty: TypeSpecifier) -> Self {
        SumValue {
            ty,
            tag: MAYBE_EMPTY.to_string(),
            tag_type: TypeSpecifier::nil(),
            value: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}

/// Host function callable from Quill code.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, String>>;

#[derive(Clone)]
pub enum FunctionBody {
    Literal(Rc<FunctionLiteral>),
    /// Synthesized body that returns the default of `ret`, read in `table`.
    Default {
        ret: TypeSpecifier,
        table: Weak<TypeTable>,
    },
    Native { name: String, func: NativeFn },
}

impl fmt::Debug for FunctionBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionBody::Literal(lit) => write!(f, "Literal(span {})", lit.span),
            FunctionBody::Default { ret, .. } => write!(f, "Default(-> {})", ret),
            FunctionBody::Native { name, .. } => write!(f, "Native({})", name),
        }
    }
}

#[derive(Debug)]
pub struct FunctionValue {
    pub signature: FunctionSignature,
    pub body: FunctionBody,
    /// Scope the function was created in. `None` for native and synthesized
    /// functions.
    pub closure: Option<ContextLink>,
}

impl FunctionValue {
    pub fn native(name: impl Into<String>, signature: FunctionSignature, func: NativeFn) -> Self {
        FunctionValue {
            signature,
            body: FunctionBody::Native {
                name: name.into(),
                func,
            },
            closure: None,
        }
    }
}

impl Value {
    /// The dynamic type of this value.
    pub fn type_specifier(&self) -> TypeSpecifier {
        match self {
            Value::Bool(_) => TypeSpecifier::boolean(),
            Value::Int(_) => TypeSpecifier::int(),
            Value::Double(_) => TypeSpecifier::double(),
            Value::Str(_) => TypeSpecifier::string(),
            Value::Nil => TypeSpecifier::nil(),
            Value::Array(a) => TypeSpecifier::array(a.element.clone(), a.mode),
            Value::Record(r) => r.ty.clone(),
            Value::Sum(s) => s.ty.clone(),
            Value::Function(f) => TypeSpecifier::function(f.signature.clone()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view with booleans and ints widened.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(*i as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Maybe constructor: `value` tag around `inner`.
    pub fn some(ty: TypeSpecifier, base: TypeSpecifier, inner: Value) -> Value {
        Value::Sum(SumValue::new(ty, MAYBE_VALUE, base, inner))
    }
}

impl PartialEq for Value {
    /// Structural equality. Numbers compare across int and double; functions
    /// compare by identity. Records and sums also compare their type, so
    /// equally named variants of different sums differ.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Array(a), Value::Array(b)) => a.items == b.items,
            (Value::Record(a), Value::Record(b)) => a.ty == b.ty && a.fields == b.fields,
            (Value::Sum(a), Value::Sum(b)) => {
                a.ty == b.ty && a.tag == b.tag && a.value == b.value
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (a, b) => match (a.as_double(), b.as_double()) {
                (Some(x), Some(y)) => {
                    !matches!(a, Value::Bool(_)) && !matches!(b, Value::Bool(_)) && x == y
                }
                _ => false,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v:?}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Nil => write!(f, "nil"),
            Value::Array(a) => {
                write!(f, "[")?;
                for (i, item) in a.items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    fmt_nested(item, f)?;
                }
                write!(f, "]")
            }
            Value::Record(r) => {
                write!(f, "{} {{ ", r.ty)?;
                for (i, (name, symbol)) in r.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", name)?;
                    fmt_nested(symbol.value(), f)?;
                }
                write!(f, " }}")
            }
            Value::Sum(s) => match &s.value {
                None => write!(f, "{}", s.tag),
                Some(inner) if s.tag == MAYBE_VALUE => fmt_nested(inner, f),
                Some(inner) => {
                    write!(f, "{}(", s.tag)?;
                    fmt_nested(inner, f)?;
                    write!(f, ")")
                }
            },
            Value::Function(func) => write!(f, "<fn{}>", func.signature),
        }
    }
}

/// Strings are quoted when shown inside a compound value.
fn fmt_nested(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::Str(s) => write!(f, "\"{s}\""),
        other => write!(f, "{other}"),
    }
}
