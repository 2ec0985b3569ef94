//! Type specifiers: the as-written description of a type.
//!
//! Specifiers are immutable values. Equality is structural and ignores
//! source spans; named specifiers compare by name, container chain and
//! type arguments.

use crate::ast::Ident;
use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Boolean,
    Int,
    Double,
    String,
}

impl PrimitiveKind {
    /// Position on the widening order `boolean < int < double`.
    /// Strings sit outside the order.
    pub fn rank(self) -> Option<u8> {
        match self {
            PrimitiveKind::Boolean => Some(0),
            PrimitiveKind::Int => Some(1),
            PrimitiveKind::Double => Some(2),
            PrimitiveKind::String => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Double => "double",
            PrimitiveKind::String => "string",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, PrimitiveKind::Int | PrimitiveKind::Double)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrayMode {
    Fixed,
    #[default]
    Dynamic,
}

/// A name reference with its enclosing-container chain and type arguments.
///
/// `Shape.Circle` is `{ name: "Circle", container: ["Shape"] }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NamedType {
    pub name: String,
    #[serde(default)]
    pub container: Vec<String>,
    #[serde(default)]
    pub type_args: Vec<TypeSpecifier>,
    #[serde(default)]
    pub span: Span,
}

impl NamedType {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        NamedType {
            name: name.into(),
            container: Vec::new(),
            type_args: Vec::new(),
            span,
        }
    }

    pub fn within(mut self, container: Vec<String>) -> Self {
        self.container = container;
        self
    }

    pub fn with_args(mut self, type_args: Vec<TypeSpecifier>) -> Self {
        self.type_args = type_args;
        self
    }

    /// Dotted name including the container chain, without type arguments.
    pub fn qualified_name(&self) -> String {
        let mut out = String::new();
        for c in &self.container {
            out.push_str(c);
            out.push('.');
        }
        out.push_str(&self.name);
        out
    }

    /// Container chain followed by this name; the chain a nested type uses
    /// as its own container.
    pub fn path(&self) -> Vec<String> {
        let mut path = self.container.clone();
        path.push(self.name.clone());
        path
    }

    /// Same nominal identity (name + container chain), ignoring type arguments.
    pub fn same_declaration(&self, other: &NamedType) -> bool {
        self.name == other.name && self.container == other.container
    }
}

impl PartialEq for NamedType {
    fn eq(&self, other: &Self) -> bool {
        named_eq(self, other, &mut Vec::new())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Param {
    pub name: Ident,
    pub ty: TypeSpecifier,
}

/// Function signature: type parameters, parameters and return type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionSignature {
    #[serde(default)]
    pub type_params: Vec<Ident>,
    pub params: Vec<Param>,
    pub ret: TypeSpecifier,
    #[serde(default)]
    pub span: Span,
}

impl FunctionSignature {
    pub fn new(params: Vec<Param>, ret: TypeSpecifier) -> Self {
        FunctionSignature {
            type_params: Vec::new(),
            params,
            ret,
            span: Span::default(),
        }
    }

    pub fn generic(mut self, type_params: Vec<Ident>) -> Self {
        self.type_params = type_params;
        self
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    pub fn type_param_names(&self) -> Vec<String> {
        self.type_params.iter().map(|p| p.text.clone()).collect()
    }
}

impl PartialEq for FunctionSignature {
    // Parameter names do not contribute to the type; type parameters compare
    // by position, so `<A>(A) -> A` equals `<B>(B) -> B`.
    fn eq(&self, other: &Self) -> bool {
        signature_eq(self, other, &mut Vec::new())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TypeSpecifier {
    Primitive {
        kind: PrimitiveKind,
        #[serde(default)]
        span: Span,
    },
    Array {
        element: Box<TypeSpecifier>,
        #[serde(default)]
        mode: ArrayMode,
        #[serde(default)]
        span: Span,
    },
    /// Nominal record type.
    Record(NamedType),
    /// Nominal sum type.
    Sum(NamedType),
    /// `T?`: either a value of `T` or empty.
    Maybe {
        base: Box<TypeSpecifier>,
        #[serde(default)]
        span: Span,
    },
    Function(Box<FunctionSignature>),
    /// `Parent.member`: a sum variant's payload type or a record field's type.
    Nested {
        parent: Box<TypeSpecifier>,
        member: String,
        #[serde(default)]
        span: Span,
    },
    /// A name applied to zero or more type arguments, resolved through the
    /// type table (record, sum, alias or bound type parameter).
    Named(NamedType),
    /// The type of `nil`; also the return type of functions without a value.
    Nil(Span),
}

impl TypeSpecifier {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        TypeSpecifier::Primitive {
            kind,
            span: Span::default(),
        }
    }

    pub fn boolean() -> Self {
        Self::primitive(PrimitiveKind::Boolean)
    }

    pub fn int() -> Self {
        Self::primitive(PrimitiveKind::Int)
    }

    pub fn double() -> Self {
        Self::primitive(PrimitiveKind::Double)
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveKind::String)
    }

    pub fn nil() -> Self {
        TypeSpecifier::Nil(Span::default())
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeSpecifier::Named(NamedType::new(name, Span::default()))
    }

    pub fn array(element: TypeSpecifier, mode: ArrayMode) -> Self {
        TypeSpecifier::Array {
            element: Box::new(element),
            mode,
            span: Span::default(),
        }
    }

    pub fn maybe(base: TypeSpecifier) -> Self {
        TypeSpecifier::Maybe {
            base: Box::new(base),
            span: Span::default(),
        }
    }

    pub fn function(signature: FunctionSignature) -> Self {
        TypeSpecifier::Function(Box::new(signature))
    }

    pub fn nested(parent: TypeSpecifier, member: impl Into<String>) -> Self {
        TypeSpecifier::Nested {
            parent: Box::new(parent),
            member: member.into(),
            span: Span::default(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TypeSpecifier::Primitive { span, .. }
            | TypeSpecifier::Array { span, .. }
            | TypeSpecifier::Maybe { span, .. }
            | TypeSpecifier::Nested { span, .. }
            | TypeSpecifier::Nil(span) => *span,
            TypeSpecifier::Record(n) | TypeSpecifier::Sum(n) | TypeSpecifier::Named(n) => n.span,
            TypeSpecifier::Function(sig) => sig.span,
        }
    }

    /// Copy of this specifier carrying `span`.
    pub fn at(mut self, at: Span) -> Self {
        match &mut self {
            TypeSpecifier::Primitive { span, .. }
            | TypeSpecifier::Array { span, .. }
            | TypeSpecifier::Maybe { span, .. }
            | TypeSpecifier::Nested { span, .. }
            | TypeSpecifier::Nil(span) => *span = at,
            TypeSpecifier::Record(n) | TypeSpecifier::Sum(n) | TypeSpecifier::Named(n) => {
                n.span = at
            }
            TypeSpecifier::Function(sig) => sig.span = at,
        }
        self
    }

    pub fn as_named(&self) -> Option<&NamedType> {
        match self {
            TypeSpecifier::Record(n) | TypeSpecifier::Sum(n) | TypeSpecifier::Named(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            TypeSpecifier::Primitive { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, TypeSpecifier::Nil(_))
    }

    /// True when this is a bare name without container or arguments; the
    /// shape a type parameter reference has.
    pub fn is_bare_name(&self, name: &str) -> bool {
        matches!(self, TypeSpecifier::Named(n)
            if n.name == name && n.container.is_empty() && n.type_args.is_empty())
    }
}

impl PartialEq for TypeSpecifier {
    fn eq(&self, other: &Self) -> bool {
        specifier_eq(self, other, &mut Vec::new())
    }
}

/// Type parameters in scope during a comparison, innermost last. Each entry
/// pairs the names the two sides bind at the same position.
type Binders<'a> = Vec<(&'a str, &'a str)>;

fn specifier_eq<'a>(a: &'a TypeSpecifier, b: &'a TypeSpecifier, binders: &mut Binders<'a>) -> bool {
    use TypeSpecifier::*;
    match (a, b) {
        (Primitive { kind: a, .. }, Primitive { kind: b, .. }) => a == b,
        (
            Array {
                element: a,
                mode: ma,
                ..
            },
            Array {
                element: b,
                mode: mb,
                ..
            },
        ) => ma == mb && specifier_eq(a, b, binders),
        (Maybe { base: a, .. }, Maybe { base: b, .. }) => specifier_eq(a, b, binders),
        (Function(a), Function(b)) => signature_eq(a, b, binders),
        (
            Nested {
                parent: pa,
                member: ma,
                ..
            },
            Nested {
                parent: pb,
                member: mb,
                ..
            },
        ) => ma == mb && specifier_eq(pa, pb, binders),
        (Nil(_), Nil(_)) => true,
        (Record(a) | Sum(a) | Named(a), Record(b) | Sum(b) | Named(b)) => named_eq(a, b, binders),
        _ => false,
    }
}

fn named_eq<'a>(a: &'a NamedType, b: &'a NamedType, binders: &mut Binders<'a>) -> bool {
    let bare = |n: &NamedType| n.container.is_empty() && n.type_args.is_empty();
    if bare(a) && bare(b) {
        let left = binders.iter().rposition(|(l, _)| *l == a.name);
        let right = binders.iter().rposition(|(_, r)| *r == b.name);
        if left.is_some() || right.is_some() {
            return left == right;
        }
    }
    a.same_declaration(b)
        && a.type_args.len() == b.type_args.len()
        && a.type_args
            .iter()
            .zip(&b.type_args)
            .all(|(x, y)| specifier_eq(x, y, binders))
}

fn signature_eq<'a>(
    a: &'a FunctionSignature,
    b: &'a FunctionSignature,
    binders: &mut Binders<'a>,
) -> bool {
    if a.type_params.len() != b.type_params.len() || a.params.len() != b.params.len() {
        return false;
    }
    let outer = binders.len();
    binders.extend(
        a.type_params
            .iter()
            .zip(&b.type_params)
            .map(|(l, r)| (l.text.as_str(), r.text.as_str())),
    );
    let equal = a
        .params
        .iter()
        .zip(&b.params)
        .all(|(x, y)| specifier_eq(&x.ty, &y.ty, binders))
        && specifier_eq(&a.ret, &b.ret, binders);
    binders.truncate(outer);
    equal
}

impl fmt::Display for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())?;
        if !self.type_args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.type_args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.type_params.is_empty() {
            let names = self.type_param_names();
            write!(f, "<{}>", names.join(", "))?;
        }
        write!(f, "(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p.ty)?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

impl fmt::Display for TypeSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpecifier::Primitive { kind, .. } => write!(f, "{}", kind.name()),
            TypeSpecifier::Array { element, mode, .. } => match mode {
                ArrayMode::Dynamic => write!(f, "{}[]", element),
                ArrayMode::Fixed => write!(f, "{}[fixed]", element),
            },
            TypeSpecifier::Record(n) | TypeSpecifier::Sum(n) | TypeSpecifier::Named(n) => {
                write!(f, "{}", n)
            }
            TypeSpecifier::Maybe { base, .. } => write!(f, "{}?", base),
            TypeSpecifier::Function(sig) => write!(f, "{}", sig),
            TypeSpecifier::Nested { parent, member, .. } => write!(f, "{}.{}", parent, member),
            TypeSpecifier::Nil(_) => write!(f, "nil"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_spans() {
        let a = TypeSpecifier::int().at(Span::new(1, 1));
        let b = TypeSpecifier::int().at(Span::new(9, 4));
        assert_eq!(a, b);
    }

    #[test]
    fn named_kinds_compare_by_name_and_container() {
        let record = TypeSpecifier::Record(NamedType::new("Circle", Span::default()).within(vec!["Shape".into()]));
        let named = TypeSpecifier::Named(NamedType::new("Circle", Span::default()).within(vec!["Shape".into()]));
        let bare = TypeSpecifier::named("Circle");
        assert_eq!(record, named);
        assert_ne!(record, bare);
    }

    #[test]
    fn generic_signatures_compare_type_parameters_by_position() {
        let t = |name: &str| TypeSpecifier::named(name);
        let sig = |params: &[&str], args: Vec<TypeSpecifier>, ret: TypeSpecifier| {
            let args = args
                .into_iter()
                .map(|ty| Param {
                    name: Ident::new("p", Span::default()),
                    ty,
                })
                .collect();
            TypeSpecifier::function(
                FunctionSignature::new(args, ret)
                    .generic(params.iter().map(|p| Ident::new(*p, Span::default())).collect()),
            )
        };

        assert_eq!(sig(&["A"], vec![t("A")], t("A")), sig(&["B"], vec![t("B")], t("B")));
        assert_ne!(
            sig(&["A", "B"], vec![t("A")], t("B")),
            sig(&["A", "B"], vec![t("B")], t("A"))
        );
        // A free name is not the same as a bound one.
        assert_ne!(sig(&["T"], vec![t("T")], t("T")), sig(&["U"], vec![t("T")], t("U")));
        assert_ne!(sig(&["T"], vec![t("T")], t("T")), sig(&[], vec![t("T")], t("T")));
        // Bindings reach into type arguments and nested signatures.
        let boxed = |n: &str| TypeSpecifier::Named(NamedType::new("Box", Span::default()).with_args(vec![t(n)]));
        assert_eq!(
            sig(&["A"], vec![boxed("A"), sig(&[], vec![t("A")], t("A"))], t("A")),
            sig(&["Z"], vec![boxed("Z"), sig(&[], vec![t("Z")], t("Z"))], t("Z"))
        );
    }

    #[test]
    fn array_equality_includes_mode() {
        let fixed = TypeSpecifier::array(TypeSpecifier::int(), ArrayMode::Fixed);
        let dynamic = TypeSpecifier::array(TypeSpecifier::int(), ArrayMode::Dynamic);
        assert_ne!(fixed, dynamic);
        assert_eq!(dynamic.clone(), dynamic);
    }

    #[test]
    fn display_forms() {
        let boxed = TypeSpecifier::Named(
            NamedType::new("Box", Span::default()).with_args(vec![TypeSpecifier::int()]),
        );
        assert_eq!(boxed.to_string(), "Box<int>");
        assert_eq!(TypeSpecifier::maybe(TypeSpecifier::double()).to_string(), "double?");
        let sig = FunctionSignature::new(
            vec![Param {
                name: Ident::new("x", Span::default()),
                ty: TypeSpecifier::int(),
            }],
            TypeSpecifier::string(),
        );
        assert_eq!(TypeSpecifier::function(sig).to_string(), "(int) -> string");
    }

    #[test]
    fn widening_ranks() {
        assert!(PrimitiveKind::Boolean.rank() < PrimitiveKind::Int.rank());
        assert!(PrimitiveKind::Int.rank() < PrimitiveKind::Double.rank());
        assert_eq!(PrimitiveKind::String.rank(), None);
    }
}
