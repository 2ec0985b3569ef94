//! Statements and expressions of a Quill program.

use crate::span::Span;
use crate::specifier::{ArrayMode, FunctionSignature, TypeSpecifier};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    pub text: String,
    #[serde(default)]
    pub span: Span,
}

impl Ident {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Ident {
            text: text.into(),
            span,
        }
    }
}

/// A whole program: the statements of the outermost block.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Block {
            statements,
            span: Span::default(),
        }
    }
}

/// Mutability of a record's instances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    #[default]
    Mutable,
    Readonly,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldDecl {
    pub ty: TypeSpecifier,
    pub name: Ident,
    #[serde(default)]
    pub default: Option<Expr>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordDecl {
    pub name: Ident,
    #[serde(default)]
    pub type_params: Vec<Ident>,
    #[serde(default)]
    pub modifier: Modifier,
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub span: Span,
}

/// Payload of a sum variant: either an inline record or an existing type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum VariantShape {
    Record(Vec<FieldDecl>),
    Type(TypeSpecifier),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariantDecl {
    pub name: Ident,
    pub shape: VariantShape,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SumDecl {
    pub name: Ident,
    #[serde(default)]
    pub type_params: Vec<Ident>,
    pub variants: Vec<VariantDecl>,
    #[serde(default)]
    pub span: Span,
}

/// `type Name<T> = target = default;`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AliasDecl {
    pub name: Ident,
    #[serde(default)]
    pub type_params: Vec<Ident>,
    pub target: TypeSpecifier,
    #[serde(default)]
    pub default: Option<Expr>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionLiteral {
    pub signature: FunctionSignature,
    pub body: Block,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: Ident,
    pub function: Rc<FunctionLiteral>,
}

/// Variable declaration. Either the type or the initializer may be omitted,
/// not both.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Declaration {
    #[serde(default)]
    pub ty: Option<TypeSpecifier>,
    pub name: Ident,
    #[serde(default)]
    pub init: Option<Expr>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AssignTarget {
    Variable(Ident),
    Member {
        object: Box<AssignTarget>,
        member: Ident,
        #[serde(default)]
        span: Span,
    },
    Index {
        array: Box<AssignTarget>,
        index: Expr,
        #[serde(default)]
        span: Span,
    },
}

impl AssignTarget {
    pub fn span(&self) -> Span {
        match self {
            AssignTarget::Variable(id) => id.span,
            AssignTarget::Member { span, .. } | AssignTarget::Index { span, .. } => *span,
        }
    }

    /// The variable at the root of the target path.
    pub fn root(&self) -> &Ident {
        match self {
            AssignTarget::Variable(id) => id,
            AssignTarget::Member { object, .. } => object.root(),
            AssignTarget::Index { array, .. } => array.root(),
        }
    }
}

/// One arm of a `match`: `case Variant binding => body`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchArm {
    pub variant: Ident,
    #[serde(default)]
    pub binding: Option<Ident>,
    pub body: Block,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Stmt {
    Declare(Declaration),
    Assign {
        target: AssignTarget,
        value: Expr,
        #[serde(default)]
        span: Span,
    },
    Expr {
        expr: Expr,
        #[serde(default)]
        span: Span,
    },
    Return {
        #[serde(default)]
        value: Option<Expr>,
        #[serde(default)]
        span: Span,
    },
    If {
        cond: Expr,
        then_: Box<Stmt>,
        #[serde(default)]
        else_: Option<Box<Stmt>>,
        #[serde(default)]
        span: Span,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
        #[serde(default)]
        span: Span,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
        #[serde(default)]
        span: Span,
    },
    For {
        #[serde(default)]
        init: Option<Box<Stmt>>,
        #[serde(default)]
        cond: Option<Expr>,
        #[serde(default)]
        update: Option<Box<Stmt>>,
        body: Box<Stmt>,
        #[serde(default)]
        span: Span,
    },
    Block(Block),
    Match {
        subject: Expr,
        arms: Vec<MatchArm>,
        #[serde(default)]
        else_: Option<Block>,
        #[serde(default)]
        span: Span,
    },
    Record(RecordDecl),
    Sum(SumDecl),
    Alias(AliasDecl),
    Function(FunctionDecl),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Declare(d) => d.span,
            Stmt::Assign { span, .. }
            | Stmt::Expr { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::DoWhile { span, .. }
            | Stmt::For { span, .. }
            | Stmt::Match { span, .. } => *span,
            Stmt::Block(b) => b.span,
            Stmt::Record(r) => r.span,
            Stmt::Sum(s) => s.span,
            Stmt::Alias(a) => a.span,
            Stmt::Function(f) => f.name.span,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Lit {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    Nil,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Not,
    Neg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(self, BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldInit {
    pub name: Ident,
    pub value: Expr,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Expr {
    Lit(Lit, Span),
    Var(Ident),
    Member {
        object: Box<Expr>,
        member: Ident,
        #[serde(default)]
        span: Span,
    },
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
        #[serde(default)]
        span: Span,
    },
    /// Array literal; an empty literal needs its element type spelled out.
    Array {
        #[serde(default)]
        element: Option<TypeSpecifier>,
        #[serde(default)]
        mode: ArrayMode,
        elements: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
    /// `Type { field = value, ... }`, also used for inline sum variants.
    Record {
        ty: TypeSpecifier,
        fields: Vec<FieldInit>,
        #[serde(default)]
        span: Span,
    },
    /// `default(T)`
    Default {
        ty: TypeSpecifier,
        #[serde(default)]
        span: Span,
    },
    Unary {
        op: UnOp,
        expr: Box<Expr>,
        #[serde(default)]
        span: Span,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        #[serde(default)]
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        #[serde(default)]
        type_args: Vec<TypeSpecifier>,
        args: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
    Function(Rc<FunctionLiteral>),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Lit(_, span) => *span,
            Expr::Var(id) => id.span,
            Expr::Member { span, .. }
            | Expr::Index { span, .. }
            | Expr::Array { span, .. }
            | Expr::Record { span, .. }
            | Expr::Default { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Call { span, .. } => *span,
            Expr::Function(f) => f.span,
        }
    }
}
