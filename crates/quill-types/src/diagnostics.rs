//! Diagnostics and the error list threaded through every fallible operation.
//!
//! Nothing in the semantic core panics or unwinds on bad input: failures are
//! collected as [`Diagnostic`]s in an [`ErrorList`], which is immutable once
//! built and only ever grows by concatenation.

use quill_ast::span::Span;
use std::fmt;
use thiserror::Error;

/// Broad class of a diagnostic, used by drivers to group output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Lexical,
    Syntactic,
    Semantic,
    /// A broken internal invariant. Evaluation stops at the first defect.
    Defect,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Lexical => "LEXICAL",
            Category::Syntactic => "SYNTACTIC",
            Category::Semantic => "SEMANTIC",
            Category::Defect => "DEFECT",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ErrorKind {
    #[error("'{name}' was already declared in this scope")]
    PreviousDeclaration { name: String },
    #[error("undeclared variable '{name}'")]
    UndeclaredVariable { name: String },
    #[error("undeclared type '{name}'")]
    UndeclaredType { name: String },
    #[error("malformed tree: {message}")]
    Syntax { message: String },
    #[error("cannot initialize '{name}' of type {expected} with a value of type {found}")]
    InvalidInitializerType {
        name: String,
        expected: String,
        found: String,
    },
    #[error("cannot assign a value of type {found} to '{target}' of type {expected}")]
    AssignmentTypeError {
        target: String,
        expected: String,
        found: String,
    },
    #[error("condition has type {found}, expected boolean")]
    InvalidConditionalExpressionType { found: String },
    #[error("not every path through the function returns a value of type {expected}")]
    FunctionReturnMismatch { expected: String },
    #[error("cannot return a value of type {found} from a function returning {expected}")]
    ReturnTypeMismatch { expected: String, found: String },
    #[error("return statement outside of a function body")]
    ReturnOutsideFunction,
    #[error("too many type arguments: {argument} has no matching type parameter")]
    TooManyArguments { argument: String },
    #[error("too few type arguments: no argument for type parameter '{parameter}'")]
    TooFewArguments { parameter: String },
    #[error("type '{name}' is used before its declaration is complete")]
    PartiallyDeclaredType { name: String },
    #[error("alias '{name}' refers to itself")]
    CircularAlias { name: String },
    #[error("cannot assign to member '{member}' of readonly record {record}")]
    ReadOnlyAssignment { record: String, member: String },
    #[error("a value of type {found} is not callable")]
    NotAFunction { found: String },
    #[error("function takes {expected} argument(s) but {found} were supplied")]
    FunctionArgumentCount { expected: usize, found: usize },
    #[error("argument {index} has type {found}, expected {expected}")]
    FunctionArgumentType {
        index: usize,
        expected: String,
        found: String,
    },
    #[error("type {ty} has no member '{member}'")]
    UnknownMember { ty: String, member: String },
    #[error("a value of type {found} cannot be indexed")]
    NotAnArray { found: String },
    #[error("{found} is not a record type")]
    NotARecord { found: String },
    #[error("array index has type {found}, expected int")]
    InvalidIndexType { found: String },
    #[error("array element of type {found} does not fit element type {expected}")]
    InvalidArrayElement { expected: String, found: String },
    #[error("an empty array literal needs an explicit element type")]
    UntypedArrayLiteral,
    #[error("operator '{op}' cannot be applied to {operands}")]
    OperatorTypeError { op: String, operands: String },
    #[error("{ty} has no variant '{variant}'")]
    UnknownVariant { ty: String, variant: String },
    #[error("match over {ty} does not handle {missing}")]
    NonExhaustiveMatch { ty: String, missing: String },
    #[error("cannot match on a value of type {found}")]
    InvalidMatchSubject { found: String },
    #[error("sum type '{name}' declares {count} variant(s); at least two are required")]
    SumTooFewVariants { name: String, count: usize },
    #[error("a value of type {found} fits more than one variant of {ty}")]
    AmbiguousSumConversion { ty: String, found: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("index {index} is out of bounds for an array of length {length}")]
    ArrayIndexOutOfBounds { index: i64, length: usize },
    #[error("call depth limit of {limit} exceeded")]
    CallDepthExceeded { limit: u32 },
    #[error("native function '{name}' failed: {message}")]
    NativeFunction { name: String, message: String },

    #[error("resolving '{name}' did not reach a concrete type within {limit} steps")]
    AliasResolutionLimit { name: String, limit: usize },
    #[error("sum type '{name}' has fewer than two variants")]
    InvalidSumType { name: String },
    #[error("function called after its defining scope was released")]
    ClosureScopeReleased,
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

impl ErrorKind {
    /// Stable code printed next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::PreviousDeclaration { .. } => "PREVIOUS_DECLARATION",
            ErrorKind::UndeclaredVariable { .. } => "UNDECLARED_VARIABLE",
            ErrorKind::UndeclaredType { .. } => "UNDECLARED_TYPE",
            ErrorKind::Syntax { .. } => "MALFORMED_TREE",
            ErrorKind::InvalidInitializerType { .. } => "INVALID_INITIALIZER_TYPE",
            ErrorKind::AssignmentTypeError { .. } => "ASSIGNMENT_TYPE_ERROR",
            ErrorKind::InvalidConditionalExpressionType { .. } => {
                "INVALID_CONDITIONAL_EXPRESSION_TYPE"
            }
            ErrorKind::FunctionReturnMismatch { .. } => "FUNCTION_RETURN_MISMATCH",
            ErrorKind::ReturnTypeMismatch { .. } => "RETURN_TYPE_MISMATCH",
            ErrorKind::ReturnOutsideFunction => "RETURN_OUTSIDE_FUNCTION",
            ErrorKind::TooManyArguments { .. } => "TOO_MANY_ARGUMENTS",
            ErrorKind::TooFewArguments { .. } => "TOO_FEW_ARGUMENTS",
            ErrorKind::PartiallyDeclaredType { .. } => "PARTIALLY_DECLARED_TYPE",
            ErrorKind::CircularAlias { .. } => "CIRCULAR_ALIAS",
            ErrorKind::ReadOnlyAssignment { .. } => "READ_ONLY_ASSIGNMENT",
            ErrorKind::NotAFunction { .. } => "NOT_A_FUNCTION",
            ErrorKind::FunctionArgumentCount { .. } => "FUNCTION_ARGUMENT_COUNT",
            ErrorKind::FunctionArgumentType { .. } => "FUNCTION_ARGUMENT_TYPE",
            ErrorKind::UnknownMember { .. } => "UNKNOWN_MEMBER",
            ErrorKind::NotAnArray { .. } => "NOT_AN_ARRAY",
            ErrorKind::NotARecord { .. } => "NOT_A_RECORD",
            ErrorKind::InvalidIndexType { .. } => "INVALID_INDEX_TYPE",
            ErrorKind::InvalidArrayElement { .. } => "INVALID_ARRAY_ELEMENT",
            ErrorKind::UntypedArrayLiteral => "UNTYPED_ARRAY_LITERAL",
            ErrorKind::OperatorTypeError { .. } => "OPERATOR_TYPE_ERROR",
            ErrorKind::UnknownVariant { .. } => "UNKNOWN_VARIANT",
            ErrorKind::NonExhaustiveMatch { .. } => "NON_EXHAUSTIVE_MATCH",
            ErrorKind::InvalidMatchSubject { .. } => "INVALID_MATCH_SUBJECT",
            ErrorKind::SumTooFewVariants { .. } => "SUM_TOO_FEW_VARIANTS",
            ErrorKind::AmbiguousSumConversion { .. } => "AMBIGUOUS_SUM_CONVERSION",
            ErrorKind::DivisionByZero => "DIVISION_BY_ZERO",
            ErrorKind::ArrayIndexOutOfBounds { .. } => "ARRAY_INDEX_OUT_OF_BOUNDS",
            ErrorKind::CallDepthExceeded { .. } => "CALL_DEPTH_EXCEEDED",
            ErrorKind::NativeFunction { .. } => "NATIVE_FUNCTION_ERROR",
            ErrorKind::AliasResolutionLimit { .. } => "ALIAS_RESOLUTION_LIMIT",
            ErrorKind::InvalidSumType { .. } => "INVALID_SUM_TYPE",
            ErrorKind::ClosureScopeReleased => "CLOSURE_SCOPE_RELEASED",
            ErrorKind::InvariantViolation(_) => "INVARIANT_VIOLATION",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            ErrorKind::Syntax { .. } => Category::Syntactic,
            ErrorKind::InvalidSumType { .. }
            | ErrorKind::ClosureScopeReleased
            | ErrorKind::InvariantViolation(_) => Category::Defect,
            _ => Category::Semantic,
        }
    }

    pub fn is_defect(&self) -> bool {
        self.category() == Category::Defect
    }

    /// Attach a source location.
    pub fn at(self, span: Span) -> Diagnostic {
        Diagnostic { kind: self, span }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub span: Span,
}

impl Diagnostic {
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: error[{}]: {}", self.span, self.kind.code(), self.kind)
    }
}

impl std::error::Error for Diagnostic {}

/// Ordered, append-only collection of diagnostics.
///
/// Lists are combined by value; the order of entries is the order in which
/// failures were discovered.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErrorList {
    entries: Vec<Diagnostic>,
}

/// Result of a fallible operation in the semantic core.
pub type Checked<T> = Result<T, ErrorList>;

impl ErrorList {
    pub fn new() -> Self {
        ErrorList::default()
    }

    pub fn single(diagnostic: Diagnostic) -> Self {
        ErrorList {
            entries: vec![diagnostic],
        }
    }

    /// This list followed by one more entry.
    pub fn with(mut self, diagnostic: Diagnostic) -> Self {
        self.entries.push(diagnostic);
        self
    }

    /// This list followed by every entry of `other`.
    pub fn concat(mut self, other: ErrorList) -> Self {
        self.entries.extend(other.entries);
        self
    }

    /// Fold the error side of `result` into this list, passing the value on.
    pub fn absorb<T>(self, result: Checked<T>) -> (Self, Option<T>) {
        match result {
            Ok(value) => (self, Some(value)),
            Err(errors) => (self.concat(errors), None),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn first(&self) -> Option<&Diagnostic> {
        self.entries.first()
    }

    pub fn has_defect(&self) -> bool {
        self.entries.iter().any(|d| d.kind.is_defect())
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.entries.iter().map(Diagnostic::code).collect()
    }

    /// `Ok(value)` when the list is empty, otherwise the list itself.
    pub fn into_result<T>(self, value: T) -> Checked<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<Diagnostic> for ErrorList {
    fn from(diagnostic: Diagnostic) -> Self {
        ErrorList::single(diagnostic)
    }
}

impl FromIterator<Diagnostic> for ErrorList {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        ErrorList {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ErrorList {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}
