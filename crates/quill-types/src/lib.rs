#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![forbid(unsafe_code)]

//! Semantic core of Quill: type definitions, the chained type table,
//! runtime values and the scopes that hold them.

pub mod context;
pub mod definition;
pub mod diagnostics;
mod defaults;
pub mod specifier;
pub mod symbol;
pub mod table;
pub mod value;

pub use context::{ContextLink, ExecutionContext, LifeTime};
pub use definition::TypeDefinition;
pub use diagnostics::{Category, Checked, Diagnostic, ErrorKind, ErrorList};
pub use specifier::{AnalysisResult, SpecifierExt};
pub use symbol::{InsertResult, Symbol, SymbolContext};
pub use table::{AliasResolution, Depth, Resolved, TypeTable};
pub use value::{FunctionBody, FunctionValue, Value};

// Short names for dependents.
pub mod prelude {
    pub use crate::context::{ContextLink, ExecutionContext, LifeTime};
    pub use crate::definition::{
        AliasDefinition, AliasKind, ArrayType, FunctionType, MaybeType, PlaceholderKind,
        PlaceholderType, RecordType, SumType, TypeDefinition,
    };
    pub use crate::diagnostics::{Checked, Diagnostic, ErrorKind, ErrorList};
    pub use crate::specifier::{AnalysisResult, SpecifierExt};
    pub use crate::symbol::{InsertResult, Symbol, SymbolContext};
    pub use crate::table::{AliasResolution, Depth, Resolved, TypeTable};
    pub use crate::value::{
        ArrayValue, FunctionBody, FunctionValue, NativeFn, RecordValue, SumValue, Value,
    };
}
