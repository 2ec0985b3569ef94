#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]

//! Syntax tree consumed by the Quill semantic core.
//!
//! The tree is produced by an external parser (or loaded from JSON by the
//! driver); nothing in this crate performs analysis.

pub mod span {
    use serde::{Deserialize, Serialize};
    use std::fmt;

    /// Opaque source location carried for diagnostics only.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Span {
        pub line: u32,
        pub column: u32,
    }

    impl Span {
        pub fn new(line: u32, column: u32) -> Self {
            Span { line, column }
        }
    }

    impl fmt::Display for Span {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

pub mod ast;
pub mod specifier;

pub use specifier::{
    ArrayMode, FunctionSignature, NamedType, Param, PrimitiveKind, TypeSpecifier,
};
