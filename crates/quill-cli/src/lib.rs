#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![forbid(unsafe_code)]

//! Evaluator and driver support for Quill programs.

pub mod builtins;
pub mod eval;
