//! rilli-util - Foundation types shared by every interpreter phase.
//!
//! This crate holds the pieces that the lexer, parser, runtime and driver
//! all need to agree on:
//!
//! - [`Span`] / [`SourcePos`] - source location tracking
//! - [`ScriptError`] / [`ErrorKind`] - the closed taxonomy of script-level
//!   errors, carrying an optional source position
//!
//! Everything here is about *scripts* going wrong, never the interpreter
//! itself; internal invariant violations panic instead.

pub mod error;
pub mod span;

pub use error::{ErrorKind, ScriptError, ScriptResult};
pub use span::{SourcePos, Span};
