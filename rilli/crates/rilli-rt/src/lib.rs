//! rilli-rt - The Rill runtime.
//!
//! This crate is the interpreter proper: the value model, the context tree
//! the evaluator runs on, the operator overload registry, and the operator
//! handlers themselves.
//!
//! The shape of execution:
//!
//! - [`ScriptRuntime`] owns the root [`ContextFrame`] and the
//!   [`OpRegistry`], and is the only type the driver talks to.
//! - The evaluator walks a symbol stream on a frame; every operator symbol
//!   goes through registry dispatch, which peeks the stack top-down to
//!   select an overload by operand classes.
//! - Handlers may recursively re-enter the evaluator on a child frame
//!   (blocks, map, invoke) or on the current frame (unpack, loops).
//!
//! Everything is single-threaded; values are `Rc`-shared, and mutable
//! arrays alias by reference exactly as scripts observe them.

pub mod context;
pub mod ops;
pub mod registry;
pub mod runtime;
pub mod value;

pub use context::{ContextFrame, CtxFlag, Namespace};
pub use registry::OpRegistry;
pub use runtime::ScriptRuntime;
pub use value::{Operand, Value};

pub use rilli_util::{ErrorKind, ScriptError, ScriptResult};
