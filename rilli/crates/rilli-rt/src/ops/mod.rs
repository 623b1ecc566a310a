//! Built-in operator handlers, grouped by behaviour.
//!
//! Each submodule contributes one `register` function that enters its
//! handlers into the [`OpRegistry`]; [`register_all`] is called once when
//! the registry is built. A handler is a plain `fn` per (operator,
//! signature) combination, so the registry stays data-only.

pub mod arithmetic;
pub mod coerce;
pub mod conditional;
pub mod general;
pub mod sequences;

use rilli_util::ScriptError;

use crate::registry::OpRegistry;
use crate::value::{format_values, Value};

/// Install the full built-in operator set.
pub(crate) fn register_all(registry: &mut OpRegistry) {
    arithmetic::register(registry);
    sequences::register(registry);
    general::register(registry);
    conditional::register(registry);
}

/// Operand error for argument combinations a handler rejects.
pub(crate) fn unsupported(operands: &[Value]) -> ScriptError {
    ScriptError::operand("unsupported operand types", format_values(operands, ", "))
}

// Dispatch pops exactly the arity a handler was registered with, so these
// destructuring helpers cannot fail.

pub(crate) fn pop1(args: Vec<Value>) -> Value {
    let mut args = args.into_iter();
    match args.next() {
        Some(a) => a,
        None => unreachable!("dispatch pops the declared arity"),
    }
}

pub(crate) fn pop2(args: Vec<Value>) -> (Value, Value) {
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(a), Some(b)) => (a, b),
        _ => unreachable!("dispatch pops the declared arity"),
    }
}

pub(crate) fn pop3(args: Vec<Value>) -> (Value, Value, Value) {
    let mut args = args.into_iter();
    match (args.next(), args.next(), args.next()) {
        (Some(a), Some(b), Some(c)) => (a, b, c),
        _ => unreachable!("dispatch pops the declared arity"),
    }
}

/// The elements of a value whose operand class guarantees a sequence.
pub(crate) fn seq_items(value: &Value) -> Vec<Value> {
    match value.seq_items() {
        Some(items) => items,
        None => unreachable!("operand class guarantees a sequence"),
    }
}
