//! The Rill value model.
//!
//! Values are cheap to clone: primitives copy, everything else is an `Rc`
//! handle. The one deliberately *shared* mutable type is [`Value::Array`];
//! binding an array to two names aliases the same storage, and scripts can
//! observe mutation through either name. Tuples, strings and blocks are
//! immutable and compare by content; arrays compare by identity.
//!
//! Pseudo-values ([`Value::Name`], [`Value::Index`]) exist only while an
//! assignment target block is being evaluated. No ordinary operator accepts
//! them, so they can never survive onto a normal stack.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use rilli_par::{format_float, format_symbols, quote_str, SymSeq};
use rilli_util::{ScriptError, ScriptResult};

use crate::context::Namespace;

/// Operand class tags used to resolve operator overloading.
///
/// The mapping is coarser than the value variants: both integer and float
/// are `Number`, both array and tuple are `Array`, and blocks are `Exec`.
/// `Name` marks assignment-target pseudo-values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    Bool,
    Number,
    String,
    Array,
    Exec,
    Name,
}

/// Shared mutable array storage.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// A runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    /// Arbitrary-precision signed integer
    Int(BigInt),
    Float(f64),
    Str(Rc<str>),
    /// Immutable ordered sequence
    Tuple(Rc<Vec<Value>>),
    /// Mutable ordered sequence, shared by reference
    Array(ArrayRef),
    /// Captured parse output, executable later
    Block(SymSeq),
    /// Assignment target: a name in a namespace
    Name(NameTarget),
    /// Assignment target: an array slot
    Index(IndexTarget),
}

impl Value {
    /// Construct an array value from its elements.
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// Construct a tuple value from its elements.
    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(Rc::new(items))
    }

    /// Construct a string value.
    pub fn str(text: impl Into<Rc<str>>) -> Value {
        Value::Str(text.into())
    }

    /// Construct an integer value.
    pub fn int(n: impl Into<BigInt>) -> Value {
        Value::Int(n.into())
    }

    /// The operand class used by dispatch.
    pub fn optype(&self) -> Operand {
        match self {
            Value::Bool(_) => Operand::Bool,
            Value::Int(_) | Value::Float(_) => Operand::Number,
            Value::Str(_) => Operand::String,
            Value::Tuple(_) | Value::Array(_) => Operand::Array,
            Value::Block(_) => Operand::Exec,
            Value::Name(_) | Value::Index(_) => Operand::Name,
        }
    }

    /// The user-facing type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Tuple(_) => "tuple",
            Value::Array(_) => "array",
            Value::Block(_) => "block",
            Value::Name(_) => "_name",
            Value::Index(_) => "_index",
        }
    }

    /// Script truthiness: `false`, zero, and empty sequences are false.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(n) => !n.is_zero(),
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Tuple(t) => !t.is_empty(),
            Value::Array(a) => !a.borrow().is_empty(),
            Value::Block(_) | Value::Name(_) | Value::Index(_) => true,
        }
    }

    /// Format the value as script source that evaluates back to it.
    pub fn format(&self) -> String {
        match self {
            Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => quote_str(s),
            Value::Tuple(t) => format!("({})", format_values(t, " ")),
            Value::Array(a) => format!("[{}]", format_values(&a.borrow(), " ")),
            Value::Block(syms) => format!("{{{}}}", format_symbols(syms)),
            Value::Name(target) => target.name.to_string(),
            Value::Index(target) => {
                format!("{} {} $", Value::Array(target.array.clone()).format(), target.index)
            }
        }
    }

    /// The element count of a sequence value, `None` for non-sequences.
    pub fn seq_len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::Tuple(t) => Some(t.len()),
            Value::Array(a) => Some(a.borrow().len()),
            _ => None,
        }
    }

    /// The elements of a sequence value in order; strings yield their
    /// characters as single-character strings.
    pub fn seq_items(&self) -> Option<Vec<Value>> {
        match self {
            Value::Str(s) => Some(
                s.chars()
                    .map(|c| Value::Str(Rc::from(c.to_string().as_str())))
                    .collect(),
            ),
            Value::Tuple(t) => Some(t.as_ref().clone()),
            Value::Array(a) => Some(a.borrow().clone()),
            _ => None,
        }
    }

    /// Whether this value is an assignment-target pseudo-value.
    pub fn is_target(&self) -> bool {
        matches!(self, Value::Name(_) | Value::Index(_))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                a.to_f64().map_or(false, |a| a == *b)
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a.as_slice() == b.as_slice(),
            // arrays are equal only when they are the same array
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Block(a), Value::Block(b)) => a == b,
            (Value::Name(a), Value::Name(b)) => {
                Rc::ptr_eq(&a.scope, &b.scope) && a.name == b.name
            }
            (Value::Index(a), Value::Index(b)) => {
                Rc::ptr_eq(&a.array, &b.array) && a.index == b.index
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Join formatted values with a separator (stack echoes, error payloads).
pub fn format_values(values: &[Value], sep: &str) -> String {
    values
        .iter()
        .map(Value::format)
        .collect::<Vec<_>>()
        .join(sep)
}

/// Resolve a 1-based, possibly negative script index against a sequence of
/// `len` elements. Index 0 and out-of-bounds indices are Index errors.
pub fn resolve_index(index: &BigInt, len: usize) -> ScriptResult<usize> {
    if index.is_zero() {
        return Err(ScriptError::index("0 is not a valid index"));
    }
    let offset = if index.is_negative() {
        let back = (-index).to_usize().unwrap_or(usize::MAX);
        len.checked_sub(back)
    } else {
        let fwd = index.to_usize().unwrap_or(usize::MAX);
        if fwd <= len {
            Some(fwd - 1)
        } else {
            None
        }
    };
    offset.ok_or_else(|| ScriptError::index("index out of range"))
}

/// An assignment target naming a binding in a namespace.
///
/// Produced by identifier evaluation inside an assignment sub-context;
/// `scope` is the namespace the identifier was evaluated in, which is what
/// `resolve` reads through.
#[derive(Clone, Debug)]
pub struct NameTarget {
    pub scope: Rc<RefCell<Namespace>>,
    pub name: Rc<str>,
}

impl NameTarget {
    pub fn new(scope: Rc<RefCell<Namespace>>, name: Rc<str>) -> Self {
        Self { scope, name }
    }

    /// Read the current value of the target through the namespace chain.
    pub fn resolve(&self) -> ScriptResult<Value> {
        self.scope
            .borrow()
            .lookup(&self.name)
            .ok_or_else(|| ScriptError::name(self.name.as_ref()))
    }

    /// Bind `value` to the name in the given namespace.
    pub fn bind(&self, ns: &Rc<RefCell<Namespace>>, value: Value) {
        ns.borrow_mut().bind(self.name.as_ref(), value);
    }
}

/// An assignment target addressing a single array slot.
///
/// The index is validated to be non-zero at creation; range checking
/// happens at bind/resolve time, and binding at `len + 1` appends.
#[derive(Clone, Debug)]
pub struct IndexTarget {
    pub array: ArrayRef,
    pub index: BigInt,
}

impl IndexTarget {
    pub fn new(array: ArrayRef, index: BigInt) -> ScriptResult<Self> {
        if index.is_zero() {
            return Err(ScriptError::index("0 is not a valid index"));
        }
        Ok(Self { array, index })
    }

    /// Read the current value of the slot.
    pub fn resolve(&self) -> ScriptResult<Value> {
        let items = self.array.borrow();
        let offset = resolve_index(&self.index, items.len())?;
        Ok(items[offset].clone())
    }

    /// Write `value` into the slot; index `len + 1` appends.
    pub fn bind(&self, value: Value) -> ScriptResult<()> {
        let mut items = self.array.borrow_mut();
        let len = items.len();
        if !self.index.is_negative() && self.index.to_usize() == Some(len + 1) {
            items.push(value);
            return Ok(());
        }
        let offset = resolve_index(&self.index, len)?;
        items[offset] = value;
        Ok(())
    }
}
