//! Result-type coercion for mixed operand pairs.
//!
//! Number results: Float dominates Int. Sequence results: Array dominates
//! Tuple. Coercion is explicit at the handler level; there is no implicit
//! subtyping anywhere in the value model.

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use rilli_util::ScriptResult;

use crate::ops::unsupported;
use crate::value::Value;

/// A numeric operand pair lowered into its result domain.
pub enum NumPair {
    Int(BigInt, BigInt),
    Float(f64, f64),
}

/// Coerce two `Number` operands: any Float makes the pair Float.
pub fn coerce_number(a: &Value, b: &Value) -> ScriptResult<NumPair> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(NumPair::Int(x.clone(), y.clone())),
        _ => Ok(NumPair::Float(as_f64(a)?, as_f64(b)?)),
    }
}

/// A `Number` operand as a float.
pub fn as_f64(value: &Value) -> ScriptResult<f64> {
    match value {
        Value::Int(n) => Ok(n.to_f64().unwrap_or(f64::NAN)),
        Value::Float(f) => Ok(*f),
        other => Err(unsupported(std::slice::from_ref(other))),
    }
}

/// Which sequence type a result takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeqKind {
    Array,
    Tuple,
}

impl SeqKind {
    /// The sequence kind of a single `Array`-class operand.
    pub fn of(value: &Value) -> SeqKind {
        match value {
            Value::Array(_) => SeqKind::Array,
            _ => SeqKind::Tuple,
        }
    }

    /// Build a sequence value of this kind.
    pub fn build(self, items: Vec<Value>) -> Value {
        match self {
            SeqKind::Array => Value::array(items),
            SeqKind::Tuple => Value::tuple(items),
        }
    }
}

/// Coerce two `Array`-class operands: any Array makes the result an Array.
pub fn coerce_seq(a: &Value, b: &Value) -> SeqKind {
    if matches!(a, Value::Array(_)) || matches!(b, Value::Array(_)) {
        SeqKind::Array
    } else {
        SeqKind::Tuple
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_coercion_prefers_float() {
        assert!(matches!(
            coerce_number(&Value::int(1), &Value::int(2)).unwrap(),
            NumPair::Int(_, _)
        ));
        assert!(matches!(
            coerce_number(&Value::int(1), &Value::Float(2.0)).unwrap(),
            NumPair::Float(_, _)
        ));
        assert!(matches!(
            coerce_number(&Value::Float(1.0), &Value::Float(2.0)).unwrap(),
            NumPair::Float(_, _)
        ));
    }

    #[test]
    fn test_seq_coercion_prefers_array() {
        let array = Value::array(vec![]);
        let tuple = Value::tuple(vec![]);
        assert_eq!(coerce_seq(&array, &tuple), SeqKind::Array);
        assert_eq!(coerce_seq(&tuple, &array), SeqKind::Array);
        assert_eq!(coerce_seq(&tuple, &tuple), SeqKind::Tuple);
    }
}
