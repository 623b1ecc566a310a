//! Numeric and bitwise operator handlers.
//!
//! All arithmetic is total over `Number` pairs except division and modulo
//! by zero. Modulo and the bitwise family require integers; floats mixed
//! into a pair promote the result to float.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{FromPrimitive, One, Pow, Signed, ToPrimitive, Zero};
use rilli_lex::Operator;
use rilli_util::{ScriptError, ScriptResult};

use crate::context::ContextFrame;
use crate::ops::coerce::{as_f64, coerce_number, NumPair};
use crate::ops::{pop1, pop2, unsupported};
use crate::registry::OpRegistry;
use crate::value::{format_values, Operand, Value};

/// Float equality tolerance for `=` and `~=`.
const FLOAT_EQ_EPSILON: f64 = 1e-9;

pub(crate) fn register(registry: &mut OpRegistry) {
    use Operand::Number;

    registry.register_typed(Operator::Add, &[Number, Number], add);
    registry.register_typed(Operator::Sub, &[Number, Number], sub);
    registry.register_typed(Operator::Mul, &[Number, Number], mul);
    registry.register_typed(Operator::Div, &[Number, Number], div);
    registry.register_typed(Operator::Pow, &[Number, Number], pow);
    registry.register_typed(Operator::Mod, &[Number, Number], modulo);

    registry.register_typed(Operator::Equal, &[Number, Number], numeric_eq);
    registry.register_typed(Operator::NotEqual, &[Number, Number], numeric_ne);
    registry.register_typed(Operator::Lt, &[Number, Number], lt);
    registry.register_typed(Operator::Le, &[Number, Number], le);
    registry.register_typed(Operator::Gt, &[Number, Number], gt);
    registry.register_typed(Operator::Ge, &[Number, Number], ge);

    registry.register_typed(Operator::Invert, &[Number], invert);
    registry.register_typed(Operator::BitAnd, &[Number, Number], bitand);
    registry.register_typed(Operator::BitOr, &[Number, Number], bitor);
    registry.register_typed(Operator::BitXor, &[Number, Number], bitxor);
    registry.register_typed(Operator::RShift, &[Number, Number], rshift);
}

fn add(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    Ok(vec![match coerce_number(&a, &b)? {
        NumPair::Int(x, y) => Value::Int(x + y),
        NumPair::Float(x, y) => Value::Float(x + y),
    }])
}

fn sub(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    Ok(vec![match coerce_number(&a, &b)? {
        NumPair::Int(x, y) => Value::Int(x - y),
        NumPair::Float(x, y) => Value::Float(x - y),
    }])
}

fn mul(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    Ok(vec![match coerce_number(&a, &b)? {
        NumPair::Int(x, y) => Value::Int(x * y),
        NumPair::Float(x, y) => Value::Float(x * y),
    }])
}

/// Integer division truncates toward zero; any float operand promotes to
/// float division.
fn div(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    Ok(vec![match coerce_number(&a, &b)? {
        NumPair::Int(x, y) => {
            if y.is_zero() {
                return Err(division_by_zero(&a, &b));
            }
            Value::Int(x / y)
        }
        NumPair::Float(x, y) => {
            if y == 0.0 {
                return Err(division_by_zero(&a, &b));
            }
            Value::Float(x / y)
        }
    }])
}

fn pow(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    Ok(vec![match coerce_number(&a, &b)? {
        NumPair::Int(x, y) => {
            if y.is_negative() {
                if x.is_zero() {
                    return Err(division_by_zero(&a, &b));
                }
                // compute through f64 and truncate back, keeping the
                // integer result domain
                let f = as_f64(&a)?.powf(as_f64(&b)?);
                match BigInt::from_f64(f.trunc()) {
                    Some(n) => Value::Int(n),
                    None => return Err(unsupported(&[a, b])),
                }
            } else {
                let exp = y
                    .to_u32()
                    .ok_or_else(|| ScriptError::operand("exponent too large", b.format()))?;
                Value::Int(Pow::pow(&x, exp))
            }
        }
        NumPair::Float(x, y) => Value::Float(x.powf(y)),
    }])
}

/// Floor modulo over integers only.
fn modulo(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => {
            if y.is_zero() {
                return Err(division_by_zero(&a, &b));
            }
            Ok(vec![Value::Int(x.mod_floor(y))])
        }
        _ => Err(unsupported(&[a, b])),
    }
}

fn division_by_zero(a: &Value, b: &Value) -> ScriptError {
    ScriptError::operand(
        "division by zero",
        format_values(&[a.clone(), b.clone()], ", "),
    )
}

/// `=`/`~=` on numbers: exact over int pairs, within epsilon otherwise.
fn test_numeric_equality(a: &Value, b: &Value) -> ScriptResult<bool> {
    Ok(match coerce_number(a, b)? {
        NumPair::Int(x, y) => x == y,
        NumPair::Float(x, y) => (x - y).abs() < FLOAT_EQ_EPSILON,
    })
}

fn numeric_eq(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    Ok(vec![Value::Bool(test_numeric_equality(&a, &b)?)])
}

fn numeric_ne(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    Ok(vec![Value::Bool(!test_numeric_equality(&a, &b)?)])
}

fn compare(a: &Value, b: &Value) -> ScriptResult<Option<Ordering>> {
    Ok(match coerce_number(a, b)? {
        NumPair::Int(x, y) => Some(x.cmp(&y)),
        NumPair::Float(x, y) => x.partial_cmp(&y),
    })
}

fn lt(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    Ok(vec![Value::Bool(compare(&a, &b)? == Some(Ordering::Less))])
}

fn le(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    let ord = compare(&a, &b)?;
    Ok(vec![Value::Bool(matches!(
        ord,
        Some(Ordering::Less) | Some(Ordering::Equal)
    ))])
}

fn gt(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    Ok(vec![Value::Bool(
        compare(&a, &b)? == Some(Ordering::Greater),
    )])
}

fn ge(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    let ord = compare(&a, &b)?;
    Ok(vec![Value::Bool(matches!(
        ord,
        Some(Ordering::Greater) | Some(Ordering::Equal)
    ))])
}

/// Bitwise not over integers: `~n` is `-(n + 1)`.
fn invert(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let a = pop1(args);
    match &a {
        Value::Int(n) => Ok(vec![Value::Int(-(n + BigInt::one()))]),
        _ => Err(unsupported(&[a])),
    }
}

fn bitand(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => Ok(vec![Value::Int(x & y)]),
        _ => Err(unsupported(&[a, b])),
    }
}

fn bitor(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => Ok(vec![Value::Int(x | y)]),
        _ => Err(unsupported(&[a, b])),
    }
}

fn bitxor(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => Ok(vec![Value::Int(x ^ y)]),
        _ => Err(unsupported(&[a, b])),
    }
}

fn rshift(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => {
            if y.is_negative() {
                return Err(ScriptError::operand("negative shift count", b.format()));
            }
            let shift = y
                .to_usize()
                .ok_or_else(|| ScriptError::operand("shift count too large", b.format()))?;
            Ok(vec![Value::Int(x >> shift)])
        }
        _ => Err(unsupported(&[a, b])),
    }
}
