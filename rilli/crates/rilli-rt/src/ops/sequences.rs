//! Sequence operator handlers: unpacking, indexing, concatenation,
//! repetition, difference, and the setwise family.
//!
//! Result types follow the coercion rule (Array dominates Tuple). Set
//! membership is value equality, so arrays participate by identity.

use std::rc::Rc;

use num_traits::{Signed, ToPrimitive};
use rilli_lex::Operator;
use rilli_util::{ScriptError, ScriptResult};

use crate::context::ContextFrame;
use crate::ops::coerce::{coerce_seq, SeqKind};
use crate::ops::{pop1, pop2, seq_items, unsupported};
use crate::registry::OpRegistry;
use crate::value::{resolve_index, IndexTarget, Value};

pub(crate) fn register(registry: &mut OpRegistry) {
    use crate::value::Operand;

    registry.register_typed(Operator::Invert, &[Operand::Array], unpack);
    registry.register_typed(Operator::Invert, &[Operand::String], unpack);

    registry.register_typed(Operator::Collect, &[Operand::Number], collect);

    registry.register_typed(Operator::Index, &[Operand::Array, Operand::Number], index);
    registry.register_typed(Operator::Index, &[Operand::String, Operand::Number], index);
    // assignment-target forms: operands may arrive as pseudo-values
    registry.register_typed(Operator::Index, &[Operand::Name, Operand::Number], index);
    registry.register_typed(Operator::Index, &[Operand::Array, Operand::Name], index);
    registry.register_typed(Operator::Index, &[Operand::Name, Operand::Name], index);

    registry.register_typed(Operator::Size, &[Operand::Array], size);
    registry.register_typed(Operator::Size, &[Operand::String], size);

    registry.register_typed(Operator::Add, &[Operand::Array, Operand::Array], concat);
    registry.register_typed(Operator::Add, &[Operand::String, Operand::String], concat_str);
    registry.register_untyped(Operator::Add, 2, append);

    registry.register_typed(Operator::Sub, &[Operand::Array, Operand::Array], diff);

    registry.register_permute(Operator::Mul, &[Operand::Number, Operand::Array], repeat_seq);
    registry.register_permute(Operator::Mul, &[Operand::Number, Operand::String], repeat_str);

    registry.register_typed(Operator::BitOr, &[Operand::Array, Operand::Array], union);
    registry.register_typed(Operator::BitAnd, &[Operand::Array, Operand::Array], intersection);
    registry.register_typed(Operator::BitXor, &[Operand::Array, Operand::Array], symmetric_diff);
}

/// `~` pushes each element of the sequence in order.
fn unpack(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let seq = pop1(args);
    Ok(seq_items(&seq))
}

/// `<<` pops n further values and packs them into a tuple in original
/// stack order.
fn collect(ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let n = pop1(args);
    let count = match &n {
        Value::Int(n) if n.is_negative() => 0,
        Value::Int(n) => n
            .to_usize()
            .ok_or_else(|| ScriptError::operand("count too large", n.to_string()))?,
        _ => return Err(unsupported(&[n])),
    };

    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(ctx.pop_stack()?);
    }
    items.reverse();
    Ok(vec![Value::tuple(items)])
}

/// `$` replaces a sequence and 1-based index with the addressed element.
///
/// Inside an assignment target this instead produces an index target for
/// a mutable array; resolving through pseudo-value operands is allowed
/// there so that `array n $` works when both names are bound.
fn index(ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (seq, idx) = pop2(args);

    let (seq, idx) = if seq.is_target() || idx.is_target() {
        if !ctx.in_assign_ctx() {
            return Err(unsupported(&[seq, idx]));
        }
        (resolve_operand(seq)?, resolve_operand(idx)?)
    } else {
        (seq, idx)
    };

    let number = match &idx {
        Value::Int(n) => n.clone(),
        _ => return Err(unsupported(&[seq, idx])),
    };

    if ctx.in_assign_ctx() {
        if let Value::Array(array) = &seq {
            let target = IndexTarget::new(Rc::clone(array), number)?;
            return Ok(vec![Value::Index(target)]);
        }
    }

    match &seq {
        Value::Array(items) => {
            let items = items.borrow();
            let offset = resolve_index(&number, items.len())?;
            Ok(vec![items[offset].clone()])
        }
        Value::Tuple(items) => {
            let offset = resolve_index(&number, items.len())?;
            Ok(vec![items[offset].clone()])
        }
        Value::Str(text) => {
            let chars: Vec<char> = text.chars().collect();
            let offset = resolve_index(&number, chars.len())?;
            Ok(vec![Value::str(chars[offset].to_string())])
        }
        _ => Err(unsupported(&[seq, idx])),
    }
}

/// Read an assignment pseudo-value through to its current value.
fn resolve_operand(value: Value) -> ScriptResult<Value> {
    match value {
        Value::Name(target) => target.resolve(),
        Value::Index(target) => target.resolve(),
        other => Ok(other),
    }
}

fn size(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let seq = pop1(args);
    match seq.seq_len() {
        Some(len) => Ok(vec![Value::int(len)]),
        None => Err(unsupported(&[seq])),
    }
}

/// `+` over two sequences builds a new sequence of the coerced type.
fn concat(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    let kind = coerce_seq(&a, &b);
    let mut items = seq_items(&a);
    items.extend(seq_items(&b));
    Ok(vec![kind.build(items)])
}

fn concat_str(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    match (&a, &b) {
        (Value::Str(x), Value::Str(y)) => Ok(vec![Value::str(format!("{x}{y}"))]),
        _ => Err(unsupported(&[a, b])),
    }
}

/// `+` with exactly one sequence operand appends the scalar at the end,
/// whichever side it is on.
fn append(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    let (seq, scalar) = match (&a, &b) {
        (Value::Array(_) | Value::Tuple(_), _) => (a, b),
        (_, Value::Array(_) | Value::Tuple(_)) => (b, a),
        _ => return Err(unsupported(&[a, b])),
    };
    let kind = SeqKind::of(&seq);
    let mut items = seq_items(&seq);
    items.push(scalar);
    Ok(vec![kind.build(items)])
}

/// `-` removes the right sequence's elements from the left. Tuples yield
/// a filtered copy; arrays are mutated in place and returned.
fn diff(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    let remove = seq_items(&b);
    match &a {
        Value::Tuple(items) => {
            let kept = items
                .iter()
                .filter(|item| !remove.contains(item))
                .cloned()
                .collect();
            Ok(vec![Value::tuple(kept)])
        }
        Value::Array(cell) => {
            {
                let mut items = cell.borrow_mut();
                for item in &remove {
                    if let Some(pos) = items.iter().position(|x| x == item) {
                        items.remove(pos);
                    }
                }
            }
            Ok(vec![a.clone()])
        }
        _ => Err(unsupported(&[a, b])),
    }
}

/// `*` repeats a whole sequence, keeping its type.
fn repeat_seq(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (n, seq) = pop2(args);
    let count = repeat_count(&n)?;
    let items = seq_items(&seq);
    let mut result = Vec::with_capacity(items.len() * count);
    for _ in 0..count {
        result.extend(items.iter().cloned());
    }
    Ok(vec![SeqKind::of(&seq).build(result)])
}

fn repeat_str(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (n, text) = pop2(args);
    let count = repeat_count(&n)?;
    match &text {
        Value::Str(s) => Ok(vec![Value::str(s.repeat(count))]),
        _ => Err(unsupported(&[n, text])),
    }
}

/// A repetition count: negative counts mean zero repetitions.
fn repeat_count(n: &Value) -> ScriptResult<usize> {
    match n {
        Value::Int(n) if n.is_negative() => Ok(0),
        Value::Int(n) => n
            .to_usize()
            .ok_or_else(|| ScriptError::operand("count too large", n.to_string())),
        _ => Err(unsupported(std::slice::from_ref(n))),
    }
}

/// `|` setwise union, first-seen order.
fn union(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    let mut result: Vec<Value> = Vec::new();
    for item in seq_items(&a).into_iter().chain(seq_items(&b)) {
        if !result.contains(&item) {
            result.push(item);
        }
    }
    Ok(vec![coerce_seq(&a, &b).build(result)])
}

/// `&` setwise intersection.
fn intersection(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    let right = seq_items(&b);
    let mut result: Vec<Value> = Vec::new();
    for item in seq_items(&a) {
        if right.contains(&item) && !result.contains(&item) {
            result.push(item);
        }
    }
    Ok(vec![coerce_seq(&a, &b).build(result)])
}

/// `^` setwise symmetric difference.
fn symmetric_diff(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    let left = seq_items(&a);
    let right = seq_items(&b);
    let mut result: Vec<Value> = Vec::new();
    for item in &left {
        if !right.contains(item) && !result.contains(item) {
            result.push(item.clone());
        }
    }
    for item in &right {
        if !left.contains(item) && !result.contains(item) {
            result.push(item.clone());
        }
    }
    Ok(vec![coerce_seq(&a, &b).build(result)])
}
