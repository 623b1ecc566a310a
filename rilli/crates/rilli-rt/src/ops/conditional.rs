//! Logical operators, general equality, and control flow.
//!
//! `and`, `or`, `if` and `while` accept blocks as lazy expressions: a
//! block operand is evaluated in a namespace-sharing child frame and must
//! reduce to exactly one value. `if` branches and loop bodies run in the
//! *current* frame, so their side effects are visible.

use rilli_lex::Operator;
use rilli_par::SymSeq;
use rilli_util::{ScriptError, ScriptResult};

use crate::context::{ContextFrame, CtxFlag};
use crate::ops::{pop1, pop2, pop3, unsupported};
use crate::registry::OpRegistry;
use crate::value::Value;

pub(crate) fn register(registry: &mut OpRegistry) {
    use crate::value::Operand;

    registry.register_untyped(Operator::Equal, 2, equal);
    registry.register_untyped(Operator::NotEqual, 2, not_equal);
    registry.register_untyped(Operator::Not, 1, not);

    registry.register_typed(Operator::BitAnd, &[Operand::Bool, Operand::Bool], bool_and);
    registry.register_typed(Operator::BitOr, &[Operand::Bool, Operand::Bool], bool_or);
    registry.register_typed(Operator::BitXor, &[Operand::Bool, Operand::Bool], bool_xor);

    registry.register_untyped(Operator::And, 2, and);
    registry.register_untyped(Operator::Or, 2, or);
    registry.register_untyped(Operator::If, 3, if_op);
    registry.register_typed(Operator::While, &[Operand::Exec, Operand::Exec], while_op);
    registry.register_typed(Operator::Do, &[Operand::Exec], do_op);
}

/// `=` falls back to general value equality for non-numeric pairs.
fn equal(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    Ok(vec![Value::Bool(a == b)])
}

fn not_equal(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    Ok(vec![Value::Bool(a != b)])
}

fn not(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let value = pop1(args);
    Ok(vec![Value::Bool(!value.truthy())])
}

fn bool_and(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    match (&a, &b) {
        (Value::Bool(x), Value::Bool(y)) => Ok(vec![Value::Bool(*x & *y)]),
        _ => Err(unsupported(&[a, b])),
    }
}

fn bool_or(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    match (&a, &b) {
        (Value::Bool(x), Value::Bool(y)) => Ok(vec![Value::Bool(*x | *y)]),
        _ => Err(unsupported(&[a, b])),
    }
}

fn bool_xor(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    match (&a, &b) {
        (Value::Bool(x), Value::Bool(y)) => Ok(vec![Value::Bool(*x ^ *y)]),
        _ => Err(unsupported(&[a, b])),
    }
}

/// Reduce a lazy operand: blocks run in a namespace-sharing child frame
/// and must leave exactly one value.
fn lazy_eval(ctx: &mut ContextFrame, value: Value, what: &str) -> ScriptResult<Value> {
    if let Value::Block(syms) = &value {
        let mut sub = ctx.create_child(CtxFlag::ShareNamespace.into());
        sub.exec(syms)?;
        if sub.stack_size() != 1 {
            return Err(ScriptError::operand(
                format!("{what} did not evaluate to a single value"),
                value.format(),
            ));
        }
        return sub.peek_stack();
    }
    Ok(value)
}

/// Short-circuiting `and`: pushes the first falsy operand, else the second.
fn and(ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    let a = lazy_eval(ctx, a, "left expression")?;
    if !a.truthy() {
        return Ok(vec![a]);
    }
    Ok(vec![lazy_eval(ctx, b, "right expression")?])
}

/// Short-circuiting `or`: pushes the first truthy operand, else the second.
fn or(ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    let a = lazy_eval(ctx, a, "left expression")?;
    if a.truthy() {
        return Ok(vec![a]);
    }
    Ok(vec![lazy_eval(ctx, b, "right expression")?])
}

/// Ternary `if`: a selected block branch executes in the current frame,
/// any other selected value is pushed.
fn if_op(ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (cond, if_true, if_false) = pop3(args);
    let cond = lazy_eval(ctx, cond, "conditional expression")?;

    let selected = if cond.truthy() { if_true } else { if_false };
    if let Value::Block(syms) = &selected {
        let syms = syms.clone();
        ctx.exec(&syms)?;
        return Ok(vec![]);
    }
    Ok(vec![selected])
}

/// `while`: re-evaluate the condition block before every body run.
fn while_op(ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (cond, body) = pop2(args);
    let body = block_syms(&body);
    loop {
        if !lazy_eval(ctx, cond.clone(), "conditional expression")?.truthy() {
            break;
        }
        ctx.exec(&body)?;
    }
    Ok(vec![])
}

/// `do`: execute the body, pop the top, repeat while it was truthy.
fn do_op(ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let body = block_syms(&pop1(args));
    loop {
        ctx.exec(&body)?;
        if !ctx.pop_stack()?.truthy() {
            break;
        }
    }
    Ok(vec![])
}

fn block_syms(value: &Value) -> SymSeq {
    match value {
        Value::Block(syms) => syms.clone(),
        _ => unreachable!("typed signature guarantees a block"),
    }
}
