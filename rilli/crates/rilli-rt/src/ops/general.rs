//! Stack manipulation, block execution, and assignment.
//!
//! The handlers here are the ones that drive the evaluator: `!` and `~`
//! re-enter the current frame, `%` and `|` run blocks in child frames and
//! hand the results back, and `:` consumes the next symbol from the
//! frame's active stream instead of touching the stack.

use std::rc::Rc;

use enumflags2::BitFlags;
use num_traits::{Signed, ToPrimitive};
use rilli_lex::Operator;
use rilli_par::{Sym, SymKind, SymSeq};
use rilli_util::{ScriptError, ScriptResult};

use crate::context::{ContextFrame, CtxFlag};
use crate::ops::{pop1, pop2, unsupported};
use crate::registry::OpRegistry;
use crate::value::Value;

pub(crate) fn register(registry: &mut OpRegistry) {
    use crate::value::Operand;

    registry.register_untyped(Operator::Inspect, 1, inspect);
    registry.register_untyped(Operator::Dup, 0, dup);
    registry.register_untyped(Operator::Drop, 1, drop_top);
    registry.register_untyped(Operator::Break, 0, break_stack);

    registry.register_typed(Operator::Eval, &[Operand::Exec], eval_block);
    registry.register_typed(Operator::Eval, &[Operand::String], eval_str);
    // `~` on a block is the same "unpack" notion as on sequences
    registry.register_typed(Operator::Invert, &[Operand::Exec], eval_block);

    registry.register_permute(Operator::Mul, &[Operand::Number, Operand::Exec], repeat_exec);
    registry.register_permute(Operator::Div, &[Operand::Exec, Operand::Array], map);
    registry.register_permute(Operator::Div, &[Operand::Exec, Operand::String], map);

    registry.register_untyped(Operator::Mod, 2, invoke);
    registry.register_untyped(Operator::BitOr, 2, compose);

    registry.register_typed(Operator::Add, &[Operand::Exec, Operand::Exec], concat_blocks);

    registry.register_untyped(Operator::Assign, 0, assign);
}

/// `` ` `` pushes the operand's source rendering as a string.
fn inspect(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let value = pop1(args);
    Ok(vec![Value::str(value.format())])
}

/// `..` duplicates the top of the stack, reading through to the parent
/// frame when the current stack is empty.
fn dup(ctx: &mut ContextFrame, _args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    if ctx.stack_size() > 0 {
        return Ok(vec![ctx.peek_stack()?]);
    }
    match ctx.parent_top() {
        Some(value) => Ok(vec![value]),
        None => Err(ScriptError::operand("not enough operands for '..'", "")),
    }
}

fn drop_top(_ctx: &mut ContextFrame, _args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    Ok(vec![])
}

/// `;` clears the current stack.
fn break_stack(ctx: &mut ContextFrame, _args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    ctx.clear_stack();
    Ok(vec![])
}

/// `!` on a block executes it in the current context.
fn eval_block(ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let syms = block_syms(pop1(args))?;
    ctx.exec(&syms)?;
    Ok(vec![])
}

/// `!` on a string parses it as source and executes the result in the
/// current context.
fn eval_str(ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let text = pop1(args);
    match &text {
        Value::Str(source) => {
            ctx.execs(source)?;
            Ok(vec![])
        }
        _ => Err(unsupported(&[text])),
    }
}

/// `n {block} *` executes the block n times in the current context.
fn repeat_exec(ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (n, block) = pop2(args);
    let count = match &n {
        Value::Int(n) if n.is_negative() => 0,
        Value::Int(n) => n
            .to_usize()
            .ok_or_else(|| ScriptError::operand("count too large", n.to_string()))?,
        _ => return Err(unsupported(&[n, block])),
    };
    let syms = block_syms(block)?;
    for _ in 0..count {
        ctx.exec(&syms)?;
    }
    Ok(vec![])
}

/// `arg {block} %` runs the block in a child context seeded with `arg`
/// and appends the child's results to the caller's stack.
fn invoke(ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (arg, block) = pop2(args);
    let syms = match &block {
        Value::Block(syms) => Rc::clone(syms),
        _ => return Err(unsupported(&[arg, block])),
    };
    let mut child = ctx.create_child(BitFlags::empty());
    child.push_stack(arg);
    child.exec(&syms)?;
    Ok(child.iter_stack_result())
}

/// `arg {block} |` is invoke with the results packed into a tuple.
fn compose(ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (arg, block) = pop2(args);
    let syms = match &block {
        Value::Block(syms) => Rc::clone(syms),
        _ => return Err(unsupported(&[arg, block])),
    };
    let mut child = ctx.create_child(BitFlags::empty());
    child.push_stack(arg);
    child.exec(&syms)?;
    Ok(vec![Value::tuple(child.iter_stack_result())])
}

/// `{block} seq /` maps the block over each element in its own child
/// context and collects every result into the coerced sequence type.
fn map(ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (block, seq) = pop2(args);
    let syms = block_syms(block)?;
    let keep_tuple = matches!(seq, Value::Tuple(_));

    let mut result = Vec::new();
    for item in crate::ops::seq_items(&seq) {
        let mut child = ctx.create_child(BitFlags::empty());
        child.push_stack(item);
        child.exec(&syms)?;
        result.extend(child.iter_stack_result());
    }

    Ok(vec![if keep_tuple {
        Value::tuple(result)
    } else {
        Value::array(result)
    }])
}

/// `+` concatenates two blocks into one.
fn concat_blocks(_ctx: &mut ContextFrame, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let (a, b) = pop2(args);
    match (&a, &b) {
        (Value::Block(x), Value::Block(y)) => {
            let joined: Vec<Sym> = x.iter().chain(y.iter()).cloned().collect();
            Ok(vec![Value::Block(Rc::from(joined))])
        }
        _ => Err(unsupported(&[a, b])),
    }
}

/// `:` consumes the next symbol from the active stream and binds the
/// top-of-stack value to it. The value stays on the stack.
fn assign(ctx: &mut ContextFrame, _args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    if ctx.stack_size() < 1 {
        return Err(ScriptError::operand("not enough operands for ':'", ""));
    }

    let sym = match ctx.next_symbol() {
        Some(sym) => sym,
        None => return Err(ScriptError::syntax("expected an assignment target after ':'")),
    };

    match &sym.kind {
        SymKind::Ident(name) => {
            let value = ctx.peek_stack()?;
            ctx.bind_name(name, value);
            Ok(vec![])
        }
        SymKind::Block(target) => {
            block_assign(ctx, target)?;
            Ok(vec![])
        }
        _ => Err(ScriptError::syntax("cannot assign to a non-identifier").at(sym.meta.pos())),
    }
}

/// Destructuring assignment through an assignment sub-context.
///
/// The target block is executed with [`CtxFlag::BlockAssignExpr`] set, so
/// identifiers and `$` leave pseudo-values on the sub-stack. Those targets
/// are then bound against the top-of-stack value.
fn block_assign(ctx: &mut ContextFrame, target: &SymSeq) -> ScriptResult<()> {
    let mut sub = ctx.create_child(CtxFlag::BlockAssignExpr.into());
    sub.exec(target)?;
    let targets = sub.iter_stack_result();

    if !targets.iter().all(Value::is_target) {
        return Err(ScriptError::assignment("cannot assign to a non-identifier"));
    }

    let value = ctx.peek_stack()?;
    match targets.len() {
        0 => Ok(()),
        1 => bind_target(ctx, &targets[0], value),
        expected => {
            let items = match value.seq_items() {
                Some(items) => items,
                None => {
                    return Err(ScriptError::assignment(format!(
                        "value '{}' does not support multiple assignment",
                        value.format()
                    )))
                }
            };
            if items.len() != expected {
                let reason = if items.len() < expected {
                    "not enough"
                } else {
                    "too many"
                };
                return Err(ScriptError::assignment(format!(
                    "{reason} values to unpack (expected {expected}, got {})",
                    items.len()
                )));
            }
            for (target, item) in targets.iter().zip(items) {
                bind_target(ctx, target, item)?;
            }
            Ok(())
        }
    }
}

fn bind_target(ctx: &mut ContextFrame, target: &Value, value: Value) -> ScriptResult<()> {
    match target {
        Value::Name(name) => {
            name.bind(ctx.namespace(), value);
            Ok(())
        }
        Value::Index(slot) => slot.bind(value),
        _ => unreachable!("targets are checked before binding"),
    }
}

fn block_syms(value: Value) -> ScriptResult<SymSeq> {
    match &value {
        Value::Block(syms) => Ok(Rc::clone(syms)),
        _ => Err(unsupported(&[value])),
    }
}
