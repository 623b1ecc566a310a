//! Operator overload registry and dispatch.
//!
//! Every operator maps to a table of overloads keyed either by a *typed
//! signature* (operand classes, bottom-to-top) or by an *untyped arity*.
//! Dispatch peeks the stack one value at a time from the top, building the
//! candidate signature at each depth; the first typed match wins, then an
//! untyped handler of the same arity. Walking past the operator's maximum
//! registered arity is an operand error.
//!
//! Symmetric overloads (`3 {..} *` and `{..} 3 *`) are registered once via
//! [`OpRegistry::register_permute`], which enters the handler under every
//! permutation of the declared signature and stores the permutation so the
//! handler always receives its arguments in the declared order.

use rilli_lex::Operator;
use rilli_util::{ScriptError, ScriptResult};
use rustc_hash::FxHashMap;

use crate::context::ContextFrame;
use crate::value::{format_values, Operand, Value};

/// An operator handler.
///
/// Receives the execution context and the popped operands bottom-to-top;
/// returned values are pushed back in order. Handlers that drive the
/// context directly (loops, eval, break) return an empty vector.
pub type HandlerFn = fn(&mut ContextFrame, Vec<Value>) -> ScriptResult<Vec<Value>>;

/// One registered overload.
struct Overload {
    /// How many values to pop when invoked.
    arity: usize,
    func: HandlerFn,
    /// For permuted registrations: `canonical[k] = args[perm[k]]`.
    perm: Option<Vec<usize>>,
}

/// The overload table of a single operator.
#[derive(Default)]
struct OpTable {
    typed: FxHashMap<Vec<Operand>, Overload>,
    untyped: FxHashMap<usize, Overload>,
    /// Highest arity of any registered overload.
    max_arity: usize,
}

/// Registry mapping every operator to its overload table.
pub struct OpRegistry {
    ops: FxHashMap<Operator, OpTable>,
}

impl OpRegistry {
    /// An empty registry with no overloads.
    pub fn new() -> Self {
        Self {
            ops: FxHashMap::default(),
        }
    }

    /// The registry with the full built-in operator set.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::ops::register_all(&mut registry);
        registry
    }

    /// Register a handler for one typed signature.
    ///
    /// # Panics
    ///
    /// Panics if the signature is already registered for this operator;
    /// that is a mistake in the built-in tables, not a script error.
    pub fn register_typed(&mut self, op: Operator, signature: &[Operand], func: HandlerFn) {
        self.insert_typed(
            op,
            signature.to_vec(),
            Overload {
                arity: signature.len(),
                func,
                perm: None,
            },
        );
    }

    /// Register a handler taking the top `arity` values of any type.
    pub fn register_untyped(&mut self, op: Operator, arity: usize, func: HandlerFn) {
        let table = self.ops.entry(op).or_default();
        if table.untyped.insert(arity, Overload { arity, func, perm: None }).is_some() {
            panic!("arity {arity} is already registered for '{op}'");
        }
        table.max_arity = table.max_arity.max(arity);
    }

    /// Register a handler for every permutation of `signature`, restoring
    /// the declared argument order at call time.
    pub fn register_permute(&mut self, op: Operator, signature: &[Operand], func: HandlerFn) {
        for perm in permutations(signature.len()) {
            let sig: Vec<Operand> = perm.iter().map(|&i| signature[i]).collect();
            self.insert_typed(
                op,
                sig,
                Overload {
                    arity: signature.len(),
                    func,
                    perm: Some(perm),
                },
            );
        }
    }

    fn insert_typed(&mut self, op: Operator, signature: Vec<Operand>, overload: Overload) {
        let table = self.ops.entry(op).or_default();
        table.max_arity = table.max_arity.max(overload.arity);
        if table.typed.insert(signature.clone(), overload).is_some() {
            panic!("signature {signature:?} is already registered for '{op}'");
        }
    }

    /// Dispatch `op` against the context's stack and invoke the matching
    /// overload.
    pub fn apply(&self, ctx: &mut ContextFrame, op: Operator) -> ScriptResult<()> {
        let overload = self.search(ctx, op)?;

        let mut args = Vec::with_capacity(overload.arity);
        for _ in 0..overload.arity {
            args.push(ctx.pop_stack()?);
        }
        args.reverse(); // bottom-to-top

        let args = match &overload.perm {
            Some(perm) => reorder(args, perm),
            None => args,
        };

        for value in (overload.func)(ctx, args)? {
            ctx.push_stack(value);
        }
        Ok(())
    }

    /// Select the overload for `op` given the current stack.
    fn search(&self, ctx: &ContextFrame, op: Operator) -> ScriptResult<&Overload> {
        let table = self
            .ops
            .get(&op)
            .ok_or_else(|| ScriptError::operand(format!("invalid operands for '{op}'"), ""))?;

        // a 0-ary overload matches without looking at the stack
        if let Some(overload) = table.untyped.get(&0) {
            return Ok(overload);
        }

        let mut peeked: Vec<Value> = Vec::new(); // top-down
        loop {
            match ctx.peek_at(peeked.len()) {
                Some(value) => peeked.push(value),
                None => {
                    return Err(ScriptError::operand(
                        format!("not enough operands for '{op}'"),
                        format_values(&peeked, ", "),
                    ))
                }
            }

            let nargs = peeked.len();
            let signature: Vec<Operand> = peeked.iter().rev().map(Value::optype).collect();

            if let Some(overload) = table.typed.get(&signature) {
                return Ok(overload);
            }
            if let Some(overload) = table.untyped.get(&nargs) {
                return Ok(overload);
            }

            if nargs >= table.max_arity {
                return Err(ScriptError::operand(
                    format!("invalid operands for '{op}'"),
                    format_values(&peeked, ", "),
                ));
            }
        }
    }
}

impl Default for OpRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Reorder popped arguments into a permuted overload's declared order.
fn reorder(args: Vec<Value>, perm: &[usize]) -> Vec<Value> {
    let mut slots: Vec<Option<Value>> = args.into_iter().map(Some).collect();
    perm.iter()
        .map(|&i| slots[i].take().expect("valid permutation"))
        .collect()
}

/// All permutations of `0..n`, identity first.
fn permutations(n: usize) -> Vec<Vec<usize>> {
    fn fill(n: usize, current: &mut Vec<usize>, used: &mut [bool], out: &mut Vec<Vec<usize>>) {
        if current.len() == n {
            out.push(current.clone());
            return;
        }
        for i in 0..n {
            if !used[i] {
                used[i] = true;
                current.push(i);
                fill(n, current, used, out);
                current.pop();
                used[i] = false;
            }
        }
    }

    let mut out = Vec::new();
    fill(n, &mut Vec::new(), &mut vec![false; n], &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn tag_typed(_ctx: &mut ContextFrame, _args: Vec<Value>) -> ScriptResult<Vec<Value>> {
        Ok(vec![Value::str("typed")])
    }

    fn tag_untyped(_ctx: &mut ContextFrame, _args: Vec<Value>) -> ScriptResult<Vec<Value>> {
        Ok(vec![Value::str("untyped")])
    }

    fn first_arg(_ctx: &mut ContextFrame, mut args: Vec<Value>) -> ScriptResult<Vec<Value>> {
        Ok(vec![args.remove(0)])
    }

    fn frame_with(registry: &Rc<OpRegistry>) -> ContextFrame {
        ContextFrame::root(Rc::clone(registry))
    }

    #[test]
    fn test_typed_beats_untyped() {
        let mut registry = OpRegistry::new();
        registry.register_typed(
            Operator::Add,
            &[Operand::Number, Operand::Number],
            tag_typed,
        );
        registry.register_untyped(Operator::Add, 2, tag_untyped);
        let registry = Rc::new(registry);

        let mut ctx = frame_with(&registry);
        ctx.push_stack(Value::int(1));
        ctx.push_stack(Value::int(2));
        registry.apply(&mut ctx, Operator::Add).unwrap();
        assert_eq!(ctx.peek_stack().unwrap(), Value::str("typed"));

        let mut ctx = frame_with(&registry);
        ctx.push_stack(Value::str("a"));
        ctx.push_stack(Value::int(2));
        registry.apply(&mut ctx, Operator::Add).unwrap();
        assert_eq!(ctx.peek_stack().unwrap(), Value::str("untyped"));
    }

    #[test]
    fn test_shorter_signature_matches_first() {
        let mut registry = OpRegistry::new();
        registry.register_typed(Operator::Invert, &[Operand::Number], tag_typed);
        registry.register_untyped(Operator::Invert, 2, tag_untyped);
        let registry = Rc::new(registry);

        // top is a Number, so the 1-ary typed overload wins over the
        // 2-ary untyped one even with two values available
        let mut ctx = frame_with(&registry);
        ctx.push_stack(Value::str("below"));
        ctx.push_stack(Value::int(1));
        registry.apply(&mut ctx, Operator::Invert).unwrap();
        assert_eq!(ctx.stack_size(), 2);
        assert_eq!(ctx.peek_stack().unwrap(), Value::str("typed"));
    }

    #[test]
    fn test_not_enough_operands() {
        let mut registry = OpRegistry::new();
        registry.register_typed(
            Operator::Add,
            &[Operand::Number, Operand::Number],
            tag_typed,
        );
        let registry = Rc::new(registry);

        let mut ctx = frame_with(&registry);
        ctx.push_stack(Value::int(1));
        let err = registry.apply(&mut ctx, Operator::Add).unwrap_err();
        assert!(err.to_string().contains("not enough operands for '+'"));
        // dispatch failed, nothing was popped
        assert_eq!(ctx.stack_size(), 1);
    }

    #[test]
    fn test_invalid_operands_reports_values() {
        let mut registry = OpRegistry::new();
        registry.register_typed(
            Operator::Add,
            &[Operand::Number, Operand::Number],
            tag_typed,
        );
        let registry = Rc::new(registry);

        let mut ctx = frame_with(&registry);
        ctx.push_stack(Value::int(1));
        ctx.push_stack(Value::str("x"));
        let err = registry.apply(&mut ctx, Operator::Add).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("invalid operands for '+'"));
        assert!(message.contains("'x'"));
    }

    #[test]
    fn test_permute_restores_declared_order() {
        let mut registry = OpRegistry::new();
        registry.register_permute(
            Operator::Mul,
            &[Operand::Number, Operand::String],
            first_arg,
        );
        let registry = Rc::new(registry);

        // declared order is (Number, String); the handler returns its
        // first argument, which must be the number either way round
        let mut ctx = frame_with(&registry);
        ctx.push_stack(Value::int(3));
        ctx.push_stack(Value::str("ab"));
        registry.apply(&mut ctx, Operator::Mul).unwrap();
        assert_eq!(ctx.peek_stack().unwrap(), Value::int(3));

        let mut ctx = frame_with(&registry);
        ctx.push_stack(Value::str("ab"));
        ctx.push_stack(Value::int(3));
        registry.apply(&mut ctx, Operator::Mul).unwrap();
        assert_eq!(ctx.peek_stack().unwrap(), Value::int(3));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_signature_panics() {
        let mut registry = OpRegistry::new();
        registry.register_typed(Operator::Add, &[Operand::Number], tag_typed);
        registry.register_typed(Operator::Add, &[Operand::Number], tag_untyped);
    }

    #[test]
    fn test_permutations_cover_all_orders() {
        assert_eq!(permutations(1), vec![vec![0]]);
        assert_eq!(permutations(2), vec![vec![0, 1], vec![1, 0]]);
        assert_eq!(permutations(3).len(), 6);
    }
}
