//! Execution contexts: the stack, the namespace chain, and the evaluator.
//!
//! A [`ContextFrame`] is the runtime unit a symbol stream executes on.
//! Frames form a tree at run time: operator handlers create children to
//! evaluate blocks in, and the child's flags decide how much it shares
//! with its parent (namespace, stack, assignment-target mode).
//!
//! The frame also owns the *symbol cursor* of the stream it is currently
//! executing. That cursor is what the assignment operator reads when it
//! consumes the symbol after `:`; it is saved and restored around nested
//! `exec` calls so the innermost active stream is always the one consumed.

use std::cell::RefCell;
use std::rc::Rc;

use enumflags2::{bitflags, BitFlags};
use indexmap::IndexMap;
use rilli_par::{Parser, Sym, SymKind, SymSeq};
use rilli_util::{ScriptError, ScriptResult};

use crate::registry::OpRegistry;
use crate::value::{NameTarget, Value};

/// Flags controlling what a child frame shares with its parent.
#[bitflags]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CtxFlag {
    /// The child uses the parent's namespace object; bindings made in the
    /// child are visible to the parent and vice versa.
    ShareNamespace,
    /// The child pushes and pops the parent's stack directly.
    ShareStack,
    /// The child evaluates an assignment target: identifiers and `$`
    /// produce pseudo-values instead of ordinary values.
    BlockAssignExpr,
}

/// One layer of the name-lookup chain.
///
/// Reads fall through to the parent; writes always land in this layer.
#[derive(Debug, Default)]
pub struct Namespace {
    vars: IndexMap<String, Value>,
    parent: Option<Rc<RefCell<Namespace>>>,
}

impl Namespace {
    /// The root namespace, with no parent.
    pub fn root() -> Self {
        Self::default()
    }

    /// A fresh layer reading through to `parent`.
    pub fn child_of(parent: Rc<RefCell<Namespace>>) -> Self {
        Self {
            vars: IndexMap::new(),
            parent: Some(parent),
        }
    }

    /// Resolve a name through the chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.vars.get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.borrow().lookup(name))
    }

    /// Bind a name in this layer.
    pub fn bind(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }
}

/// Cursor over the symbol stream a frame is currently executing.
struct SymCursor {
    syms: SymSeq,
    pos: usize,
}

/// An execution frame: stack + namespace + flags + symbol cursor.
pub struct ContextFrame {
    registry: Rc<OpRegistry>,
    stack: Rc<RefCell<Vec<Value>>>,
    namespace: Rc<RefCell<Namespace>>,
    parent_stack: Option<Rc<RefCell<Vec<Value>>>>,
    flags: BitFlags<CtxFlag>,
    cursor: Option<SymCursor>,
}

impl ContextFrame {
    /// Create a root frame holding the global namespace.
    pub fn root(registry: Rc<OpRegistry>) -> Self {
        Self {
            registry,
            stack: Rc::new(RefCell::new(Vec::new())),
            namespace: Rc::new(RefCell::new(Namespace::root())),
            parent_stack: None,
            flags: BitFlags::empty(),
            cursor: None,
        }
    }

    /// Create a child frame of this one.
    pub fn create_child(&self, flags: BitFlags<CtxFlag>) -> ContextFrame {
        let namespace = if flags.contains(CtxFlag::ShareNamespace) {
            Rc::clone(&self.namespace)
        } else {
            Rc::new(RefCell::new(Namespace::child_of(Rc::clone(&self.namespace))))
        };
        let stack = if flags.contains(CtxFlag::ShareStack) {
            Rc::clone(&self.stack)
        } else {
            Rc::new(RefCell::new(Vec::new()))
        };
        ContextFrame {
            registry: Rc::clone(&self.registry),
            stack,
            namespace,
            parent_stack: Some(Rc::clone(&self.stack)),
            flags,
            cursor: None,
        }
    }

    #[inline]
    pub fn flags(&self) -> BitFlags<CtxFlag> {
        self.flags
    }

    /// Whether this frame evaluates an assignment target.
    #[inline]
    pub fn in_assign_ctx(&self) -> bool {
        self.flags.contains(CtxFlag::BlockAssignExpr)
    }

    /// This frame's namespace handle.
    pub fn namespace(&self) -> &Rc<RefCell<Namespace>> {
        &self.namespace
    }

    pub fn lookup_name(&self, name: &str) -> Option<Value> {
        self.namespace.borrow().lookup(name)
    }

    pub fn bind_name(&mut self, name: &str, value: Value) {
        self.namespace.borrow_mut().bind(name, value);
    }

    // Stack operations

    pub fn push_stack(&mut self, value: Value) {
        self.stack.borrow_mut().push(value);
    }

    pub fn pop_stack(&mut self) -> ScriptResult<Value> {
        self.stack
            .borrow_mut()
            .pop()
            .ok_or_else(|| ScriptError::generic("stack is empty"))
    }

    /// The top value, cloned, without removing it.
    pub fn peek_stack(&self) -> ScriptResult<Value> {
        self.stack
            .borrow()
            .last()
            .cloned()
            .ok_or_else(|| ScriptError::generic("stack is empty"))
    }

    /// The value `depth` slots below the top, or `None` past the bottom.
    pub fn peek_at(&self, depth: usize) -> Option<Value> {
        let stack = self.stack.borrow();
        stack.len().checked_sub(depth + 1).map(|i| stack[i].clone())
    }

    /// Insert a value `depth` slots below the top.
    pub fn insert_stack(&mut self, depth: usize, value: Value) {
        let mut stack = self.stack.borrow_mut();
        let index = stack.len().saturating_sub(depth);
        stack.insert(index, value);
    }

    /// Remove and return the value `depth` slots below the top.
    pub fn remove_stack(&mut self, depth: usize) -> ScriptResult<Value> {
        let mut stack = self.stack.borrow_mut();
        let index = stack
            .len()
            .checked_sub(depth + 1)
            .ok_or_else(|| ScriptError::generic("stack is empty"))?;
        Ok(stack.remove(index))
    }

    pub fn clear_stack(&mut self) {
        self.stack.borrow_mut().clear();
    }

    pub fn stack_size(&self) -> usize {
        self.stack.borrow().len()
    }

    /// Stack contents from the top down.
    pub fn iter_stack(&self) -> Vec<Value> {
        self.stack.borrow().iter().rev().cloned().collect()
    }

    /// Stack contents from the bottom up, the order in which results
    /// transfer to a parent frame.
    pub fn iter_stack_result(&self) -> Vec<Value> {
        self.stack.borrow().clone()
    }

    /// The top of the parent frame's stack, if any.
    pub fn parent_top(&self) -> Option<Value> {
        self.parent_stack.as_ref().and_then(|s| s.borrow().last().cloned())
    }

    pub fn has_parent(&self) -> bool {
        self.parent_stack.is_some()
    }

    // Execution

    /// Execute a symbol sequence on this frame.
    pub fn exec(&mut self, syms: &SymSeq) -> ScriptResult<()> {
        let saved = self.cursor.take();
        self.cursor = Some(SymCursor {
            syms: Rc::clone(syms),
            pos: 0,
        });
        let result = self.run();
        self.cursor = saved;
        result
    }

    /// Parse source text and execute it on this frame.
    pub fn execs(&mut self, text: &str) -> ScriptResult<()> {
        let syms: SymSeq = Rc::from(Parser::parse_source(text)?);
        self.exec(&syms)
    }

    fn run(&mut self) -> ScriptResult<()> {
        while let Some(sym) = self.next_symbol() {
            self.step(&sym)
                .map_err(|err| err.or_at(|| sym.meta.pos()))?;
        }
        Ok(())
    }

    fn step(&mut self, sym: &Sym) -> ScriptResult<()> {
        if let SymKind::Operator(op) = &sym.kind {
            let registry = Rc::clone(&self.registry);
            registry.apply(self, *op)
        } else {
            let value = self.eval(sym)?;
            self.push_stack(value);
            Ok(())
        }
    }

    /// Consume the next symbol from the stream this frame is executing.
    ///
    /// The assignment operator uses this to read its target symbol.
    pub fn next_symbol(&mut self) -> Option<Sym> {
        let cursor = self.cursor.as_mut()?;
        let sym = cursor.syms.get(cursor.pos)?.clone();
        cursor.pos += 1;
        Some(sym)
    }

    /// Evaluate a non-operator symbol to a value.
    pub fn eval(&mut self, sym: &Sym) -> ScriptResult<Value> {
        match &sym.kind {
            SymKind::Ident(name) => {
                if self.in_assign_ctx() {
                    Ok(Value::Name(NameTarget::new(
                        Rc::clone(&self.namespace),
                        Rc::clone(name),
                    )))
                } else {
                    self.lookup_name(name)
                        .ok_or_else(|| ScriptError::name(name.as_ref()))
                }
            }
            SymKind::Bool(b) => Ok(Value::Bool(*b)),
            SymKind::Int(n) => Ok(Value::Int(n.clone())),
            SymKind::Float(f) => Ok(Value::Float(*f)),
            SymKind::Str(s) => Ok(Value::Str(Rc::clone(s))),
            SymKind::Block(syms) => Ok(Value::Block(Rc::clone(syms))),
            SymKind::Array(syms) => Ok(Value::array(self.eval_compound(syms)?)),
            SymKind::Tuple(syms) => Ok(Value::tuple(self.eval_compound(syms)?)),
            SymKind::Operator(op) => Err(ScriptError::generic(format!(
                "cannot evaluate operator '{op}' as a value"
            ))),
        }
    }

    /// Evaluate a compound literal's payload in a namespace-sharing child
    /// and collect the child's stack bottom-up.
    fn eval_compound(&mut self, syms: &SymSeq) -> ScriptResult<Vec<Value>> {
        let mut child = self.create_child(CtxFlag::ShareNamespace.into());
        child.exec(syms)?;
        Ok(child.iter_stack_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> ContextFrame {
        ContextFrame::root(Rc::new(OpRegistry::with_builtins()))
    }

    #[test]
    fn test_namespace_chain_reads_through() {
        let parent = Rc::new(RefCell::new(Namespace::root()));
        parent.borrow_mut().bind("x", Value::int(1));
        let child = Namespace::child_of(Rc::clone(&parent));
        assert_eq!(child.lookup("x"), Some(Value::int(1)));
        assert_eq!(child.lookup("y"), None);
    }

    #[test]
    fn test_namespace_child_writes_stay_local() {
        let parent = Rc::new(RefCell::new(Namespace::root()));
        let mut child = Namespace::child_of(Rc::clone(&parent));
        child.bind("x", Value::int(2));
        assert_eq!(child.lookup("x"), Some(Value::int(2)));
        assert_eq!(parent.borrow().lookup("x"), None);
    }

    #[test]
    fn test_share_namespace_child_writes_propagate() {
        let mut root = frame();
        let mut child = root.create_child(CtxFlag::ShareNamespace.into());
        child.bind_name("n", Value::int(5));
        assert_eq!(root.lookup_name("n"), Some(Value::int(5)));
        root.bind_name("m", Value::int(6));
        assert_eq!(child.lookup_name("m"), Some(Value::int(6)));
    }

    #[test]
    fn test_plain_child_writes_are_isolated() {
        let root = frame();
        let mut child = root.create_child(BitFlags::empty());
        child.bind_name("n", Value::int(5));
        assert_eq!(root.lookup_name("n"), None);
    }

    #[test]
    fn test_share_stack() {
        let mut root = frame();
        root.push_stack(Value::int(1));
        let mut child = root.create_child(CtxFlag::ShareStack.into());
        child.push_stack(Value::int(2));
        assert_eq!(root.stack_size(), 2);
        assert_eq!(root.peek_stack().unwrap(), Value::int(2));
    }

    #[test]
    fn test_stack_order() {
        let mut ctx = frame();
        ctx.push_stack(Value::int(1));
        ctx.push_stack(Value::int(2));
        ctx.push_stack(Value::int(3));
        assert_eq!(
            ctx.iter_stack(),
            vec![Value::int(3), Value::int(2), Value::int(1)]
        );
        assert_eq!(
            ctx.iter_stack_result(),
            vec![Value::int(1), Value::int(2), Value::int(3)]
        );
        assert_eq!(ctx.peek_at(0), Some(Value::int(3)));
        assert_eq!(ctx.peek_at(2), Some(Value::int(1)));
        assert_eq!(ctx.peek_at(3), None);
    }

    #[test]
    fn test_pop_empty_stack_is_generic_error() {
        let mut ctx = frame();
        let err = ctx.pop_stack().unwrap_err();
        assert_eq!(err.to_string(), "stack is empty");
    }

    #[test]
    fn test_exec_pushes_literals() {
        let mut ctx = frame();
        ctx.execs("1 2.5 'x' true").unwrap();
        assert_eq!(ctx.stack_size(), 4);
        assert_eq!(ctx.peek_stack().unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_unresolved_identifier() {
        let mut ctx = frame();
        let err = ctx.execs("nope").unwrap_err();
        assert!(err.to_string().contains("could not resolve identifier"));
        // the evaluator attached the symbol's position
        assert_eq!(err.pos().unwrap().line, 1);
    }

    #[test]
    fn test_array_literal_collects_bottom_up() {
        let mut ctx = frame();
        ctx.execs("[ 1 2 3 ]").unwrap();
        let value = ctx.peek_stack().unwrap();
        assert_eq!(value.format(), "[1 2 3]");
    }

    #[test]
    fn test_parent_top() {
        let mut root = frame();
        root.push_stack(Value::int(9));
        let child = root.create_child(BitFlags::empty());
        assert_eq!(child.parent_top(), Some(Value::int(9)));
        assert_eq!(child.stack_size(), 0);
    }
}
