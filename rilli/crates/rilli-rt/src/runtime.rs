//! The public runtime surface consumed by the driver.

use std::cell::RefCell;
use std::rc::Rc;

use rilli_util::ScriptResult;

use crate::context::{ContextFrame, Namespace};
use crate::registry::OpRegistry;
use crate::value::Value;

/// A ready-to-run interpreter: the operator registry plus the root
/// context frame holding the global namespace.
///
/// # Example
///
/// ```
/// use rilli_rt::ScriptRuntime;
///
/// let mut runtime = ScriptRuntime::new();
/// runtime.run_script("1 1 +").unwrap();
/// assert_eq!(runtime.iter_stack()[0].format(), "2");
/// ```
pub struct ScriptRuntime {
    root: ContextFrame,
}

impl ScriptRuntime {
    pub fn new() -> Self {
        let registry = Rc::new(OpRegistry::with_builtins());
        Self {
            root: ContextFrame::root(registry),
        }
    }

    /// Parse and execute source text in the root context.
    ///
    /// Script errors propagate with their source position attached; the
    /// stack is left exactly as the script left it, including on error.
    pub fn run_script(&mut self, text: &str) -> ScriptResult<()> {
        self.root.execs(text)
    }

    /// The root stack from the top down.
    pub fn iter_stack(&self) -> Vec<Value> {
        self.root.iter_stack()
    }

    pub fn clear_stack(&mut self) {
        self.root.clear_stack();
    }

    pub fn stack_size(&self) -> usize {
        self.root.stack_size()
    }

    /// The global namespace, shared with the root context.
    ///
    /// The driver may read and write it between script runs, never during
    /// one.
    pub fn globals(&self) -> Rc<RefCell<Namespace>> {
        Rc::clone(self.root.namespace())
    }

    /// Bind a global name.
    pub fn set_global(&mut self, name: &str, value: Value) {
        self.root.bind_name(name, value);
    }

    /// Read a global name through the root namespace.
    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.root.lookup_name(name)
    }

    /// Format the stack top-down, one line per value.
    ///
    /// `fmt` may contain `{idx}` (1-based, zero-padded to the width of
    /// the stack size) and `{value}` placeholders. `fmt_single` replaces
    /// `fmt` when exactly one value is on the stack.
    pub fn format_stack(&self, fmt: Option<&str>, fmt_single: Option<&str>) -> Vec<String> {
        let values = self.iter_stack();
        let mut fmt = fmt.unwrap_or("{idx}: {value}");
        if values.len() == 1 {
            if let Some(single) = fmt_single {
                fmt = single;
            }
        }

        let width = values.len().to_string().len();
        values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                fmt.replace("{idx}", &format!("{:0width$}", i + 1))
                    .replace("{value}", &value.format())
            })
            .collect()
    }
}

impl Default for ScriptRuntime {
    fn default() -> Self {
        Self::new()
    }
}
