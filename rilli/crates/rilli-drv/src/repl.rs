//! Read-evaluate-print loop.
//!
//! Statements are accumulated line by line until a line ends with the
//! terminator `;`, which is stripped before evaluation. After a
//! successful run the stack is echoed top-down as `] value` lines and
//! cleared; after a script error the message is printed and the stack is
//! left untouched so the user can inspect it.
//!
//! Lines starting with `/` are meta-commands handled by the REPL itself.

use std::io::{self, BufRead, Write};

use rilli_rt::ScriptRuntime;

const INTRO: &str = "Rill interpreter interactive mode.\nType /help or /? to list metacommands.";

const PROMPT_DEFAULT: &str = ">>> ";
const PROMPT_MULTILINE: &str = "... ";
const INPUT_TERM: &str = ";";
const CMD_PREFIX: &str = "/";

/// The interactive loop over a runtime borrowed from the driver.
pub struct Repl<'a> {
    runtime: &'a mut ScriptRuntime,
    done: bool,
}

impl<'a> Repl<'a> {
    pub fn new(runtime: &'a mut ScriptRuntime) -> Self {
        Self {
            runtime,
            done: false,
        }
    }

    /// Run the loop until `/quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        writeln!(output, "{INTRO}")?;

        let mut lines = input.lines();
        let mut pending: Vec<String> = Vec::new();

        while !self.done {
            let prompt = if pending.is_empty() {
                PROMPT_DEFAULT
            } else {
                PROMPT_MULTILINE
            };
            write!(output, "{prompt}")?;
            output.flush()?;

            let line = match lines.next() {
                Some(line) => line?,
                None => break,
            };
            let line = line.trim_end();

            if pending.is_empty() {
                if let Some(command) = line.strip_prefix(CMD_PREFIX) {
                    self.dispatch_metacommand(command, &mut output)?;
                    continue;
                }
            }

            match line.strip_suffix(INPUT_TERM) {
                Some(stripped) => {
                    pending.push(stripped.to_string());
                    let statement = pending.join("\n");
                    pending.clear();
                    if !statement.trim().is_empty() {
                        self.evaluate(&statement, &mut output)?;
                    }
                }
                None => pending.push(line.to_string()),
            }
        }

        Ok(())
    }

    fn evaluate<W: Write>(&mut self, statement: &str, output: &mut W) -> io::Result<()> {
        match self.runtime.run_script(statement) {
            Ok(()) => {
                for value in self.runtime.iter_stack() {
                    writeln!(output, "] {}", value.format())?;
                }
                self.runtime.clear_stack();
            }
            // keep the stack so the user can inspect what was left
            Err(err) => writeln!(output, "*** {err}")?,
        }
        Ok(())
    }

    fn dispatch_metacommand<W: Write>(&mut self, command: &str, output: &mut W) -> io::Result<()> {
        let name = command.split_whitespace().next().unwrap_or("");
        match name {
            "help" | "?" => {
                writeln!(output, "/help   show this help")?;
                writeln!(output, "/clear  clear the stack")?;
                writeln!(output, "/quit   quit the interpreter")?;
            }
            "clear" => self.runtime.clear_stack(),
            "quit" => self.done = true,
            other => writeln!(output, "*** Unrecognized command '{other}'")?,
        }
        Ok(())
    }
}
