//! rilli-drv - Driver for the Rill interpreter.
//!
//! Everything outside the language core lives here: command-line parsing,
//! script loading, the `argv` global, the REPL, and exit-code policy. The
//! driver only talks to the core through the public `ScriptRuntime`
//! surface.

pub mod repl;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rilli_rt::{ScriptRuntime, Value};

use crate::repl::Repl;

/// Stack-based script interpreter.
#[derive(Debug, Parser)]
#[command(name = "rilli", version, about = "Stack-based script interpreter.")]
pub struct Cli {
    /// Program passed in as a string at the command line
    #[arg(short = 'c', value_name = "cmd")]
    pub cmd: Option<String>,

    /// Enter interactive mode after running the script
    #[arg(short = 'i')]
    pub interactive: bool,

    /// Print the contents of the stack on exit
    #[arg(short = 'd')]
    pub dump_stack: bool,

    /// Read the program from a script file
    pub file: Option<PathBuf>,

    /// Arguments passed to the program in argv
    #[arg(trailing_var_arg = true)]
    pub args: Vec<String>,
}

/// Run the driver to completion.
///
/// A script error is reported through the returned `Err`, which the
/// binary turns into a non-zero exit code.
pub fn run(cli: Cli) -> Result<()> {
    let mut argv: Vec<String> = cli.args.clone();

    // with `-c` the file positional is really the first program argument
    let script = match (&cli.cmd, &cli.file) {
        (Some(cmd), file) => {
            if let Some(file) = file {
                argv.insert(0, file.display().to_string());
            }
            Some(cmd.clone())
        }
        (None, Some(path)) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("could not read script file '{}'", path.display()))?;
            Some(source)
        }
        (None, None) => None,
    };

    let mut runtime = ScriptRuntime::new();
    runtime.set_global(
        "argv",
        Value::tuple(argv.iter().map(|arg| Value::str(arg.as_str())).collect()),
    );

    match script {
        Some(source) => {
            tracing::debug!(bytes = source.len(), "running script");
            runtime.run_script(&source)?;
            if cli.interactive {
                let stdin = std::io::stdin();
                Repl::new(&mut runtime).run(stdin.lock(), std::io::stdout())?;
            }
        }
        None => {
            let stdin = std::io::stdin();
            Repl::new(&mut runtime).run(stdin.lock(), std::io::stdout())?;
        }
    }

    if cli.dump_stack {
        for line in runtime.format_stack(None, None) {
            println!("{line}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_cmd_and_args() {
        let cli = Cli::parse_from(["rilli", "-c", "argv #", "-d", "a", "b"]);
        assert_eq!(cli.cmd.as_deref(), Some("argv #"));
        assert!(cli.dump_stack);
        assert!(!cli.interactive);
        // the first positional lands in `file` and is folded into argv
        assert_eq!(cli.file, Some(PathBuf::from("a")));
        assert_eq!(cli.args, vec!["b"]);
    }

    #[test]
    fn test_cli_parses_script_file() {
        let cli = Cli::parse_from(["rilli", "script.rill", "x"]);
        assert_eq!(cli.file, Some(PathBuf::from("script.rill")));
        assert_eq!(cli.args, vec!["x"]);
    }
}
