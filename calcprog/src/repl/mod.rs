//! REPL (Read-Eval-Print Loop) for building a scope one step at a time
//!
//! `name = expr` evaluates `expr` against the session scope and binds the
//! result, just like a program step. Any other line is evaluated and
//! printed.

use crate::config::EngineConfig;
use crate::error::report_error;
use crate::expression::{Scope, StoredExpression, analyze_with, evaluate_with};
use crate::template::is_identifier;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;

const PROMPT: &str = "> ";
const HISTORY_FILE: &str = ".calcprog_history";

/// What a line asks for
#[derive(Debug, Clone, PartialEq)]
enum Line<'a> {
    Bind { name: &'a str, source: &'a str },
    Eval(&'a str),
}

/// Split `name = expr` from a bare expression; `==` is never a binding
fn classify(line: &str) -> Line<'_> {
    if let Some((lhs, rhs)) = line.split_once('=') {
        let name = lhs.trim();
        if is_identifier(name) && !rhs.starts_with('=') {
            return Line::Bind {
                name,
                source: rhs.trim(),
            };
        }
    }
    Line::Eval(line)
}

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    config: EngineConfig,
    scope: Scope,
    history_path: Option<PathBuf>,
}

impl Repl {
    /// Create a new REPL
    pub fn new(config: EngineConfig) -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            config,
            scope: Scope::new(),
            history_path,
        };

        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("calcprog REPL {}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit.\n");

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    let _ = self.editor.add_history_entry(line);

                    if line.starts_with(':') {
                        if self.handle_command(line) {
                            break;
                        }
                        continue;
                    }

                    self.eval_input(line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    /// Handle REPL commands (starting with :). Returns true to exit.
    fn handle_command(&mut self, cmd: &str) -> bool {
        let (name, arg) = cmd.split_once(' ').unwrap_or((cmd, ""));
        match name {
            ":quit" | ":q" | ":exit" => {
                println!("Goodbye!");
                true
            }
            ":help" | ":h" | ":?" => {
                self.print_help();
                false
            }
            ":scope" => {
                if self.scope.is_empty() {
                    println!("(empty)");
                }
                for (name, value) in &self.scope {
                    println!("  {name} = {value}");
                }
                false
            }
            ":vars" => {
                let analysis = analyze_with(arg, &self.config);
                println!("variables: {}", analysis.variables.join(", "));
                if let Some(error) = analysis.error {
                    println!("error: {error}");
                }
                false
            }
            ":reset" => {
                self.scope.clear();
                false
            }
            _ => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
                false
            }
        }
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("  :help, :h, :?   Show this help");
        println!("  :quit, :q       Exit the REPL");
        println!("  :scope          List bindings in order");
        println!("  :vars <expr>    Show the variables an expression uses");
        println!("  :reset          Drop every binding");
        println!();
        println!("You can enter:");
        println!("  - Bindings: rate = 0.07");
        println!("  - Expressions over bindings: {{{{rate}}}} * 100");
        println!("  - Builtins: sqrt(2), max(1, 2, 3), pi, 4!");
    }

    fn eval_input(&mut self, input: &str) {
        match classify(input) {
            Line::Bind { name, source } => {
                if let Some(value) = self.evaluate(source) {
                    self.scope.insert(name.to_string(), value);
                    println!("{name} = {value}");
                }
            }
            Line::Eval(source) => {
                if let Some(value) = self.evaluate(source) {
                    println!("{value}");
                }
            }
        }
    }

    fn evaluate(&self, source: &str) -> Option<f64> {
        let expression = StoredExpression::new(source);
        match evaluate_with(&expression, &self.scope, &self.config) {
            Ok(value) => Some(value),
            Err(err) => {
                if report_error("<repl>", source, &err).is_err() {
                    eprintln!("Error: {err}");
                }
                None
            }
        }
    }
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repl() -> Repl {
        Repl::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("rate = 0.5"), Line::Bind { name: "rate", source: "0.5" });
        assert_eq!(classify("total=  {{a}} + 1"), Line::Bind { name: "total", source: "{{a}} + 1" });
        assert_eq!(classify("{{a}} == 1"), Line::Eval("{{a}} == 1"));
        assert_eq!(classify("a == 1"), Line::Eval("a == 1"));
        assert_eq!(classify("1 + 2"), Line::Eval("1 + 2"));
        assert_eq!(classify("{{a}} >= 1"), Line::Eval("{{a}} >= 1"));
    }

    #[test]
    fn test_bindings_accumulate() {
        let mut repl = repl();
        repl.eval_input("x = 10");
        repl.eval_input("doubled = {{x}} * 2");
        assert_eq!(repl.scope.get("doubled"), Some(&20.0));
        let keys: Vec<&str> = repl.scope.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["x", "doubled"]);
    }

    #[test]
    fn test_failed_binding_leaves_scope_untouched() {
        let mut repl = repl();
        repl.eval_input("x = 1 / 0");
        repl.eval_input("y = {{missing}}");
        assert!(repl.scope.is_empty());
    }

    #[test]
    fn test_rebinding_keeps_position() {
        let mut repl = repl();
        repl.eval_input("a = 1");
        repl.eval_input("b = 2");
        repl.eval_input("a = {{a}} + {{b}}");
        assert_eq!(repl.scope.get_index(0), Some((&"a".to_string(), &3.0)));
    }

    #[test]
    fn test_handle_commands() {
        let mut repl = repl();
        assert!(repl.handle_command(":quit"));
        assert!(repl.handle_command(":q"));
        assert!(!repl.handle_command(":help"));
        assert!(!repl.handle_command(":scope"));
        assert!(!repl.handle_command(":vars {{a}} + {{b}}"));
        assert!(!repl.handle_command(":anything_else"));
    }

    #[test]
    fn test_reset_clears_scope() {
        let mut repl = repl();
        repl.eval_input("a = 1");
        assert!(!repl.handle_command(":reset"));
        assert!(repl.scope.is_empty());
    }
}
