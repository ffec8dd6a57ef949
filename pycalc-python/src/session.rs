//! Interpreter session - one persistent interactive namespace
//!
//! The Python session wraps `code.InteractiveConsole`, which gives the same
//! line-by-line semantics as the interactive prompt: an incomplete statement
//! is buffered until a later line completes it.

use crate::capture::{capture_output, CapturedOutput};
use pycalc::error::{Error, Result};
use pyo3::prelude::*;

/// A persistent evaluation context fed by the worker loop.
///
/// Evaluation errors raised by user code are part of the captured output;
/// `Err` is reserved for failures of the session machinery itself.
pub trait Interpreter: Send {
    /// Feed one line with interactive-prompt semantics
    fn evaluate_line(&mut self, text: &str) -> Result<CapturedOutput>;

    /// Drop any pending continuation, then run `text` as a complete block
    fn evaluate_block(&mut self, text: &str) -> Result<CapturedOutput>;
}

/// Replaces the builtin `help`, whose pager needs an interactive terminal.
const HELP_SOURCE: &str = r#"
def __help__(*args, **kwargs):
    import sys
    v = sys.version_info
    print(f"Welcome to Python {v.major}.{v.minor}'s help utility!\n"
          "\n"
          "If this is your first time using Python, you should definitely check out\n"
          f"the tutorial on the internet at https://docs.python.org/{v.major}.{v.minor}/tutorial/.")

help = __help__
"#;

/// Interpreter session backed by an embedded CPython
pub struct PythonSession {
    console: Py<PyAny>,
}

impl PythonSession {
    /// Create a console with a fresh namespace and the help helper installed
    pub fn new() -> Result<Self> {
        Python::with_gil(|py| {
            let code = py
                .import("code")
                .map_err(|e| Error::context("failed to import code module", e))?;
            let console = code
                .call_method0("InteractiveConsole")
                .map_err(|e| Error::context("failed to create InteractiveConsole", e))?;
            console
                .call_method1("runcode", (HELP_SOURCE,))
                .map_err(|e| Error::context("failed to install help helper", e))?;

            Ok(Self {
                console: console.unbind(),
            })
        })
    }
}

impl Interpreter for PythonSession {
    fn evaluate_line(&mut self, text: &str) -> Result<CapturedOutput> {
        let console = &self.console;
        capture_output(|py| {
            console.bind(py).call_method1("push", (text,))?;
            Ok(())
        })
    }

    fn evaluate_block(&mut self, text: &str) -> Result<CapturedOutput> {
        let console = &self.console;
        capture_output(|py| {
            let console = console.bind(py);
            console.call_method0("resetbuffer")?;
            console.call_method1("runcode", (text,))?;
            Ok(())
        })
    }
}

/// Get Python version info
pub fn python_version() -> String {
    Python::with_gil(|py| {
        let sys = py.import("sys").ok();
        sys.and_then(|s| s.getattr("version").ok())
            .and_then(|v| v.extract().ok())
            .unwrap_or_else(|| "unknown".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_in_line_mode() {
        let mut session = PythonSession::new().unwrap();
        let output = session.evaluate_line("print(1+1)").unwrap();
        assert_eq!(output.stdout, "2\n");
        assert_eq!(output.stderr, "");
    }

    #[test]
    fn test_expression_is_displayed() {
        let mut session = PythonSession::new().unwrap();
        let output = session.evaluate_line("6 * 7").unwrap();
        assert_eq!(output.stdout, "42\n");
    }

    #[test]
    fn test_block_definitions_persist() {
        let mut session = PythonSession::new().unwrap();
        let output = session
            .evaluate_block("def double(x):\n    return x * 2\n\nbase = 20\n")
            .unwrap();
        assert_eq!(output.stdout, "");
        assert_eq!(output.stderr, "");

        let output = session.evaluate_line("print(double(base) + 2)").unwrap();
        assert_eq!(output.stdout, "42\n");
    }

    #[test]
    fn test_incomplete_line_is_buffered() {
        let mut session = PythonSession::new().unwrap();
        assert_eq!(session.evaluate_line("for i in range(2):").unwrap().stdout, "");
        assert_eq!(session.evaluate_line("    print(i)").unwrap().stdout, "");
        assert_eq!(session.evaluate_line("").unwrap().stdout, "0\n1\n");
    }

    #[test]
    fn test_block_discards_pending_continuation() {
        let mut session = PythonSession::new().unwrap();
        session.evaluate_line("if True:").unwrap();
        let output = session.evaluate_block("print('fresh')").unwrap();
        assert_eq!(output.stdout, "fresh\n");

        // The dangling `if True:` must not swallow the next line.
        let output = session.evaluate_line("print('next')").unwrap();
        assert_eq!(output.stdout, "next\n");
    }

    #[test]
    fn test_error_keeps_session_usable() {
        let mut session = PythonSession::new().unwrap();
        let output = session.evaluate_line("1/0").unwrap();
        assert!(output.stderr.contains("ZeroDivisionError"));
        assert_eq!(output.stdout, "");

        let output = session.evaluate_block("raise RuntimeError('nope')").unwrap();
        assert!(output.stderr.contains("RuntimeError"));

        let output = session.evaluate_line("print('still alive')").unwrap();
        assert_eq!(output.stdout, "still alive\n");
    }

    #[test]
    fn test_help_is_canned() {
        let mut session = PythonSession::new().unwrap();
        let output = session.evaluate_line("help()").unwrap();
        assert!(output.stdout.starts_with("Welcome to Python 3."));
        assert!(output.stdout.contains("tutorial"));
    }

    #[test]
    fn test_python_version() {
        assert!(python_version().starts_with('3'));
    }
}
