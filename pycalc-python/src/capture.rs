//! Output capture - redirect Python's stdout/stderr for one evaluation

use parking_lot::ReentrantMutex;
use pycalc::error::{Error, Result};
use pyo3::prelude::*;
use pyo3::types::PyModule;
use std::sync::OnceLock;
use tracing::warn;

/// Text written to the standard streams during one evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Puts the original streams back when dropped, including on unwind.
struct StreamRedirect<'py> {
    sys: Bound<'py, PyModule>,
    original_stdout: Bound<'py, PyAny>,
    original_stderr: Bound<'py, PyAny>,
}

impl Drop for StreamRedirect<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.sys.setattr("stdout", &self.original_stdout) {
            warn!("failed to restore sys.stdout: {}", e);
        }
        if let Err(e) = self.sys.setattr("stderr", &self.original_stderr) {
            warn!("failed to restore sys.stderr: {}", e);
        }
    }
}

/// sys.stdout is process-wide and the interpreter hands the GIL to other
/// threads between bytecodes, so redirections are serialized here. Always
/// taken before the GIL.
fn capture_lock() -> &'static ReentrantMutex<()> {
    static LOCK: OnceLock<ReentrantMutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| ReentrantMutex::new(()))
}

/// Run `run` with sys.stdout/sys.stderr redirected into fresh StringIO buffers.
///
/// An exception escaping `run` is appended to the captured stderr as its
/// `repr`; it is never returned to the caller. `Err` means the redirection
/// itself could not be set up.
pub fn capture_output<F>(run: F) -> Result<CapturedOutput>
where
    F: for<'py> FnOnce(Python<'py>) -> PyResult<()>,
{
    let _lock = capture_lock().lock();
    Python::with_gil(|py| capture_with_gil(py, run))
}

fn capture_with_gil<F>(py: Python<'_>, run: F) -> Result<CapturedOutput>
where
    F: for<'py> FnOnce(Python<'py>) -> PyResult<()>,
{
    let io = py
        .import("io")
        .map_err(|e| Error::context("failed to import io module", e))?;
    let sys = py
        .import("sys")
        .map_err(|e| Error::context("failed to import sys module", e))?;

    let stdout_capture = io
        .call_method0("StringIO")
        .map_err(|e| Error::context("failed to create stdout StringIO object", e))?;
    let stderr_capture = io
        .call_method0("StringIO")
        .map_err(|e| Error::context("failed to create stderr StringIO object", e))?;

    let redirect = StreamRedirect {
        original_stdout: sys
            .getattr("stdout")
            .map_err(|e| Error::context("failed to get original sys.stdout", e))?,
        original_stderr: sys
            .getattr("stderr")
            .map_err(|e| Error::context("failed to get original sys.stderr", e))?,
        sys,
    };

    redirect
        .sys
        .setattr("stdout", &stdout_capture)
        .map_err(|e| Error::context("failed to redirect sys.stdout to StringIO", e))?;
    redirect
        .sys
        .setattr("stderr", &stderr_capture)
        .map_err(|e| Error::context("failed to redirect sys.stderr to StringIO", e))?;

    let outcome = run(py);
    drop(redirect);

    let stdout: String = stdout_capture
        .call_method0("getvalue")
        .and_then(|v| v.extract())
        .unwrap_or_default();
    let mut stderr: String = stderr_capture
        .call_method0("getvalue")
        .and_then(|v| v.extract())
        .unwrap_or_default();

    if let Err(err) = outcome {
        stderr.push_str(&exception_repr(py, &err));
    }

    Ok(CapturedOutput { stdout, stderr })
}

fn exception_repr(py: Python<'_>, err: &PyErr) -> String {
    err.value(py)
        .repr()
        .and_then(|r| r.extract())
        .unwrap_or_else(|_| err.to_string())
}

/// Drop stdout that is only the console echoing the typed line back.
pub fn suppress_echo(stdout: String, source: &str) -> String {
    if stdout == format!("{}\n", source.trim()) {
        String::new()
    } else {
        stdout
    }
}
