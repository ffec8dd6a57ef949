//! Worker loop - the single background thread that owns the interpreter
//!
//! Idle → Evaluating → Publishing → Idle. A read timeout publishes an empty
//! placeholder so the pump hears from the worker at least once per idle
//! interval. Faults are converted into results; the loop only ends once the
//! queues on the other side are gone.

use crate::capture::{suppress_echo, CapturedOutput};
use crate::channel::{Delivery, EvaluationResult, Snippet, WorkerEndpoint};
use crate::session::Interpreter;
use pycalc::error::{Error, Result};
use pycalc::tracing::prefix;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Builds the interpreter on the worker thread
pub type InterpreterFactory = Box<dyn FnOnce() -> Result<Box<dyn Interpreter>> + Send>;

/// Name of the worker thread
pub const WORKER_THREAD_NAME: &str = "pycalc-repl-worker";

/// Spawn the worker thread
pub fn spawn_worker(
    factory: InterpreterFactory,
    endpoint: WorkerEndpoint,
    idle_timeout: Duration,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || run_worker(factory, endpoint, idle_timeout))
        .map_err(|e| Error::context("failed to spawn worker thread", e))
}

/// Body of the worker thread
pub fn run_worker(factory: InterpreterFactory, endpoint: WorkerEndpoint, idle_timeout: Duration) {
    info!("{} REPL worker starting", prefix::START);

    let mut session = factory().map_err(|e| {
        error!("Failed to create interpreter session: {}", e);
        format!("pycalc: interpreter session unavailable: {e}")
    });

    loop {
        let result = match endpoint.next_request(idle_timeout) {
            Delivery::Item(snippet) => {
                debug!(
                    "{} Evaluating {} snippet ({} bytes)",
                    prefix::EVAL,
                    snippet.mode(),
                    snippet.text().len()
                );
                match session.as_mut() {
                    Ok(session) => evaluate(&mut **session, &snippet),
                    Err(message) => EvaluationResult::failure(message.clone()),
                }
            }
            Delivery::TimedOut => EvaluationResult::empty(),
            Delivery::Closed => {
                info!("{} Request queue closed, REPL worker exiting", prefix::STOP);
                return;
            }
        };

        if let Err(e) = endpoint.publish(result) {
            info!("{} {}, REPL worker exiting", prefix::STOP, e);
            return;
        }
    }
}

/// Evaluate one snippet; every outcome becomes a result.
pub fn evaluate(session: &mut dyn Interpreter, snippet: &Snippet) -> EvaluationResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| match snippet {
        Snippet::Line { text } => session.evaluate_line(text),
        Snippet::Block { text } => session.evaluate_block(text),
    }));

    match outcome {
        Ok(Ok(CapturedOutput { stdout, stderr })) => {
            EvaluationResult::from_output(CapturedOutput {
                stdout: suppress_echo(stdout, snippet.text()),
                stderr,
            })
        }
        Ok(Err(e)) => {
            error!("Evaluation fault: {}", e);
            EvaluationResult::failure(format!("pycalc: evaluation failed: {e}"))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!("Evaluation panicked: {}", message);
            EvaluationResult::failure(format!("pycalc: evaluation panicked: {message}"))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<no message>".to_string())
}
