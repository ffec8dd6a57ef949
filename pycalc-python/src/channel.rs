//! Request/result queues between the caller and the REPL worker.
//!
//! Requests flow through an unbounded queue. Results flow back through a
//! bounded one, so a worker that outpaces the pump blocks on `publish`.

use crate::capture::CapturedOutput;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use pycalc::error::{Error, Result};
use std::time::Duration;

/// One unit of source text submitted for evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snippet {
    /// Incremental, line-by-line REPL semantics
    Line { text: String },
    /// Whole-unit execution; clears any pending continuation first
    Block { text: String },
}

impl Snippet {
    pub fn line(text: impl Into<String>) -> Self {
        Snippet::Line { text: text.into() }
    }

    pub fn block(text: impl Into<String>) -> Self {
        Snippet::Block { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Snippet::Line { text } | Snippet::Block { text } => text,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Snippet::Line { .. } => "line",
            Snippet::Block { .. } => "block",
        }
    }
}

/// Output of one evaluation, or an empty placeholder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationResult {
    /// Text to insert at the cursor
    pub stdout: Option<String>,

    /// Text to surface in the error panel
    pub stderr: Option<String>,
}

impl EvaluationResult {
    /// Placeholder published when nothing happened
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.stdout.is_none() && self.stderr.is_none()
    }

    pub fn from_output(output: CapturedOutput) -> Self {
        Self {
            stdout: Some(output.stdout),
            stderr: Some(output.stderr),
        }
    }

    /// Result for a snippet that could not be evaluated at all
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            stdout: None,
            stderr: Some(message.into()),
        }
    }
}

/// Outcome of a timed read
#[derive(Debug, PartialEq, Eq)]
pub enum Delivery<T> {
    Item(T),
    TimedOut,
    Closed,
}

fn timed_recv<T>(rx: &Receiver<T>, timeout: Duration) -> Delivery<T> {
    match rx.recv_timeout(timeout) {
        Ok(item) => Delivery::Item(item),
        Err(RecvTimeoutError::Timeout) => Delivery::TimedOut,
        Err(RecvTimeoutError::Disconnected) => Delivery::Closed,
    }
}

/// Create the queue pair. `capacity` bounds the result queue only.
pub fn channel(capacity: usize) -> (Submitter, WorkerEndpoint, ResultReceiver) {
    let (request_tx, request_rx) = crossbeam_channel::unbounded();
    let (result_tx, result_rx) = crossbeam_channel::bounded(capacity);

    (
        Submitter { tx: request_tx },
        WorkerEndpoint {
            requests: request_rx,
            results: result_tx,
        },
        ResultReceiver { rx: result_rx },
    )
}

/// Caller side of the request queue
#[derive(Debug, Clone)]
pub struct Submitter {
    tx: Sender<Snippet>,
}

impl Submitter {
    /// Enqueue a snippet without waiting
    pub fn submit(&self, snippet: Snippet) -> Result<()> {
        self.tx
            .send(snippet)
            .map_err(|_| Error::Channel("request queue closed".to_string()))
    }
}

/// Worker side: reads requests, publishes results
#[derive(Debug)]
pub struct WorkerEndpoint {
    requests: Receiver<Snippet>,
    results: Sender<EvaluationResult>,
}

impl WorkerEndpoint {
    pub fn next_request(&self, timeout: Duration) -> Delivery<Snippet> {
        timed_recv(&self.requests, timeout)
    }

    /// Push a result, blocking while the result queue is full
    pub fn publish(&self, result: EvaluationResult) -> Result<()> {
        self.results
            .send(result)
            .map_err(|_| Error::Channel("result queue closed".to_string()))
    }
}

/// Pump side of the result queue
#[derive(Debug, Clone)]
pub struct ResultReceiver {
    rx: Receiver<EvaluationResult>,
}

impl ResultReceiver {
    pub fn receive(&self, timeout: Duration) -> Delivery<EvaluationResult> {
        timed_recv(&self.rx, timeout)
    }
}
