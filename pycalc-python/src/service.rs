//! REPL service - lifecycle of the worker and pump, plus the entry actions
//!
//! One service per process. The worker thread and the pump are started
//! lazily by the first entry action and then run for the life of the service.

use crate::channel::{channel, ResultReceiver, Snippet, Submitter, WorkerEndpoint};
use crate::config::SettingsStore;
use crate::host::EditorHost;
use crate::pump::{PumpTimings, ResultPump};
use crate::session::{Interpreter, PythonSession};
use crate::worker::{spawn_worker, InterpreterFactory};
use parking_lot::Mutex;
use pycalc::error::Result;
use pycalc::tracing::prefix;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info};

/// Everything the first `start` consumes
struct PendingStart {
    factory: InterpreterFactory,
    endpoint: WorkerEndpoint,
    results: ResultReceiver,
}

pub struct ReplService<H: EditorHost> {
    settings: Arc<SettingsStore>,
    host: Arc<H>,
    runtime: Handle,
    submitter: Submitter,
    pending: Mutex<Option<PendingStart>>,
}

impl<H: EditorHost> ReplService<H> {
    /// Create a service whose worker builds its session with `factory`.
    ///
    /// Fails with `Error::Config` when the timings would make an idle worker
    /// look stalled.
    pub fn new(
        settings: Arc<SettingsStore>,
        host: Arc<H>,
        runtime: Handle,
        factory: InterpreterFactory,
    ) -> Result<Self> {
        let snapshot = settings.get();
        snapshot.validate()?;

        let (submitter, endpoint, results) = channel(snapshot.output_capacity());
        Ok(Self {
            settings,
            host,
            runtime,
            submitter,
            pending: Mutex::new(Some(PendingStart {
                factory,
                endpoint,
                results,
            })),
        })
    }

    /// Create a service backed by an embedded Python session
    pub fn python(settings: Arc<SettingsStore>, host: Arc<H>, runtime: Handle) -> Result<Self> {
        let factory: InterpreterFactory = Box::new(|| {
            let session = PythonSession::new()?;
            Ok(Box::new(session) as Box<dyn Interpreter>)
        });
        Self::new(settings, host, runtime, factory)
    }

    /// Start the worker thread and the result pump. Later calls do nothing.
    pub fn start(&self) -> Result<()> {
        let Some(pending) = self.pending.lock().take() else {
            return Ok(());
        };

        let settings = self.settings.get();
        let _worker = spawn_worker(pending.factory, pending.endpoint, settings.idle_timeout())?;
        let _pump = ResultPump::new(pending.results, self.host.clone(), PumpTimings::from(&settings))
            .spawn(&self.runtime);

        info!("{} REPL service started", prefix::START);
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.pending.lock().is_none()
    }

    /// Evaluate the current line up to the cursor in line mode.
    ///
    /// `cursor` is a character offset into `line`. A newline is inserted
    /// afterwards even when evaluation is disabled, so the result lands on
    /// the next line.
    pub fn evaluate_line(&self, line: &str, cursor: usize) -> Result<()> {
        let submitted = self.submit_line(line, cursor);
        self.host.insert_text("\n");
        submitted
    }

    fn submit_line(&self, line: &str, cursor: usize) -> Result<()> {
        self.start()?;
        if !self.settings.is_enabled() {
            debug!("Line evaluation disabled, skipping");
            return Ok(());
        }

        let text: String = line.chars().take(cursor).collect();
        self.submitter.submit(Snippet::line(text))
    }

    /// Evaluate a selection as one block. Not affected by the enabled flag.
    pub fn evaluate_selection(&self, text: &str) -> Result<()> {
        let submitted = self
            .start()
            .and_then(|_| self.submitter.submit(Snippet::block(text)));
        if !text.ends_with('\n') {
            self.host.insert_text("\n");
        }
        submitted
    }

    /// Flip and persist the enabled flag, returning the new value
    pub fn toggle(&self) -> Result<bool> {
        let enabled = self.settings.toggle()?;
        log_enabled(enabled);
        Ok(enabled)
    }

    /// Persist an explicit enabled flag
    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.settings.set_enabled(enabled)?;
        log_enabled(enabled);
        Ok(())
    }
}

fn log_enabled(enabled: bool) {
    info!(
        "Line evaluation {}",
        if enabled { "enabled" } else { "disabled" }
    );
}
