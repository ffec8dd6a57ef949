//! Result pump - drains evaluation results into the editor
//!
//! A self re-arming task on the tokio runtime. Each tick waits a bounded time
//! for one result on the blocking pool, applies it, then sleeps for the
//! re-arm delay. A tick that hears nothing at all, not even a placeholder,
//! means the worker is busy with long-running code: the user is asked whether
//! to terminate. Every such tick asks again.

use crate::channel::{Delivery, EvaluationResult, ResultReceiver};
use crate::config::Settings;
use crate::host::EditorHost;
use pycalc::tracing::prefix;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Question asked when a tick times out
pub const STALL_MESSAGE: &str =
    "The Python code has been running for a long time. Do you want to terminate it?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpTimings {
    /// Bounded wait for one result
    pub stall_timeout: Duration,
    /// Delay before the next tick
    pub reschedule_delay: Duration,
    /// How long the error panel stays up
    pub panel_duration: Duration,
}

impl From<&Settings> for PumpTimings {
    fn from(settings: &Settings) -> Self {
        Self {
            stall_timeout: settings.stall_timeout(),
            reschedule_delay: settings.reschedule_delay(),
            panel_duration: settings.panel_duration(),
        }
    }
}

enum Tick {
    Rearm,
    Stop,
}

pub struct ResultPump<H: EditorHost> {
    results: ResultReceiver,
    host: Arc<H>,
    timings: PumpTimings,
}

impl<H: EditorHost> ResultPump<H> {
    pub fn new(results: ResultReceiver, host: Arc<H>, timings: PumpTimings) -> Self {
        Self {
            results,
            host,
            timings,
        }
    }

    /// Start the pump on `runtime`
    pub fn spawn(self, runtime: &Handle) -> JoinHandle<()> {
        runtime.spawn(self.run())
    }

    /// Tick until the user terminates or the worker disappears
    pub async fn run(self) {
        info!("{} Result pump started", prefix::PUMP);
        while let Tick::Rearm = self.tick().await {
            tokio::time::sleep(self.timings.reschedule_delay).await;
        }
        info!("{} Result pump stopped", prefix::STOP);
    }

    async fn tick(&self) -> Tick {
        let results = self.results.clone();
        let wait = self.timings.stall_timeout;
        let delivery = match task::spawn_blocking(move || results.receive(wait)).await {
            Ok(delivery) => delivery,
            Err(e) => {
                error!("{} Result dequeue task failed: {}", prefix::PUMP, e);
                return Tick::Rearm;
            }
        };

        match delivery {
            Delivery::Item(result) => {
                self.apply(result);
                Tick::Rearm
            }
            Delivery::TimedOut => self.offer_termination().await,
            Delivery::Closed => {
                error!(
                    "{} Result queue closed; the REPL worker is gone",
                    prefix::PUMP
                );
                Tick::Stop
            }
        }
    }

    fn apply(&self, result: EvaluationResult) {
        if result.is_empty() {
            return;
        }
        debug!(
            "{} Applying result (stdout {} bytes, stderr {} bytes)",
            prefix::PUMP,
            result.stdout.as_deref().map_or(0, str::len),
            result.stderr.as_deref().map_or(0, str::len)
        );

        if let Some(stdout) = result.stdout.filter(|s| !s.is_empty()) {
            self.host.insert_text(&stdout);
        }

        if let Some(stderr) = result.stderr.filter(|s| !s.is_empty()) {
            self.host.show_panel(&stderr);
            let host = self.host.clone();
            let linger = self.timings.panel_duration;
            tokio::spawn(async move {
                tokio::time::sleep(linger).await;
                host.hide_panel();
            });
        }
    }

    async fn offer_termination(&self) -> Tick {
        warn!(
            "{} No result within {:?}, asking whether to terminate",
            prefix::PUMP,
            self.timings.stall_timeout
        );

        let host = self.host.clone();
        let terminate = match task::spawn_blocking(move || host.confirm(STALL_MESSAGE)).await {
            Ok(answer) => answer,
            Err(e) => {
                error!("{} Termination prompt failed: {}", prefix::PUMP, e);
                false
            }
        };

        if terminate {
            warn!("{} Terminating at the user's request", prefix::STOP);
            self.host.terminate();
            Tick::Stop
        } else {
            Tick::Rearm
        }
    }
}
