//! Shared test fixtures: a recording editor host and a scripted interpreter.
#![allow(dead_code)]

use parking_lot::Mutex;
use pycalc::error::Result;
use pycalc_python::capture::CapturedOutput;
use pycalc_python::{EditorHost, Interpreter, Settings};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Inserted(String),
    PanelShown(String),
    PanelHidden,
    Asked(String),
    Terminated,
}

/// Records every call; answers every question with a fixed reply.
pub struct RecordingHost {
    events: Mutex<Vec<HostEvent>>,
    reply: bool,
}

impl RecordingHost {
    pub fn answering(reply: bool) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            reply,
        }
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().clone()
    }

    /// Inserted text, in order
    pub fn inserted(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HostEvent::Inserted(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Inserted text other than the newlines the entry actions add
    pub fn outputs(&self) -> Vec<String> {
        self.inserted().into_iter().filter(|t| t != "\n").collect()
    }

    pub fn count(&self, wanted: &HostEvent) -> usize {
        self.events().iter().filter(|e| *e == wanted).count()
    }

    /// Poll until `check` holds or `timeout` passes
    pub async fn wait_until(
        &self,
        timeout: Duration,
        check: impl Fn(&[HostEvent]) -> bool,
    ) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if check(&self.events()) {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn record(&self, event: HostEvent) {
        self.events.lock().push(event);
    }
}

impl EditorHost for RecordingHost {
    fn insert_text(&self, text: &str) {
        self.record(HostEvent::Inserted(text.to_string()));
    }

    fn show_panel(&self, text: &str) {
        self.record(HostEvent::PanelShown(text.to_string()));
    }

    fn hide_panel(&self) {
        self.record(HostEvent::PanelHidden);
    }

    fn confirm(&self, message: &str) -> bool {
        self.record(HostEvent::Asked(message.to_string()));
        self.reply
    }

    fn terminate(&self) {
        self.record(HostEvent::Terminated);
    }
}

/// Answers `= <text>` for lines and `block <text>` for blocks.
/// `sleep <ms>` blocks the worker; `fail` writes to stderr.
pub struct ScriptedInterpreter;

impl Interpreter for ScriptedInterpreter {
    fn evaluate_line(&mut self, text: &str) -> Result<CapturedOutput> {
        if let Some(ms) = text.strip_prefix("sleep ") {
            let ms: u64 = ms.trim().parse().unwrap_or(0);
            std::thread::sleep(Duration::from_millis(ms));
            return Ok(CapturedOutput::default());
        }
        if text == "fail" {
            return Ok(CapturedOutput {
                stdout: String::new(),
                stderr: "NameError: name 'fail' is not defined\n".to_string(),
            });
        }
        Ok(CapturedOutput {
            stdout: format!("= {text}\n"),
            stderr: String::new(),
        })
    }

    fn evaluate_block(&mut self, text: &str) -> Result<CapturedOutput> {
        Ok(CapturedOutput {
            stdout: format!("block {}\n", text.trim_end()),
            stderr: String::new(),
        })
    }
}

/// Settings with timings short enough for tests
pub fn fast_settings() -> Settings {
    Settings {
        idle_timeout_ms: 20,
        stall_timeout_ms: 2_000,
        reschedule_delay_ms: 1,
        panel_duration_ms: 50,
        ..Settings::default()
    }
}
