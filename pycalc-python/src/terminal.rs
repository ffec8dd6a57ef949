//! Terminal stand-in for an editor
//!
//! Inserted text goes to stdout, the panel goes to stderr, and questions are
//! answered by the next input line.
//!
//! Input protocol, one command per line:
//! - any text: evaluate it in line mode with the cursor at the end
//! - `:block` ... `:end`: evaluate the lines in between as one block
//! - `:toggle`: flip line evaluation on or off
//! - `:on` / `:off`: turn line evaluation on or off
//! - `:quit`: exit

use crate::host::EditorHost;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use pycalc::tracing::prefix;
use std::io::Write;
use tracing::{debug, warn};

/// Exit status used when the user terminates a long-running evaluation
pub const TERMINATED_EXIT_CODE: i32 = 130;

const BLOCK_START: &str = ":block";
const BLOCK_END: &str = ":end";
const TOGGLE: &str = ":toggle";
const ENABLE: &str = ":on";
const DISABLE: &str = ":off";
const QUIT: &str = ":quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    EvaluateLine(String),
    EvaluateBlock(String),
    Toggle,
    SetEnabled(bool),
    Quit,
}

/// Turns input lines into actions, collecting `:block` bodies
#[derive(Debug, Default)]
pub struct InputParser {
    block: Option<String>,
}

impl InputParser {
    pub fn feed(&mut self, line: &str) -> Option<Action> {
        let line = line.trim_end_matches(['\n', '\r']);

        if let Some(block) = self.block.as_mut() {
            if line.trim() == BLOCK_END {
                return self.block.take().map(Action::EvaluateBlock);
            }
            block.push_str(line);
            block.push('\n');
            return None;
        }

        match line.trim() {
            BLOCK_START => {
                self.block = Some(String::new());
                None
            }
            TOGGLE => Some(Action::Toggle),
            ENABLE => Some(Action::SetEnabled(true)),
            DISABLE => Some(Action::SetEnabled(false)),
            QUIT => Some(Action::Quit),
            _ => Some(Action::EvaluateLine(line.to_string())),
        }
    }

    pub fn in_block(&self) -> bool {
        self.block.is_some()
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// `EditorHost` on stdout/stderr
#[derive(Debug, Default)]
pub struct TerminalHost {
    pending_answer: Mutex<Option<Sender<bool>>>,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand `line` to a waiting `confirm`. Returns false if nothing was waiting.
    pub fn answer(&self, line: &str) -> bool {
        let Some(tx) = self.pending_answer.lock().take() else {
            return false;
        };
        let _ = tx.send(is_yes(line));
        true
    }
}

impl EditorHost for TerminalHost {
    fn insert_text(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    fn show_panel(&self, text: &str) {
        let mut stderr = std::io::stderr().lock();
        for line in text.lines() {
            let _ = writeln!(stderr, "│ {line}");
        }
        let _ = stderr.flush();
    }

    fn hide_panel(&self) {
        debug!("Panel hidden");
    }

    fn confirm(&self, message: &str) -> bool {
        let (tx, rx) = crossbeam_channel::bounded(1);
        *self.pending_answer.lock() = Some(tx);
        eprint!("{message} [y/N] ");
        rx.recv().unwrap_or(false)
    }

    fn terminate(&self) {
        warn!("{} Terminated by user", prefix::STOP);
        std::process::exit(TERMINATED_EXIT_CODE);
    }
}
