//! pycalc - Main Entry Point
//!
//! Evaluates Python typed on stdin through a persistent background REPL.
//!
//! Usage:
//!     pycalc
//!     pycalc --settings ~/.config/pycalc.json --log-level debug

use clap::Parser;
use pycalc::tracing::prefix;
use pycalc_python::session::python_version;
use pycalc_python::terminal::{Action, InputParser, TerminalHost};
use pycalc_python::{ReplService, SettingsStore};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tokio::runtime::Handle;
use tokio::task;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "pycalc")]
#[command(about = "Inline Python evaluation backed by a persistent REPL")]
#[command(version)]
struct Args {
    /// Settings file (JSON); created on first toggle
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Log level filter when RUST_LOG is unset (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    pycalc::tracing::init_with_filter(&args.log_level);

    info!("{} Starting pycalc", prefix::START);
    info!("  Version: {}", env!("CARGO_PKG_VERSION"));
    info!("  Python: {}", python_version());

    let settings = match &args.settings {
        Some(path) => SettingsStore::open(path)?,
        None => SettingsStore::default(),
    };

    let host = Arc::new(TerminalHost::new());
    let service = ReplService::python(Arc::new(settings), host.clone(), Handle::current())?;

    let lines = spawn_stdin_reader()?;
    let mut parser = InputParser::default();

    loop {
        let rx = lines.clone();
        let Some(line) = task::spawn_blocking(move || rx.recv().ok()).await? else {
            break;
        };

        // An open termination prompt owns the next line.
        if host.answer(&line) {
            continue;
        }

        let outcome = match parser.feed(&line) {
            Some(Action::EvaluateLine(text)) => service.evaluate_line(&text, text.chars().count()),
            Some(Action::EvaluateBlock(text)) => service.evaluate_selection(&text),
            Some(Action::Toggle) => service.toggle().map(show_enabled),
            Some(Action::SetEnabled(enabled)) => {
                service.set_enabled(enabled).map(|_| show_enabled(enabled))
            }
            Some(Action::Quit) => break,
            None => Ok(()),
        };

        if let Err(e) = outcome {
            error!("{}", e);
        }
    }

    info!("{} pycalc exiting", prefix::STOP);
    // The worker may still be inside user code and the pump inside a blocking
    // dequeue; neither is joined.
    std::process::exit(0)
}

fn show_enabled(enabled: bool) {
    eprintln!("pycalc [{}]", if enabled { "✓" } else { "×" });
}

/// Read stdin on a dedicated thread so the runtime never blocks on it.
fn spawn_stdin_reader() -> std::io::Result<crossbeam_channel::Receiver<String>> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let _reader = thread::Builder::new()
        .name("pycalc-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("stdin read error: {}", e);
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}
