//! Log setup for pycalc binaries.
//!
//! Stdout is where evaluation results are inserted, so logs go to stderr.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a compact stderr subscriber.
///
/// `RUST_LOG` wins over `default_filter` when set. Does nothing if a global
/// subscriber is already installed.
pub fn init_with_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}

/// Leading glyphs that tag which part of the REPL a log line comes from.
pub mod prefix {
    /// Worker, service or process coming up
    pub const START: &str = "▶";
    /// Worker, pump or process going down
    pub const STOP: &str = "■";
    /// Result pump ticks
    pub const PUMP: &str = "⇅";
    /// One snippet evaluation
    pub const EVAL: &str = "λ";
}
