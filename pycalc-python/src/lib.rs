//! pycalc Python backend
//!
//! Evaluates Python typed into an editor through one persistent interpreter
//! running on a background thread, and writes the output back into the editor.
//!
//! ## Module Structure
//!
//! - `session` - Interpreter trait and the embedded Python session
//! - `capture` - stdout/stderr redirection for one evaluation
//! - `channel` - Request/result queues between caller and worker
//! - `worker` - Background evaluation loop
//! - `pump` - Recurring task applying results to the editor
//! - `service` - Lifecycle and entry actions
//! - `host` - Editor collaborator trait
//! - `config` - Settings
//! - `terminal` - Terminal stand-in for an editor

pub mod capture;
pub mod channel;
pub mod config;
pub mod host;
pub mod pump;
pub mod service;
pub mod session;
pub mod terminal;
pub mod worker;

pub use channel::{EvaluationResult, Snippet};
pub use config::{Settings, SettingsStore};
pub use host::EditorHost;
pub use service::ReplService;
pub use session::{Interpreter, PythonSession};
