//! The editor the REPL core writes back into.

/// Side effects the core asks of the hosting editor.
///
/// Called from the result pump's task and from the blocking pool, so
/// implementations must be thread-safe.
pub trait EditorHost: Send + Sync + 'static {
    /// Insert text at the current cursor location
    fn insert_text(&self, text: &str);

    /// Append text to the auxiliary output panel and show it
    fn show_panel(&self, text: &str);

    /// Hide the auxiliary output panel
    fn hide_panel(&self);

    /// Ask a yes/no question; may block until the user answers
    fn confirm(&self, message: &str) -> bool;

    /// Tear down the process-level execution context
    fn terminate(&self);
}
