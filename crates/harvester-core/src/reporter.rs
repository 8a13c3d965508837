/// Sink for progress messages the orchestrator emits while it works. The
/// CLI adapts this to stderr lines; tests can collect into a `Vec`.
pub trait Reporter {
    fn info(&mut self, msg: &str);
    fn warn(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
}

/// Discards everything. Used by callers (and most tests) that only care
/// about the returned run report, not the narration.
pub struct NullReporter;

impl Reporter for NullReporter {
    fn info(&mut self, _msg: &str) {}
    fn warn(&mut self, _msg: &str) {}
    fn error(&mut self, _msg: &str) {}
}
