use thiserror::Error;

/// Error taxonomy surfaced in run reports and adapter results.
///
/// Every variant here corresponds to a failure kind a source can produce; the
/// orchestrator never panics on any of them, it folds them into a per-source
/// failure entry via [`std::fmt::Display`].
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("http {status} fetching {url}")]
    Http { status: u16, url: String },

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("extract failed: {0}")]
    Extract(String),

    #[error("blocked content matched pattern: {0}")]
    BlockedContent(String),

    #[error("agent-browser launch failed: {0}")]
    AgentLaunchFailed(String),

    #[error("agent-browser produced unparseable output: {0}")]
    AgentBadOutput(String),

    #[error("agent-browser page carried no iframe: {0}")]
    AgentNoIframe(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("unknown source: {0}")]
    UnknownSource(String),

    #[error("invalid argument: {0}")]
    ValueError(String),
}

impl From<std::io::Error> for HarvestError {
    fn from(err: std::io::Error) -> Self {
        HarvestError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for HarvestError {
    fn from(err: serde_json::Error) -> Self {
        HarvestError::Io(format!("json: {err}"))
    }
}
