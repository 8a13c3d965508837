use std::fmt;

use serde::{Deserialize, Serialize};

/// Storage shape a source produces: `Aggregation` sources are persisted as
/// daily snapshots, `Blog` sources as individually versioned items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Aggregation,
    Blog,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Aggregation => write!(f, "aggregation"),
            SourceKind::Blog => write!(f, "blog"),
        }
    }
}

/// Transport a source's adapter speaks. Drives which concrete adapter the
/// registry binds to the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Api,
    Rss,
    Html,
    Agent,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Api => write!(f, "api"),
            Transport::Rss => write!(f, "rss"),
            Transport::Html => write!(f, "html"),
            Transport::Agent => write!(f, "agent"),
        }
    }
}

/// Static, immutable descriptor for a source. The registry holds an ordered
/// sequence of these; the orchestrator drives them one at a time (or
/// concurrently, bounded, per the resource model).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub id: String,
    pub name: String,
    pub kind: SourceKind,
    pub transport: Transport,
    pub enabled: bool,
}
