use harvester_http::FetchContext;
use harvester_types::{Item, Result, SourceDescriptor};

/// A source's fetch behavior. The registry binds exactly one adapter to each
/// [`SourceDescriptor`]; the orchestrator never inspects the transport
/// itself, it just calls `fetch`.
pub trait Adapter: Send + Sync {
    fn descriptor(&self) -> &SourceDescriptor;
    fn fetch(&self, ctx: &FetchContext) -> Result<Vec<Item>>;

    /// Whether this source can be dispatched right now. Most adapters need
    /// nothing beyond network access, so the default is always available;
    /// [`AgentAdapter`](crate::adapters::AgentAdapter) overrides this to
    /// check for its subprocess binary so a missing install surfaces as a
    /// skipped source instead of a spawn failure per run.
    fn is_available(&self) -> bool {
        true
    }
}
