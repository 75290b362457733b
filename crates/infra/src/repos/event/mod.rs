mod inmemory;
mod postgres;

pub use inmemory::InMemoryEventRepo;
pub use postgres::PostgresEventRepo;

use campus_notify_domain::{Event, ID};

/// Read access to the event store plus the one mutation the engine
/// performs itself: deactivating an expired event.
#[async_trait::async_trait]
pub trait IEventRepo: Send + Sync {
    async fn insert(&self, e: &Event) -> anyhow::Result<()>;
    async fn save(&self, e: &Event) -> anyhow::Result<()>;
    async fn find(&self, event_id: &ID) -> Option<Event>;
    /// All events still marked active, scanned by the expiration
    /// recovery routine on startup
    async fn find_active(&self) -> anyhow::Result<Vec<Event>>;
    async fn delete(&self, event_id: &ID) -> Option<Event>;
}
