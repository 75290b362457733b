use super::IEventRepo;
use crate::repos::shared::inmemory_repo::*;
use campus_notify_domain::{Event, ID};

pub struct InMemoryEventRepo {
    events: std::sync::Mutex<Vec<Event>>,
}

impl InMemoryEventRepo {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IEventRepo for InMemoryEventRepo {
    async fn insert(&self, e: &Event) -> anyhow::Result<()> {
        insert(e, &self.events);
        Ok(())
    }

    async fn save(&self, e: &Event) -> anyhow::Result<()> {
        save(e, &self.events);
        Ok(())
    }

    async fn find(&self, event_id: &ID) -> Option<Event> {
        find(event_id, &self.events)
    }

    async fn find_active(&self) -> anyhow::Result<Vec<Event>> {
        Ok(find_by(&self.events, |event| event.is_active))
    }

    async fn delete(&self, event_id: &ID) -> Option<Event> {
        delete(event_id, &self.events)
    }
}
