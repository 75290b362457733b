use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};

/// Snapshot of an event as owned by the external event store.
///
/// The notification engine only reads these and requests a single
/// mutation: flipping `is_active` to false once the event has expired.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: ID,
    pub name: String,
    pub location: Option<String>,
    /// Start of the event as a UTC timestamp in millis
    pub start_ts: i64,
    /// False once the event has expired (24 hours after start)
    pub is_active: bool,
    /// Closed events accept no further participants and send no reminders
    pub is_closed: bool,
    pub participants: Vec<ID>,
    pub creator_id: ID,
    pub created: i64,
}

impl Entity for Event {
    fn id(&self) -> &ID {
        &self.id
    }
}

impl Event {
    /// Timestamp at which this event expires and should be deactivated
    pub fn expires_at(&self) -> i64 {
        self.start_ts + 24 * 60 * 60 * 1000
    }
}
