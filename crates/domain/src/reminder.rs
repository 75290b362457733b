use crate::job::JobId;
use crate::shared::entity::ID;
use serde::{Deserialize, Serialize};

/// A fixed duration before an event's start at which the participants
/// should receive a reminder notification.
///
/// Every event gets at most one pending reminder job per offset, the
/// deterministic job id `"{event_id}-{label}"` is the idempotency key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderOffset {
    TwentyFourHours,
    FiveHours,
    FifteenMinutes,
}

impl ReminderOffset {
    pub const ALL: [ReminderOffset; 3] = [
        ReminderOffset::TwentyFourHours,
        ReminderOffset::FiveHours,
        ReminderOffset::FifteenMinutes,
    ];

    /// Short label used in job ids and notification data
    pub fn label(&self) -> &'static str {
        match self {
            ReminderOffset::TwentyFourHours => "24h",
            ReminderOffset::FiveHours => "5h",
            ReminderOffset::FifteenMinutes => "15m",
        }
    }

    pub fn millis(&self) -> i64 {
        match self {
            ReminderOffset::TwentyFourHours => 24 * 60 * 60 * 1000,
            ReminderOffset::FiveHours => 5 * 60 * 60 * 1000,
            ReminderOffset::FifteenMinutes => 15 * 60 * 1000,
        }
    }

    /// Text used in the notification body, e.g. "starts in 5 hours"
    pub fn humanized(&self) -> &'static str {
        match self {
            ReminderOffset::TwentyFourHours => "24 hours",
            ReminderOffset::FiveHours => "5 hours",
            ReminderOffset::FifteenMinutes => "15 minutes",
        }
    }

    pub fn job_id(&self, event_id: &ID) -> JobId {
        JobId::new(format!("{}-{}", event_id, self.label()))
    }

    /// The instant the reminder for an event starting at `start_ts`
    /// should fire
    pub fn fire_at(&self, start_ts: i64) -> i64 {
        start_ts - self.millis()
    }
}

impl std::fmt::Display for ReminderOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
