use crate::reminder::ReminderOffset;
use crate::shared::entity::ID;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Idempotency key of a `DelayedJob`.
///
/// Deterministic per piece of scheduled work: `"{event_id}-{offset}"`
/// for reminders and the plain event id for expirations. Enqueuing an
/// id that already has a pending job is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&ID> for JobId {
    fn from(id: &ID) -> Self {
        Self(id.as_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Parked until `run_at`, or ready and waiting for a worker
    Pending,
    /// Claimed by a worker, being processed
    Active,
    Completed,
    /// Attempts exhausted or failure marked non-retryable. Kept for
    /// manual inspection, never retried automatically.
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Active => "active",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }
}

impl std::str::FromStr for JobState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobState::Pending),
            "active" => Ok(JobState::Active),
            "completed" => Ok(JobState::Completed),
            "failed" => Ok(JobState::Failed),
            _ => Err(anyhow::anyhow!("Unknown job state: {}", s)),
        }
    }
}

/// Delay strategy between retry attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Backoff {
    Fixed { delay_millis: i64 },
    Exponential { initial_millis: i64 },
}

impl Backoff {
    /// Delay before the given retry attempt, 1-indexed: the first retry
    /// of an exponential backoff waits `initial_millis`, the second
    /// twice that, and so on.
    pub fn delay_for_attempt(&self, attempt: u32) -> i64 {
        match self {
            Backoff::Fixed { delay_millis } => *delay_millis,
            Backoff::Exponential { initial_millis } => {
                initial_millis * 2_i64.pow(attempt.saturating_sub(1))
            }
        }
    }
}

/// What a job does once it fires, tagged by job type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobPayload {
    /// Remind the participants of an upcoming event. The snapshot
    /// fields only feed the notification text, participant list and
    /// open/closed state are reloaded fresh when the job fires.
    EventReminder {
        event_id: ID,
        event_name: String,
        event_location: Option<String>,
        event_start_ts: i64,
        offset: ReminderOffset,
        scheduled_at: i64,
    },
    /// Deactivate an event 24 hours after its start
    EventExpiration {
        event_id: ID,
        event_name: String,
        expire_at: i64,
    },
}

impl JobPayload {
    pub fn job_name(&self) -> &'static str {
        match self {
            JobPayload::EventReminder { .. } => "send-event-reminder",
            JobPayload::EventExpiration { .. } => "expire-event",
        }
    }
}

/// A queue entry eligible for execution only after its delay has
/// elapsed. Survives process restarts when backed by a durable store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayedJob {
    pub id: JobId,
    pub payload: JobPayload,
    /// Earliest instant a worker may pick this job up
    pub run_at: i64,
    pub state: JobState,
    /// Number of processing attempts performed so far
    pub attempts: u32,
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// Set while `Active`, used to detect stalled workers
    pub claimed_at: Option<i64>,
    pub last_error: Option<String>,
    /// Short summary of the handler result once completed
    pub result: Option<String>,
    pub created: i64,
}

/// A handler failure with retry as a first-class decision.
///
/// Workers never rely on exceptions to force redelivery: a handler that
/// wants the queue to try again returns `retry: true`, everything else
/// goes straight to the failed set.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFailure {
    pub reason: String,
    pub retry: bool,
}

impl JobFailure {
    pub fn retryable(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            retry: true,
        }
    }

    pub fn fatal(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            retry: false,
        }
    }
}

/// Point-in-time queue counters for the observability surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    pub waiting: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
    pub pending_jobs: Vec<PendingJob>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingJob {
    pub id: JobId,
    pub scheduled_fire_time: i64,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exponential_backoff_doubles_per_attempt() {
        let backoff = Backoff::Exponential {
            initial_millis: 2000,
        };
        assert_eq!(backoff.delay_for_attempt(1), 2000);
        assert_eq!(backoff.delay_for_attempt(2), 4000);
        assert_eq!(backoff.delay_for_attempt(3), 8000);
    }

    #[test]
    fn fixed_backoff_is_constant() {
        let backoff = Backoff::Fixed { delay_millis: 5000 };
        assert_eq!(backoff.delay_for_attempt(1), 5000);
        assert_eq!(backoff.delay_for_attempt(4), 5000);
    }

    #[test]
    fn payload_serializes_with_type_tag() {
        let payload = JobPayload::EventExpiration {
            event_id: ID::new(),
            event_name: "Chess night".into(),
            expire_at: 1000,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "event_expiration");
    }
}
