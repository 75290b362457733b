mod inmemory;
mod postgres;

pub use inmemory::InMemoryJobRepo;
pub use postgres::PostgresJobRepo;

use campus_notify_domain::{DelayedJob, JobId, JobState};

/// Durable, time-ordered store of delayed jobs. Jobs survive process
/// restarts when backed by postgres; the in-memory backend exists for
/// tests.
#[async_trait::async_trait]
pub trait IJobRepo: Send + Sync {
    async fn insert(&self, job: &DelayedJob) -> anyhow::Result<()>;
    async fn save(&self, job: &DelayedJob) -> anyhow::Result<()>;
    async fn find(&self, job_id: &JobId) -> Option<DelayedJob>;
    async fn find_by_state(&self, state: JobState) -> Vec<DelayedJob>;
    /// Deletes the job only while it is still pending. A job already
    /// claimed by a worker (or finished) is left alone, which is what
    /// makes cancellation best-effort.
    async fn delete_pending(&self, job_id: &JobId) -> Option<DelayedJob>;
    /// Deletes the job regardless of state. Used when a finished job's
    /// id is being reused by a fresh enqueue.
    async fn delete(&self, job_id: &JobId) -> Option<DelayedJob>;
    /// Atomically flips due pending jobs to `Active` and returns them.
    /// Each job instance is handed to exactly one caller.
    async fn claim_due(&self, now: i64, limit: i64) -> anyhow::Result<Vec<DelayedJob>>;
    /// Hands `Active` jobs claimed before the given instant back to the
    /// pending set. This is what redelivers jobs lost to a worker crash
    /// and the reason handlers must tolerate duplicate delivery.
    async fn reclaim_stalled(&self, claimed_before: i64) -> anyhow::Result<Vec<DelayedJob>>;
    /// Deletes all but the most recently fired `keep` completed jobs,
    /// so the store does not grow without bound under normal operation.
    /// Returns the number of rows removed.
    async fn prune_completed(&self, keep: i64) -> anyhow::Result<u64>;
}
