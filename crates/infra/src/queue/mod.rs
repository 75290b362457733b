use crate::repos::IJobRepo;
use crate::system::ISys;
use campus_notify_domain::{
    Backoff, DelayedJob, JobFailure, JobId, JobPayload, JobState, PendingJob, QueueStats,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Options for a single enqueue. Retry limits and backoff are decided
/// by the caller per job type.
#[derive(Debug, Clone, Copy)]
pub struct EnqueueOptions {
    pub delay_millis: i64,
    pub max_attempts: u32,
    pub backoff: Backoff,
}

/// Durable delayed-job queue.
///
/// The deterministic job id is the only concurrency guard: enqueuing an
/// id that already has a pending or active job returns that job instead
/// of creating a duplicate. A finished (completed/failed) job under the
/// same id is replaced, which is what lets a rescheduled event reuse
/// its reminder ids after an earlier offset already fired.
///
/// Delivery is at-least-once. `claim_due` hands a job instance to one
/// caller at a time, but a crashed worker gets its jobs re-delivered
/// through `reclaim_stalled`, so handlers must tolerate duplicates.
#[derive(Clone)]
pub struct JobQueue {
    jobs: Arc<dyn IJobRepo>,
    sys: Arc<dyn ISys>,
    stalled_timeout_millis: i64,
}

impl JobQueue {
    pub fn new(jobs: Arc<dyn IJobRepo>, sys: Arc<dyn ISys>, stalled_timeout_millis: i64) -> Self {
        Self {
            jobs,
            sys,
            stalled_timeout_millis,
        }
    }

    pub async fn enqueue(
        &self,
        job_id: JobId,
        payload: JobPayload,
        opts: EnqueueOptions,
    ) -> anyhow::Result<DelayedJob> {
        if let Some(existing) = self.jobs.find(&job_id).await {
            match existing.state {
                JobState::Pending | JobState::Active => {
                    info!(
                        "Job {} already scheduled, returning the existing job",
                        job_id
                    );
                    return Ok(existing);
                }
                JobState::Completed | JobState::Failed => {
                    // The id is being reused, e.g. an event was
                    // rescheduled after one of its reminders already
                    // fired. Drop the finished row and enqueue fresh.
                    self.jobs.delete(&job_id).await;
                }
            }
        }

        let now = self.sys.get_timestamp_millis();
        let job = DelayedJob {
            id: job_id,
            payload,
            run_at: now + opts.delay_millis,
            state: JobState::Pending,
            attempts: 0,
            max_attempts: opts.max_attempts,
            backoff: opts.backoff,
            claimed_at: None,
            last_error: None,
            result: None,
            created: now,
        };
        self.jobs.insert(&job).await?;
        Ok(job)
    }

    pub async fn get(&self, job_id: &JobId) -> Option<DelayedJob> {
        self.jobs.find(job_id).await
    }

    /// Best-effort cancellation: true if a pending job was removed,
    /// false when the job is absent, already claimed or finished.
    pub async fn cancel(&self, job_id: &JobId) -> bool {
        self.jobs.delete_pending(job_id).await.is_some()
    }

    /// Due jobs for a worker to process, each flipped to `Active` so no
    /// other worker receives the same instance
    pub async fn claim_due(&self, limit: i64) -> Vec<DelayedJob> {
        let now = self.sys.get_timestamp_millis();
        match self.jobs.claim_due(now, limit).await {
            Ok(jobs) => jobs,
            Err(e) => {
                error!("Unable to claim due jobs: {:?}", e);
                Vec::new()
            }
        }
    }

    /// Returns jobs stuck in `Active` beyond the stalled timeout to the
    /// pending set
    pub async fn reclaim_stalled(&self) -> Vec<DelayedJob> {
        let claimed_before = self.sys.get_timestamp_millis() - self.stalled_timeout_millis;
        match self.jobs.reclaim_stalled(claimed_before).await {
            Ok(jobs) => {
                if !jobs.is_empty() {
                    warn!("Reclaimed {} stalled job(s) for redelivery", jobs.len());
                }
                jobs
            }
            Err(e) => {
                error!("Unable to reclaim stalled jobs: {:?}", e);
                Vec::new()
            }
        }
    }

    /// Drops old completed jobs beyond the retention limit. Failed jobs
    /// are never pruned, they stay for manual inspection.
    pub async fn prune_completed(&self, keep: i64) -> u64 {
        match self.jobs.prune_completed(keep).await {
            Ok(pruned) => {
                if pruned > 0 {
                    info!("Pruned {} old completed job(s)", pruned);
                }
                pruned
            }
            Err(e) => {
                error!("Unable to prune completed jobs: {:?}", e);
                0
            }
        }
    }

    pub async fn complete(&self, job: &DelayedJob, result: Option<String>) {
        let mut job = job.clone();
        job.state = JobState::Completed;
        job.attempts += 1;
        job.claimed_at = None;
        job.result = result;
        if let Err(e) = self.jobs.save(&job).await {
            error!("Unable to mark job {} as completed: {:?}", job.id, e);
        }
    }

    /// Applies the handler's failure decision: retryable failures are
    /// re-parked with backoff until the attempt limit, everything else
    /// lands in the failed set for manual inspection.
    pub async fn fail(&self, job: &DelayedJob, failure: &JobFailure) {
        let mut job = job.clone();
        job.attempts += 1;
        job.claimed_at = None;
        job.last_error = Some(failure.reason.clone());

        if failure.retry && job.attempts < job.max_attempts {
            let delay = job.backoff.delay_for_attempt(job.attempts);
            job.state = JobState::Pending;
            job.run_at = self.sys.get_timestamp_millis() + delay;
            warn!(
                "Job {} failed (attempt {}/{}), retrying in {} ms: {}",
                job.id, job.attempts, job.max_attempts, delay, failure.reason
            );
        } else {
            job.state = JobState::Failed;
            error!(
                "Job {} moved to the failed set after {} attempt(s): {}",
                job.id, job.attempts, failure.reason
            );
        }

        if let Err(e) = self.jobs.save(&job).await {
            error!("Unable to persist failure for job {}: {:?}", job.id, e);
        }
    }

    pub async fn list_pending(&self) -> Vec<DelayedJob> {
        self.jobs.find_by_state(JobState::Pending).await
    }

    pub async fn list_active(&self) -> Vec<DelayedJob> {
        self.jobs.find_by_state(JobState::Active).await
    }

    pub async fn list_completed(&self) -> Vec<DelayedJob> {
        self.jobs.find_by_state(JobState::Completed).await
    }

    pub async fn list_failed(&self) -> Vec<DelayedJob> {
        self.jobs.find_by_state(JobState::Failed).await
    }

    pub async fn stats(&self) -> QueueStats {
        let pending = self.list_pending().await;
        QueueStats {
            waiting: pending.len(),
            active: self.list_active().await.len(),
            completed: self.list_completed().await.len(),
            failed: self.list_failed().await.len(),
            pending_jobs: pending
                .into_iter()
                .map(|job| PendingJob {
                    id: job.id,
                    scheduled_fire_time: job.run_at,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::repos::Repos;
    use campus_notify_domain::ID;

    struct StaticSys {
        now: i64,
    }
    impl ISys for StaticSys {
        fn get_timestamp_millis(&self) -> i64 {
            self.now
        }
    }

    fn queue_at(now: i64) -> JobQueue {
        let repos = Repos::create_inmemory();
        JobQueue::new(repos.jobs, Arc::new(StaticSys { now }), 1000 * 60 * 5)
    }

    fn expiration_payload() -> JobPayload {
        JobPayload::EventExpiration {
            event_id: ID::new(),
            event_name: "Chess night".into(),
            expire_at: 0,
        }
    }

    fn opts(delay_millis: i64) -> EnqueueOptions {
        EnqueueOptions {
            delay_millis,
            max_attempts: 3,
            backoff: Backoff::Exponential {
                initial_millis: 2000,
            },
        }
    }

    #[tokio::test]
    async fn enqueue_is_idempotent_per_job_id() {
        let queue = queue_at(0);
        let id = JobId::new("event-24h");

        let first = queue
            .enqueue(id.clone(), expiration_payload(), opts(1000))
            .await
            .unwrap();
        let second = queue
            .enqueue(id.clone(), expiration_payload(), opts(99999))
            .await
            .unwrap();

        assert_eq!(first.run_at, second.run_at);
        assert_eq!(queue.list_pending().await.len(), 1);
    }

    #[tokio::test]
    async fn cancel_removes_only_pending_jobs() {
        let queue = queue_at(0);
        let id = JobId::new("event-5h");
        queue
            .enqueue(id.clone(), expiration_payload(), opts(1000))
            .await
            .unwrap();

        assert!(queue.cancel(&id).await);
        // Repeated cancel is a no-op, not an error
        assert!(!queue.cancel(&id).await);
        assert!(!queue.cancel(&JobId::new("absent")).await);
    }

    #[tokio::test]
    async fn claim_due_hands_out_due_jobs_once() {
        let queue = queue_at(1000);
        queue
            .enqueue(JobId::new("due"), expiration_payload(), opts(0))
            .await
            .unwrap();
        queue
            .enqueue(JobId::new("later"), expiration_payload(), opts(60_000))
            .await
            .unwrap();

        let claimed = queue.claim_due(10).await;
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].id, JobId::new("due"));
        assert_eq!(claimed[0].state, JobState::Active);

        // A claimed job is not handed out again and cannot be cancelled
        assert!(queue.claim_due(10).await.is_empty());
        assert!(!queue.cancel(&JobId::new("due")).await);
    }

    #[tokio::test]
    async fn retryable_failures_are_parked_with_backoff() {
        let queue = queue_at(1000);
        queue
            .enqueue(JobId::new("flaky"), expiration_payload(), opts(0))
            .await
            .unwrap();

        let job = queue.claim_due(1).await.remove(0);
        queue
            .fail(&job, &JobFailure::retryable("transport down"))
            .await;

        let retried = queue.get(&JobId::new("flaky")).await.unwrap();
        assert_eq!(retried.state, JobState::Pending);
        assert_eq!(retried.attempts, 1);
        assert_eq!(retried.run_at, 1000 + 2000);
        assert_eq!(retried.last_error.as_deref(), Some("transport down"));
    }

    #[tokio::test]
    async fn exhausted_attempts_land_in_the_failed_set() {
        let queue = queue_at(0);
        queue
            .enqueue(JobId::new("doomed"), expiration_payload(), opts(0))
            .await
            .unwrap();

        for _ in 0..3 {
            let job = queue.claim_due(1).await.remove(0);
            queue
                .fail(&job, &JobFailure::retryable("transport down"))
                .await;
            // Make the retried job due again right away
            if let Some(mut pending) = queue.get(&JobId::new("doomed")).await {
                if pending.state == JobState::Pending {
                    pending.run_at = 0;
                    queue.jobs.save(&pending).await.unwrap();
                }
            }
        }

        let failed = queue.list_failed().await;
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].attempts, 3);
        assert!(queue.claim_due(10).await.is_empty());
    }

    #[tokio::test]
    async fn fatal_failures_skip_retries() {
        let queue = queue_at(0);
        queue
            .enqueue(JobId::new("fatal"), expiration_payload(), opts(0))
            .await
            .unwrap();

        let job = queue.claim_due(1).await.remove(0);
        queue.fail(&job, &JobFailure::fatal("event vanished")).await;

        assert_eq!(queue.list_failed().await.len(), 1);
        assert!(queue.list_pending().await.is_empty());
    }

    #[tokio::test]
    async fn stalled_jobs_are_redelivered() {
        let repos = Repos::create_inmemory();
        let queue = JobQueue::new(
            repos.jobs.clone(),
            Arc::new(StaticSys { now: 0 }),
            1000 * 60 * 5,
        );
        queue
            .enqueue(JobId::new("stalls"), expiration_payload(), opts(0))
            .await
            .unwrap();
        assert_eq!(queue.claim_due(1).await.len(), 1);

        // Same store, clock advanced past the stalled timeout
        let later = JobQueue::new(
            repos.jobs,
            Arc::new(StaticSys {
                now: 1000 * 60 * 10,
            }),
            1000 * 60 * 5,
        );
        let reclaimed = later.reclaim_stalled().await;
        assert_eq!(reclaimed.len(), 1);
        assert_eq!(later.claim_due(1).await.len(), 1);
    }

    #[tokio::test]
    async fn completed_jobs_are_pruned_beyond_the_retention_limit() {
        let repos = Repos::create_inmemory();
        let queue_at_time = |now: i64| {
            JobQueue::new(repos.jobs.clone(), Arc::new(StaticSys { now }), 1000 * 60 * 5)
        };

        // Three jobs completed at distinct fire times
        for now in [1000, 2000, 3000] {
            let queue = queue_at_time(now);
            queue
                .enqueue(
                    JobId::new(format!("done-at-{}", now)),
                    expiration_payload(),
                    opts(0),
                )
                .await
                .unwrap();
            let job = queue.claim_due(1).await.remove(0);
            queue.complete(&job, None).await;
        }
        let queue = queue_at_time(4000);
        queue
            .enqueue(JobId::new("broken"), expiration_payload(), opts(0))
            .await
            .unwrap();
        let job = queue.claim_due(1).await.remove(0);
        queue.fail(&job, &JobFailure::fatal("event vanished")).await;

        assert_eq!(queue.prune_completed(2).await, 1);

        // The oldest completed job is gone, the two most recent stay
        assert_eq!(queue.list_completed().await.len(), 2);
        assert!(queue.get(&JobId::new("done-at-1000")).await.is_none());
        assert!(queue.get(&JobId::new("done-at-3000")).await.is_some());
        // Failed jobs are exempt from retention
        assert_eq!(queue.list_failed().await.len(), 1);

        // Already within the limit, nothing to do
        assert_eq!(queue.prune_completed(2).await, 0);
    }

    #[tokio::test]
    async fn stats_expose_pending_fire_times() {
        let queue = queue_at(0);
        queue
            .enqueue(JobId::new("a"), expiration_payload(), opts(5000))
            .await
            .unwrap();
        queue
            .enqueue(JobId::new("b"), expiration_payload(), opts(10_000))
            .await
            .unwrap();

        let stats = queue.stats().await;
        assert_eq!(stats.waiting, 2);
        assert_eq!(stats.active, 0);
        assert_eq!(stats.pending_jobs.len(), 2);
        assert_eq!(stats.pending_jobs[0].scheduled_fire_time, 5000);
    }
}
