use crate::shared::usecase::UseCase;
use campus_notify_domain::{date, DelayedJob, JobPayload, ReminderOffset, ID};
use campus_notify_infra::{Context, EnqueueOptions};
use tracing::info;

/// Schedules the upcoming reminder notifications for an event.
///
/// One delayed job per fixed offset (24h, 5h, 15m before start), each
/// under its deterministic id so that repeated scheduling of the same
/// event never duplicates jobs. Offsets whose fire time is not strictly
/// in the future are skipped silently: late reminders are dropped, not
/// backfilled.
#[derive(Debug)]
pub struct ScheduleEventRemindersUseCase {
    pub event_id: ID,
    pub event_name: String,
    pub event_location: Option<String>,
    /// Start date as received from the event store. Partial ISO-8601
    /// strings are normalized, anything unparseable is a validation
    /// error for the caller.
    pub start_date: String,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidStartDate(String),
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for ScheduleEventRemindersUseCase {
    type Response = Vec<DelayedJob>;

    type Error = UseCaseError;

    const NAME: &'static str = "ScheduleEventReminders";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let start_ts = date::parse_start_date(&self.start_date)
            .map_err(|e| UseCaseError::InvalidStartDate(e.0))?;
        let now = ctx.sys.get_timestamp_millis();
        let retry = ctx.config.reminder_retry;

        let mut scheduled = Vec::new();
        for offset in &ReminderOffset::ALL {
            let fire_at = offset.fire_at(start_ts);
            if fire_at <= now {
                info!(
                    "Skipping {} reminder for event {}, fire time is in the past",
                    offset, self.event_id
                );
                continue;
            }

            let payload = JobPayload::EventReminder {
                event_id: self.event_id.clone(),
                event_name: self.event_name.clone(),
                event_location: self.event_location.clone(),
                event_start_ts: start_ts,
                offset: *offset,
                scheduled_at: now,
            };
            let job = ctx
                .queue
                .enqueue(
                    offset.job_id(&self.event_id),
                    payload,
                    EnqueueOptions {
                        delay_millis: fire_at - now,
                        max_attempts: retry.max_attempts,
                        backoff: retry.backoff,
                    },
                )
                .await
                .map_err(|_| UseCaseError::StorageError)?;
            scheduled.push(job);
        }

        info!(
            "Scheduled {} reminder(s) for event {}",
            scheduled.len(),
            self.event_id
        );
        Ok(scheduled)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::usecase::execute;
    use campus_notify_domain::JobState;
    use campus_notify_infra::InMemoryPushTransport;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    struct StaticSys {
        now: i64,
    }
    impl campus_notify_infra::ISys for StaticSys {
        fn get_timestamp_millis(&self) -> i64 {
            self.now
        }
    }

    fn ctx_at(now: i64) -> Context {
        Context::create_inmemory(
            Arc::new(InMemoryPushTransport::new()),
            Arc::new(StaticSys { now }),
        )
    }

    fn iso(ts_millis: i64) -> String {
        Utc.timestamp_millis(ts_millis).to_rfc3339()
    }

    fn usecase(event_id: &ID, start_date: String) -> ScheduleEventRemindersUseCase {
        ScheduleEventRemindersUseCase {
            event_id: event_id.clone(),
            event_name: "Chess night".into(),
            event_location: Some("Student union".into()),
            start_date,
        }
    }

    #[tokio::test]
    async fn event_far_in_the_future_gets_all_three_reminders() {
        let now = 1_600_000_000_000;
        let ctx = ctx_at(now);
        let event_id = ID::new();
        let start = now + Duration::hours(26).num_milliseconds();

        let jobs = execute(usecase(&event_id, iso(start)), &ctx).await.unwrap();

        assert_eq!(jobs.len(), 3);
        let pending = ctx.queue.list_pending().await;
        assert_eq!(pending.len(), 3);
        for offset in &ReminderOffset::ALL {
            let id = offset.job_id(&event_id);
            let job = ctx.queue.get(&id).await.unwrap();
            assert_eq!(job.state, JobState::Pending);
            assert_eq!(job.run_at, start - offset.millis());
        }
    }

    #[tokio::test]
    async fn event_starting_soon_gets_no_reminders() {
        let now = 1_600_000_000_000;
        let ctx = ctx_at(now);
        let start = now + Duration::minutes(10).num_milliseconds();

        let jobs = execute(usecase(&ID::new(), iso(start)), &ctx).await.unwrap();

        assert!(jobs.is_empty());
        assert!(ctx.queue.list_pending().await.is_empty());
    }

    #[tokio::test]
    async fn event_within_a_day_gets_only_the_near_offsets() {
        let now = 1_600_000_000_000;
        let ctx = ctx_at(now);
        let start = now + Duration::hours(6).num_milliseconds();

        let jobs = execute(usecase(&ID::new(), iso(start)), &ctx).await.unwrap();

        // 24h is already past, 5h and 15m are still ahead
        assert_eq!(jobs.len(), 2);
    }

    #[tokio::test]
    async fn fire_time_equal_to_now_is_treated_as_past() {
        let now = 1_600_000_000_000;
        let ctx = ctx_at(now);
        let start = now + ReminderOffset::FifteenMinutes.millis();

        let jobs = execute(usecase(&ID::new(), iso(start)), &ctx).await.unwrap();

        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn partial_iso_start_dates_are_accepted() {
        let ctx = ctx_at(0);
        let jobs = execute(usecase(&ID::new(), "2021-06-01T18:30".into()), &ctx)
            .await
            .unwrap();
        assert_eq!(jobs.len(), 3);
    }

    #[tokio::test]
    async fn malformed_start_date_is_a_validation_error() {
        let ctx = ctx_at(0);
        let res = execute(usecase(&ID::new(), "not a date".into()), &ctx).await;
        assert_eq!(
            res.unwrap_err(),
            UseCaseError::InvalidStartDate("not a date".into())
        );
        assert!(ctx.queue.list_pending().await.is_empty());
    }

    #[tokio::test]
    async fn scheduling_twice_does_not_duplicate_jobs() {
        let now = 1_600_000_000_000;
        let ctx = ctx_at(now);
        let event_id = ID::new();
        let start = iso(now + Duration::hours(30).num_milliseconds());

        execute(usecase(&event_id, start.clone()), &ctx).await.unwrap();
        execute(usecase(&event_id, start), &ctx).await.unwrap();

        assert_eq!(ctx.queue.list_pending().await.len(), 3);
    }
}
