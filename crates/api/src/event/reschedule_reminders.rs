use super::cancel_reminders::CancelEventRemindersUseCase;
use super::schedule_reminders::{self, ScheduleEventRemindersUseCase};
use crate::shared::usecase::{execute, UseCase};
use campus_notify_domain::{DelayedJob, ID};
use campus_notify_infra::Context;

/// Replaces an event's reminders after its start date changed.
///
/// All three offsets are cancelled and rescheduled from scratch, so an
/// event moved closer to now may come back with fewer reminders than it
/// had before.
#[derive(Debug)]
pub struct RescheduleEventRemindersUseCase {
    pub event_id: ID,
    pub event_name: String,
    pub event_location: Option<String>,
    pub start_date: String,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidStartDate(String),
    StorageError,
}

impl From<schedule_reminders::UseCaseError> for UseCaseError {
    fn from(e: schedule_reminders::UseCaseError) -> Self {
        match e {
            schedule_reminders::UseCaseError::InvalidStartDate(d) => Self::InvalidStartDate(d),
            schedule_reminders::UseCaseError::StorageError => Self::StorageError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for RescheduleEventRemindersUseCase {
    type Response = Vec<DelayedJob>;

    type Error = UseCaseError;

    const NAME: &'static str = "RescheduleEventReminders";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        // Validate the new date before touching the existing jobs, a
        // bad update should not wipe the reminders already in place.
        campus_notify_domain::date::parse_start_date(&self.start_date)
            .map_err(|e| UseCaseError::InvalidStartDate(e.0))?;

        execute(
            CancelEventRemindersUseCase {
                event_id: self.event_id.clone(),
            },
            ctx,
        )
        .await
        .map_err(|_| UseCaseError::StorageError)?;

        execute(
            ScheduleEventRemindersUseCase {
                event_id: self.event_id.clone(),
                event_name: self.event_name.clone(),
                event_location: self.event_location.clone(),
                start_date: self.start_date.clone(),
            },
            ctx,
        )
        .await
        .map_err(|e| e.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use campus_notify_domain::ReminderOffset;
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

    fn iso(ts: i64) -> String {
        Utc.timestamp_millis(ts).to_rfc3339()
    }

    #[tokio::test]
    async fn moves_all_reminders_to_the_new_start_date() {
        let now = 1_600_000_000_000;
        let ctx = Context::create_inmemory(
            Arc::new(InMemoryPushTransport::new()),
            Arc::new(StaticSys { now }),
        );
        let event_id = ID::new();
        let old_start = now + Duration::hours(30).num_milliseconds();
        let new_start = now + Duration::hours(50).num_milliseconds();

        execute(
            ScheduleEventRemindersUseCase {
                event_id: event_id.clone(),
                event_name: "Hackathon".into(),
                event_location: None,
                start_date: iso(old_start),
            },
            &ctx,
        )
        .await
        .unwrap();

        let jobs = execute(
            RescheduleEventRemindersUseCase {
                event_id: event_id.clone(),
                event_name: "Hackathon".into(),
                event_location: None,
                start_date: iso(new_start),
            },
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(jobs.len(), 3);
        assert_eq!(ctx.queue.list_pending().await.len(), 3);
        let job = ctx
            .queue
            .get(&ReminderOffset::TwentyFourHours.job_id(&event_id))
            .await
            .unwrap();
        assert_eq!(job.run_at, new_start - ReminderOffset::TwentyFourHours.millis());
    }

    #[tokio::test]
    async fn invalid_new_date_keeps_the_old_reminders() {
        let now = 1_600_000_000_000;
        let ctx = Context::create_inmemory(
            Arc::new(InMemoryPushTransport::new()),
            Arc::new(StaticSys { now }),
        );
        let event_id = ID::new();
        execute(
            ScheduleEventRemindersUseCase {
                event_id: event_id.clone(),
                event_name: "Hackathon".into(),
                event_location: None,
                start_date: iso(now + Duration::hours(30).num_milliseconds()),
            },
            &ctx,
        )
        .await
        .unwrap();

        let res = execute(
            RescheduleEventRemindersUseCase {
                event_id,
                event_name: "Hackathon".into(),
                event_location: None,
                start_date: "garbage".into(),
            },
            &ctx,
        )
        .await;

        assert!(matches!(res, Err(UseCaseError::InvalidStartDate(_))));
        assert_eq!(ctx.queue.list_pending().await.len(), 3);
    }
}
