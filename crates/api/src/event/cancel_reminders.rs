use crate::shared::usecase::UseCase;
use campus_notify_domain::{ReminderOffset, ID};
use campus_notify_infra::Context;
use tracing::info;

/// Removes every pending reminder job for an event.
///
/// Best effort by design: jobs that never existed, already fired or are
/// currently claimed by a worker are simply left alone.
#[derive(Debug)]
pub struct CancelEventRemindersUseCase {
    pub event_id: ID,
}

#[derive(Debug)]
pub enum UseCaseError {}

#[async_trait::async_trait(?Send)]
impl UseCase for CancelEventRemindersUseCase {
    type Response = usize;

    type Error = UseCaseError;

    const NAME: &'static str = "CancelEventReminders";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let mut cancelled = 0;
        for offset in &ReminderOffset::ALL {
            if ctx.queue.cancel(&offset.job_id(&self.event_id)).await {
                cancelled += 1;
            }
        }
        info!(
            "Cancelled {} pending reminder(s) for event {}",
            cancelled, self.event_id
        );
        Ok(cancelled)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::schedule_reminders::ScheduleEventRemindersUseCase;
    use crate::shared::usecase::execute;
    use campus_notify_infra::InMemoryPushTransport;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    struct StaticSys {
        now: i64,
    }
    impl campus_notify_infra::ISys for StaticSys {
        fn get_timestamp_millis(&self) -> i64 {
            self.now
        }
    }

    #[tokio::test]
    async fn cancels_all_pending_reminders_and_ignores_misses() {
        let now = 1_600_000_000_000;
        let ctx = Context::create_inmemory(
            Arc::new(InMemoryPushTransport::new()),
            Arc::new(StaticSys { now }),
        );
        let event_id = ID::new();
        execute(
            ScheduleEventRemindersUseCase {
                event_id: event_id.clone(),
                event_name: "Board games".into(),
                event_location: None,
                start_date: Utc.timestamp_millis(now + 30 * 60 * 60 * 1000).to_rfc3339(),
            },
            &ctx,
        )
        .await
        .unwrap();

        let cancelled = execute(CancelEventRemindersUseCase { event_id: event_id.clone() }, &ctx)
            .await
            .unwrap();

        assert_eq!(cancelled, 3);
        assert!(ctx.queue.list_pending().await.is_empty());

        // Second cancel finds nothing and is still fine
        let cancelled = execute(CancelEventRemindersUseCase { event_id }, &ctx)
            .await
            .unwrap();
        assert_eq!(cancelled, 0);
    }
}
