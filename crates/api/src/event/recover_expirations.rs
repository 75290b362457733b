use crate::shared::usecase::UseCase;
use campus_notify_domain::{JobId, JobPayload};
use campus_notify_infra::{Context, EnqueueOptions};
use tracing::{info, warn};

/// Startup sweep over all active events. Events whose expiration window
/// already elapsed are deactivated on the spot, the rest get their
/// delayed expiration job (re)enqueued. Makes the engine converge after
/// downtime or a lost queue.
#[derive(Debug)]
pub struct RecoverEventExpirationsUseCase;

#[derive(Debug, Default, PartialEq)]
pub struct RecoveryReport {
    /// Events deactivated synchronously during the sweep
    pub deactivated: usize,
    /// Events that got a delayed expiration job
    pub scheduled: usize,
}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for RecoverEventExpirationsUseCase {
    type Response = RecoveryReport;

    type Error = UseCaseError;

    const NAME: &'static str = "RecoverEventExpirations";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let events = ctx
            .repos
            .events
            .find_active()
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        let now = ctx.sys.get_timestamp_millis();
        let retry = ctx.config.expiration_retry;

        let mut report = RecoveryReport::default();
        for event in events {
            let expire_at = event.expires_at();
            if expire_at <= now {
                let mut event = event;
                event.is_active = false;
                if let Err(e) = ctx.repos.events.save(&event).await {
                    warn!("Failed to deactivate expired event {}: {:?}", event.id, e);
                    continue;
                }
                report.deactivated += 1;
            } else {
                let res = ctx
                    .queue
                    .enqueue(
                        JobId::from(&event.id),
                        JobPayload::EventExpiration {
                            event_id: event.id.clone(),
                            event_name: event.name.clone(),
                            expire_at,
                        },
                        EnqueueOptions {
                            delay_millis: expire_at - now,
                            max_attempts: retry.max_attempts,
                            backoff: retry.backoff,
                        },
                    )
                    .await;
                match res {
                    Ok(_) => report.scheduled += 1,
                    Err(e) => warn!(
                        "Failed to schedule expiration for event {}: {:?}",
                        event.id, e
                    ),
                }
            }
        }
        info!(
            "Expiration recovery done, {} deactivated and {} scheduled",
            report.deactivated, report.scheduled
        );
        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::usecase::execute;
    use campus_notify_domain::{Event, JobState, ID};
    use campus_notify_infra::InMemoryPushTransport;
    use std::sync::Arc;

    struct StaticSys {
        now: i64,
    }
    impl campus_notify_infra::ISys for StaticSys {
        fn get_timestamp_millis(&self) -> i64 {
            self.now
        }
    }

    fn event(start_ts: i64, is_active: bool) -> Event {
        Event {
            id: ID::new(),
            name: "Recovered".into(),
            location: None,
            start_ts,
            is_active,
            is_closed: false,
            participants: Vec::new(),
            creator_id: ID::new(),
            created: 0,
        }
    }

    #[tokio::test]
    async fn sweep_deactivates_stale_events_and_schedules_the_rest() {
        let now = 1_600_000_000_000;
        let ctx = Context::create_inmemory(
            Arc::new(InMemoryPushTransport::new()),
            Arc::new(StaticSys { now }),
        );
        let stale = event(now - 48 * 60 * 60 * 1000, true);
        let upcoming = event(now + 60 * 60 * 1000, true);
        let inactive = event(now - 72 * 60 * 60 * 1000, false);
        for e in [&stale, &upcoming, &inactive] {
            ctx.repos.events.insert(e).await.unwrap();
        }

        let report = execute(RecoverEventExpirationsUseCase, &ctx).await.unwrap();

        assert_eq!(
            report,
            RecoveryReport {
                deactivated: 1,
                scheduled: 1
            }
        );
        assert!(!ctx.repos.events.find(&stale.id).await.unwrap().is_active);
        let job = ctx.queue.get(&JobId::from(&upcoming.id)).await.unwrap();
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.run_at, upcoming.expires_at());
    }

    #[tokio::test]
    async fn sweep_is_idempotent() {
        let now = 1_600_000_000_000;
        let ctx = Context::create_inmemory(
            Arc::new(InMemoryPushTransport::new()),
            Arc::new(StaticSys { now }),
        );
        ctx.repos
            .events
            .insert(&event(now + 60 * 60 * 1000, true))
            .await
            .unwrap();

        execute(RecoverEventExpirationsUseCase, &ctx).await.unwrap();
        let report = execute(RecoverEventExpirationsUseCase, &ctx).await.unwrap();

        assert_eq!(report.scheduled, 1);
        assert_eq!(ctx.queue.list_pending().await.len(), 1);
    }
}
