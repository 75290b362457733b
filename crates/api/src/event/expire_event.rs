use crate::shared::usecase::UseCase;
use campus_notify_domain::ID;
use campus_notify_infra::Context;
use tracing::{info, warn};

/// Deactivates an event once its expiration window has elapsed. Runs as
/// the handler of an expiration job, so the event is always reloaded
/// from the store rather than trusted from the job payload.
#[derive(Debug)]
pub struct ExpireEventUseCase {
    pub event_id: ID,
    pub expire_at: i64,
}

#[derive(Debug, PartialEq)]
pub enum ExpireOutcome {
    Deactivated,
    /// Event vanished or was already deactivated, nothing to do.
    Noop,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    /// The job fired before the window elapsed, for example after a
    /// stalled redelivery with a skewed clock. Retry later.
    FiredTooEarly { expire_at: i64, now: i64 },
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for ExpireEventUseCase {
    type Response = ExpireOutcome;

    type Error = UseCaseError;

    const NAME: &'static str = "ExpireEvent";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        if now < self.expire_at {
            warn!(
                "Expiration job for event {} fired {}ms early",
                self.event_id,
                self.expire_at - now
            );
            return Err(UseCaseError::FiredTooEarly {
                expire_at: self.expire_at,
                now,
            });
        }

        let event = match ctx.repos.events.find(&self.event_id).await {
            Some(e) => e,
            None => {
                info!(
                    "Event {} no longer exists, skipping expiration",
                    self.event_id
                );
                return Ok(ExpireOutcome::Noop);
            }
        };
        if !event.is_active {
            return Ok(ExpireOutcome::Noop);
        }

        let mut event = event;
        event.is_active = false;
        ctx.repos
            .events
            .save(&event)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        info!("Event {} expired and was deactivated", self.event_id);
        Ok(ExpireOutcome::Deactivated)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::usecase::execute;
    use campus_notify_domain::Event;
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

    fn ctx_at(now: i64) -> Context {
        Context::create_inmemory(
            Arc::new(InMemoryPushTransport::new()),
            Arc::new(StaticSys { now }),
        )
    }

    fn active_event(start_ts: i64) -> Event {
        Event {
            id: ID::new(),
            name: "Movie night".into(),
            location: None,
            start_ts,
            is_active: true,
            is_closed: false,
            participants: Vec::new(),
            creator_id: ID::new(),
            created: 0,
        }
    }

    #[tokio::test]
    async fn deactivates_an_elapsed_event() {
        let now = 1_600_000_000_000;
        let ctx = ctx_at(now);
        let event = active_event(now - 25 * 60 * 60 * 1000);
        ctx.repos.events.insert(&event).await.unwrap();

        let outcome = execute(
            ExpireEventUseCase {
                event_id: event.id.clone(),
                expire_at: event.expires_at(),
            },
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(outcome, ExpireOutcome::Deactivated);
        assert!(!ctx.repos.events.find(&event.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn premature_fire_is_an_error_so_the_job_retries() {
        let now = 1_600_000_000_000;
        let ctx = ctx_at(now);
        let event = active_event(now);
        ctx.repos.events.insert(&event).await.unwrap();

        let res = execute(
            ExpireEventUseCase {
                event_id: event.id.clone(),
                expire_at: event.expires_at(),
            },
            &ctx,
        )
        .await;

        assert_eq!(
            res.unwrap_err(),
            UseCaseError::FiredTooEarly {
                expire_at: event.expires_at(),
                now
            }
        );
        assert!(ctx.repos.events.find(&event.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn missing_or_inactive_event_is_a_quiet_noop() {
        let now = 1_600_000_000_000;
        let ctx = ctx_at(now);

        let outcome = execute(
            ExpireEventUseCase {
                event_id: ID::new(),
                expire_at: now - 1,
            },
            &ctx,
        )
        .await
        .unwrap();
        assert_eq!(outcome, ExpireOutcome::Noop);

        let mut event = active_event(now - 48 * 60 * 60 * 1000);
        event.is_active = false;
        ctx.repos.events.insert(&event).await.unwrap();
        let outcome = execute(
            ExpireEventUseCase {
                event_id: event.id,
                expire_at: now - 1,
            },
            &ctx,
        )
        .await
        .unwrap();
        assert_eq!(outcome, ExpireOutcome::Noop);
    }
}
