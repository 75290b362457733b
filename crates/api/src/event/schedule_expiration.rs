use crate::shared::usecase::UseCase;
use campus_notify_domain::{date, DelayedJob, JobId, JobPayload, ID};
use campus_notify_infra::{Context, EnqueueOptions};
use tracing::info;

/// Schedules the automatic deactivation of an event 24 hours after it
/// starts. Events whose window already elapsed are deactivated right
/// away instead of going through the queue.
#[derive(Debug)]
pub struct ScheduleEventExpirationUseCase {
    pub event_id: ID,
    pub event_name: String,
    pub start_date: String,
}

#[derive(Debug)]
pub enum ExpirationOutcome {
    /// A delayed job will deactivate the event later.
    Scheduled(DelayedJob),
    /// The expiration window had already passed, the event was
    /// deactivated synchronously.
    DeactivatedImmediately,
    /// Nothing to do, the event is gone or already inactive.
    Noop,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidStartDate(String),
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for ScheduleEventExpirationUseCase {
    type Response = ExpirationOutcome;

    type Error = UseCaseError;

    const NAME: &'static str = "ScheduleEventExpiration";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let start_ts = date::parse_start_date(&self.start_date)
            .map_err(|e| UseCaseError::InvalidStartDate(e.0))?;
        let expire_at = start_ts + 24 * 60 * 60 * 1000;
        let now = ctx.sys.get_timestamp_millis();

        if expire_at <= now {
            let event = match ctx.repos.events.find(&self.event_id).await {
                Some(e) => e,
                None => return Ok(ExpirationOutcome::Noop),
            };
            if !event.is_active {
                return Ok(ExpirationOutcome::Noop);
            }
            let mut event = event;
            event.is_active = false;
            ctx.repos
                .events
                .save(&event)
                .await
                .map_err(|_| UseCaseError::StorageError)?;
            info!(
                "Event {} was already past its expiration window, deactivated immediately",
                self.event_id
            );
            return Ok(ExpirationOutcome::DeactivatedImmediately);
        }

        let retry = ctx.config.expiration_retry;
        let job = ctx
            .queue
            .enqueue(
                JobId::from(&self.event_id),
                JobPayload::EventExpiration {
                    event_id: self.event_id.clone(),
                    event_name: self.event_name.clone(),
                    expire_at,
                },
                EnqueueOptions {
                    delay_millis: expire_at - now,
                    max_attempts: retry.max_attempts,
                    backoff: retry.backoff,
                },
            )
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        info!(
            "Scheduled expiration of event {} at {}",
            self.event_id, expire_at
        );
        Ok(ExpirationOutcome::Scheduled(job))
    }
}
