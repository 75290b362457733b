use super::cancel_expiration::CancelEventExpirationUseCase;
use super::schedule_expiration::{self, ExpirationOutcome, ScheduleEventExpirationUseCase};
use crate::shared::usecase::{execute, UseCase};
use campus_notify_domain::ID;
use campus_notify_infra::Context;

/// Replaces an event's pending expiration after its start date changed.
///
/// Enqueuing under an already-pending id keeps the existing job, so a
/// plain re-schedule would leave the old fire time in place and
/// deactivate a postponed event too early. The pending job is cancelled
/// first, then scheduled fresh from the new start date.
#[derive(Debug)]
pub struct RescheduleEventExpirationUseCase {
    pub event_id: ID,
    pub event_name: String,
    pub start_date: String,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidStartDate(String),
    StorageError,
}

impl From<schedule_expiration::UseCaseError> for UseCaseError {
    fn from(e: schedule_expiration::UseCaseError) -> Self {
        match e {
            schedule_expiration::UseCaseError::InvalidStartDate(d) => Self::InvalidStartDate(d),
            schedule_expiration::UseCaseError::StorageError => Self::StorageError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for RescheduleEventExpirationUseCase {
    type Response = ExpirationOutcome;

    type Error = UseCaseError;

    const NAME: &'static str = "RescheduleEventExpiration";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        // Validate the new date before touching the existing job, a bad
        // update should not wipe the expiration already in place.
        campus_notify_domain::date::parse_start_date(&self.start_date)
            .map_err(|e| UseCaseError::InvalidStartDate(e.0))?;

        execute(
            CancelEventExpirationUseCase {
                event_id: self.event_id.clone(),
            },
            ctx,
        )
        .await
        .map_err(|_| UseCaseError::StorageError)?;

        execute(
            ScheduleEventExpirationUseCase {
                event_id: self.event_id.clone(),
                event_name: self.event_name.clone(),
                start_date: self.start_date.clone(),
            },
            ctx,
        )
        .await
        .map_err(|e| e.into())
    }
}
