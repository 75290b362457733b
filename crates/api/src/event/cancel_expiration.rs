use crate::shared::usecase::UseCase;
use campus_notify_domain::{JobId, ID};
use campus_notify_infra::Context;
use tracing::info;

/// Drops the pending expiration job for an event, typically because the
/// event was deleted before its window elapsed.
#[derive(Debug)]
pub struct CancelEventExpirationUseCase {
    pub event_id: ID,
}

#[derive(Debug)]
pub enum UseCaseError {}

#[async_trait::async_trait(?Send)]
impl UseCase for CancelEventExpirationUseCase {
    type Response = bool;

    type Error = UseCaseError;

    const NAME: &'static str = "CancelEventExpiration";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let cancelled = ctx.queue.cancel(&JobId::from(&self.event_id)).await;
        if cancelled {
            info!("Cancelled pending expiration for event {}", self.event_id);
        }
        Ok(cancelled)
    }
}
