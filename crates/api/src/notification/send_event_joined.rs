use crate::shared::usecase::UseCase;
use campus_notify_domain::{Notification, ID};
use campus_notify_infra::{Context, DeliveryReport};
use tracing::info;

/// Tells an event's creator that someone joined. Creators without a
/// registered token or with general notifications switched off are
/// skipped quietly.
#[derive(Debug)]
pub struct SendEventJoinedUseCase {
    pub event_id: ID,
    pub event_name: String,
    pub creator_id: ID,
    pub participant_name: String,
}

#[derive(Debug)]
pub enum UseCaseError {
    TransportFailure(String),
}

#[async_trait::async_trait(?Send)]
impl UseCase for SendEventJoinedUseCase {
    type Response = DeliveryReport;

    type Error = UseCaseError;

    const NAME: &'static str = "SendEventJoined";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let device = ctx
            .repos
            .devices
            .find(&self.creator_id)
            .await
            .filter(|d| d.has_token() && d.preferences.general_notifications);
        let device = match device {
            Some(d) => d,
            None => {
                info!(
                    "Creator {} of event {} is not reachable, skipping join notification",
                    self.creator_id, self.event_id
                );
                return Ok(DeliveryReport::default());
            }
        };

        ctx.push
            .send_one(
                &device.token,
                &Notification::EventJoined {
                    event_id: self.event_id.clone(),
                    event_name: self.event_name.clone(),
                    participant_name: self.participant_name.clone(),
                },
            )
            .await
            .map_err(|e| UseCaseError::TransportFailure(e.to_string()))
    }
}
