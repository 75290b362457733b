use crate::event::resolve_recipients::resolve_recipient_tokens;
use crate::shared::usecase::UseCase;
use campus_notify_domain::{Notification, ID};
use campus_notify_infra::{Context, DeliveryReport};
use tracing::info;

/// Tells participants that an event's details changed. The caller is
/// expected to reschedule the reminders separately when the start date
/// moved.
#[derive(Debug)]
pub struct SendEventUpdatedUseCase {
    pub event_id: ID,
    pub event_name: String,
}

#[derive(Debug)]
pub enum UseCaseError {
    TransportFailure(String),
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for SendEventUpdatedUseCase {
    type Response = DeliveryReport;

    type Error = UseCaseError;

    const NAME: &'static str = "SendEventUpdated";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let event = match ctx.repos.events.find(&self.event_id).await {
            Some(e) => e,
            None => {
                info!(
                    "Event {} vanished before its update notification, skipping",
                    self.event_id
                );
                return Ok(DeliveryReport::default());
            }
        };

        let tokens = resolve_recipient_tokens(&event.participants, ctx, |p| p.event_reminders)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        if tokens.is_empty() {
            return Ok(DeliveryReport::default());
        }

        ctx.push
            .send_many(
                &tokens,
                &Notification::EventUpdated {
                    event_id: self.event_id.clone(),
                    event_name: self.event_name.clone(),
                },
            )
            .await
            .map_err(|e| UseCaseError::TransportFailure(e.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::usecase::execute;
    use campus_notify_domain::{DeviceRegistration, Event, NotificationPreferences};
    use campus_notify_infra::{InMemoryPushTransport, RealSys};
    use std::sync::Arc;

    #[tokio::test]
    async fn notifies_current_participants() {
        let transport = Arc::new(InMemoryPushTransport::new());
        let ctx = Context::create_inmemory(transport.clone(), Arc::new(RealSys {}));
        let device = DeviceRegistration {
            user_id: ID::new(),
            token: "p-token".into(),
            preferences: NotificationPreferences::default(),
        };
        ctx.repos.devices.insert(&device).await.unwrap();
        let event = Event {
            id: ID::new(),
            name: "Reading circle".into(),
            location: None,
            start_ts: 0,
            is_active: true,
            is_closed: false,
            participants: vec![device.user_id],
            creator_id: ID::new(),
            created: 0,
        };
        ctx.repos.events.insert(&event).await.unwrap();

        let report = execute(
            SendEventUpdatedUseCase {
                event_id: event.id,
                event_name: event.name,
            },
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(report.success_count, 1);
        assert!(transport.sent_messages()[0].title.contains("Updated"));
    }
}
