use crate::event::{resolve_recipients::resolve_recipient_tokens, CancelEventRemindersUseCase};
use crate::shared::usecase::{execute, UseCase};
use campus_notify_domain::{Notification, ID};
use campus_notify_infra::{Context, DeliveryReport};
use tracing::info;

/// Tells the remaining participants that an event was cancelled and
/// drops its pending reminders. Runs at deletion time with a snapshot
/// of the event, since the event itself is already gone from the store.
#[derive(Debug)]
pub struct SendEventCancelledUseCase {
    pub event_id: ID,
    pub event_name: String,
    pub participants: Vec<ID>,
}

#[derive(Debug)]
pub enum UseCaseError {
    TransportFailure(String),
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for SendEventCancelledUseCase {
    type Response = DeliveryReport;

    type Error = UseCaseError;

    const NAME: &'static str = "SendEventCancelled";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        execute(
            CancelEventRemindersUseCase {
                event_id: self.event_id.clone(),
            },
            ctx,
        )
        .await
        .map_err(|_| UseCaseError::StorageError)?;

        let tokens = resolve_recipient_tokens(&self.participants, ctx, |p| p.event_reminders)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        if tokens.is_empty() {
            info!(
                "No reachable recipients for the cancellation of event {}",
                self.event_id
            );
            return Ok(DeliveryReport::default());
        }

        ctx.push
            .send_many(
                &tokens,
                &Notification::EventCancelled {
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
    use crate::event::ScheduleEventRemindersUseCase;
    use campus_notify_domain::{DeviceRegistration, NotificationPreferences};
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
    async fn notifies_participants_and_drops_pending_reminders() {
        let now = 1_600_000_000_000;
        let transport = Arc::new(InMemoryPushTransport::new());
        let ctx = Context::create_inmemory(transport.clone(), Arc::new(StaticSys { now }));
        let device = DeviceRegistration {
            user_id: ID::new(),
            token: "participant-token".into(),
            preferences: NotificationPreferences::default(),
        };
        ctx.repos.devices.insert(&device).await.unwrap();
        let event_id = ID::new();
        execute(
            ScheduleEventRemindersUseCase {
                event_id: event_id.clone(),
                event_name: "Cancelled gig".into(),
                event_location: None,
                start_date: Utc.timestamp_millis(now + 30 * 60 * 60 * 1000).to_rfc3339(),
            },
            &ctx,
        )
        .await
        .unwrap();
        assert_eq!(ctx.queue.list_pending().await.len(), 3);

        let report = execute(
            SendEventCancelledUseCase {
                event_id,
                event_name: "Cancelled gig".into(),
                participants: vec![device.user_id],
            },
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(report.success_count, 1);
        assert!(ctx.queue.list_pending().await.is_empty());
        let sent = transport.sent_messages();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].title.contains("Cancelled"));
    }

    #[tokio::test]
    async fn no_participants_still_clears_reminders() {
        let now = 1_600_000_000_000;
        let transport = Arc::new(InMemoryPushTransport::new());
        let ctx = Context::create_inmemory(transport.clone(), Arc::new(StaticSys { now }));
        let event_id = ID::new();
        execute(
            ScheduleEventRemindersUseCase {
                event_id: event_id.clone(),
                event_name: "Empty gig".into(),
                event_location: None,
                start_date: Utc.timestamp_millis(now + 30 * 60 * 60 * 1000).to_rfc3339(),
            },
            &ctx,
        )
        .await
        .unwrap();

        let report = execute(
            SendEventCancelledUseCase {
                event_id,
                event_name: "Empty gig".into(),
                participants: vec![],
            },
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(report, DeliveryReport::default());
        assert!(ctx.queue.list_pending().await.is_empty());
        assert!(transport.sent_messages().is_empty());
    }
}
