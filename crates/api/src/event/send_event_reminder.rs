use super::resolve_recipients::resolve_recipient_tokens;
use crate::shared::usecase::UseCase;
use campus_notify_domain::{Notification, ReminderOffset, ID};
use campus_notify_infra::{Context, DeliveryReport};
use tracing::info;

/// Delivers one reminder notification for an event. Runs as the handler
/// of a reminder job. The event is reloaded so a deleted or closed
/// event, or a participant list that changed since scheduling, is
/// always honored over the job payload.
#[derive(Debug)]
pub struct SendEventReminderUseCase {
    pub event_id: ID,
    pub event_name: String,
    pub event_location: Option<String>,
    pub offset: ReminderOffset,
}

#[derive(Debug)]
pub enum UseCaseError {
    /// The push transport as a whole was unreachable. Per-token
    /// failures are not this, they land in the delivery report.
    TransportFailure(String),
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for SendEventReminderUseCase {
    type Response = DeliveryReport;

    type Error = UseCaseError;

    const NAME: &'static str = "SendEventReminder";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let event = match ctx.repos.events.find(&self.event_id).await {
            Some(e) => e,
            None => {
                info!(
                    "Event {} vanished before its {} reminder, skipping",
                    self.event_id, self.offset
                );
                return Ok(DeliveryReport::default());
            }
        };
        if event.is_closed || !event.is_active {
            info!(
                "Event {} is closed or inactive, skipping {} reminder",
                self.event_id, self.offset
            );
            return Ok(DeliveryReport::default());
        }

        let tokens = resolve_recipient_tokens(&event.participants, ctx, |p| p.event_reminders)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        if tokens.is_empty() {
            info!(
                "No reachable recipients for the {} reminder of event {}",
                self.offset, self.event_id
            );
            return Ok(DeliveryReport::default());
        }

        let notification = Notification::EventReminder {
            event_id: self.event_id.clone(),
            event_name: self.event_name.clone(),
            event_location: self.event_location.clone(),
            offset: self.offset,
        };
        let report = ctx
            .push
            .send_many(&tokens, &notification)
            .await
            .map_err(|e| UseCaseError::TransportFailure(e.to_string()))?;
        info!(
            "Reminder {} for event {} delivered: {}",
            self.offset,
            self.event_id,
            report.summary()
        );
        Ok(report)
    }
}
