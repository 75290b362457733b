use crate::reminder::ReminderOffset;
use crate::shared::entity::ID;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A push notification, tagged by what triggered it.
///
/// Internally these are a closed set of variants so the compiler keeps
/// the payloads honest. The loosely typed string map the push transport
/// wants is only produced at the boundary, by `to_data_map`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    EventReminder {
        event_id: ID,
        event_name: String,
        event_location: Option<String>,
        offset: ReminderOffset,
    },
    EventCancelled {
        event_id: ID,
        event_name: String,
    },
    EventUpdated {
        event_id: ID,
        event_name: String,
    },
    EventJoined {
        event_id: ID,
        event_name: String,
        participant_name: String,
    },
    Test,
}

impl Notification {
    /// Discriminant value placed in the `type` key of the data map
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::EventReminder { .. } => "event_reminder",
            Notification::EventCancelled { .. } => "event_cancelled",
            Notification::EventUpdated { .. } => "event_updated",
            Notification::EventJoined { .. } => "event_join",
            Notification::Test => "test",
        }
    }

    pub fn title(&self) -> String {
        match self {
            Notification::EventReminder { event_name, .. } => {
                format!("Event Reminder - {}", event_name)
            }
            Notification::EventCancelled { event_name, .. } => {
                format!("Event Cancelled - {}", event_name)
            }
            Notification::EventUpdated { event_name, .. } => {
                format!("Event Updated - {}", event_name)
            }
            Notification::EventJoined { event_name, .. } => {
                format!("New Participant - {}", event_name)
            }
            Notification::Test => "Test Notification".into(),
        }
    }

    pub fn body(&self) -> String {
        match self {
            Notification::EventReminder {
                event_name,
                event_location,
                offset,
                ..
            } => match event_location {
                Some(location) => format!(
                    "{} starts in {} at {}",
                    event_name,
                    offset.humanized(),
                    location
                ),
                None => format!("{} starts in {}", event_name, offset.humanized()),
            },
            Notification::EventCancelled { event_name, .. } => format!(
                "Unfortunately, {} has been cancelled. We apologize for any inconvenience.",
                event_name
            ),
            Notification::EventUpdated { event_name, .. } => {
                format!("{} has been updated, check the event page for details", event_name)
            }
            Notification::EventJoined {
                participant_name, ..
            } => format!("{} joined your event", participant_name),
            Notification::Test => "This is a test notification".into(),
        }
    }

    /// Flattens the variant into the string-keyed map sent to the push
    /// transport. The `type` discriminant is always present; a server
    /// timestamp is injected separately by the push client.
    pub fn to_data_map(&self) -> HashMap<String, String> {
        let mut data = HashMap::new();
        data.insert("type".to_string(), self.kind().to_string());
        match self {
            Notification::EventReminder {
                event_id,
                event_name,
                event_location,
                offset,
            } => {
                data.insert("eventId".to_string(), event_id.as_string());
                data.insert("eventName".to_string(), event_name.clone());
                data.insert(
                    "eventLocation".to_string(),
                    event_location.clone().unwrap_or_default(),
                );
                data.insert("reminderTime".to_string(), offset.label().to_string());
            }
            Notification::EventCancelled {
                event_id,
                event_name,
            }
            | Notification::EventUpdated {
                event_id,
                event_name,
            } => {
                data.insert("eventId".to_string(), event_id.as_string());
                data.insert("eventName".to_string(), event_name.clone());
            }
            Notification::EventJoined {
                event_id,
                event_name,
                participant_name,
            } => {
                data.insert("eventId".to_string(), event_id.as_string());
                data.insert("eventName".to_string(), event_name.clone());
                data.insert("participantName".to_string(), participant_name.clone());
            }
            Notification::Test => {}
        }
        data
    }
}
