use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};

/// A user's registered push device, owned by the external device store.
/// The engine only reads these; pruning invalid tokens is the owner's
/// job, driven by the invalid-token reports from the push client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRegistration {
    pub user_id: ID,
    pub token: String,
    pub preferences: NotificationPreferences,
}

impl Entity for DeviceRegistration {
    fn id(&self) -> &ID {
        &self.user_id
    }
}

impl DeviceRegistration {
    /// Placeholder registrations with blank tokens exist and must never
    /// reach the push transport
    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }
}

/// Per-category opt-in flags
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub event_reminders: bool,
    pub general_notifications: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            event_reminders: true,
            general_notifications: true,
        }
    }
}
