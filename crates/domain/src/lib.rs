pub mod date;
mod device;
mod event;
mod job;
mod notification;
mod reminder;
mod shared;

pub use device::{DeviceRegistration, NotificationPreferences};
pub use event::Event;
pub use job::{
    Backoff, DelayedJob, JobFailure, JobId, JobPayload, JobState, PendingJob, QueueStats,
};
pub use notification::Notification;
pub use reminder::ReminderOffset;
pub use shared::entity::{Entity, ID};
