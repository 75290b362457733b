pub mod cancel_expiration;
pub mod cancel_reminders;
pub mod expire_event;
pub mod recover_expirations;
pub mod reschedule_expiration;
pub mod reschedule_reminders;
pub mod resolve_recipients;
pub mod schedule_expiration;
pub mod schedule_reminders;
pub mod send_event_reminder;

pub use cancel_expiration::CancelEventExpirationUseCase;
pub use cancel_reminders::CancelEventRemindersUseCase;
pub use expire_event::ExpireEventUseCase;
pub use recover_expirations::RecoverEventExpirationsUseCase;
pub use reschedule_expiration::RescheduleEventExpirationUseCase;
pub use reschedule_reminders::RescheduleEventRemindersUseCase;
pub use schedule_expiration::ScheduleEventExpirationUseCase;
pub use schedule_reminders::ScheduleEventRemindersUseCase;
pub use send_event_reminder::SendEventReminderUseCase;
