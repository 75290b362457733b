use actix_web::web;

pub mod get_queue_stats;
pub mod send_event_cancelled;
pub mod send_event_joined;
pub mod send_event_updated;
pub mod send_test_notification;

pub use get_queue_stats::GetQueueStatsUseCase;
pub use send_event_cancelled::SendEventCancelledUseCase;
pub use send_event_joined::SendEventJoinedUseCase;
pub use send_event_updated::SendEventUpdatedUseCase;
pub use send_test_notification::SendTestNotificationUseCase;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/notification/queue-stats",
        web::get().to(get_queue_stats::get_queue_stats_controller),
    );
    cfg.route(
        "/notification/test",
        web::post().to(send_test_notification::send_test_notification_controller),
    );
}
