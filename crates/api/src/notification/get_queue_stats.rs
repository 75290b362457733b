use crate::error::NotifyError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use campus_notify_api_structs::get_queue_stats::*;
use campus_notify_domain::QueueStats;
use campus_notify_infra::Context;

pub async fn get_queue_stats_controller(
    ctx: web::Data<Context>,
) -> Result<HttpResponse, NotifyError> {
    execute(GetQueueStatsUseCase, &ctx)
        .await
        .map(|stats| HttpResponse::Ok().json(APIResponse::new(stats)))
        .map_err(|_| NotifyError::InternalError)
}

/// Snapshot of the job queue for the monitoring endpoint
#[derive(Debug)]
pub struct GetQueueStatsUseCase;

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetQueueStatsUseCase {
    type Response = QueueStats;

    type Error = UseCaseError;

    const NAME: &'static str = "GetQueueStats";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        Ok(ctx.queue.stats().await)
    }
}
