use crate::error::NotifyError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use campus_notify_api_structs::send_test_notification::*;
use campus_notify_domain::{Notification, ID};
use campus_notify_infra::{Context, DeliveryReport};

fn handle_error(e: UseCaseError) -> NotifyError {
    match e {
        UseCaseError::DeviceNotFound(user_id) => NotifyError::NotFound(format!(
            "No registered device token for user with id: {}",
            user_id
        )),
        UseCaseError::TransportFailure(_) => NotifyError::InternalError,
    }
}

pub async fn send_test_notification_controller(
    body: web::Json<RequestBody>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, NotifyError> {
    let usecase = SendTestNotificationUseCase {
        user_id: body.user_id.clone(),
    };

    execute(usecase, &ctx)
        .await
        .map(|report| {
            HttpResponse::Ok().json(APIResponse {
                success_count: report.success_count,
                failure_count: report.failure_count,
            })
        })
        .map_err(handle_error)
}

/// Sends a plain test notification to a single user's device, used to
/// verify the push pipeline end to end.
#[derive(Debug)]
pub struct SendTestNotificationUseCase {
    pub user_id: ID,
}

#[derive(Debug)]
pub enum UseCaseError {
    DeviceNotFound(ID),
    TransportFailure(String),
}

#[async_trait::async_trait(?Send)]
impl UseCase for SendTestNotificationUseCase {
    type Response = DeliveryReport;

    type Error = UseCaseError;

    const NAME: &'static str = "SendTestNotification";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let device = ctx
            .repos
            .devices
            .find(&self.user_id)
            .await
            .filter(|d| d.has_token())
            .ok_or_else(|| UseCaseError::DeviceNotFound(self.user_id.clone()))?;

        ctx.push
            .send_one(&device.token, &Notification::Test)
            .await
            .map_err(|e| UseCaseError::TransportFailure(e.to_string()))
    }
}
