mod error;
mod event;
mod job_workers;
mod notification;
mod shared;
mod status;

use actix_cors::Cors;
use actix_web::{dev::Server, middleware, web, App, HttpServer};
use campus_notify_infra::Context;
use std::net::TcpListener;
use tracing::error;
use tracing_actix_web::TracingLogger;

pub use error::NotifyError;
pub use event::{
    CancelEventExpirationUseCase, CancelEventRemindersUseCase, ExpireEventUseCase,
    RecoverEventExpirationsUseCase, RescheduleEventExpirationUseCase,
    RescheduleEventRemindersUseCase,
    ScheduleEventExpirationUseCase, ScheduleEventRemindersUseCase, SendEventReminderUseCase,
};
pub use job_workers::process_due_jobs;
pub use notification::{
    SendEventCancelledUseCase, SendEventJoinedUseCase, SendEventUpdatedUseCase,
    SendTestNotificationUseCase,
};
pub use shared::usecase::{execute, UseCase};

pub fn configure_server_api(cfg: &mut web::ServiceConfig) {
    notification::configure_routes(cfg);
    status::configure_routes(cfg);
}

pub struct Application {
    server: Server,
    port: u16,
}

impl Application {
    pub async fn new(context: Context) -> Result<Self, std::io::Error> {
        let (server, port) = Application::configure_server(context.clone()).await?;

        // Converge expirations missed while the service was down before
        // the workers start claiming jobs.
        if execute(RecoverEventExpirationsUseCase, &context).await.is_err() {
            error!("Expiration recovery failed, continuing with the jobs already queued");
        }
        job_workers::start_job_workers(context);

        Ok(Self { server, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    async fn configure_server(context: Context) -> Result<(Server, u16), std::io::Error> {
        let port = context.config.port;
        let address = format!("0.0.0.0:{}", port);
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr().unwrap().port();

        let server = HttpServer::new(move || {
            let ctx = context.clone();

            App::new()
                .wrap(Cors::permissive())
                .wrap(middleware::Compress::default())
                .wrap(TracingLogger::default())
                .data(ctx)
                .service(web::scope("/api/v1").configure(configure_server_api))
        })
        .listen(listener)?
        .workers(4)
        .run();

        Ok((server, port))
    }

    pub async fn start(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}
