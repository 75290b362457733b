mod config;
mod queue;
mod repos;
mod services;
mod system;

pub use config::{Config, RetryConfig};
pub use queue::{EnqueueOptions, JobQueue};
pub use repos::{IDeviceRepo, IEventRepo, IJobRepo, Repos};
pub use services::push::{
    DeliveryReport, FcmPushTransport, IPushTransport, InMemoryPushTransport, PushClient,
    PushMessage, TokenOutcome,
};
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
pub use system::{ISys, RealSys};

#[derive(Clone)]
pub struct Context {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub queue: JobQueue,
    pub push: PushClient,
}

struct ContextParams {
    pub postgres_connection_string: String,
    pub fcm_project_id: String,
    pub fcm_access_token: String,
}

impl Context {
    async fn create(params: ContextParams) -> Self {
        let repos = Repos::create_postgres(&params.postgres_connection_string)
            .await
            .expect("Postgres credentials must be set and valid");
        let transport = Arc::new(FcmPushTransport::new(
            params.fcm_project_id,
            params.fcm_access_token,
        ));
        Self::with_repos(repos, transport, Arc::new(RealSys {}))
    }

    /// Context backed by in-memory repositories and the recording push
    /// transport, for tests
    pub fn create_inmemory(
        transport: Arc<dyn IPushTransport>,
        sys: Arc<dyn ISys>,
    ) -> Self {
        Self::with_repos(Repos::create_inmemory(), transport, sys)
    }

    fn with_repos(repos: Repos, transport: Arc<dyn IPushTransport>, sys: Arc<dyn ISys>) -> Self {
        let config = Config::new();
        let queue = JobQueue::new(
            repos.jobs.clone(),
            sys.clone(),
            config.stalled_job_timeout_millis,
        );
        let push = PushClient::new(transport, sys.clone());
        Self {
            repos,
            config,
            sys,
            queue,
            push,
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> Context {
    Context::create(ContextParams {
        postgres_connection_string: get_psql_connection_string(),
        fcm_project_id: get_env_var("FCM_PROJECT_ID"),
        fcm_access_token: get_env_var("FCM_ACCESS_TOKEN"),
    })
    .await
}

fn get_psql_connection_string() -> String {
    get_env_var("DATABASE_URL")
}

fn get_env_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{} env var to be present.", name))
}

pub async fn run_migration() -> Result<(), MigrateError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&get_psql_connection_string())
        .await
        .expect("TO CONNECT TO POSTGRES");

    sqlx::migrate!().run(&pool).await
}
