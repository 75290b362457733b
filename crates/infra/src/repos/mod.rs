mod device;
mod event;
mod job;
mod shared;

pub use device::IDeviceRepo;
use device::{InMemoryDeviceRepo, PostgresDeviceRepo};
pub use event::IEventRepo;
use event::{InMemoryEventRepo, PostgresEventRepo};
pub use job::IJobRepo;
use job::{InMemoryJobRepo, PostgresJobRepo};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct Repos {
    pub events: Arc<dyn IEventRepo>,
    pub devices: Arc<dyn IDeviceRepo>,
    pub jobs: Arc<dyn IJobRepo>,
}

impl Repos {
    pub async fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        info!("DB CHECKING CONNECTION ...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;
        info!("DB CHECKING CONNECTION ... [done]");
        Ok(Self {
            events: Arc::new(PostgresEventRepo::new(pool.clone())),
            devices: Arc::new(PostgresDeviceRepo::new(pool.clone())),
            jobs: Arc::new(PostgresJobRepo::new(pool)),
        })
    }

    pub fn create_inmemory() -> Self {
        Self {
            events: Arc::new(InMemoryEventRepo::new()),
            devices: Arc::new(InMemoryDeviceRepo::new()),
            jobs: Arc::new(InMemoryJobRepo::new()),
        }
    }
}
