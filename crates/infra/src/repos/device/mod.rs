mod inmemory;
mod postgres;

pub use inmemory::InMemoryDeviceRepo;
pub use postgres::PostgresDeviceRepo;

use campus_notify_domain::{DeviceRegistration, ID};

/// Read-only lookup of registered push devices. This engine never
/// writes device records; pruning invalid tokens is done by the device
/// store owner from the invalid-token reports.
#[async_trait::async_trait]
pub trait IDeviceRepo: Send + Sync {
    async fn insert(&self, device: &DeviceRegistration) -> anyhow::Result<()>;
    async fn find(&self, user_id: &ID) -> Option<DeviceRegistration>;
    async fn find_many(&self, user_ids: &[ID]) -> anyhow::Result<Vec<DeviceRegistration>>;
}
