use super::IDeviceRepo;
use crate::repos::shared::inmemory_repo::*;
use campus_notify_domain::{DeviceRegistration, ID};

pub struct InMemoryDeviceRepo {
    devices: std::sync::Mutex<Vec<DeviceRegistration>>,
}

impl InMemoryDeviceRepo {
    pub fn new() -> Self {
        Self {
            devices: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IDeviceRepo for InMemoryDeviceRepo {
    async fn insert(&self, device: &DeviceRegistration) -> anyhow::Result<()> {
        insert(device, &self.devices);
        Ok(())
    }

    async fn find(&self, user_id: &ID) -> Option<DeviceRegistration> {
        find(user_id, &self.devices)
    }

    async fn find_many(&self, user_ids: &[ID]) -> anyhow::Result<Vec<DeviceRegistration>> {
        Ok(find_by(&self.devices, |device| {
            user_ids.contains(&device.user_id)
        }))
    }
}
