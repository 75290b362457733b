use super::IDeviceRepo;
use campus_notify_domain::{DeviceRegistration, NotificationPreferences, ID};
use sqlx::{types::Uuid, FromRow, PgPool};

pub struct PostgresDeviceRepo {
    pool: PgPool,
}

impl PostgresDeviceRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DeviceRaw {
    user_uid: Uuid,
    token: String,
    event_reminders: bool,
    general_notifications: bool,
}

impl Into<DeviceRegistration> for DeviceRaw {
    fn into(self) -> DeviceRegistration {
        DeviceRegistration {
            user_id: self.user_uid.into(),
            token: self.token,
            preferences: NotificationPreferences {
                event_reminders: self.event_reminders,
                general_notifications: self.general_notifications,
            },
        }
    }
}

#[async_trait::async_trait]
impl IDeviceRepo for PostgresDeviceRepo {
    async fn insert(&self, device: &DeviceRegistration) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO devices
            (user_uid, token, event_reminders, general_notifications)
            VALUES($1, $2, $3, $4)
            "#,
        )
        .bind(device.user_id.inner_ref())
        .bind(&device.token)
        .bind(device.preferences.event_reminders)
        .bind(device.preferences.general_notifications)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, user_id: &ID) -> Option<DeviceRegistration> {
        let device: DeviceRaw = match sqlx::query_as(
            r#"
            SELECT * FROM devices
            WHERE user_uid = $1
            "#,
        )
        .bind(user_id.inner_ref())
        .fetch_one(&self.pool)
        .await
        {
            Ok(device) => device,
            Err(_) => return None,
        };
        Some(device.into())
    }

    async fn find_many(&self, user_ids: &[ID]) -> anyhow::Result<Vec<DeviceRegistration>> {
        let user_uids = user_ids.iter().map(|id| *id.inner_ref()).collect::<Vec<_>>();
        let devices: Vec<DeviceRaw> = sqlx::query_as(
            r#"
            SELECT * FROM devices
            WHERE user_uid = ANY($1)
            "#,
        )
        .bind(&user_uids)
        .fetch_all(&self.pool)
        .await?;
        Ok(devices.into_iter().map(|d| d.into()).collect())
    }
}
