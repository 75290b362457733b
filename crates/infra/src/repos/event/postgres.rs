use super::IEventRepo;
use campus_notify_domain::{Event, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EventRaw {
    event_uid: Uuid,
    name: String,
    location: Option<String>,
    start_ts: i64,
    is_active: bool,
    is_closed: bool,
    participants: Vec<Uuid>,
    creator_uid: Uuid,
    created: i64,
}

impl Into<Event> for EventRaw {
    fn into(self) -> Event {
        Event {
            id: self.event_uid.into(),
            name: self.name,
            location: self.location,
            start_ts: self.start_ts,
            is_active: self.is_active,
            is_closed: self.is_closed,
            participants: self.participants.into_iter().map(|p| p.into()).collect(),
            creator_id: self.creator_uid.into(),
            created: self.created,
        }
    }
}

#[async_trait::async_trait]
impl IEventRepo for PostgresEventRepo {
    async fn insert(&self, e: &Event) -> anyhow::Result<()> {
        let participants = e
            .participants
            .iter()
            .map(|p| *p.inner_ref())
            .collect::<Vec<_>>();
        sqlx::query(
            r#"
            INSERT INTO events
            (event_uid, name, location, start_ts, is_active, is_closed, participants, creator_uid, created)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(e.id.inner_ref())
        .bind(&e.name)
        .bind(&e.location)
        .bind(e.start_ts)
        .bind(e.is_active)
        .bind(e.is_closed)
        .bind(&participants)
        .bind(e.creator_id.inner_ref())
        .bind(e.created)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save(&self, e: &Event) -> anyhow::Result<()> {
        let participants = e
            .participants
            .iter()
            .map(|p| *p.inner_ref())
            .collect::<Vec<_>>();
        sqlx::query(
            r#"
            UPDATE events SET
                name = $2,
                location = $3,
                start_ts = $4,
                is_active = $5,
                is_closed = $6,
                participants = $7
            WHERE event_uid = $1
            "#,
        )
        .bind(e.id.inner_ref())
        .bind(&e.name)
        .bind(&e.location)
        .bind(e.start_ts)
        .bind(e.is_active)
        .bind(e.is_closed)
        .bind(&participants)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, event_id: &ID) -> Option<Event> {
        let event: EventRaw = match sqlx::query_as(
            r#"
            SELECT * FROM events
            WHERE event_uid = $1
            "#,
        )
        .bind(event_id.inner_ref())
        .fetch_one(&self.pool)
        .await
        {
            Ok(event) => event,
            Err(_) => return None,
        };
        Some(event.into())
    }

    async fn find_active(&self) -> anyhow::Result<Vec<Event>> {
        let events: Vec<EventRaw> = sqlx::query_as(
            r#"
            SELECT * FROM events
            WHERE is_active = TRUE
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Unable to query active events: {:?}", e);
            e
        })?;
        Ok(events.into_iter().map(|e| e.into()).collect())
    }

    async fn delete(&self, event_id: &ID) -> Option<Event> {
        match sqlx::query_as(
            r#"
            DELETE FROM events
            WHERE event_uid = $1
            RETURNING *
            "#,
        )
        .bind(event_id.inner_ref())
        .fetch_one(&self.pool)
        .await
        {
            Ok(event) => {
                let event: EventRaw = event;
                Some(event.into())
            }
            Err(_) => None,
        }
    }
}
