use super::IJobRepo;
use campus_notify_domain::{Backoff, DelayedJob, JobId, JobPayload, JobState};
use sqlx::{types::Json, FromRow, PgPool};
use tracing::error;

pub struct PostgresJobRepo {
    pool: PgPool,
}

impl PostgresJobRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct JobRaw {
    job_id: String,
    payload: Json<JobPayload>,
    run_at: i64,
    state: String,
    attempts: i32,
    max_attempts: i32,
    backoff: Json<Backoff>,
    claimed_at: Option<i64>,
    last_error: Option<String>,
    result: Option<String>,
    created: i64,
}

impl Into<DelayedJob> for JobRaw {
    fn into(self) -> DelayedJob {
        // The state column carries a CHECK constraint, a parse failure
        // would mean a schema drift
        let state = self.state.parse().unwrap_or_else(|e| {
            error!("Unknown job state in database: {:?}", e);
            JobState::Failed
        });
        DelayedJob {
            id: JobId::new(self.job_id),
            payload: self.payload.0,
            run_at: self.run_at,
            state,
            attempts: self.attempts as u32,
            max_attempts: self.max_attempts as u32,
            backoff: self.backoff.0,
            claimed_at: self.claimed_at,
            last_error: self.last_error,
            result: self.result,
            created: self.created,
        }
    }
}

#[async_trait::async_trait]
impl IJobRepo for PostgresJobRepo {
    async fn insert(&self, job: &DelayedJob) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO jobs
            (job_id, payload, run_at, state, attempts, max_attempts, backoff, claimed_at, last_error, result, created)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(job.id.as_str())
        .bind(Json(&job.payload))
        .bind(job.run_at)
        .bind(job.state.as_str())
        .bind(job.attempts as i32)
        .bind(job.max_attempts as i32)
        .bind(Json(&job.backoff))
        .bind(job.claimed_at)
        .bind(&job.last_error)
        .bind(&job.result)
        .bind(job.created)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save(&self, job: &DelayedJob) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs SET
                run_at = $2,
                state = $3,
                attempts = $4,
                claimed_at = $5,
                last_error = $6,
                result = $7
            WHERE job_id = $1
            "#,
        )
        .bind(job.id.as_str())
        .bind(job.run_at)
        .bind(job.state.as_str())
        .bind(job.attempts as i32)
        .bind(job.claimed_at)
        .bind(&job.last_error)
        .bind(&job.result)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, job_id: &JobId) -> Option<DelayedJob> {
        let job: JobRaw = match sqlx::query_as(
            r#"
            SELECT * FROM jobs
            WHERE job_id = $1
            "#,
        )
        .bind(job_id.as_str())
        .fetch_one(&self.pool)
        .await
        {
            Ok(job) => job,
            Err(_) => return None,
        };
        Some(job.into())
    }

    async fn find_by_state(&self, state: JobState) -> Vec<DelayedJob> {
        let jobs: Vec<JobRaw> = sqlx::query_as(
            r#"
            SELECT * FROM jobs
            WHERE state = $1
            ORDER BY run_at
            "#,
        )
        .bind(state.as_str())
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default();
        jobs.into_iter().map(|job| job.into()).collect()
    }

    async fn delete_pending(&self, job_id: &JobId) -> Option<DelayedJob> {
        match sqlx::query_as(
            r#"
            DELETE FROM jobs
            WHERE job_id = $1 AND state = 'pending'
            RETURNING *
            "#,
        )
        .bind(job_id.as_str())
        .fetch_one(&self.pool)
        .await
        {
            Ok(job) => {
                let job: JobRaw = job;
                Some(job.into())
            }
            Err(_) => None,
        }
    }

    async fn delete(&self, job_id: &JobId) -> Option<DelayedJob> {
        match sqlx::query_as(
            r#"
            DELETE FROM jobs
            WHERE job_id = $1
            RETURNING *
            "#,
        )
        .bind(job_id.as_str())
        .fetch_one(&self.pool)
        .await
        {
            Ok(job) => {
                let job: JobRaw = job;
                Some(job.into())
            }
            Err(_) => None,
        }
    }

    async fn claim_due(&self, now: i64, limit: i64) -> anyhow::Result<Vec<DelayedJob>> {
        let jobs: Vec<JobRaw> = sqlx::query_as(
            r#"
            UPDATE jobs SET
                state = 'active',
                claimed_at = $1
            WHERE job_id IN (
                SELECT job_id FROM jobs
                WHERE state = 'pending' AND run_at <= $1
                ORDER BY run_at
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs.into_iter().map(|job| job.into()).collect())
    }

    async fn prune_completed(&self, keep: i64) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            DELETE FROM jobs
            WHERE state = 'completed' AND job_id NOT IN (
                SELECT job_id FROM jobs
                WHERE state = 'completed'
                ORDER BY run_at DESC
                LIMIT $1
            )
            "#,
        )
        .bind(keep)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    async fn reclaim_stalled(&self, claimed_before: i64) -> anyhow::Result<Vec<DelayedJob>> {
        let jobs: Vec<JobRaw> = sqlx::query_as(
            r#"
            UPDATE jobs SET
                state = 'pending',
                claimed_at = NULL
            WHERE state = 'active' AND (claimed_at IS NULL OR claimed_at <= $1)
            RETURNING *
            "#,
        )
        .bind(claimed_before)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs.into_iter().map(|job| job.into()).collect())
    }
}
