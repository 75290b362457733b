use crate::event::expire_event::{self, ExpireEventUseCase};
use crate::event::send_event_reminder::{self, SendEventReminderUseCase};
use crate::shared::usecase::execute;
use actix_web::rt::time::interval;
use campus_notify_domain::{DelayedJob, JobFailure, JobPayload};
use campus_notify_infra::Context;
use std::time::Duration;
use tracing::{debug, info};

/// Spawns the worker pool that drains due jobs, plus a single
/// housekeeping task that puts jobs from crashed workers back on the
/// queue and prunes completed jobs beyond the retention limit.
pub fn start_job_workers(ctx: Context) {
    for worker_id in 0..ctx.config.worker_count {
        let ctx = ctx.clone();
        actix_web::rt::spawn(async move {
            let mut poll_interval =
                interval(Duration::from_millis(ctx.config.worker_poll_interval_millis));
            loop {
                poll_interval.tick().await;
                let processed = process_due_jobs(&ctx).await;
                if processed > 0 {
                    debug!("Worker {} processed {} job(s)", worker_id, processed);
                }
            }
        });
    }

    actix_web::rt::spawn(async move {
        // Half the stall timeout keeps redelivery latency bounded
        // without hammering the jobs table.
        let mut reclaim_interval = interval(Duration::from_millis(
            (ctx.config.stalled_job_timeout_millis / 2).max(1000) as u64,
        ));
        loop {
            reclaim_interval.tick().await;
            ctx.queue.reclaim_stalled().await;
            ctx.queue
                .prune_completed(ctx.config.completed_jobs_to_keep)
                .await;
        }
    });
}

/// Claims one batch of due jobs and runs each to completion. Exposed so
/// tests can drive the queue without the timer loops.
pub async fn process_due_jobs(ctx: &Context) -> usize {
    let jobs = ctx.queue.claim_due(ctx.config.worker_batch_size).await;
    let claimed = jobs.len();
    for job in jobs {
        process_job(job, ctx).await;
    }
    claimed
}

async fn process_job(job: DelayedJob, ctx: &Context) {
    info!("Processing job {} ({})", job.id, job.payload.job_name());
    let outcome = match job.payload.clone() {
        JobPayload::EventReminder {
            event_id,
            event_name,
            event_location,
            offset,
            ..
        } => execute(
            SendEventReminderUseCase {
                event_id,
                event_name,
                event_location,
                offset,
            },
            ctx,
        )
        .await
        .map(|report| Some(report.summary()))
        .map_err(reminder_failure),
        JobPayload::EventExpiration {
            event_id,
            expire_at,
            ..
        } => execute(ExpireEventUseCase { event_id, expire_at }, ctx)
            .await
            .map(|outcome| Some(format!("{:?}", outcome)))
            .map_err(expiration_failure),
    };

    match outcome {
        Ok(result) => ctx.queue.complete(&job, result).await,
        Err(failure) => ctx.queue.fail(&job, &failure).await,
    }
}

fn reminder_failure(e: send_event_reminder::UseCaseError) -> JobFailure {
    match e {
        send_event_reminder::UseCaseError::TransportFailure(reason) => {
            JobFailure::retryable(format!("push transport unavailable: {}", reason))
        }
        send_event_reminder::UseCaseError::StorageError => {
            JobFailure::retryable("storage error while resolving recipients")
        }
    }
}

fn expiration_failure(e: expire_event::UseCaseError) -> JobFailure {
    match e {
        expire_event::UseCaseError::FiredTooEarly { expire_at, now } => JobFailure::retryable(
            format!("fired {}ms before the expiration window", expire_at - now),
        ),
        expire_event::UseCaseError::StorageError => {
            JobFailure::retryable("storage error while expiring event")
        }
    }
}
