use campus_notify_domain::Backoff;
use tracing::{info, log::warn};

/// Retry settings for one job type. Attempt limits and backoff are
/// configured per job type, not globally.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// How often the dispatcher workers poll the queue for due jobs
    pub worker_poll_interval_millis: u64,
    /// Maximum number of due jobs a worker claims per poll
    pub worker_batch_size: i64,
    /// Number of concurrent dispatcher workers
    pub worker_count: usize,
    /// An `Active` job claimed longer ago than this is considered
    /// stalled and handed back to the pending set for redelivery
    pub stalled_job_timeout_millis: i64,
    /// Completed jobs kept around for the observability surface,
    /// older ones are pruned periodically
    pub completed_jobs_to_keep: i64,
    /// Retry policy for reminder jobs
    pub reminder_retry: RetryConfig,
    /// Retry policy for expiration jobs
    pub expiration_retry: RetryConfig,
}

impl Config {
    pub fn new() -> Self {
        let default_port = "5000";
        let port = std::env::var("PORT").unwrap_or_else(|_| default_port.into());
        let port = match port.parse::<usize>() {
            Ok(port) => port,
            Err(_) => {
                warn!(
                    "The given PORT: {} is not valid, falling back to the default port: {}.",
                    port, default_port
                );
                default_port.parse::<usize>().unwrap()
            }
        };

        let worker_count = match std::env::var("NOTIFICATION_WORKERS") {
            Ok(count) => count.parse::<usize>().unwrap_or_else(|_| {
                warn!(
                    "The given NOTIFICATION_WORKERS: {} is not valid, falling back to 2.",
                    count
                );
                2
            }),
            Err(_) => {
                info!("Did not find NOTIFICATION_WORKERS environment variable. Using 2 workers.");
                2
            }
        };

        Self {
            port,
            worker_poll_interval_millis: 5 * 1000,
            worker_batch_size: 25,
            worker_count,
            stalled_job_timeout_millis: 1000 * 60 * 5, // 5 minutes
            completed_jobs_to_keep: 100,
            reminder_retry: RetryConfig {
                max_attempts: 3,
                backoff: Backoff::Exponential {
                    initial_millis: 2000,
                },
            },
            expiration_retry: RetryConfig {
                max_attempts: 3,
                backoff: Backoff::Exponential {
                    initial_millis: 5000,
                },
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
