use campus_notify_domain::{PendingJob, QueueStats, ID};
use serde::{Deserialize, Serialize};

pub mod get_queue_stats {
    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PendingJobDTO {
        pub id: String,
        pub scheduled_fire_time: i64,
    }

    impl PendingJobDTO {
        pub fn new(job: PendingJob) -> Self {
            Self {
                id: job.id.to_string(),
                scheduled_fire_time: job.scheduled_fire_time,
            }
        }
    }

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub waiting: usize,
        pub active: usize,
        pub completed: usize,
        pub failed: usize,
        pub pending_jobs: Vec<PendingJobDTO>,
    }

    impl APIResponse {
        pub fn new(stats: QueueStats) -> Self {
            Self {
                waiting: stats.waiting,
                active: stats.active,
                completed: stats.completed,
                failed: stats.failed,
                pending_jobs: stats
                    .pending_jobs
                    .into_iter()
                    .map(PendingJobDTO::new)
                    .collect(),
            }
        }
    }
}

pub mod send_test_notification {
    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub user_id: ID,
    }

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub success_count: usize,
        pub failure_count: usize,
    }
}
