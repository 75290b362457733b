use super::IJobRepo;
use campus_notify_domain::{DelayedJob, JobId, JobState};
use std::sync::Mutex;

pub struct InMemoryJobRepo {
    jobs: Mutex<Vec<DelayedJob>>,
}

impl InMemoryJobRepo {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IJobRepo for InMemoryJobRepo {
    async fn insert(&self, job: &DelayedJob) -> anyhow::Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.push(job.clone());
        Ok(())
    }

    async fn save(&self, job: &DelayedJob) -> anyhow::Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        for i in 0..jobs.len() {
            if jobs[i].id == job.id {
                jobs.splice(i..i + 1, vec![job.clone()]);
            }
        }
        Ok(())
    }

    async fn find(&self, job_id: &JobId) -> Option<DelayedJob> {
        let jobs = self.jobs.lock().unwrap();
        jobs.iter().find(|job| job.id == *job_id).cloned()
    }

    async fn find_by_state(&self, state: JobState) -> Vec<DelayedJob> {
        let jobs = self.jobs.lock().unwrap();
        jobs.iter().filter(|job| job.state == state).cloned().collect()
    }

    async fn delete_pending(&self, job_id: &JobId) -> Option<DelayedJob> {
        let mut jobs = self.jobs.lock().unwrap();
        for i in 0..jobs.len() {
            if jobs[i].id == *job_id && jobs[i].state == JobState::Pending {
                return Some(jobs.remove(i));
            }
        }
        None
    }

    async fn delete(&self, job_id: &JobId) -> Option<DelayedJob> {
        let mut jobs = self.jobs.lock().unwrap();
        for i in 0..jobs.len() {
            if jobs[i].id == *job_id {
                return Some(jobs.remove(i));
            }
        }
        None
    }

    async fn claim_due(&self, now: i64, limit: i64) -> anyhow::Result<Vec<DelayedJob>> {
        let mut jobs = self.jobs.lock().unwrap();
        let mut due = jobs
            .iter_mut()
            .filter(|job| job.state == JobState::Pending && job.run_at <= now)
            .collect::<Vec<_>>();
        due.sort_by_key(|job| job.run_at);

        let mut claimed = Vec::new();
        for job in due.into_iter().take(limit as usize) {
            job.state = JobState::Active;
            job.claimed_at = Some(now);
            claimed.push(job.clone());
        }
        Ok(claimed)
    }

    async fn prune_completed(&self, keep: i64) -> anyhow::Result<u64> {
        let mut jobs = self.jobs.lock().unwrap();
        let mut completed = jobs
            .iter()
            .filter(|job| job.state == JobState::Completed)
            .map(|job| (job.run_at, job.id.clone()))
            .collect::<Vec<_>>();
        if completed.len() <= keep as usize {
            return Ok(0);
        }
        // Keep the `keep` most recently fired jobs
        completed.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        let keep_ids = completed
            .iter()
            .take(keep as usize)
            .map(|(_, id)| id.clone())
            .collect::<std::collections::HashSet<_>>();

        let before = jobs.len();
        jobs.retain(|job| job.state != JobState::Completed || keep_ids.contains(&job.id));
        Ok((before - jobs.len()) as u64)
    }

    async fn reclaim_stalled(&self, claimed_before: i64) -> anyhow::Result<Vec<DelayedJob>> {
        let mut jobs = self.jobs.lock().unwrap();
        let mut reclaimed = Vec::new();
        for job in jobs.iter_mut() {
            let stalled = job.state == JobState::Active
                && job.claimed_at.map(|at| at <= claimed_before).unwrap_or(true);
            if stalled {
                job.state = JobState::Pending;
                job.claimed_at = None;
                reclaimed.push(job.clone());
            }
        }
        Ok(reclaimed)
    }
}
