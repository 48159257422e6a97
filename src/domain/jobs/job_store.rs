use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::backend::backend_api::SharedBackend;
use crate::domain::clock::clock::SharedClock;
use crate::domain::jobs::job::Job;
use crate::domain::sync::snapshot_slot::SnapshotSlot;
use crate::domain::utils::id::JobId;
use crate::error::Result;

/// Job set as of one successful poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobSet {
    pub jobs: Vec<Job>,
    pub fetched_at: Option<DateTime<Utc>>,

    /// Incremented on every publication; 0 before the first successful poll.
    pub revision: u64,
}

impl JobSet {
    pub fn get(&self, id: &JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| &job.id == id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }
}

/// Known jobs, replaced wholesale by each successful poll.
#[derive(Debug, Clone)]
pub struct JobStore {
    backend: SharedBackend,
    clock: SharedClock,
    slot: Arc<SnapshotSlot<JobSet>>,
}

impl JobStore {
    pub fn new(backend: SharedBackend, clock: SharedClock) -> Self {
        Self { backend, clock, slot: Arc::new(SnapshotSlot::new(JobSet::default())) }
    }

    pub fn current(&self) -> Arc<JobSet> {
        self.slot.load()
    }

    /// Fetches the job list and publishes it.
    ///
    /// On failure the previous set stays in place and the error is returned after being logged.
    /// `Ok(false)` means a poll issued later has already published.
    pub async fn poll(&self) -> Result<bool> {
        let token = self.slot.issue();

        let response = match self.backend.fetch_jobs().await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Job poll failed, keeping {} known job(s): {}", self.current().len(), e);
                return Err(e);
            }
        };

        let fresh: Vec<Job> = response
            .jobs
            .into_iter()
            .filter_map(|dto| Job::try_from(dto).map_err(|e| log::warn!("Skipping job record: {}", e)).ok())
            .collect();
        let fetched_at = self.clock.now();

        let published = self.slot.publish_with(token, |previous| JobSet {
            jobs: reconcile(previous, fresh),
            fetched_at: Some(fetched_at),
            revision: previous.revision + 1,
        });

        Ok(published.is_some())
    }
}

/// Applies polled truth on top of the previous set. A job already in a terminal state keeps it.
fn reconcile(previous: &JobSet, fresh: Vec<Job>) -> Vec<Job> {
    let known: HashMap<&JobId, &Job> = previous.jobs.iter().map(|job| (&job.id, job)).collect();

    fresh
        .into_iter()
        .map(|mut job| {
            if let Some(old) = known.get(&job.id) {
                if !old.status.can_transition_to(job.status) {
                    if old.status.is_terminal() {
                        log::warn!(
                            "Integrity fault: job {} was {} and is now reported as {}; keeping {}.",
                            job.id,
                            old.status,
                            job.status,
                            old.status
                        );
                        job.status = old.status;
                        job.completed_at = old.completed_at.or(job.completed_at);
                    } else {
                        log::debug!("Job {} moved from {} back to {}.", job.id, old.status, job.status);
                    }
                }
            }
            job
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::jobs::job::JobStatus;

    fn job(id: &str, status: JobStatus) -> Job {
        Job {
            id: JobId::new(id),
            workload_type: None,
            command: "run".to_string(),
            status,
            gpu: None,
            agent: None,
            created_at: None,
            started_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_terminal_status_is_kept() {
        let previous = JobSet { jobs: vec![job("1", JobStatus::Completed), job("2", JobStatus::Queued)], ..Default::default() };
        let fresh = vec![job("1", JobStatus::Running), job("2", JobStatus::Running)];

        let reconciled = reconcile(&previous, fresh);
        assert_eq!(reconciled[0].status, JobStatus::Completed);
        assert_eq!(reconciled[1].status, JobStatus::Running);
    }

    #[test]
    fn test_new_jobs_are_taken_as_reported() {
        let reconciled = reconcile(&JobSet::default(), vec![job("9", JobStatus::Failed)]);
        assert_eq!(reconciled[0].status, JobStatus::Failed);
    }
}
