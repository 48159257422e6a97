use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::job_dto::{CancelJobResponseDto, SubmitJobRequestDto, SubmitJobResponseDto};
use crate::domain::backend::backend_api::SharedBackend;
use crate::domain::clock::clock::parse_timestamp;
use crate::domain::jobs::job::{Job, JobStatus, WorkloadType};
use crate::domain::jobs::job_store::JobStore;
use crate::domain::utils::id::{JobId, NodeId};
use crate::error::{Error, Result};
use crate::logger::AUDIT_TARGET;

/// What the operator learns after a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitReceipt {
    pub job_id: JobId,

    /// Assigned GPU as reported by the scheduler; `None` while queued.
    pub gpu: Option<NodeId>,
    pub status: Option<JobStatus>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CancelOutcome {
    Cancelled { job_id: JobId, status: String },
    /// The operator did not confirm; nothing was sent.
    Declined,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobHistoryEntry {
    pub action: String,
    pub details: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Asked before a cancel request goes out.
pub trait ConfirmCancel {
    fn confirm(&self, job: &Job) -> bool;
}

impl<F> ConfirmCancel for F
where
    F: Fn(&Job) -> bool,
{
    fn confirm(&self, job: &Job) -> bool {
        self(job)
    }
}

/// Validates operator requests, forwards them to the scheduler and refreshes the job store afterwards.
///
/// Nothing here writes job state locally: the next poll is the only source of truth.
#[derive(Debug, Clone)]
pub struct JobLifecycleController {
    backend: SharedBackend,
    jobs: JobStore,
}

impl JobLifecycleController {
    pub fn new(backend: SharedBackend, jobs: JobStore) -> Self {
        Self { backend, jobs }
    }

    pub fn job_store(&self) -> &JobStore {
        &self.jobs
    }

    pub async fn submit(&self, workload_type: WorkloadType, command: &str) -> Result<SubmitReceipt> {
        let command = command.trim();
        if command.is_empty() {
            return Err(Error::EmptyCommand);
        }

        let request = SubmitJobRequestDto { workload_type: workload_type.as_str().to_string(), command: command.to_string() };
        let response = self.backend.submit_job(&request).await.inspect_err(|e| {
            tracing::warn!(target: AUDIT_TARGET, Action = "submit", WorkloadType = %workload_type, Error = %e);
        })?;

        let receipt = receipt_from_response(response).inspect_err(|e| {
            tracing::warn!(target: AUDIT_TARGET, Action = "submit", WorkloadType = %workload_type, Error = %e);
        })?;

        tracing::info!(
            target: AUDIT_TARGET,
            Action = "submit",
            JobId = %receipt.job_id,
            WorkloadType = %workload_type,
            Gpu = receipt.gpu.as_ref().map(|gpu| gpu.as_str()).unwrap_or("unassigned"),
            Status = receipt.status.map(|status| status.as_str()).unwrap_or("unknown"),
        );

        self.refresh_after("submit").await;
        Ok(receipt)
    }

    /// Whether the job table offers a cancel action for `job`.
    pub fn cancel_offered(&self, job: &Job) -> bool {
        job.cancel_offered()
    }

    pub async fn cancel(&self, job_id: &JobId, confirm: &impl ConfirmCancel) -> Result<CancelOutcome> {
        let jobs = self.jobs.current();
        let job = jobs.get(job_id).ok_or_else(|| Error::UnknownJob(job_id.to_string()))?;

        if !self.cancel_offered(job) {
            return Err(Error::CancelNotOffered { job_id: job_id.to_string(), status: job.status.to_string() });
        }
        if !confirm.confirm(job) {
            log::info!("Cancellation of job {} not confirmed.", job_id);
            return Ok(CancelOutcome::Declined);
        }

        let outcome = self.backend.cancel_job(job_id).await.and_then(|response| cancel_outcome(job_id, response));

        match outcome {
            Ok(outcome) => {
                tracing::info!(target: AUDIT_TARGET, Action = "cancel", JobId = %job_id, Outcome = ?outcome);
                self.refresh_after("cancel").await;
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(target: AUDIT_TARGET, Action = "cancel", JobId = %job_id, Error = %e);
                Err(e)
            }
        }
    }

    pub async fn history(&self, job_id: &JobId) -> Result<Vec<JobHistoryEntry>> {
        let response = self.backend.fetch_job_history(job_id).await?;
        Ok(response
            .history
            .into_iter()
            .map(|entry| JobHistoryEntry {
                action: entry.action,
                details: entry.details,
                timestamp: entry.timestamp.as_deref().and_then(parse_timestamp),
            })
            .collect())
    }

    async fn refresh_after(&self, action: &str) {
        if let Err(e) = self.jobs.poll().await {
            log::debug!("Job refresh after {} failed; the next scheduled poll retries: {}", action, e);
        }
    }
}

/// The scheduler reports some failures with a success status code, so the body decides.
fn receipt_from_response(response: SubmitJobResponseDto) -> Result<SubmitReceipt> {
    let is_error = response.status.as_deref().is_some_and(|status| status.eq_ignore_ascii_case("error"));

    let job_id = match (is_error, response.job_id) {
        (false, Some(job_id)) => job_id,
        _ => {
            let message = response
                .error
                .or(response.message)
                .unwrap_or_else(|| "Submission rejected without a message".to_string());
            return Err(Error::backend(None, message));
        }
    };

    Ok(SubmitReceipt {
        job_id: JobId::new(job_id),
        gpu: response.gpu.map(NodeId::new),
        status: response.status.as_deref().and_then(|status| status.parse().ok()),
        message: response.message.or(response.error),
    })
}

fn cancel_outcome(job_id: &JobId, response: CancelJobResponseDto) -> Result<CancelOutcome> {
    if let Some(error) = response.error {
        return Err(Error::backend(None, error));
    }

    match response.status.as_deref() {
        None | Some("cancelled") | Some("canceled") | Some("already_finished") => Ok(CancelOutcome::Cancelled {
            job_id: job_id.clone(),
            status: response.status.unwrap_or_else(|| "cancelled".to_string()),
        }),
        Some(status) => {
            let message = response.message.unwrap_or_else(|| format!("Job is {}", status));
            Err(Error::backend(None, message))
        }
    }
}
