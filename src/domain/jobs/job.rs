use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::api::job_dto::JobDto;
use crate::domain::clock::clock::parse_timestamp;
use crate::domain::utils::id::{AgentId, JobId, NodeId};
use crate::error::Error;

/// Lifecycle state of a job as reported by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created and bound to a GPU, not launched yet.
    Pending,
    /// Waiting for a GPU to become available.
    Queued,
    /// Process launched on the assigned GPU.
    Running,
    /// Finished successfully.
    Completed,
    /// Launch or execution failed.
    Failed,
    /// Terminated on operator request.
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    /// Cancel is only offered while the scheduler can still stop the job.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    fn rank(&self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Queued => 1,
            JobStatus::Running => 2,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled => 3,
        }
    }

    /// Whether `next` may follow `self`. Polls are coarse, so intermediate states may be skipped;
    /// terminal states never change.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if *self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next.rank() > self.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "completed" | "finished" | "done" => Ok(JobStatus::Completed),
            "failed" | "error" => Ok(JobStatus::Failed),
            "cancelled" | "canceled" => Ok(JobStatus::Cancelled),
            other => Err(Error::UnknownJobStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkloadType {
    Inference,
    Training,
    FineTuning,
    Testing,
    DataProcessing,
    Task,
}

impl WorkloadType {
    pub const ALL: [WorkloadType; 6] = [
        WorkloadType::Inference,
        WorkloadType::Training,
        WorkloadType::FineTuning,
        WorkloadType::Testing,
        WorkloadType::DataProcessing,
        WorkloadType::Task,
    ];

    /// Wire form expected by the scheduler.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadType::Inference => "inference",
            WorkloadType::Training => "training",
            WorkloadType::FineTuning => "fine-tuning",
            WorkloadType::Testing => "testing",
            WorkloadType::DataProcessing => "data-processing",
            WorkloadType::Task => "task",
        }
    }
}

impl fmt::Display for WorkloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts `_` and spaces as separators and any letter case: `Fine_Tuning`, `data processing`.
impl FromStr for WorkloadType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "inference" => Ok(WorkloadType::Inference),
            "training" => Ok(WorkloadType::Training),
            "fine-tuning" | "finetuning" | "fine-tune" => Ok(WorkloadType::FineTuning),
            "testing" | "test" => Ok(WorkloadType::Testing),
            "data-processing" | "dataprocessing" => Ok(WorkloadType::DataProcessing),
            "task" => Ok(WorkloadType::Task),
            _ => Err(Error::UnknownWorkloadType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: JobId,

    /// `None` if the backend reported a label outside the known set.
    pub workload_type: Option<WorkloadType>,
    pub command: String,
    pub status: JobStatus,
    pub gpu: Option<NodeId>,
    pub agent: Option<AgentId>,
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Display label used by the job table, e.g. `#42`.
    pub fn label(&self) -> String {
        format!("#{}", self.id)
    }

    pub fn cancel_offered(&self) -> bool {
        self.status.is_cancellable()
    }
}

impl TryFrom<JobDto> for Job {
    type Error = Error;

    fn try_from(dto: JobDto) -> Result<Self, Self::Error> {
        let Some(id) = dto.id else {
            return Err(Error::MissingField { element: "job record".to_string(), field: "id" });
        };
        let Some(status) = dto.status else {
            return Err(Error::MissingField { element: format!("job {}", id), field: "status" });
        };
        let status = status.parse::<JobStatus>()?;
        let workload_type = dto.workload_type.as_deref().and_then(|label| match label.parse::<WorkloadType>() {
            Ok(workload_type) => Some(workload_type),
            Err(_) => {
                log::debug!("Job {} has unrecognized workload type '{}'.", id, label);
                None
            }
        });

        Ok(Job {
            id: JobId::new(id),
            workload_type,
            command: dto.command.unwrap_or_default(),
            status,
            gpu: dto.gpu.map(NodeId::new),
            agent: dto.agent.map(AgentId::new),
            created_at: dto.created_at.as_deref().and_then(parse_timestamp),
            started_at: dto.started_at.as_deref().and_then(parse_timestamp),
            completed_at: dto.completed_at.as_deref().and_then(parse_timestamp),
        })
    }
}
