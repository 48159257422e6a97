use serde::{Deserialize, Serialize};

use crate::api::serde_helpers::{opt_lenient_i64, opt_string_or_number};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct JobsResponseDto {
    #[serde(default)]
    pub jobs: Vec<JobDto>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct JobDto {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub workload_type: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub status: Option<String>,
    #[serde(default, alias = "assigned_gpu_id", deserialize_with = "opt_string_or_number")]
    pub gpu: Option<String>,
    #[serde(default, alias = "agent_id", deserialize_with = "opt_string_or_number")]
    pub agent: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default, alias = "finished_at")]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SubmitJobRequestDto {
    pub workload_type: String,
    pub command: String,
}

/// Body of `POST /api/v1/jobs/submit`.
///
/// The scheduler answers `200` even for some failures (`{"status": "error", "message": ...}`),
/// so success is decided on the content, not only the status code.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SubmitJobResponseDto {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub job_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub gpu: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "opt_lenient_i64")]
    pub gpu_temp: Option<i64>,
    #[serde(default, deserialize_with = "opt_lenient_i64")]
    pub gpu_util: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct CancelJobResponseDto {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub job_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct JobHistoryDto {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub job_id: Option<String>,
    #[serde(default)]
    pub history: Vec<JobHistoryEntryDto>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct JobHistoryEntryDto {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    pub action: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Error payload of a non-success response. FastAPI uses `detail`, the control plane `error` or `message`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct BackendErrorDto {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl BackendErrorDto {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message).or_else(|| {
            self.detail.map(|detail| match detail {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            })
        })
    }
}
