use async_trait::async_trait;
use std::sync::Arc;

use crate::api::gpu_dto::{GpuDetectResponseDto, SelfGpuResponseDto};
use crate::api::job_dto::{CancelJobResponseDto, JobHistoryDto, JobsResponseDto, SubmitJobRequestDto, SubmitJobResponseDto};
use crate::api::topology_dto::TopologyResponseDto;
use crate::domain::utils::id::JobId;
use crate::error::Result;

/// The control-plane REST surface the dashboard consumes.
///
/// Implementations return `Error::Transport` / `Error::MalformedBody` for transient faults
/// and `Error::Backend` when the backend answered with an error payload.
#[async_trait]
pub trait BackendApi: std::fmt::Debug + Send + Sync {
    async fn fetch_topology(&self) -> Result<TopologyResponseDto>;

    async fn fetch_jobs(&self) -> Result<JobsResponseDto>;

    async fn submit_job(&self, request: &SubmitJobRequestDto) -> Result<SubmitJobResponseDto>;

    async fn cancel_job(&self, job_id: &JobId) -> Result<CancelJobResponseDto>;

    async fn fetch_job_history(&self, job_id: &JobId) -> Result<JobHistoryDto>;

    async fn detect_gpus(&self) -> Result<GpuDetectResponseDto>;

    async fn fetch_self_gpu(&self) -> Result<SelfGpuResponseDto>;
}

pub type SharedBackend = Arc<dyn BackendApi>;
