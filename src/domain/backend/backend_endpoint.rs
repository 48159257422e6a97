use reqwest::Method;

use crate::domain::utils::id::JobId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEndpoint {
    Topology,
    Jobs,
    SubmitJob,
    CancelJob(JobId),
    JobHistory(JobId),
    DetectGpu,
    SelfGpu,
}

impl BackendEndpoint {
    pub fn path(&self) -> String {
        match self {
            Self::Topology => "/api/v1/topology".to_string(),
            Self::Jobs => "/api/v1/jobs".to_string(),
            Self::SubmitJob => "/api/v1/jobs/submit".to_string(),
            Self::CancelJob(job_id) => format!("/api/v1/jobs/{}/cancel", job_id),
            Self::JobHistory(job_id) => format!("/api/v1/jobs/{}/history", job_id),
            Self::DetectGpu => "/gpu/detect".to_string(),
            Self::SelfGpu => "/gpu/self".to_string(),
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Self::SubmitJob | Self::CancelJob(_) | Self::DetectGpu => Method::POST,
            _ => Method::GET,
        }
    }

    /// Reads of state that changes behind our back must not be answered from an HTTP cache.
    pub fn bypasses_cache(&self) -> bool {
        matches!(self, Self::Topology | Self::Jobs | Self::JobHistory(_) | Self::SelfGpu)
    }
}
