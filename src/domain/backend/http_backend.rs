use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::api::gpu_dto::{GpuDetectResponseDto, SelfGpuResponseDto};
use crate::api::job_dto::{BackendErrorDto, CancelJobResponseDto, JobHistoryDto, JobsResponseDto, SubmitJobRequestDto, SubmitJobResponseDto};
use crate::api::topology_dto::TopologyResponseDto;
use crate::domain::backend::{backend_api::BackendApi, backend_endpoint::BackendEndpoint};
use crate::domain::utils::id::JobId;
use crate::error::{Error, Result};

/// `BackendApi` over the control plane's JSON/HTTP surface.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder().default_headers(headers).timeout(request_timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        log::debug!("HTTP backend targets {}", base_url);
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call<T: DeserializeOwned>(&self, endpoint: BackendEndpoint, body: Option<&SubmitJobRequestDto>) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        let mut request = self.client.request(endpoint.method(), &url);

        if endpoint.bypasses_cache() {
            request = request.header(CACHE_CONTROL, "no-cache").header(PRAGMA, "no-cache");
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        log::trace!("{} {} -> {}", endpoint.method(), url, status);
        decode_response(&endpoint, status, &text)
    }
}

/// Maps a raw response to a DTO.
///
/// Non-success statuses become `Error::Backend` carrying the backend's own message when the
/// body has one; success bodies that do not match the expected shape become `Error::MalformedBody`.
pub fn decode_response<T: DeserializeOwned>(endpoint: &BackendEndpoint, status: StatusCode, body: &str) -> Result<T> {
    if !status.is_success() {
        let message = serde_json::from_str::<BackendErrorDto>(body)
            .ok()
            .and_then(BackendErrorDto::into_message)
            .unwrap_or_else(|| fallback_message(status, body));
        return Err(Error::backend(Some(status.as_u16()), message));
    }

    serde_json::from_str(body).map_err(|e| Error::MalformedBody { endpoint: endpoint.path(), reason: e.to_string() })
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("Backend responded with {}", status)
    } else {
        body.to_string()
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn fetch_topology(&self) -> Result<TopologyResponseDto> {
        self.call(BackendEndpoint::Topology, None).await
    }

    async fn fetch_jobs(&self) -> Result<JobsResponseDto> {
        self.call(BackendEndpoint::Jobs, None).await
    }

    async fn submit_job(&self, request: &SubmitJobRequestDto) -> Result<SubmitJobResponseDto> {
        self.call(BackendEndpoint::SubmitJob, Some(request)).await
    }

    async fn cancel_job(&self, job_id: &JobId) -> Result<CancelJobResponseDto> {
        self.call(BackendEndpoint::CancelJob(job_id.clone()), None).await
    }

    async fn fetch_job_history(&self, job_id: &JobId) -> Result<JobHistoryDto> {
        self.call(BackendEndpoint::JobHistory(job_id.clone()), None).await
    }

    async fn detect_gpus(&self) -> Result<GpuDetectResponseDto> {
        self.call(BackendEndpoint::DetectGpu, None).await
    }

    async fn fetch_self_gpu(&self) -> Result<SelfGpuResponseDto> {
        self.call(BackendEndpoint::SelfGpu, None).await
    }
}
