#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nebula_dashboard::api::gpu_dto::{GpuDetectResponseDto, SelfGpuResponseDto};
use nebula_dashboard::api::job_dto::{
    CancelJobResponseDto, JobDto, JobHistoryDto, JobsResponseDto, SubmitJobRequestDto, SubmitJobResponseDto,
};
use nebula_dashboard::api::topology_dto::TopologyResponseDto;
use nebula_dashboard::domain::backend::backend_api::BackendApi;
use nebula_dashboard::domain::clock::clock_mock::MockClock;
use nebula_dashboard::domain::utils::id::JobId;
use nebula_dashboard::error::{Error, Result};

/// Scripted answer of the mock backend.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    /// Stand-in for a refused connection or timeout.
    Unreachable,
    /// Non-success status with the given message.
    Backend(String),
}

impl<T> Reply<T> {
    fn into_result(self, endpoint: &str) -> Result<T> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Unreachable => Err(Error::MalformedBody { endpoint: endpoint.to_string(), reason: "connection refused".to_string() }),
            Reply::Backend(message) => Err(Error::backend(Some(500), message)),
        }
    }
}

/// One endpoint: a queue of one-shot answers, then a standing answer.
#[derive(Debug)]
struct Script<T> {
    queued: VecDeque<(Duration, Reply<T>)>,
    standing: Reply<T>,
    delay: Duration,
}

impl<T: Clone> Script<T> {
    fn new(standing: Reply<T>) -> Self {
        Self { queued: VecDeque::new(), standing, delay: Duration::ZERO }
    }

    fn next(&mut self) -> (Duration, Reply<T>) {
        self.queued.pop_front().unwrap_or_else(|| (self.delay, self.standing.clone()))
    }
}

#[derive(Debug)]
struct MockState {
    topology: Script<TopologyResponseDto>,
    jobs: Script<JobsResponseDto>,
    submit: Script<SubmitJobResponseDto>,
    cancel: Script<CancelJobResponseDto>,
    history: Script<JobHistoryDto>,
    detect: Script<GpuDetectResponseDto>,
    self_gpu: Script<SelfGpuResponseDto>,

    /// Added to the standing job list when a submission succeeds.
    job_on_submit: Option<JobDto>,
    submitted: Vec<SubmitJobRequestDto>,
    cancelled: Vec<JobId>,
}

#[derive(Debug, Default)]
pub struct CallCounters {
    pub topology: AtomicUsize,
    pub jobs: AtomicUsize,
    pub submit: AtomicUsize,
    pub cancel: AtomicUsize,
    pub history: AtomicUsize,
    pub detect: AtomicUsize,
    pub self_gpu: AtomicUsize,
}

impl CallCounters {
    pub fn total(&self) -> usize {
        [&self.topology, &self.jobs, &self.submit, &self.cancel, &self.history, &self.detect, &self.self_gpu]
            .iter()
            .map(|counter| counter.load(Ordering::SeqCst))
            .sum()
    }
}

/// In-memory `BackendApi` with scripted answers, per-call delays and request counters.
#[derive(Debug)]
pub struct MockBackend {
    state: Mutex<MockState>,
    pub calls: CallCounters,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockState {
                topology: Script::new(Reply::Ok(flat_topology())),
                jobs: Script::new(Reply::Ok(JobsResponseDto::default())),
                submit: Script::new(Reply::Backend("submit not scripted".to_string())),
                cancel: Script::new(Reply::Ok(CancelJobResponseDto::default())),
                history: Script::new(Reply::Ok(JobHistoryDto::default())),
                detect: Script::new(Reply::Ok(GpuDetectResponseDto::default())),
                self_gpu: Script::new(Reply::Ok(SelfGpuResponseDto::default())),
                job_on_submit: None,
                submitted: Vec::new(),
                cancelled: Vec::new(),
            }),
            calls: CallCounters::default(),
        })
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn set_topology(&self, reply: Reply<TopologyResponseDto>) {
        self.state().topology.standing = reply;
    }

    pub fn queue_topology(&self, delay: Duration, reply: Reply<TopologyResponseDto>) {
        self.state().topology.queued.push_back((delay, reply));
    }

    pub fn set_topology_delay(&self, delay: Duration) {
        self.state().topology.delay = delay;
    }

    pub fn set_jobs(&self, jobs: Vec<JobDto>) {
        self.state().jobs.standing = Reply::Ok(JobsResponseDto { jobs });
    }

    pub fn set_jobs_reply(&self, reply: Reply<JobsResponseDto>) {
        self.state().jobs.standing = reply;
    }

    pub fn queue_jobs(&self, delay: Duration, reply: Reply<JobsResponseDto>) {
        self.state().jobs.queued.push_back((delay, reply));
    }

    pub fn set_jobs_delay(&self, delay: Duration) {
        self.state().jobs.delay = delay;
    }

    pub fn set_submit(&self, reply: Reply<SubmitJobResponseDto>, job_on_submit: Option<JobDto>) {
        let mut state = self.state();
        state.submit.standing = reply;
        state.job_on_submit = job_on_submit;
    }

    pub fn set_cancel(&self, reply: Reply<CancelJobResponseDto>) {
        self.state().cancel.standing = reply;
    }

    pub fn set_history(&self, reply: Reply<JobHistoryDto>) {
        self.state().history.standing = reply;
    }

    pub fn set_detect(&self, reply: Reply<GpuDetectResponseDto>) {
        self.state().detect.standing = reply;
    }

    pub fn set_self_gpu(&self, reply: Reply<SelfGpuResponseDto>) {
        self.state().self_gpu.standing = reply;
    }

    pub fn submitted(&self) -> Vec<SubmitJobRequestDto> {
        self.state().submitted.clone()
    }

    pub fn cancelled(&self) -> Vec<JobId> {
        self.state().cancelled.clone()
    }

    async fn answer<T>(&self, endpoint: &str, (delay, reply): (Duration, Reply<T>)) -> Result<T> {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply.into_result(endpoint)
    }
}

#[async_trait]
impl BackendApi for MockBackend {
    async fn fetch_topology(&self) -> Result<TopologyResponseDto> {
        self.calls.topology.fetch_add(1, Ordering::SeqCst);
        let next = self.state().topology.next();
        self.answer("/api/v1/topology", next).await
    }

    async fn fetch_jobs(&self) -> Result<JobsResponseDto> {
        self.calls.jobs.fetch_add(1, Ordering::SeqCst);
        let next = self.state().jobs.next();
        self.answer("/api/v1/jobs", next).await
    }

    async fn submit_job(&self, request: &SubmitJobRequestDto) -> Result<SubmitJobResponseDto> {
        self.calls.submit.fetch_add(1, Ordering::SeqCst);
        let next = {
            let mut state = self.state();
            state.submitted.push(request.clone());
            let next = state.submit.next();

            if matches!(next.1, Reply::Ok(_)) {
                if let Some(job) = state.job_on_submit.take() {
                    if let Reply::Ok(listing) = &mut state.jobs.standing {
                        listing.jobs.push(job);
                    }
                }
            }
            next
        };
        self.answer("/api/v1/jobs/submit", next).await
    }

    async fn cancel_job(&self, job_id: &JobId) -> Result<CancelJobResponseDto> {
        self.calls.cancel.fetch_add(1, Ordering::SeqCst);
        let next = {
            let mut state = self.state();
            state.cancelled.push(job_id.clone());
            state.cancel.next()
        };
        self.answer("/api/v1/jobs/cancel", next).await
    }

    async fn fetch_job_history(&self, _job_id: &JobId) -> Result<JobHistoryDto> {
        self.calls.history.fetch_add(1, Ordering::SeqCst);
        let next = self.state().history.next();
        self.answer("/api/v1/jobs/history", next).await
    }

    async fn detect_gpus(&self) -> Result<GpuDetectResponseDto> {
        self.calls.detect.fetch_add(1, Ordering::SeqCst);
        let next = self.state().detect.next();
        self.answer("/gpu/detect", next).await
    }

    async fn fetch_self_gpu(&self) -> Result<SelfGpuResponseDto> {
        self.calls.self_gpu.fetch_add(1, Ordering::SeqCst);
        let next = self.state().self_gpu.next();
        self.answer("/gpu/self", next).await
    }
}

pub fn topology_from_json(body: &str) -> TopologyResponseDto {
    serde_json::from_str(body).unwrap()
}

/// Shape served by the control plane: one agent with two GPUs.
pub fn flat_topology() -> TopologyResponseDto {
    topology_from_json(
        r#"{
            "gpus": [
                {"id": "gpu-0", "name": "GPU 0", "model": "A100", "status": "healthy", "temperature": 70, "utilization": 40},
                {"id": "gpu-1", "name": "GPU 1", "model": "A100", "status": "available", "temperature": 83, "utilization": 95}
            ],
            "servers": [{"id": "server-node-alpha", "name": "node-alpha", "cpu": "64 cores", "ram": "512 GB", "status": "online"}],
            "connections": [
                {"id": "conn-node-alpha-gpu-0", "source": "server-node-alpha", "target": "gpu-0", "type": "pcie"},
                {"id": "conn-node-alpha-gpu-1", "source": "server-node-alpha", "target": "gpu-1", "type": "pcie"}
            ],
            "total_jobs": 1
        }"#,
    )
}

pub fn job_dto(id: &str, status: &str, gpu: Option<&str>) -> JobDto {
    JobDto {
        id: Some(id.to_string()),
        workload_type: Some("inference".to_string()),
        command: Some("python serve.py".to_string()),
        status: Some(status.to_string()),
        gpu: gpu.map(str::to_string),
        agent: Some("node-alpha".to_string()),
        created_at: Some("2025-03-01T10:00:00".to_string()),
        started_at: None,
        completed_at: None,
    }
}

pub fn mock_clock() -> Arc<MockClock> {
    Arc::new(MockClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 45).unwrap()))
}
