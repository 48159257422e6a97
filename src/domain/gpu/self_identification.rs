use serde::Serialize;

use crate::api::gpu_dto::{DetectedGpuDto, SelfGpuDto};
use crate::domain::backend::backend_api::SharedBackend;
use crate::domain::topology::gpu_node::{GpuNode, HealthStatus, clamp_utilization};
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};
use crate::logger::AUDIT_TARGET;

/// Outcome of a server-side detection run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionReport {
    pub method: Option<String>,
    pub detected: Vec<DetectedGpu>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedGpu {
    pub id: Option<String>,
    pub name: String,
    pub model: Option<String>,
}

impl From<DetectedGpuDto> for DetectedGpu {
    fn from(dto: DetectedGpuDto) -> Self {
        let name = dto.name.or_else(|| dto.id.clone()).unwrap_or_else(|| "Unknown GPU".to_string());
        DetectedGpu { id: dto.id, name, model: dto.model }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identification {
    pub report: DetectionReport,

    /// The GPU the backend host resolved as its own, if any.
    pub local_gpu: Option<GpuNode>,
}

/// Asks the backend host to detect its GPUs, then reads back which one it identified as itself.
#[derive(Debug, Clone)]
pub struct GpuSelfIdentification {
    backend: SharedBackend,
}

impl GpuSelfIdentification {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    pub async fn detect(&self) -> Result<DetectionReport> {
        let response = self.backend.detect_gpus().await?;

        if response.status.as_deref().is_some_and(|status| status.eq_ignore_ascii_case("error")) {
            let message = response.message.unwrap_or_else(|| "GPU detection failed".to_string());
            tracing::warn!(target: AUDIT_TARGET, Action = "detect", Error = %message);
            return Err(Error::backend(None, message));
        }

        let report = DetectionReport {
            method: response.detection_method,
            detected: response.gpus.into_iter().map(DetectedGpu::from).collect(),
            message: response.message,
        };

        tracing::info!(
            target: AUDIT_TARGET,
            Action = "detect",
            DetectedGpus = report.detected.len(),
            Method = report.method.as_deref().unwrap_or("unknown"),
        );
        Ok(report)
    }

    pub async fn local_gpu(&self) -> Result<Option<GpuNode>> {
        let response = self.backend.fetch_self_gpu().await?;
        Ok(response.gpu.and_then(gpu_from_self))
    }

    pub async fn identify(&self) -> Result<Identification> {
        let report = self.detect().await?;
        let local_gpu = self.local_gpu().await?;
        Ok(Identification { report, local_gpu })
    }
}

fn gpu_from_self(dto: SelfGpuDto) -> Option<GpuNode> {
    let Some(id) = dto.id else {
        log::warn!("Self GPU record without id ignored.");
        return None;
    };

    let temperature = dto.temperature.unwrap_or(0) as i32;
    let memory_total = dto.memory_total.or(dto.vram).and_then(|v| u64::try_from(v).ok());

    Some(GpuNode {
        name: dto.name.unwrap_or_else(|| id.clone()),
        model: dto.model.unwrap_or_else(|| "Unknown".to_string()),
        health: HealthStatus::resolve(dto.status.as_deref(), temperature),
        temperature,
        utilization: clamp_utilization(dto.utilization),
        memory_total,
        memory_used: dto.memory_used.and_then(|v| u64::try_from(v).ok()),
        active_jobs: 0,
        current_job: None,
        id: NodeId::new(id),
    })
}
