use serde::Serialize;
use std::fmt;

use crate::domain::utils::id::NodeId;

/// Above this temperature a GPU is considered faulty.
pub const CRITICAL_TEMPERATURE_C: i32 = 85;

/// From this temperature on a GPU is flagged for the operator.
pub const WARNING_TEMPERATURE_C: i32 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Maps the backend's status label; `None` for labels that do not describe health
    /// (e.g. `"available"`, `"busy"`), in which case health is derived from temperature.
    pub fn from_label(label: &str) -> Option<HealthStatus> {
        match label.trim().to_ascii_lowercase().as_str() {
            "healthy" | "ok" | "normal" => Some(HealthStatus::Healthy),
            "warning" | "warn" | "degraded" => Some(HealthStatus::Warning),
            "critical" | "error" | "fault" | "faulty" => Some(HealthStatus::Critical),
            _ => None,
        }
    }

    pub fn from_temperature(temperature: i32) -> HealthStatus {
        if temperature > CRITICAL_TEMPERATURE_C {
            HealthStatus::Critical
        } else if temperature >= WARNING_TEMPERATURE_C {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        }
    }

    pub fn resolve(label: Option<&str>, temperature: i32) -> HealthStatus {
        label.and_then(HealthStatus::from_label).unwrap_or_else(|| HealthStatus::from_temperature(temperature))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuNode {
    pub id: NodeId,
    pub name: String,
    pub model: String,

    /// Degrees Celsius.
    pub temperature: i32,

    /// Percent, clamped to 0..=100.
    pub utilization: u8,
    pub health: HealthStatus,

    /// Bytes.
    pub memory_total: Option<u64>,
    pub memory_used: Option<u64>,

    pub active_jobs: u32,

    /// Workload type of the job currently running on this GPU, if any.
    pub current_job: Option<String>,
}

impl GpuNode {
    pub fn memory_usage_percent(&self) -> Option<u8> {
        match (self.memory_used, self.memory_total) {
            (Some(used), Some(total)) if total > 0 => Some(((used as f64 / total as f64) * 100.0).round().min(100.0) as u8),
            _ => None,
        }
    }
}

pub fn clamp_utilization(raw: Option<i64>) -> u8 {
    raw.unwrap_or(0).clamp(0, 100) as u8
}
