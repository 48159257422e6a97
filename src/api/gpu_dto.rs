use serde::{Deserialize, Serialize};

use crate::api::serde_helpers::{opt_lenient_i64, opt_string_or_number};

/// Body of `POST /gpu/detect`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct GpuDetectResponseDto {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub gpus: Vec<DetectedGpuDto>,
    #[serde(default)]
    pub detection_method: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct DetectedGpuDto {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "opt_lenient_i64")]
    pub temperature: Option<i64>,
    #[serde(default, deserialize_with = "opt_lenient_i64")]
    pub utilization: Option<i64>,
}

/// Body of `GET /gpu/self`; `gpu` is `null` until a detection succeeded.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SelfGpuResponseDto {
    #[serde(default)]
    pub gpu: Option<SelfGpuDto>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SelfGpuDto {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "opt_lenient_i64")]
    pub temperature: Option<i64>,
    #[serde(default, deserialize_with = "opt_lenient_i64")]
    pub utilization: Option<i64>,
    #[serde(default, deserialize_with = "opt_lenient_i64")]
    pub memory_total: Option<i64>,
    #[serde(default, deserialize_with = "opt_lenient_i64")]
    pub memory_used: Option<i64>,
    #[serde(default, deserialize_with = "opt_lenient_i64")]
    pub vram: Option<i64>,
}
