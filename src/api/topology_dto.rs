use serde::{Deserialize, Serialize};

use crate::api::serde_helpers::{opt_lenient_i64, opt_string_or_number};

/// Every shape the backend has been observed to return for `GET /api/v1/topology`.
///
/// Variant order matters for the untagged match: the flat shape requires both
/// `gpus` and `servers`, the generic shape requires `nodes`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum TopologyResponseDto {
    Flat(FlatTopologyDto),
    Generic(GenericTopologyDto),
    Wrapped(WrappedTopologyDto),
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FlatTopologyDto {
    pub gpus: Vec<GpuDto>,
    pub servers: Vec<ServerDto>,
    #[serde(default)]
    pub connections: Vec<ConnectionDto>,
    #[serde(default)]
    pub total_jobs: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GenericTopologyDto {
    pub nodes: Vec<GenericNodeDto>,
    #[serde(default, alias = "links", alias = "edges")]
    pub connections: Vec<ConnectionDto>,
}

/// Legacy agent endpoint: `{"topology": {"nodes": [...], "links": [...]}}`, served
/// by `/topology` with one more `topology` wrapper around it. Its nodes are GPUs and
/// carry no `type`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct WrappedTopologyDto {
    pub topology: Box<TopologyResponseDto>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct GpuDto {
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
    #[serde(default, alias = "memoryTotal", deserialize_with = "opt_lenient_i64")]
    pub memory_total: Option<i64>,
    #[serde(default, alias = "memoryUsed", deserialize_with = "opt_lenient_i64")]
    pub memory_used: Option<i64>,
    #[serde(default, deserialize_with = "opt_lenient_i64")]
    pub active_jobs: Option<i64>,
    #[serde(default)]
    pub current_job: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServerDto {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cpu: Option<String>,
    #[serde(default)]
    pub ram: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "opt_lenient_i64")]
    pub active_jobs: Option<i64>,
}

/// Node of the generic shape; `type` discriminates GPU from server.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct GenericNodeDto {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default, rename = "type", alias = "node_type", alias = "kind")]
    pub node_type: Option<String>,
    #[serde(default, alias = "label")]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "opt_lenient_i64")]
    pub temperature: Option<i64>,
    #[serde(default, deserialize_with = "opt_lenient_i64")]
    pub utilization: Option<i64>,
    #[serde(default, alias = "memoryTotal", deserialize_with = "opt_lenient_i64")]
    pub memory_total: Option<i64>,
    #[serde(default, alias = "memoryUsed", deserialize_with = "opt_lenient_i64")]
    pub memory_used: Option<i64>,
    #[serde(default)]
    pub cpu: Option<String>,
    #[serde(default)]
    pub ram: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default, deserialize_with = "opt_lenient_i64")]
    pub active_jobs: Option<i64>,
    #[serde(default)]
    pub current_job: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ConnectionDto {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub target: Option<String>,
    #[serde(default, rename = "type", alias = "connection", alias = "link_type")]
    pub link_type: Option<String>,
    #[serde(default)]
    pub bandwidth: Option<String>,
}
