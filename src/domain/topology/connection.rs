use serde::Serialize;
use std::fmt;

use crate::domain::utils::id::{ConnectionId, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Pcie,
    Nvlink,
    Infiniband,
    /// Backend-defined link type, lowercased.
    Other(String),
}

impl LinkType {
    pub fn from_label(label: Option<&str>) -> LinkType {
        let normalized = label.unwrap_or("pcie").trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pcie" | "pci-e" | "pci" => LinkType::Pcie,
            "nvlink" | "nv-link" => LinkType::Nvlink,
            "infiniband" | "ib" => LinkType::Infiniband,
            _ => LinkType::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LinkType::Pcie => "pcie",
            LinkType::Nvlink => "nvlink",
            LinkType::Infiniband => "infiniband",
            LinkType::Other(label) => label,
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub source: NodeId,
    pub target: NodeId,
    pub link_type: LinkType,
    pub bandwidth: Option<String>,
}

impl Connection {
    pub fn new(id: ConnectionId, source: NodeId, target: NodeId, link_type: LinkType) -> Self {
        Self { id, source, target, link_type, bandwidth: None }
    }

    pub fn with_bandwidth(mut self, bandwidth: impl Into<String>) -> Self {
        self.bandwidth = Some(bandwidth.into());
        self
    }
}
