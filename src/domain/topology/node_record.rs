use serde::Serialize;
use std::fmt;

use crate::domain::topology::{gpu_node::GpuNode, server_node::ServerNode};
use crate::domain::utils::id::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Gpu,
    Server,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Gpu => f.write_str("gpu"),
            NodeKind::Server => f.write_str("server"),
        }
    }
}

/// Full record of one graph node: identity plus every domain attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeRecord {
    Gpu(GpuNode),
    Server(ServerNode),
}

impl NodeRecord {
    pub fn id(&self) -> &NodeId {
        match self {
            NodeRecord::Gpu(gpu) => &gpu.id,
            NodeRecord::Server(server) => &server.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            NodeRecord::Gpu(gpu) => &gpu.name,
            NodeRecord::Server(server) => &server.name,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRecord::Gpu(_) => NodeKind::Gpu,
            NodeRecord::Server(_) => NodeKind::Server,
        }
    }

    /// Styling class consumed by a presenter (`gpu-critical`, `server-offline`, ...).
    pub fn style_class(&self) -> String {
        match self {
            NodeRecord::Gpu(gpu) => format!("gpu-{}", gpu.health),
            NodeRecord::Server(server) => format!("server-{}", server.status),
        }
    }
}
