use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::domain::topology::{connection::Connection, gpu_node::GpuNode, node_record::NodeRecord, server_node::ServerNode};
use crate::domain::utils::id::{ConnectionId, NodeId};

/// One atomic capture of the cluster: GPU nodes, server nodes and their connections.
///
/// Snapshots are immutable once built; consumers share them behind an `Arc` and
/// a refresh replaces the whole value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopologySnapshot {
    pub gpus: Vec<GpuNode>,
    pub servers: Vec<ServerNode>,
    pub connections: Vec<Connection>,
}

/// A backend element violating a topology invariant. Faults are logged and the
/// element is left out of the rendered graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IntegrityFault {
    DanglingConnection { connection: ConnectionId, missing: Vec<NodeId> },
    DuplicateNode { node: NodeId },
    DuplicateConnection { connection: ConnectionId },
    UnknownNodeType { node: NodeId, node_type: String },
    MissingField { element: String, field: &'static str },
}

impl fmt::Display for IntegrityFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityFault::DanglingConnection { connection, missing } => {
                let missing: Vec<&str> = missing.iter().map(|id| id.as_str()).collect();
                write!(f, "connection {} references unknown node(s) {}", connection, missing.join(", "))
            }
            IntegrityFault::DuplicateNode { node } => write!(f, "node id {} appears more than once", node),
            IntegrityFault::DuplicateConnection { connection } => write!(f, "connection id {} appears more than once", connection),
            IntegrityFault::UnknownNodeType { node, node_type } => write!(f, "node {} has unrecognized type '{}'", node, node_type),
            IntegrityFault::MissingField { element, field } => write!(f, "{} is missing required field '{}'", element, field),
        }
    }
}

impl TopologySnapshot {
    pub fn new(gpus: Vec<GpuNode>, servers: Vec<ServerNode>, connections: Vec<Connection>) -> Self {
        Self { gpus, servers, connections }
    }

    pub fn is_empty(&self) -> bool {
        self.gpus.is_empty() && self.servers.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.gpus.len() + self.servers.len()
    }

    pub fn node_ids(&self) -> HashSet<&NodeId> {
        self.servers.iter().map(|server| &server.id).chain(self.gpus.iter().map(|gpu| &gpu.id)).collect()
    }

    /// Node records in render order: servers first, then GPUs, each in backend order.
    pub fn node_records(&self) -> impl Iterator<Item = NodeRecord> + '_ {
        self.servers.iter().cloned().map(NodeRecord::Server).chain(self.gpus.iter().cloned().map(NodeRecord::Gpu))
    }

    pub fn node(&self, id: &NodeId) -> Option<NodeRecord> {
        if let Some(gpu) = self.gpus.iter().find(|gpu| &gpu.id == id) {
            return Some(NodeRecord::Gpu(gpu.clone()));
        }
        self.servers.iter().find(|server| &server.id == id).cloned().map(NodeRecord::Server)
    }

    pub fn gpu(&self, id: &NodeId) -> Option<&GpuNode> {
        self.gpus.iter().find(|gpu| &gpu.id == id)
    }

    /// Node ids a connection references that are not part of this snapshot.
    pub fn missing_endpoints(&self, connection: &Connection) -> Vec<NodeId> {
        let node_ids = self.node_ids();
        [&connection.source, &connection.target].into_iter().filter(|id| !node_ids.contains(id)).cloned().collect()
    }

    /// Connections whose both endpoints exist in this snapshot.
    pub fn valid_connections(&self) -> impl Iterator<Item = &Connection> {
        let node_ids = self.node_ids();
        self.connections.iter().filter(move |connection| node_ids.contains(&connection.source) && node_ids.contains(&connection.target))
    }

    /// Checks every invariant of the snapshot; an empty result means the snapshot is self-consistent.
    pub fn integrity_faults(&self) -> Vec<IntegrityFault> {
        let mut faults = Vec::new();
        let mut seen: HashSet<&NodeId> = HashSet::new();

        for id in self.servers.iter().map(|server| &server.id).chain(self.gpus.iter().map(|gpu| &gpu.id)) {
            if !seen.insert(id) {
                faults.push(IntegrityFault::DuplicateNode { node: id.clone() });
            }
        }

        for connection in &self.connections {
            let missing: Vec<NodeId> =
                [&connection.source, &connection.target].into_iter().filter(|id| !seen.contains(id)).cloned().collect();
            if !missing.is_empty() {
                faults.push(IntegrityFault::DanglingConnection { connection: connection.id.clone(), missing });
            }
        }

        faults
    }
}
