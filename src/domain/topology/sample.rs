use crate::domain::topology::{
    connection::{Connection, LinkType},
    gpu_node::{GpuNode, HealthStatus},
    server_node::{ServerNode, ServerStatus},
    snapshot::TopologySnapshot,
};
use crate::domain::utils::id::{ConnectionId, NodeId};

const GIB: u64 = 1024 * 1024 * 1024;

fn sample_gpu(id: &str, name: &str, model: &str, temperature: i32, utilization: u8, memory_used_gib: u64) -> GpuNode {
    GpuNode {
        id: NodeId::new(id),
        name: name.to_string(),
        model: model.to_string(),
        temperature,
        utilization,
        health: HealthStatus::from_temperature(temperature),
        memory_total: Some(80 * GIB),
        memory_used: Some(memory_used_gib * GIB),
        active_jobs: 0,
        current_job: None,
    }
}

fn sample_server(id: &str, name: &str) -> ServerNode {
    ServerNode {
        id: NodeId::new(id),
        name: name.to_string(),
        cpu: "AMD EPYC 7763 (64 cores)".to_string(),
        ram: "512 GB".to_string(),
        os: Some("Ubuntu 22.04".to_string()),
        status: ServerStatus::Online,
        active_jobs: 0,
    }
}

fn link(id: &str, source: &str, target: &str, link_type: LinkType, bandwidth: &str) -> Connection {
    Connection::new(ConnectionId::new(id), NodeId::new(source), NodeId::new(target), link_type).with_bandwidth(bandwidth)
}

/// Built-in snapshot shown whenever the backend cannot deliver a topology.
///
/// Always the same value, and self-consistent: every connection endpoint is one of its nodes.
pub fn sample_topology() -> TopologySnapshot {
    let servers = vec![sample_server("server-0", "node-alpha"), sample_server("server-1", "node-beta")];

    let gpus = vec![
        sample_gpu("gpu-0", "GPU 0", "NVIDIA A100-SXM4-80GB", 72, 45, 32),
        sample_gpu("gpu-1", "GPU 1", "NVIDIA A100-SXM4-80GB", 75, 60, 48),
        sample_gpu("gpu-2", "GPU 2", "NVIDIA H100-SXM5-80GB", 78, 85, 70),
        sample_gpu("gpu-3", "GPU 3", "NVIDIA H100-SXM5-80GB", 69, 20, 12),
    ];

    let connections = vec![
        link("conn-server-0-gpu-0", "server-0", "gpu-0", LinkType::Pcie, "32 GB/s"),
        link("conn-server-0-gpu-1", "server-0", "gpu-1", LinkType::Pcie, "32 GB/s"),
        link("conn-server-1-gpu-2", "server-1", "gpu-2", LinkType::Pcie, "64 GB/s"),
        link("conn-server-1-gpu-3", "server-1", "gpu-3", LinkType::Pcie, "64 GB/s"),
        link("conn-gpu-0-gpu-1", "gpu-0", "gpu-1", LinkType::Nvlink, "600 GB/s"),
        link("conn-gpu-2-gpu-3", "gpu-2", "gpu-3", LinkType::Nvlink, "900 GB/s"),
        link("conn-server-0-server-1", "server-0", "server-1", LinkType::Infiniband, "200 Gb/s"),
    ];

    TopologySnapshot::new(gpus, servers, connections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::topology::metrics::TopologyMetrics;

    #[test]
    fn test_sample_is_self_consistent() {
        let sample = sample_topology();
        assert!(sample.integrity_faults().is_empty());
        assert_eq!(sample.valid_connections().count(), sample.connections.len());
    }

    #[test]
    fn test_sample_is_deterministic() {
        assert_eq!(sample_topology(), sample_topology());
    }

    #[test]
    fn test_sample_metrics() {
        let metrics = TopologyMetrics::compute(&sample_topology());
        assert_eq!(metrics.gpu_count, 4);
        assert_eq!(metrics.connection_count, 7);
        assert_eq!(metrics.average_temperature, 74);
    }
}
