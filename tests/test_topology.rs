mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockBackend, Reply, flat_topology, topology_from_json};
use nebula_dashboard::domain::backend::backend_api::SharedBackend;
use nebula_dashboard::domain::topology::{
    connection::LinkType,
    gpu_node::HealthStatus,
    metrics::TopologyMetrics,
    node_record::NodeKind,
    normalize::normalize,
    sample::sample_topology,
    server_node::ServerStatus,
    snapshot::IntegrityFault,
    topology_store::{SnapshotSource, TopologyStore},
};
use nebula_dashboard::domain::utils::id::NodeId;

#[test]
fn test_flat_shape_is_normalized() {
    let normalized = normalize(flat_topology());
    let snapshot = &normalized.snapshot;

    assert!(normalized.faults.is_empty());
    assert_eq!(snapshot.gpus.len(), 2);
    assert_eq!(snapshot.servers.len(), 1);
    assert_eq!(snapshot.connections.len(), 2);

    let gpu_1 = snapshot.gpu(&NodeId::new("gpu-1")).unwrap();
    // "available" is not a health label, so health comes from the temperature.
    assert_eq!(gpu_1.health, HealthStatus::Warning);
    assert_eq!(snapshot.servers[0].status, ServerStatus::Online);
}

#[test]
fn test_generic_shape_types_and_faults() {
    let dto = topology_from_json(
        r#"{
            "nodes": [
                {"id": "server-a", "label": "rack a"},
                {"id": "gpu-0", "type": "GPU", "temperature": 90},
                {"id": "switch-1", "type": "switch"}
            ],
            "connections": [
                {"source": "server-a", "target": "gpu-0"},
                {"source": "server-a", "target": "gpu-0", "type": "nvlink"}
            ]
        }"#,
    );
    let normalized = normalize(dto);
    let snapshot = &normalized.snapshot;

    assert_eq!(snapshot.node(&NodeId::new("server-a")).unwrap().kind(), NodeKind::Server);
    assert_eq!(snapshot.gpu(&NodeId::new("gpu-0")).unwrap().health, HealthStatus::Critical);
    assert!(snapshot.node(&NodeId::new("switch-1")).is_none());
    assert!(normalized.faults.contains(&IntegrityFault::UnknownNodeType {
        node: NodeId::new("switch-1"),
        node_type: "switch".to_string()
    }));

    let ids: Vec<&str> = snapshot.connections.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["conn-server-a-gpu-0", "conn-server-a-gpu-0-2"]);
    assert_eq!(snapshot.connections[0].link_type, LinkType::Pcie);
    assert_eq!(snapshot.connections[1].link_type, LinkType::Nvlink);
}

#[test]
fn test_legacy_wrapped_shape() {
    // `/topology` wraps the agent payload once more; its nodes carry no type.
    let dto = topology_from_json(
        r#"{"topology": {"topology": {
            "nodes": [{"id": "GPU-0", "name": "Fake NVIDIA A100", "pci_bus": "0000:00:01.0"},
                      {"id": "GPU-1", "name": "Fake NVIDIA A100", "pci_bus": "0000:00:02.0"},
                      {"id": "GPU-2", "name": "Fake NVIDIA V100", "pci_bus": "0000:00:03.0"}],
            "links": [{"source": "GPU-0", "target": "GPU-1", "connection": "NVLink"},
                      {"source": "GPU-1", "target": "GPU-2", "connection": "PCIe"}]
        }}}"#,
    );
    let normalized = normalize(dto);
    let snapshot = &normalized.snapshot;

    assert!(normalized.faults.is_empty());
    assert_eq!(snapshot.gpus.len(), 3);
    assert!(snapshot.servers.is_empty());
    assert_eq!(snapshot.node(&NodeId::new("GPU-2")).unwrap().kind(), NodeKind::Gpu);
    assert_eq!(TopologyMetrics::compute(snapshot).gpu_count, 3);
    assert_eq!(snapshot.connections[0].id.as_str(), "conn-GPU-0-GPU-1");
    assert_eq!(snapshot.connections[0].link_type, LinkType::Nvlink);
    assert_eq!(snapshot.connections[1].link_type, LinkType::Pcie);
}

#[test]
fn test_element_missing_required_field_is_skipped() {
    let dto = topology_from_json(
        r#"{
            "gpus": [{"name": "anonymous", "temperature": 70}, {"id": "gpu-1", "temperature": "hot"}],
            "servers": [{"id": "server-a"}, {"name": "nameless"}],
            "connections": [
                {"id": "ok", "source": "server-a", "target": "gpu-1"},
                {"id": "half", "source": "server-a"},
                {"target": "gpu-1"}
            ]
        }"#,
    );
    let normalized = normalize(dto);
    let snapshot = &normalized.snapshot;

    assert_eq!(snapshot.gpus.len(), 1);
    assert_eq!(snapshot.gpus[0].temperature, 0);
    assert_eq!(snapshot.servers.len(), 1);
    let ids: Vec<&str> = snapshot.connections.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["ok"]);

    assert_eq!(
        normalized.faults,
        vec![
            IntegrityFault::MissingField { element: "gpu #0".to_string(), field: "id" },
            IntegrityFault::MissingField { element: "server #1".to_string(), field: "id" },
            IntegrityFault::MissingField { element: "connection half".to_string(), field: "target" },
            IntegrityFault::MissingField { element: "connection #2".to_string(), field: "source" },
        ]
    );
}

#[test]
fn test_generic_node_without_id_is_skipped() {
    let dto = topology_from_json(
        r#"{"nodes": [{"type": "gpu", "name": "ghost"}, {"id": "gpu-0", "type": "gpu"}, {"type": "router"}]}"#,
    );
    let normalized = normalize(dto);

    assert_eq!(normalized.snapshot.gpus.len(), 1);
    assert_eq!(
        normalized.faults,
        vec![
            IntegrityFault::MissingField { element: "node #0".to_string(), field: "id" },
            IntegrityFault::MissingField { element: "node #2".to_string(), field: "id" },
        ]
    );
}

#[test]
fn test_dangling_connection_is_reported_and_not_counted() {
    let dto = topology_from_json(
        r#"{
            "gpus": [{"id": "gpu-0", "temperature": 60}],
            "servers": [{"id": "server-a"}],
            "connections": [
                {"id": "ok", "source": "server-a", "target": "gpu-0"},
                {"id": "broken", "source": "server-a", "target": "gpu-9"}
            ]
        }"#,
    );
    let normalized = normalize(dto);

    assert_eq!(
        normalized.faults,
        vec![IntegrityFault::DanglingConnection { connection: "broken".into(), missing: vec![NodeId::new("gpu-9")] }]
    );

    let valid: Vec<&str> = normalized.snapshot.valid_connections().map(|c| c.id.as_str()).collect();
    assert_eq!(valid, vec!["ok"]);
    assert_eq!(TopologyMetrics::compute(&normalized.snapshot).connection_count, 1);
}

#[test]
fn test_duplicate_node_keeps_first() {
    let dto = topology_from_json(
        r#"{
            "gpus": [{"id": "gpu-0", "name": "first"}, {"id": "gpu-0", "name": "second"}],
            "servers": []
        }"#,
    );
    let normalized = normalize(dto);

    assert_eq!(normalized.snapshot.gpus.len(), 1);
    assert_eq!(normalized.snapshot.gpus[0].name, "first");
    assert_eq!(normalized.faults, vec![IntegrityFault::DuplicateNode { node: NodeId::new("gpu-0") }]);
}

#[tokio::test]
async fn test_refresh_is_idempotent() {
    let backend = MockBackend::new();
    let store = TopologyStore::new(backend.clone() as SharedBackend);

    let first = store.refresh().await;
    let second = store.refresh().await;

    assert!(first.applied && second.applied);
    assert_eq!(first.state.snapshot, second.state.snapshot);
    assert_eq!(first.state.metrics, second.state.metrics);
    assert_eq!(first.state.revision, 1);
    assert_eq!(second.state.revision, 2);
    assert_eq!(second.state.source, SnapshotSource::Backend);
}

#[tokio::test]
async fn test_one_broken_element_keeps_backend_snapshot() {
    let backend = MockBackend::new();
    backend.set_topology(Reply::Ok(topology_from_json(
        r#"{
            "gpus": [{"name": "no id", "temperature": 70}, {"id": "gpu-1", "temperature": 75}],
            "servers": [{"id": "server-node-alpha"}],
            "connections": [{"id": "c1", "source": "server-node-alpha", "target": "gpu-1", "type": "pcie"}]
        }"#,
    )));
    let store = TopologyStore::new(backend.clone() as SharedBackend);

    let state = store.refresh().await.state;
    assert_eq!(state.source, SnapshotSource::Backend);
    assert_eq!(state.metrics.gpu_count, 1);
    assert_eq!(state.metrics.connection_count, 1);
    assert_eq!(state.faults, vec![IntegrityFault::MissingField { element: "gpu #0".to_string(), field: "id" }]);
}

#[tokio::test]
async fn test_unreachable_backend_publishes_sample() {
    let backend = MockBackend::new();
    backend.set_topology(Reply::Unreachable);
    let store = TopologyStore::new(backend.clone() as SharedBackend);

    let outcome = store.refresh().await;

    assert_eq!(outcome.state.source, SnapshotSource::Fallback);
    assert_eq!(*outcome.state.snapshot, sample_topology());
    assert_eq!(outcome.state.metrics.gpu_count, 4);
    assert_eq!(outcome.state.metrics.average_temperature, 74);
}

#[tokio::test]
async fn test_backend_error_publishes_sample() {
    let backend = MockBackend::new();
    backend.set_topology(Reply::Backend("database locked".to_string()));
    let store = TopologyStore::new(backend.clone() as SharedBackend);

    let state = store.refresh().await.state;
    assert_eq!(state.source, SnapshotSource::Fallback);
    assert!(state.faults.is_empty());
}

#[tokio::test]
async fn test_recovery_after_fallback() {
    let backend = MockBackend::new();
    backend.queue_topology(Duration::ZERO, Reply::Unreachable);
    let store = TopologyStore::new(backend.clone() as SharedBackend);

    assert_eq!(store.refresh().await.state.source, SnapshotSource::Fallback);

    let state = store.refresh().await.state;
    assert_eq!(state.source, SnapshotSource::Backend);
    assert_eq!(state.metrics.gpu_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_response_does_not_overwrite_newer_one() {
    let backend = MockBackend::new();
    let old = topology_from_json(r#"{"gpus": [{"id": "gpu-old"}], "servers": []}"#);
    let new = topology_from_json(r#"{"gpus": [{"id": "gpu-new"}], "servers": []}"#);
    backend.queue_topology(Duration::from_secs(2), Reply::Ok(old));
    backend.queue_topology(Duration::ZERO, Reply::Ok(new));

    let store = TopologyStore::new(backend.clone() as SharedBackend);
    let (slow, fast) = tokio::join!(store.refresh(), store.refresh());

    assert!(fast.applied);
    assert!(!slow.applied);

    let current = store.current();
    assert_eq!(current.snapshot.gpus[0].id, NodeId::new("gpu-new"));
    assert_eq!(current.revision, 1);
    assert!(Arc::ptr_eq(&current, &slow.state));
}
