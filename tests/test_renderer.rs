use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use nebula_dashboard::domain::graph::{
    layout::LayoutMode,
    renderer::{GraphRenderer, RenderState},
    viewport::{MAX_ZOOM, MIN_ZOOM, ZoomDirection},
};
use nebula_dashboard::domain::topology::{
    metrics::TopologyMetrics,
    node_record::NodeRecord,
    sample::sample_topology,
    snapshot::TopologySnapshot,
    topology_store::{SnapshotSource, TopologyState},
};
use nebula_dashboard::domain::utils::id::NodeId;
use nebula_dashboard::error::Error;

fn state(snapshot: TopologySnapshot, revision: u64) -> Arc<TopologyState> {
    Arc::new(TopologyState {
        metrics: TopologyMetrics::compute(&snapshot),
        snapshot: Arc::new(snapshot),
        source: SnapshotSource::Backend,
        revision,
        faults: Vec::new(),
    })
}

fn renderer() -> GraphRenderer {
    GraphRenderer::new(LayoutMode::ForceDirected, 1200.0, 800.0)
}

fn node_ids(renderer: &GraphRenderer) -> HashSet<String> {
    renderer.positions().into_iter().map(|(id, _)| id.to_string()).collect()
}

#[test]
fn test_render_sample() {
    let mut renderer = renderer();
    assert_eq!(renderer.state(), &RenderState::Loading);

    assert!(renderer.render(state(sample_topology(), 1)).unwrap());

    let instance = renderer.instance().unwrap();
    assert_eq!(instance.node_count(), 6);
    assert_eq!(instance.edge_count(), 7);
    assert_eq!(renderer.state(), &RenderState::Ready { revision: 1 });

    let nvlink = instance.edges().find(|edge| edge.connection.id.as_str() == "conn-gpu-0-gpu-1").unwrap();
    assert_eq!(nvlink.class, "link-nvlink");
    assert_eq!(instance.node(&NodeId::new("gpu-2")).unwrap().class, "gpu-healthy");
}

#[test]
fn test_older_revision_is_not_rendered() {
    let mut renderer = renderer();
    renderer.render(state(sample_topology(), 2)).unwrap();
    let generation = renderer.instance().unwrap().generation();

    assert!(!renderer.render(state(TopologySnapshot::default(), 1)).unwrap());
    assert!(!renderer.render(state(TopologySnapshot::default(), 2)).unwrap());
    assert_eq!(renderer.instance().unwrap().generation(), generation);
    assert_eq!(renderer.instance().unwrap().node_count(), 6);
}

#[test]
fn test_layout_changes_positions_only() {
    let mut renderer = renderer();
    renderer.render(state(sample_topology(), 1)).unwrap();
    let generation = renderer.instance().unwrap().generation();
    let ids = node_ids(&renderer);
    let force_positions = renderer.positions();

    renderer.layout(LayoutMode::Grid);
    assert_eq!(node_ids(&renderer), ids);
    assert_eq!(renderer.instance().unwrap().edge_count(), 7);
    assert_eq!(renderer.instance().unwrap().generation(), generation);
    assert_ne!(renderer.positions(), force_positions);

    renderer.layout(LayoutMode::ForceDirected);
    assert_eq!(renderer.positions(), force_positions);
}

#[test]
fn test_every_layout_is_deterministic_per_snapshot() {
    for mode in [LayoutMode::ForceDirected, LayoutMode::Grid, LayoutMode::Concentric, LayoutMode::BreadthFirst] {
        let mut first = GraphRenderer::new(mode, 1200.0, 800.0);
        let mut second = GraphRenderer::new(mode, 1200.0, 800.0);
        first.render(state(sample_topology(), 1)).unwrap();
        second.render(state(sample_topology(), 7)).unwrap();
        assert_eq!(first.positions(), second.positions(), "{} differs", mode);
    }
}

#[test]
fn test_zoom_is_clamped_and_animated() {
    let mut renderer = renderer();
    renderer.render(state(sample_topology(), 1)).unwrap();

    for _ in 0..30 {
        renderer.zoom(ZoomDirection::In);
    }
    assert_eq!(renderer.viewport().zoom_level(), MAX_ZOOM);

    for _ in 0..30 {
        renderer.zoom(ZoomDirection::Out);
    }
    let animation = renderer.zoom(ZoomDirection::Out);
    assert_eq!(renderer.viewport().zoom_level(), MIN_ZOOM);
    assert_eq!(animation.duration, Duration::from_millis(200));
}

#[test]
fn test_fit_frames_every_node() {
    let mut renderer = renderer();
    renderer.render(state(sample_topology(), 1)).unwrap();
    renderer.zoom(ZoomDirection::In);

    let animation = renderer.fit().unwrap();
    assert_eq!(animation.duration, Duration::from_millis(200));

    let viewport = renderer.viewport();
    for (_, position) in renderer.positions() {
        let screen = viewport.to_screen(position);
        assert!(screen.x >= 29.999 && screen.x <= 1200.0 - 29.999, "x {} out of frame", screen.x);
        assert!(screen.y >= 29.999 && screen.y <= 800.0 - 29.999, "y {} out of frame", screen.y);
    }
}

#[test]
fn test_at_most_one_node_selected() {
    let mut renderer = renderer();
    renderer.render(state(sample_topology(), 1)).unwrap();

    renderer.tap_node(&NodeId::new("gpu-0")).unwrap();
    renderer.tap_node(&NodeId::new("server-1")).unwrap();

    let instance = renderer.instance().unwrap();
    assert_eq!(instance.selected_count(), 1);
    assert_eq!(renderer.selected_node().unwrap().id().as_str(), "server-1");

    renderer.clear_selection();
    assert!(renderer.selected_node().is_none());
}

#[test]
fn test_tap_reaches_listener_once_after_rebuilds() {
    let taps = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

    let mut renderer = renderer();
    let counter = taps.clone();
    let records = seen.clone();
    renderer.on_node_tap(move |record: &NodeRecord| {
        counter.fetch_add(1, Ordering::SeqCst);
        records.lock().unwrap().push(record.clone());
    });

    for revision in 1..=5 {
        renderer.render(state(sample_topology(), revision)).unwrap();
    }

    let record = renderer.tap_node(&NodeId::new("gpu-3")).unwrap();
    assert_eq!(taps.load(Ordering::SeqCst), 1);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.as_slice(), &[record.clone()]);
    let NodeRecord::Gpu(gpu) = record else { panic!("expected a GPU record") };
    assert_eq!(gpu.temperature, 69);
}

#[test]
fn test_tap_on_unknown_node() {
    let mut renderer = renderer();
    assert!(matches!(renderer.tap_node(&NodeId::new("gpu-0")), Err(Error::UnknownNode(_))));

    renderer.render(state(sample_topology(), 1)).unwrap();
    assert!(matches!(renderer.tap_node(&NodeId::new("gpu-42")), Err(Error::UnknownNode(_))));
}

#[test]
fn test_construction_error_is_a_failed_state() {
    let mut broken = sample_topology();
    broken.gpus[1].id = NodeId::new("gpu-0");

    let mut renderer = renderer();
    let err = renderer.render(state(broken, 1)).unwrap_err();
    assert!(matches!(err, Error::GraphConstruction(_)));

    match renderer.state() {
        RenderState::Failed { message } => assert!(message.contains("gpu-0")),
        other => panic!("expected failed state, got {:?}", other),
    }
    assert!(renderer.instance().is_none());

    // Reloading the same data fails again; it never degrades to an empty graph.
    assert!(renderer.reload().is_err());
    assert!(matches!(renderer.state(), RenderState::Failed { .. }));

    renderer.render(state(sample_topology(), 2)).unwrap();
    assert_eq!(renderer.state(), &RenderState::Ready { revision: 2 });
}
