use serde::Serialize;
use std::sync::Arc;

use crate::domain::graph::{
    element::Position,
    graph_instance::{GraphInstance, TapListener},
    layout::{LayoutBounds, LayoutMode, compute_layout},
    viewport::{Viewport, ViewportAnimation, ZoomDirection},
};
use crate::domain::topology::{node_record::NodeKind, node_record::NodeRecord, topology_store::TopologyState};
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RenderState {
    Loading,
    Ready { revision: u64 },
    /// Terminal until `reload()`; never shown as an empty graph.
    Failed { message: String },
}

/// Projects topology states into one live graph instance.
///
/// Every accepted state replaces the whole instance; layout, zoom and fit only touch
/// positions and the camera. Tap listeners registered here are re-bound to each new
/// instance, so a tap reaches each listener once no matter how often the graph was rebuilt.
pub struct GraphRenderer {
    state: RenderState,
    instance: Option<GraphInstance>,
    source: Option<Arc<TopologyState>>,
    layout_mode: LayoutMode,
    viewport: Viewport,
    listeners: Vec<TapListener>,
    generation: u64,
}

impl std::fmt::Debug for GraphRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphRenderer")
            .field("state", &self.state)
            .field("instance", &self.instance)
            .field("layout_mode", &self.layout_mode)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl GraphRenderer {
    pub fn new(layout_mode: LayoutMode, width: f64, height: f64) -> Self {
        Self {
            state: RenderState::Loading,
            instance: None,
            source: None,
            layout_mode,
            viewport: Viewport::new(width, height),
            listeners: Vec::new(),
            generation: 0,
        }
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn instance(&self) -> Option<&GraphInstance> {
        self.instance.as_ref()
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.layout_mode
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Revision of the topology currently shown, if any.
    pub fn rendered_revision(&self) -> Option<u64> {
        self.source.as_ref().map(|state| state.revision)
    }

    /// Renders `topology` if it is newer than what is shown. Returns whether the graph was rebuilt.
    pub fn render(&mut self, topology: Arc<TopologyState>) -> Result<bool> {
        if let Some(shown) = self.rendered_revision() {
            if topology.revision <= shown {
                log::debug!("Ignoring topology revision {} (showing {}).", topology.revision, shown);
                return Ok(false);
            }
        }

        self.source = Some(topology);
        self.rebuild()?;
        Ok(true)
    }

    /// Rebuilds from the last received topology. A successful rebuild clears a `Failed` state.
    pub fn reload(&mut self) -> Result<()> {
        self.state = RenderState::Loading;
        self.rebuild()
    }

    fn rebuild(&mut self) -> Result<()> {
        // The previous graph and its bound handlers are gone before the next one exists.
        if let Some(previous) = self.instance.take() {
            log::debug!("Destroying graph instance {}.", previous.generation());
        }

        let Some(topology) = self.source.clone() else {
            self.state = RenderState::Loading;
            return Ok(());
        };

        self.generation += 1;
        match GraphInstance::build(self.generation, &topology.snapshot) {
            Ok((mut instance, _skipped)) => {
                for listener in &self.listeners {
                    instance.bind_tap(listener.clone());
                }
                self.instance = Some(instance);
                self.apply_layout();
                self.viewport.fit(self.instance.as_ref().and_then(GraphInstance::bounding_box));
                self.state = RenderState::Ready { revision: topology.revision };
                Ok(())
            }
            Err(e) => {
                log::error!("Graph construction for topology revision {} failed: {}", topology.revision, e);
                self.state = RenderState::Failed { message: e.to_string() };
                Err(e)
            }
        }
    }

    fn apply_layout(&mut self) {
        let Some(instance) = self.instance.as_mut() else {
            return;
        };

        let kinds: Vec<NodeKind> = instance.nodes().map(|node| node.record.kind()).collect();
        let edges = instance.edge_indices();
        let bounds = LayoutBounds { width: self.viewport.width, height: self.viewport.height };

        let positions = compute_layout(self.layout_mode, &kinds, &edges, bounds);
        instance.apply_positions(&positions);
    }

    /// Re-positions the current graph without rebuilding it.
    pub fn layout(&mut self, mode: LayoutMode) {
        self.layout_mode = mode;
        self.apply_layout();
    }

    pub fn zoom(&mut self, direction: ZoomDirection) -> ViewportAnimation {
        self.viewport.zoom(direction)
    }

    pub fn fit(&mut self) -> Option<ViewportAnimation> {
        self.viewport.fit(self.instance.as_ref().and_then(GraphInstance::bounding_box))
    }

    pub fn on_node_tap(&mut self, listener: impl Fn(&NodeRecord) + Send + Sync + 'static) {
        let listener: TapListener = Arc::new(listener);
        if let Some(instance) = self.instance.as_mut() {
            instance.bind_tap(listener.clone());
        }
        self.listeners.push(listener);
    }

    /// Taps a node: selects it and notifies the listeners.
    pub fn tap_node(&mut self, id: &NodeId) -> Result<NodeRecord> {
        let instance = self.instance.as_mut().ok_or_else(|| Error::UnknownNode(id.to_string()))?;
        instance.tap(id).ok_or_else(|| Error::UnknownNode(id.to_string()))
    }

    pub fn clear_selection(&mut self) {
        if let Some(instance) = self.instance.as_mut() {
            instance.clear_selection();
        }
    }

    pub fn selected_node(&self) -> Option<&NodeRecord> {
        self.instance.as_ref().and_then(GraphInstance::selected_record)
    }

    pub fn positions(&self) -> Vec<(NodeId, Position)> {
        self.instance.as_ref().map(GraphInstance::positions).unwrap_or_default()
    }

    /// Drops the graph and every listener.
    pub fn destroy(&mut self) {
        self.instance = None;
        self.listeners.clear();
        self.source = None;
        self.state = RenderState::Loading;
    }
}
