use slotmap::SlotMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::graph::element::{BoundingBox, EdgeKey, ElementRef, GraphEdge, GraphNode, NodeKey, Position};
use crate::domain::topology::{node_record::NodeRecord, snapshot::IntegrityFault, snapshot::TopologySnapshot};
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/// Callback invoked with the full node record when a node is tapped.
pub type TapListener = Arc<dyn Fn(&NodeRecord) + Send + Sync>;

/// One materialized graph built from one snapshot.
///
/// Owns its elements and the tap handlers bound to them; dropping the instance
/// destroys both. Node order (servers first, then GPUs) is kept for layouts.
pub struct GraphInstance {
    generation: u64,
    nodes: SlotMap<NodeKey, GraphNode>,
    edges: SlotMap<EdgeKey, GraphEdge>,

    /// Node keys in insertion order.
    order: Vec<NodeKey>,

    /// Element id -> element, nodes and edges alike.
    id_index: HashMap<String, ElementRef>,

    selected: Option<NodeKey>,
    tap_bindings: Vec<TapListener>,
}

impl fmt::Debug for GraphInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphInstance")
            .field("generation", &self.generation)
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("selected", &self.selected_record().map(|record| record.id().clone()))
            .field("tap_bindings", &self.tap_bindings.len())
            .finish()
    }
}

impl GraphInstance {
    /// Builds the scene graph of `snapshot`.
    ///
    /// Connections with an unknown endpoint are skipped and returned as faults.
    /// An element id used twice is a construction error.
    pub fn build(generation: u64, snapshot: &TopologySnapshot) -> Result<(GraphInstance, Vec<IntegrityFault>)> {
        let mut instance = GraphInstance {
            generation,
            nodes: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            order: Vec::with_capacity(snapshot.node_count()),
            id_index: HashMap::new(),
            selected: None,
            tap_bindings: Vec::new(),
        };
        let mut skipped = Vec::new();

        for record in snapshot.node_records() {
            let id = record.id().as_str().to_string();
            if instance.id_index.contains_key(&id) {
                return Err(Error::GraphConstruction(format!("duplicate element id '{}'", id)));
            }

            let class = record.style_class();
            let key = instance.nodes.insert(GraphNode { record, class, position: Position::default(), selected: false });
            instance.order.push(key);
            instance.id_index.insert(id, ElementRef::Node(key));
        }

        for connection in &snapshot.connections {
            let source = instance.node_key(&connection.source);
            let target = instance.node_key(&connection.target);

            let (Some(source), Some(target)) = (source, target) else {
                let missing = snapshot.missing_endpoints(connection);
                log::warn!("Skipping edge {}: endpoint(s) not in graph ({:?}).", connection.id, missing);
                skipped.push(IntegrityFault::DanglingConnection { connection: connection.id.clone(), missing });
                continue;
            };

            let id = connection.id.as_str().to_string();
            if instance.id_index.contains_key(&id) {
                return Err(Error::GraphConstruction(format!("duplicate element id '{}'", id)));
            }

            let class = format!("link-{}", connection.link_type);
            let key = instance.edges.insert(GraphEdge { connection: connection.clone(), class, source, target });
            instance.id_index.insert(id, ElementRef::Edge(key));
        }

        log::debug!(
            "Graph instance {} built: {} nodes, {} edges, {} skipped.",
            generation,
            instance.nodes.len(),
            instance.edges.len(),
            skipped.len()
        );

        Ok((instance, skipped))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn node_key(&self, id: &NodeId) -> Option<NodeKey> {
        match self.id_index.get(id.as_str()) {
            Some(ElementRef::Node(key)) => Some(*key),
            _ => None,
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.node_key(id).and_then(|key| self.nodes.get(key))
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.order.iter().filter_map(|key| self.nodes.get(*key))
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.values()
    }

    /// Edges as pairs of node positions in insertion order, the form layouts consume.
    pub fn edge_indices(&self) -> Vec<(usize, usize)> {
        let index_of: HashMap<NodeKey, usize> = self.order.iter().enumerate().map(|(i, key)| (*key, i)).collect();
        self.edges.values().filter_map(|edge| Some((*index_of.get(&edge.source)?, *index_of.get(&edge.target)?))).collect()
    }

    pub fn positions(&self) -> Vec<(NodeId, Position)> {
        self.nodes().map(|node| (node.record.id().clone(), node.position)).collect()
    }

    /// Assigns positions in insertion order. Elements are neither added nor removed.
    pub fn apply_positions(&mut self, positions: &[Position]) {
        for (key, position) in self.order.iter().zip(positions) {
            if let Some(node) = self.nodes.get_mut(*key) {
                node.position = *position;
            }
        }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::around(self.nodes().map(|node| node.position))
    }

    pub fn bind_tap(&mut self, listener: TapListener) {
        self.tap_bindings.push(listener);
    }

    /// Selects the node and notifies every bound listener exactly once.
    pub fn tap(&mut self, id: &NodeId) -> Option<NodeRecord> {
        let key = self.node_key(id)?;
        self.select(key);

        let record = self.nodes.get(key)?.record.clone();
        for listener in &self.tap_bindings {
            listener(&record);
        }
        Some(record)
    }

    fn select(&mut self, key: NodeKey) {
        if let Some(previous) = self.selected.take().and_then(|previous| self.nodes.get_mut(previous)) {
            previous.selected = false;
        }
        if let Some(node) = self.nodes.get_mut(key) {
            node.selected = true;
            self.selected = Some(key);
        }
    }

    pub fn clear_selection(&mut self) {
        if let Some(node) = self.selected.take().and_then(|key| self.nodes.get_mut(key)) {
            node.selected = false;
        }
    }

    pub fn selected_record(&self) -> Option<&NodeRecord> {
        self.selected.and_then(|key| self.nodes.get(key)).map(|node| &node.record)
    }

    pub fn selected_count(&self) -> usize {
        self.nodes.values().filter(|node| node.selected).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::topology::sample::sample_topology;

    #[test]
    fn test_build_sample() {
        let (instance, skipped) = GraphInstance::build(1, &sample_topology()).unwrap();
        assert_eq!(instance.node_count(), 6);
        assert_eq!(instance.edge_count(), 7);
        assert!(skipped.is_empty());
        assert_eq!(instance.nodes().next().unwrap().record.id().as_str(), "server-0");
    }

    #[test]
    fn test_node_and_edge_share_id_space() {
        let mut snapshot = sample_topology();
        snapshot.connections[0].id = "gpu-0".into();

        let err = GraphInstance::build(1, &snapshot).unwrap_err();
        assert!(matches!(err, Error::GraphConstruction(_)));
    }

    #[test]
    fn test_selection_is_exclusive() {
        let (mut instance, _) = GraphInstance::build(1, &sample_topology()).unwrap();
        instance.tap(&NodeId::new("gpu-0"));
        instance.tap(&NodeId::new("gpu-2"));

        assert_eq!(instance.selected_count(), 1);
        assert_eq!(instance.selected_record().unwrap().id().as_str(), "gpu-2");

        instance.clear_selection();
        assert_eq!(instance.selected_count(), 0);
    }

    #[test]
    fn test_tap_on_unknown_node() {
        let (mut instance, _) = GraphInstance::build(1, &sample_topology()).unwrap();
        assert!(instance.tap(&NodeId::new("gpu-99")).is_none());
        assert!(instance.selected_record().is_none());
    }
}
