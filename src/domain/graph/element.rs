use serde::Serialize;
use slotmap::new_key_type;

use crate::domain::topology::{connection::Connection, node_record::NodeRecord};

new_key_type! {
    pub struct NodeKey;
    pub struct EdgeKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounds of a set of positions, in model coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn around(positions: impl IntoIterator<Item = Position>) -> Option<BoundingBox> {
        positions.into_iter().fold(None, |bounds, p| {
            Some(match bounds {
                None => BoundingBox { min_x: p.x, min_y: p.y, max_x: p.x, max_y: p.y },
                Some(b) => BoundingBox { min_x: b.min_x.min(p.x), min_y: b.min_y.min(p.y), max_x: b.max_x.max(p.x), max_y: b.max_y.max(p.y) },
            })
        })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Position {
        Position::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }
}

/// Scene-graph node: the full record plus presentation state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub record: NodeRecord,
    pub class: String,
    pub position: Position,
    pub selected: bool,
}

/// Scene-graph edge; both endpoints are guaranteed to be nodes of the same instance.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub connection: Connection,
    pub class: String,
    pub source: NodeKey,
    pub target: NodeKey,
}

/// Element ids share one namespace across nodes and edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRef {
    Node(NodeKey),
    Edge(EdgeKey),
}
