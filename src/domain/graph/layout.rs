use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use crate::domain::graph::element::Position;
use crate::domain::topology::node_record::NodeKind;
use crate::error::Error;

const LAYOUT_SEED: u64 = 0x6e65_6275_6c61;
const FORCE_ITERATIONS: usize = 120;
const DAMPING: f64 = 0.85;
const ATTRACTION: f64 = 0.01;
const PADDING: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    #[default]
    ForceDirected,
    Grid,
    Concentric,
    BreadthFirst,
}

impl LayoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::ForceDirected => "force-directed",
            LayoutMode::Grid => "grid",
            LayoutMode::Concentric => "concentric",
            LayoutMode::BreadthFirst => "breadth-first",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "force-directed" | "force" | "cose" => Ok(LayoutMode::ForceDirected),
            "grid" => Ok(LayoutMode::Grid),
            "concentric" => Ok(LayoutMode::Concentric),
            "breadth-first" | "breadthfirst" | "hierarchical" => Ok(LayoutMode::BreadthFirst),
            _ => Err(Error::InvalidConfig(format!("unknown layout '{}'", s))),
        }
    }
}

/// Drawing area the layout fills, in model units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutBounds {
    pub width: f64,
    pub height: f64,
}

impl LayoutBounds {
    fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Computes one position per node. `kinds[i]` is the kind of node `i`,
/// `edges` are index pairs into `kinds`. Same input, same output.
pub fn compute_layout(mode: LayoutMode, kinds: &[NodeKind], edges: &[(usize, usize)], bounds: LayoutBounds) -> Vec<Position> {
    if kinds.is_empty() {
        return Vec::new();
    }

    match mode {
        LayoutMode::ForceDirected => force_directed(kinds.len(), edges, bounds),
        LayoutMode::Grid => grid(kinds.len(), bounds),
        LayoutMode::Concentric => concentric(kinds.len(), edges, bounds),
        LayoutMode::BreadthFirst => breadth_first(kinds, edges, bounds),
    }
}

fn force_directed(count: usize, edges: &[(usize, usize)], bounds: LayoutBounds) -> Vec<Position> {
    let mut rng = StdRng::seed_from_u64(LAYOUT_SEED);
    let center = bounds.center();
    let radius = bounds.width.min(bounds.height) / 3.0;
    let repulsion = (bounds.width * bounds.height) / count as f64 * 4.0;

    let mut positions: Vec<Position> = (0..count)
        .map(|i| {
            let angle = TAU * i as f64 / count as f64;
            Position::new(
                center.x + radius * angle.cos() + rng.random_range(-1.0..1.0),
                center.y + radius * angle.sin() + rng.random_range(-1.0..1.0),
            )
        })
        .collect();

    for _ in 0..FORCE_ITERATIONS {
        let mut forces = vec![(0.0f64, 0.0f64); count];

        for i in 0..count {
            for j in (i + 1)..count {
                let dx = positions[j].x - positions[i].x;
                let dy = positions[j].y - positions[i].y;
                let dist = (dx * dx + dy * dy).sqrt().max(1.0);

                let force = repulsion / (dist * dist);
                let (fx, fy) = (dx / dist * force, dy / dist * force);
                forces[i].0 -= fx;
                forces[i].1 -= fy;
                forces[j].0 += fx;
                forces[j].1 += fy;
            }
        }

        for &(source, target) in edges {
            if source >= count || target >= count || source == target {
                continue;
            }
            let dx = positions[target].x - positions[source].x;
            let dy = positions[target].y - positions[source].y;
            let dist = (dx * dx + dy * dy).sqrt().max(1.0);

            let force = dist * ATTRACTION;
            let (fx, fy) = (dx / dist * force, dy / dist * force);
            forces[source].0 += fx;
            forces[source].1 += fy;
            forces[target].0 -= fx;
            forces[target].1 -= fy;
        }

        for (position, (fx, fy)) in positions.iter_mut().zip(forces) {
            position.x = (position.x + fx * DAMPING).clamp(PADDING, (bounds.width - PADDING).max(PADDING));
            position.y = (position.y + fy * DAMPING).clamp(PADDING, (bounds.height - PADDING).max(PADDING));
        }
    }

    positions
}

fn grid(count: usize, bounds: LayoutBounds) -> Vec<Position> {
    let columns = (count as f64).sqrt().ceil() as usize;
    let rows = count.div_ceil(columns);
    let cell_width = bounds.width / columns as f64;
    let cell_height = bounds.height / rows as f64;

    (0..count)
        .map(|i| {
            let (row, column) = (i / columns, i % columns);
            Position::new(cell_width * (column as f64 + 0.5), cell_height * (row as f64 + 0.5))
        })
        .collect()
}

fn degrees(count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut degrees = vec![0; count];
    for &(source, target) in edges {
        if source < count && target < count {
            degrees[source] += 1;
            degrees[target] += 1;
        }
    }
    degrees
}

/// Rings by degree: the best-connected nodes sit in the middle.
fn concentric(count: usize, edges: &[(usize, usize)], bounds: LayoutBounds) -> Vec<Position> {
    let degrees = degrees(count, edges);
    let mut levels: Vec<usize> = degrees.clone();
    levels.sort_unstable_by(|a, b| b.cmp(a));
    levels.dedup();

    let center = bounds.center();
    let spacing = (bounds.width.min(bounds.height) / 2.0 - PADDING) / levels.len().max(1) as f64;
    let mut positions = vec![center; count];

    for (ring, level) in levels.iter().enumerate() {
        let members: Vec<usize> = (0..count).filter(|i| degrees[*i] == *level).collect();
        let radius = if ring == 0 && members.len() == 1 { 0.0 } else { spacing * (ring as f64 + 1.0) };

        for (slot, index) in members.iter().enumerate() {
            let angle = TAU * slot as f64 / members.len() as f64;
            positions[*index] = Position::new(center.x + radius * angle.cos(), center.y + radius * angle.sin());
        }
    }

    positions
}

/// Rows by hop distance from the servers; nodes not reachable from any server go last.
fn breadth_first(kinds: &[NodeKind], edges: &[(usize, usize)], bounds: LayoutBounds) -> Vec<Position> {
    let count = kinds.len();
    let mut adjacency = vec![Vec::new(); count];
    for &(source, target) in edges {
        if source < count && target < count {
            adjacency[source].push(target);
            adjacency[target].push(source);
        }
    }

    let mut depth: Vec<Option<usize>> = vec![None; count];
    let mut queue: VecDeque<usize> = VecDeque::new();

    let roots: Vec<usize> = (0..count).filter(|i| kinds[*i] == NodeKind::Server).collect();
    let roots = if roots.is_empty() { vec![0] } else { roots };
    for root in roots {
        depth[root] = Some(0);
        queue.push_back(root);
    }

    while let Some(current) = queue.pop_front() {
        let next_depth = depth[current].map(|d| d + 1);
        for &neighbour in &adjacency[current] {
            if depth[neighbour].is_none() {
                depth[neighbour] = next_depth;
                queue.push_back(neighbour);
            }
        }
    }

    let deepest = depth.iter().flatten().copied().max().unwrap_or(0);
    let depth: Vec<usize> = depth.into_iter().map(|d| d.unwrap_or(deepest + 1)).collect();
    let row_count = depth.iter().copied().max().unwrap_or(0) + 1;
    let row_height = bounds.height / row_count as f64;

    let mut positions = vec![Position::default(); count];
    for row in 0..row_count {
        let members: Vec<usize> = (0..count).filter(|i| depth[*i] == row).collect();
        let column_width = bounds.width / members.len().max(1) as f64;
        for (column, index) in members.iter().enumerate() {
            positions[*index] = Position::new(column_width * (column as f64 + 0.5), row_height * (row as f64 + 0.5));
        }
    }

    positions
}
