use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::domain::backend::backend_api::SharedBackend;
use crate::domain::sync::snapshot_slot::SnapshotSlot;
use crate::domain::topology::{
    metrics::TopologyMetrics,
    normalize::{NormalizedTopology, normalize},
    sample::sample_topology,
    snapshot::{IntegrityFault, TopologySnapshot},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSource {
    /// Nothing fetched yet.
    Initial,
    Backend,
    /// The backend could not deliver; the built-in sample is shown.
    Fallback,
}

impl fmt::Display for SnapshotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotSource::Initial => f.write_str("initial"),
            SnapshotSource::Backend => f.write_str("backend"),
            SnapshotSource::Fallback => f.write_str("fallback"),
        }
    }
}

/// Value published by the topology store. Read as one unit; never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologyState {
    pub snapshot: Arc<TopologySnapshot>,
    pub metrics: TopologyMetrics,
    pub source: SnapshotSource,

    /// Incremented on every publication; 0 before the first refresh.
    pub revision: u64,
    pub faults: Vec<IntegrityFault>,
}

impl Default for TopologyState {
    fn default() -> Self {
        Self {
            snapshot: Arc::new(TopologySnapshot::default()),
            metrics: TopologyMetrics::default(),
            source: SnapshotSource::Initial,
            revision: 0,
            faults: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// False if a refresh issued later already published its result.
    pub applied: bool,
    pub state: Arc<TopologyState>,
}

/// Last-known cluster topology plus its derived metrics.
#[derive(Debug, Clone)]
pub struct TopologyStore {
    backend: SharedBackend,
    slot: Arc<SnapshotSlot<TopologyState>>,
}

impl TopologyStore {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend, slot: Arc::new(SnapshotSlot::new(TopologyState::default())) }
    }

    pub fn current(&self) -> Arc<TopologyState> {
        self.slot.load()
    }

    /// Fetches the topology and replaces the stored state wholesale.
    ///
    /// Any failure (unreachable backend, error status, unparseable body) publishes the
    /// built-in sample topology instead; this never returns an error.
    pub async fn refresh(&self) -> RefreshOutcome {
        let token = self.slot.issue();

        let (normalized, source) = match self.backend.fetch_topology().await {
            Ok(dto) => (normalize(dto), SnapshotSource::Backend),
            Err(e) => {
                log::warn!("Topology fetch failed ({}). Showing built-in sample topology.", e);
                (NormalizedTopology { snapshot: sample_topology(), faults: Vec::new() }, SnapshotSource::Fallback)
            }
        };

        for fault in &normalized.faults {
            log::warn!("Topology integrity fault: {}", fault);
        }

        let NormalizedTopology { snapshot, faults } = normalized;
        let metrics = TopologyMetrics::compute(&snapshot);

        match self.slot.publish_with(token, |previous| TopologyState {
            snapshot: Arc::new(snapshot),
            metrics,
            source,
            revision: previous.revision + 1,
            faults,
        }) {
            Some(state) => {
                log::debug!(
                    "Topology revision {} published from {}: {} GPUs, {} connections, avg {}°C.",
                    state.revision,
                    state.source,
                    state.metrics.gpu_count,
                    state.metrics.connection_count,
                    state.metrics.average_temperature
                );
                RefreshOutcome { applied: true, state }
            }
            None => RefreshOutcome { applied: false, state: self.slot.load() },
        }
    }
}
