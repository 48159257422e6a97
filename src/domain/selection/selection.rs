use std::sync::{Arc, RwLock};

use crate::domain::topology::node_record::NodeRecord;

/// Label/value pairs of the detail panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDetail {
    pub title: String,
    pub rows: Vec<(String, String)>,
}

impl NodeDetail {
    pub fn of(record: &NodeRecord) -> NodeDetail {
        let mut rows = vec![("ID".to_string(), record.id().to_string()), ("Type".to_string(), record.kind().to_string())];

        match record {
            NodeRecord::Gpu(gpu) => {
                rows.push(("Model".to_string(), gpu.model.clone()));
                rows.push(("Temperature".to_string(), format!("{}°C", gpu.temperature)));
                rows.push(("Utilization".to_string(), format!("{}%", gpu.utilization)));
                rows.push(("Health".to_string(), gpu.health.to_string()));
                if let (Some(used), Some(total)) = (gpu.memory_used, gpu.memory_total) {
                    rows.push(("Memory".to_string(), format!("{} / {} MiB", used / (1024 * 1024), total / (1024 * 1024))));
                }
                rows.push(("Active jobs".to_string(), gpu.active_jobs.to_string()));
                if let Some(current_job) = &gpu.current_job {
                    rows.push(("Current workload".to_string(), current_job.clone()));
                }
            }
            NodeRecord::Server(server) => {
                rows.push(("CPU".to_string(), server.cpu.clone()));
                rows.push(("RAM".to_string(), server.ram.clone()));
                if let Some(os) = &server.os {
                    rows.push(("OS".to_string(), os.clone()));
                }
                rows.push(("Status".to_string(), server.status.to_string()));
                rows.push(("Active jobs".to_string(), server.active_jobs.to_string()));
            }
        }

        NodeDetail { title: record.name().to_string(), rows }
    }

    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows.iter().find(|(key, _)| key == label).map(|(_, value)| value.as_str())
    }
}

/// Holds at most one selected node record. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct SelectionCoordinator {
    selected: Arc<RwLock<Option<NodeRecord>>>,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&self, record: NodeRecord) {
        log::debug!("Selected {} {}.", record.kind(), record.id());
        *self.selected.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(record);
    }

    pub fn clear(&self) {
        *self.selected.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    pub fn selected(&self) -> Option<NodeRecord> {
        self.selected.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    pub fn detail(&self) -> Option<NodeDetail> {
        self.selected().as_ref().map(NodeDetail::of)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::topology::sample::sample_topology;
    use crate::domain::utils::id::NodeId;

    #[test]
    fn test_detail_branches_on_kind() {
        let sample = sample_topology();

        let gpu = NodeDetail::of(&sample.node(&NodeId::new("gpu-2")).unwrap());
        assert_eq!(gpu.value("Temperature"), Some("78°C"));
        assert!(gpu.value("CPU").is_none());

        let server = NodeDetail::of(&sample.node(&NodeId::new("server-0")).unwrap());
        assert_eq!(server.title, "node-alpha");
        assert_eq!(server.value("Status"), Some("online"));
        assert!(server.value("Temperature").is_none());
    }

    #[test]
    fn test_selection_is_replaced_wholesale() {
        let sample = sample_topology();
        let coordinator = SelectionCoordinator::new();

        coordinator.select(sample.node(&NodeId::new("gpu-0")).unwrap());
        coordinator.select(sample.node(&NodeId::new("server-1")).unwrap());
        assert_eq!(coordinator.selected().unwrap().id().as_str(), "server-1");

        coordinator.clear();
        assert!(coordinator.detail().is_none());
    }
}
