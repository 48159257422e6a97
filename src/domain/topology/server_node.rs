use serde::Serialize;
use std::fmt;

use crate::domain::utils::id::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Online,
    Offline,
}

impl ServerStatus {
    /// A registered agent without a status label is reachable by definition.
    /// Labels that are neither online nor offline are logged and shown as offline.
    pub fn from_label(label: Option<&str>) -> ServerStatus {
        let Some(label) = label else {
            return ServerStatus::Online;
        };

        match label.trim().to_ascii_lowercase().as_str() {
            "online" | "healthy" | "active" | "up" | "ready" => ServerStatus::Online,
            "offline" | "down" | "unreachable" | "inactive" => ServerStatus::Offline,
            other => {
                log::warn!("Unknown server status label '{}', displaying server as offline.", other);
                ServerStatus::Offline
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServerStatus::Online => "online",
            ServerStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerNode {
    pub id: NodeId,
    pub name: String,
    pub cpu: String,
    pub ram: String,
    pub os: Option<String>,
    pub status: ServerStatus,
    pub active_jobs: u32,
}
