use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::domain::dashboard::dashboard::DashboardOptions;
use crate::domain::graph::layout::LayoutMode;
use crate::error::{Error, Result};
use crate::loader::parser::parse_json_file;

/// Where the control plane listens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self { scheme: "http".to_string(), host: "localhost".to_string(), port: 8080, request_timeout_ms: 5000 }
    }
}

impl BackendConfig {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// Parses `scheme://host[:port][/]`; the port defaults to the current one.
    pub fn set_url(&mut self, url: &str) -> Result<()> {
        let (scheme, rest) = url.split_once("://").ok_or_else(|| Error::InvalidConfig(format!("backend url '{}' has no scheme", url)))?;
        let authority = rest.trim_end_matches('/');

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| Error::InvalidConfig(format!("invalid port in backend url '{}'", url)))?;
                (host, port)
            }
            None => (authority, self.port),
        };

        self.scheme = scheme.to_string();
        self.host = host.to_string();
        self.port = port;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self { width: 1200.0, height: 800.0 }
    }
}

/// Settings of the dashboard, loaded from a camelCase JSON file. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardConfig {
    pub backend: BackendConfig,
    pub job_poll_interval_ms: u64,
    pub topology_refresh_interval_ms: u64,
    pub layout: LayoutMode,
    pub viewport: ViewportConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            job_poll_interval_ms: 3000,
            topology_refresh_interval_ms: 15000,
            layout: LayoutMode::ForceDirected,
            viewport: ViewportConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Defaults, overlaid with `path` if given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                log::info!("Loading dashboard configuration from '{}'.", path.display());
                parse_json_file::<DashboardConfig>(path)?
            }
            None => DashboardConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.job_poll_interval_ms == 0 {
            return Err(Error::InvalidConfig("jobPollIntervalMs must be greater than 0".to_string()));
        }
        if self.topology_refresh_interval_ms == 0 {
            return Err(Error::InvalidConfig("topologyRefreshIntervalMs must be greater than 0".to_string()));
        }
        if self.backend.request_timeout_ms == 0 {
            return Err(Error::InvalidConfig("backend.requestTimeoutMs must be greater than 0".to_string()));
        }
        if self.backend.port == 0 {
            return Err(Error::InvalidConfig("backend.port must not be 0".to_string()));
        }
        if self.backend.host.trim().is_empty() {
            return Err(Error::InvalidConfig("backend.host must not be empty".to_string()));
        }
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return Err(Error::InvalidConfig("viewport dimensions must be positive".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.backend.request_timeout_ms)
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            job_poll_interval: Duration::from_millis(self.job_poll_interval_ms),
            topology_refresh_interval: Duration::from_millis(self.topology_refresh_interval_ms),
            layout: self.layout,
            viewport_width: self.viewport.width,
            viewport_height: self.viewport.height,
        }
    }
}
