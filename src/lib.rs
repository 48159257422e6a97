use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::domain::backend::http_backend::HttpBackend;
use crate::domain::clock::clock::SystemClock;
use crate::domain::dashboard::dashboard::Dashboard;
use crate::error::Result;

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Connects to the configured backend and mounts a dashboard with both refresh timelines running.
///
/// Must be called inside a tokio runtime.
pub fn mount_dashboard(config: &DashboardConfig) -> Result<Arc<Dashboard>> {
    config.validate()?;

    let backend = HttpBackend::new(config.backend.base_url(), config.request_timeout())?;
    log::info!("Mounting dashboard against {}.", backend.base_url());

    Ok(Dashboard::mount(Arc::new(backend), SystemClock::shared(), config.dashboard_options()))
}
