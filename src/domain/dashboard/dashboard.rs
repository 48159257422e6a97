use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::domain::backend::backend_api::SharedBackend;
use crate::domain::clock::clock::SharedClock;
use crate::domain::gpu::self_identification::{GpuSelfIdentification, Identification};
use crate::domain::graph::{
    layout::LayoutMode,
    renderer::{GraphRenderer, RenderState},
    viewport::{ViewportAnimation, ZoomDirection},
};
use crate::domain::jobs::{
    job::WorkloadType,
    job_store::{JobSet, JobStore},
    lifecycle::{CancelOutcome, ConfirmCancel, JobHistoryEntry, JobLifecycleController, SubmitReceipt},
};
use crate::domain::selection::selection::{NodeDetail, SelectionCoordinator};
use crate::domain::topology::{
    node_record::NodeRecord,
    topology_store::{TopologyState, TopologyStore},
};
use crate::domain::utils::id::{JobId, NodeId};
use crate::error::{Error, Result};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardOptions {
    pub job_poll_interval: Duration,
    pub topology_refresh_interval: Duration,
    pub layout: LayoutMode,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            job_poll_interval: Duration::from_millis(3000),
            topology_refresh_interval: Duration::from_millis(15000),
            layout: LayoutMode::ForceDirected,
            viewport_width: 1200.0,
            viewport_height: 800.0,
        }
    }
}

/// Change notifications for whoever presents the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    TopologyUpdated { revision: u64 },
    RenderFailed { message: String },
    JobsUpdated { revision: u64 },
    SelectionChanged { node: Option<NodeId> },
}

/// A mounted dashboard view: both refresh timelines, the renderer and the selection.
///
/// Every operation races against the view's shutdown token. Once `teardown` ran, timers are
/// stopped, in-flight requests are dropped before their results reach the view, and further
/// calls fail with `Error::TornDown`.
#[derive(Debug)]
pub struct Dashboard {
    topology: TopologyStore,
    jobs: JobStore,
    lifecycle: JobLifecycleController,
    gpu: GpuSelfIdentification,
    selection: SelectionCoordinator,
    renderer: Mutex<GraphRenderer>,
    clock: SharedClock,
    events: broadcast::Sender<DashboardEvent>,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Dashboard {
    /// Builds the view and starts both timelines; the first job poll and topology fetch run immediately.
    pub fn mount(backend: SharedBackend, clock: SharedClock, options: DashboardOptions) -> Arc<Dashboard> {
        let dashboard = Arc::new(Self::new(backend, clock, &options));

        let job_loop = tokio::spawn(dashboard.clone().run_job_polling(options.job_poll_interval));
        let topology_loop = tokio::spawn(dashboard.clone().run_topology_refresh(options.topology_refresh_interval));
        dashboard.lock_tasks().extend([job_loop, topology_loop]);

        log::info!(
            "Dashboard mounted (job poll every {:?}, topology refresh every {:?}).",
            options.job_poll_interval,
            options.topology_refresh_interval
        );
        dashboard
    }

    /// Builds the view without starting any timer. Refreshes then only happen on manual triggers.
    pub fn new(backend: SharedBackend, clock: SharedClock, options: &DashboardOptions) -> Dashboard {
        let topology = TopologyStore::new(backend.clone());
        let jobs = JobStore::new(backend.clone(), clock.clone());
        let lifecycle = JobLifecycleController::new(backend.clone(), jobs.clone());
        let gpu = GpuSelfIdentification::new(backend);
        let selection = SelectionCoordinator::new();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let mut renderer = GraphRenderer::new(options.layout, options.viewport_width, options.viewport_height);
        let tap_selection = selection.clone();
        let tap_events = events.clone();
        renderer.on_node_tap(move |record: &NodeRecord| {
            tap_selection.select(record.clone());
            let _ = tap_events.send(DashboardEvent::SelectionChanged { node: Some(record.id().clone()) });
        });

        Dashboard {
            topology,
            jobs,
            lifecycle,
            gpu,
            selection,
            renderer: Mutex::new(renderer),
            clock,
            events,
            shutdown: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    async fn run_job_polling(self: Arc<Self>, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = interval.tick() => {
                    // Failures are logged by the store; the next tick retries.
                    let _ = self.refresh_jobs().await;
                }
            }
        }
        log::debug!("Job polling stopped.");
    }

    async fn run_topology_refresh(self: Arc<Self>, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let _ = self.refresh_topology().await;
                }
            }
        }
        log::debug!("Topology refresh stopped.");
    }

    /// Runs `operation` unless the view is torn down first.
    async fn guarded<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        if self.shutdown.is_cancelled() {
            return Err(Error::TornDown);
        }

        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(Error::TornDown),
            result = operation => result,
        }
    }

    pub async fn refresh_topology(&self) -> Result<Arc<TopologyState>> {
        let outcome = self.guarded(async { Ok(self.topology.refresh().await) }).await?;
        if !outcome.applied {
            return Ok(self.topology.current());
        }

        let state = outcome.state;
        let rendered = self.lock_renderer().render(state.clone());
        match rendered {
            Ok(true) => {
                self.selection.clear();
                let _ = self.events.send(DashboardEvent::TopologyUpdated { revision: state.revision });
            }
            Ok(false) => {}
            Err(e) => {
                self.selection.clear();
                let _ = self.events.send(DashboardEvent::RenderFailed { message: e.to_string() });
            }
        }

        Ok(state)
    }

    pub async fn refresh_jobs(&self) -> Result<Arc<JobSet>> {
        let applied = self.guarded(self.jobs.poll()).await?;
        let jobs = self.jobs.current();
        if applied {
            let _ = self.events.send(DashboardEvent::JobsUpdated { revision: jobs.revision });
        }
        Ok(jobs)
    }

    pub async fn submit_job(&self, workload_type: WorkloadType, command: &str) -> Result<SubmitReceipt> {
        let receipt = self.guarded(self.lifecycle.submit(workload_type, command)).await?;
        let _ = self.events.send(DashboardEvent::JobsUpdated { revision: self.jobs.current().revision });
        Ok(receipt)
    }

    pub async fn cancel_job(&self, job_id: &JobId, confirm: &impl ConfirmCancel) -> Result<CancelOutcome> {
        let outcome = self.guarded(self.lifecycle.cancel(job_id, confirm)).await?;
        let _ = self.events.send(DashboardEvent::JobsUpdated { revision: self.jobs.current().revision });
        Ok(outcome)
    }

    pub async fn job_history(&self, job_id: &JobId) -> Result<Vec<JobHistoryEntry>> {
        self.guarded(self.lifecycle.history(job_id)).await
    }

    /// Server-side GPU detection; a successful run refreshes the topology.
    pub async fn detect_local_gpus(&self) -> Result<Identification> {
        let identification = self.guarded(self.gpu.identify()).await?;
        self.refresh_topology().await?;
        Ok(identification)
    }

    /// Leaves a `Failed` render state by rebuilding from the last topology.
    pub fn reload(&self) -> Result<RenderState> {
        self.ensure_mounted()?;
        let mut renderer = self.lock_renderer();
        if let Err(e) = renderer.reload() {
            log::warn!("Reload failed: {}", e);
        }
        Ok(renderer.state().clone())
    }

    pub fn tap_node(&self, id: &NodeId) -> Result<NodeRecord> {
        self.ensure_mounted()?;
        self.lock_renderer().tap_node(id)
    }

    pub fn clear_selection(&self) -> Result<()> {
        self.ensure_mounted()?;
        self.lock_renderer().clear_selection();
        self.selection.clear();
        let _ = self.events.send(DashboardEvent::SelectionChanged { node: None });
        Ok(())
    }

    pub fn layout(&self, mode: LayoutMode) -> Result<()> {
        self.ensure_mounted()?;
        self.lock_renderer().layout(mode);
        Ok(())
    }

    pub fn zoom(&self, direction: ZoomDirection) -> Result<ViewportAnimation> {
        self.ensure_mounted()?;
        Ok(self.lock_renderer().zoom(direction))
    }

    pub fn fit(&self) -> Result<Option<ViewportAnimation>> {
        self.ensure_mounted()?;
        Ok(self.lock_renderer().fit())
    }

    pub fn topology(&self) -> Arc<TopologyState> {
        self.topology.current()
    }

    pub fn jobs(&self) -> Arc<JobSet> {
        self.jobs.current()
    }

    pub fn lifecycle(&self) -> &JobLifecycleController {
        &self.lifecycle
    }

    pub fn selection(&self) -> Option<NodeRecord> {
        self.selection.selected()
    }

    pub fn selection_detail(&self) -> Option<NodeDetail> {
        self.selection.detail()
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    /// Gives read access to the renderer (state, graph instance, viewport).
    pub fn with_renderer<R>(&self, read: impl FnOnce(&GraphRenderer) -> R) -> R {
        read(&self.lock_renderer())
    }

    pub fn is_torn_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Stops both timelines and drops the graph. Idempotent.
    pub async fn teardown(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.shutdown.cancel();

        let tasks: Vec<JoinHandle<()>> = self.lock_tasks().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                log::warn!("Dashboard task ended abnormally: {}", e);
            }
        }

        self.lock_renderer().destroy();
        self.selection.clear();
        log::info!("Dashboard torn down.");
    }

    fn ensure_mounted(&self) -> Result<()> {
        if self.shutdown.is_cancelled() { Err(Error::TornDown) } else { Ok(()) }
    }

    fn lock_renderer(&self) -> MutexGuard<'_, GraphRenderer> {
        self.renderer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
