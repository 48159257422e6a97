use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};

use crate::domain::graph::renderer::RenderState;
use crate::domain::jobs::{duration::display_duration, job::Job, job::JobStatus, job_store::JobSet};
use crate::domain::selection::selection::NodeDetail;
use crate::domain::topology::{gpu_node::HealthStatus, topology_store::SnapshotSource, topology_store::TopologyState};

/// One line of the job table, before coloring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRow {
    pub label: String,
    pub workload: String,
    pub status: JobStatus,
    pub gpu: String,
    pub agent: String,
    pub duration: String,
    pub cancellable: bool,
}

impl JobRow {
    pub fn of(job: &Job, now: DateTime<Utc>) -> JobRow {
        JobRow {
            label: job.label(),
            workload: job.workload_type.map_or_else(|| "unknown".to_string(), |workload| workload.to_string()),
            status: job.status,
            gpu: job.gpu.as_ref().map_or_else(|| "-".to_string(), |gpu| gpu.to_string()),
            agent: job.agent.as_ref().map_or_else(|| "-".to_string(), |agent| agent.to_string()),
            duration: display_duration(job, now),
            cancellable: job.cancel_offered(),
        }
    }
}

/// Newest jobs first.
pub fn job_rows(jobs: &JobSet, now: DateTime<Utc>) -> Vec<JobRow> {
    let mut ordered: Vec<&Job> = jobs.iter().collect();
    ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    ordered.into_iter().map(|job| JobRow::of(job, now)).collect()
}

fn colored_status(status: JobStatus, text: &str) -> ColoredString {
    match status {
        JobStatus::Pending | JobStatus::Queued => text.yellow(),
        JobStatus::Running => text.blue(),
        JobStatus::Completed => text.green(),
        JobStatus::Failed => text.red(),
        JobStatus::Cancelled => text.dimmed(),
    }
}

fn colored_health(health: HealthStatus) -> ColoredString {
    match health {
        HealthStatus::Healthy => health.as_str().green(),
        HealthStatus::Warning => health.as_str().yellow(),
        HealthStatus::Critical => health.as_str().red().bold(),
    }
}

pub fn render_job_table(jobs: &JobSet, now: DateTime<Utc>) -> String {
    let rows = job_rows(jobs, now);
    if rows.is_empty() {
        return "No jobs.".dimmed().to_string();
    }

    let mut out = format!("{:<8} {:<16} {:<10} {:<12} {:<14} {:<8} {}\n", "JOB", "WORKLOAD", "STATUS", "GPU", "AGENT", "TIME", "");
    for row in rows {
        let status = colored_status(row.status, &format!("{:<10}", row.status.as_str()));
        out.push_str(&format!(
            "{:<8} {:<16} {} {:<12} {:<14} {:<8} {}\n",
            row.label,
            row.workload,
            status,
            row.gpu,
            row.agent,
            row.duration,
            if row.cancellable { "[cancel]" } else { "" }
        ));
    }
    out
}

pub fn render_topology_summary(state: &TopologyState, render_state: &RenderState) -> String {
    let source = match state.source {
        SnapshotSource::Backend => "live".green(),
        SnapshotSource::Fallback => "sample data (backend unreachable)".yellow(),
        SnapshotSource::Initial => "loading".dimmed(),
    };

    let mut out = format!(
        "{} {}  GPUs: {}  Links: {}  Avg temp: {}°C  [{}]\n",
        "Topology".bold(),
        format!("r{}", state.revision).dimmed(),
        state.metrics.gpu_count,
        state.metrics.connection_count,
        state.metrics.average_temperature,
        source
    );

    if let RenderState::Failed { message } = render_state {
        out.push_str(&format!("{} {} (reload to retry)\n", "Graph failed:".red().bold(), message));
    }

    for gpu in &state.snapshot.gpus {
        out.push_str(&format!(
            "  {:<10} {:<24} {:>3}°C {:>3}%  {}\n",
            gpu.id.as_str(),
            gpu.model,
            gpu.temperature,
            gpu.utilization,
            colored_health(gpu.health)
        ));
    }

    if !state.faults.is_empty() {
        out.push_str(&format!("{} {}\n", "Integrity faults:".yellow(), state.faults.len()));
        for fault in &state.faults {
            out.push_str(&format!("  - {}\n", fault));
        }
    }

    out
}

pub fn render_detail(detail: &NodeDetail) -> String {
    let mut out = format!("{}\n", detail.title.bold());
    for (label, value) in &detail.rows {
        out.push_str(&format!("  {:<18} {}\n", label, value));
    }
    out
}

pub fn render_status(status: JobStatus) -> String {
    colored_status(status, status.as_str()).to_string()
}
