use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;

use nebula_dashboard::config::DashboardConfig;
use nebula_dashboard::domain::backend::http_backend::HttpBackend;
use nebula_dashboard::domain::clock::clock::SystemClock;
use nebula_dashboard::domain::dashboard::dashboard::{Dashboard, DashboardEvent};
use nebula_dashboard::domain::dashboard::view::{render_detail, render_job_table, render_status, render_topology_summary};
use nebula_dashboard::domain::graph::layout::LayoutMode;
use nebula_dashboard::domain::jobs::job::{Job, WorkloadType};
use nebula_dashboard::domain::jobs::lifecycle::CancelOutcome;
use nebula_dashboard::domain::utils::id::JobId;
use nebula_dashboard::error::Error;
use nebula_dashboard::{logger, mount_dashboard};

#[derive(Parser, Debug)]
#[command(name = "nebula-dashboard")]
#[command(version)]
#[command(about = "Operator dashboard for a small GPU cluster")]
struct Cli {
    /// JSON configuration file (camelCase keys)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, e.g. http://localhost:8080
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Job poll interval in milliseconds
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    /// Debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mount the dashboard and print every change until Ctrl-C
    Watch {
        #[arg(long)]
        layout: Option<LayoutMode>,
    },
    /// Fetch the topology once and print nodes, positions and edges
    Topology {
        #[arg(long)]
        layout: Option<LayoutMode>,
        /// Select a node and print its details
        #[arg(long)]
        select: Option<String>,
    },
    /// Poll the job list once
    Jobs,
    /// Submit a job
    Submit {
        #[arg(long)]
        workload_type: WorkloadType,
        #[arg(long)]
        command: String,
    },
    /// Cancel a pending or running job
    Cancel {
        job_id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show the history of a job
    History { job_id: String },
    /// Run server-side GPU detection and show the GPU the backend identified as its own
    Detect,
}

fn resolve_config(cli: &Cli, layout: Option<LayoutMode>) -> anyhow::Result<DashboardConfig> {
    let mut config = DashboardConfig::load(cli.config.as_deref()).context("loading configuration")?;

    if let Some(url) = &cli.backend_url {
        config.backend.set_url(url)?;
    }
    if let Some(interval) = cli.poll_interval_ms {
        config.job_poll_interval_ms = interval;
    }
    if let Some(layout) = layout {
        config.layout = layout;
    }

    config.validate()?;
    Ok(config)
}

/// A dashboard without timers, for one-shot commands.
fn connect(config: &DashboardConfig) -> anyhow::Result<Arc<Dashboard>> {
    let backend = HttpBackend::new(config.backend.base_url(), config.request_timeout())?;
    Ok(Arc::new(Dashboard::new(Arc::new(backend), SystemClock::shared(), &config.dashboard_options())))
}

fn print_topology(dashboard: &Dashboard) {
    let state = dashboard.topology();
    let render_state = dashboard.with_renderer(|renderer| renderer.state().clone());
    print!("{}", render_topology_summary(&state, &render_state));

    dashboard.with_renderer(|renderer| {
        let Some(instance) = renderer.instance() else {
            return;
        };
        println!("{} ({})", "Nodes".bold(), renderer.layout_mode());
        for node in instance.nodes() {
            println!("  {:<14} {:<16} ({:>7.1}, {:>7.1})", node.record.id().as_str(), node.class, node.position.x, node.position.y);
        }
        println!("{}", "Edges".bold());
        for edge in instance.edges() {
            println!(
                "  {:<28} {} -> {} {}",
                edge.connection.id.as_str(),
                edge.connection.source,
                edge.connection.target,
                edge.class.dimmed()
            );
        }
    });
}

fn confirm_on_terminal(job: &Job) -> bool {
    print!("Cancel job {} ({})? [y/N] ", job.label(), job.status);
    if std::io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match std::io::stdin().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

async fn watch(config: &DashboardConfig) -> anyhow::Result<()> {
    let dashboard = mount_dashboard(config)?;
    let mut events = dashboard.subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Ctrl-C received, tearing down.");
                break;
            }
            event = events.recv() => match event {
                Ok(DashboardEvent::TopologyUpdated { .. }) | Ok(DashboardEvent::RenderFailed { .. }) => print_topology(&dashboard),
                Ok(DashboardEvent::JobsUpdated { .. }) => print!("{}", render_job_table(&dashboard.jobs(), dashboard.clock().now())),
                Ok(DashboardEvent::SelectionChanged { .. }) => {
                    if let Some(detail) = dashboard.selection_detail() {
                        print!("{}", render_detail(&detail));
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => log::debug!("Skipped {} dashboard events.", skipped),
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    dashboard.teardown().await;
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Watch { layout } => {
            let config = resolve_config(&cli, *layout)?;
            watch(&config).await
        }
        Command::Topology { layout, select } => {
            let config = resolve_config(&cli, *layout)?;
            let dashboard = connect(&config)?;
            dashboard.refresh_topology().await?;
            print_topology(&dashboard);

            if let Some(node) = select {
                dashboard.tap_node(&node.as_str().into())?;
                if let Some(detail) = dashboard.selection_detail() {
                    print!("{}", render_detail(&detail));
                }
            }
            Ok(())
        }
        Command::Jobs => {
            let dashboard = connect(&resolve_config(&cli, None)?)?;
            let jobs = dashboard.refresh_jobs().await?;
            print!("{}", render_job_table(&jobs, dashboard.clock().now()));
            Ok(())
        }
        Command::Submit { workload_type, command } => {
            let dashboard = connect(&resolve_config(&cli, None)?)?;
            let receipt = dashboard.submit_job(*workload_type, command).await?;

            let status = receipt.status.map(render_status).unwrap_or_else(|| "submitted".to_string());
            let gpu = receipt.gpu.as_ref().map_or_else(|| "unassigned".to_string(), |gpu| gpu.to_string());
            println!("Job #{} {} on {}", receipt.job_id, status, gpu);
            if let Some(message) = receipt.message {
                println!("  {}", message.dimmed());
            }
            Ok(())
        }
        Command::Cancel { job_id, yes } => {
            let dashboard = connect(&resolve_config(&cli, None)?)?;
            let job_id = JobId::new(job_id.as_str());
            dashboard.refresh_jobs().await.context("loading jobs before cancelling")?;

            let assume_yes = *yes;
            let confirm = move |job: &Job| assume_yes || confirm_on_terminal(job);
            match dashboard.cancel_job(&job_id, &confirm).await {
                Ok(CancelOutcome::Cancelled { status, .. }) => println!("Job #{} {}", job_id, status),
                Ok(CancelOutcome::Declined) => println!("Job #{} left untouched.", job_id),
                Err(Error::Backend { message, .. }) => bail!("{}", message),
                Err(e) => return Err(e.into()),
            }
            Ok(())
        }
        Command::History { job_id } => {
            let dashboard = connect(&resolve_config(&cli, None)?)?;
            let history = dashboard.job_history(&JobId::new(job_id.as_str())).await?;
            if history.is_empty() {
                println!("No history for job #{}.", job_id);
            }
            for entry in history {
                let timestamp = entry.timestamp.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
                println!("{}  {:<10} {}", timestamp.dimmed(), entry.action, entry.details.unwrap_or_default());
            }
            Ok(())
        }
        Command::Detect => {
            let dashboard = connect(&resolve_config(&cli, None)?)?;
            let identification = dashboard.detect_local_gpus().await?;

            println!(
                "Detected {} GPU(s) via {}.",
                identification.report.detected.len(),
                identification.report.method.as_deref().unwrap_or("unknown method")
            );
            for gpu in &identification.report.detected {
                println!("  {} {}", gpu.name, gpu.model.as_deref().unwrap_or_default().dimmed());
            }
            match identification.local_gpu {
                Some(gpu) => println!("Backend host GPU: {} ({}, {}°C)", gpu.id, gpu.name, gpu.temperature),
                None => println!("Backend host did not identify a GPU of its own."),
            }
            Ok(())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    run(cli).await
}
