//! CLI entry point for the fleet maintenance due engine.
//!
//! Provides subcommands for running any of the due rules over a tenant's
//! fleet, checking task interval data, and requesting work-order numbers.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use fleet_due::backend::{FleetBackend, MemoryBackend, RestBackend};
use fleet_due::config::AppConfig;
use fleet_due::due::{DueMode, Urgency};
use fleet_due::fetch::{ApiKey, BasicClient};
use fleet_due::fleet::{DueFilter, FleetAssessment, Thresholds, assess_fleet, schedulable_tasks};
use fleet_due::models::TenantId;
use fleet_due::order_number::next_order_number;
use fleet_due::output::{
    log_due_report, log_modulo_entries, log_sweep_report, print_pretty, to_json, write_due_csv,
};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "fleet_due")]
#[command(about = "Maintenance due tracking for bus fleets", long_about = None)]
struct Cli {
    /// Tenant (empresa) id
    #[arg(short, long, global = true, default_value_t = 1)]
    tenant: TenantId,

    /// Read rows from a JSON snapshot instead of the hosted backend
    #[arg(long, global = true, value_name = "FILE")]
    snapshot: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a due rule across the tenant's fleet
    Assess {
        /// Rule to apply
        #[arg(short, long, default_value = "per-task-schedule")]
        mode: DueMode,

        /// Reference date (YYYY-MM-DD), defaults to today in UTC
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Only show plates containing this text (per-task-schedule)
        #[arg(short, long)]
        plate: Option<String>,

        /// Only show this urgency: overdue, upcoming or ok (per-task-schedule)
        #[arg(short, long)]
        urgency: Option<Urgency>,

        /// Maximum number of concurrent history lookups
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Seconds before a single history lookup is abandoned
        #[arg(long)]
        lookup_timeout: Option<u64>,

        /// Write the filtered statuses to a CSV file (per-task-schedule)
        #[arg(long, value_name = "FILE")]
        csv: Option<String>,

        /// Print the full result as JSON on stdout
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List scheduled tasks and report invalid interval data
    Tasks,
    /// Request the next work-order number from the backend
    NextOrder,
    /// Describe the available due rules
    Modes,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/fleet_due.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("fleet_due.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let snapshot = cli.snapshot.as_deref();

    match cli.command {
        Commands::Assess {
            mode,
            today,
            plate,
            urgency,
            concurrency,
            lookup_timeout,
            csv,
            json,
        } => {
            let today = today.unwrap_or_else(|| Utc::now().date_naive());
            let mut fan_out = config.fan_out();
            if let Some(n) = concurrency {
                fan_out.concurrency = n.max(1);
            }
            if let Some(secs) = lookup_timeout {
                fan_out.lookup_timeout = Duration::from_secs(secs);
            }

            let backend = open_backend(&config, snapshot)?;
            info!(tenant = cli.tenant, %mode, %today, "Assessing fleet");
            let assessment = assess_fleet(
                backend,
                cli.tenant,
                mode,
                today,
                &fan_out,
                &Thresholds::default(),
            )
            .await
            .context("fleet assessment failed")?;

            print_pretty(&assessment);
            if json {
                println!("{}", to_json(&assessment)?);
            }

            match &assessment {
                FleetAssessment::PerTaskSchedule(report) => {
                    let filter = DueFilter { plate, urgency };
                    let shown = report.filtered(&filter);
                    log_due_report(report, &shown);
                    if let Some(path) = csv {
                        write_due_csv(&path, &shown)?;
                        info!(path = %path, rows = shown.len(), "CSV written");
                    }
                    if !report.is_complete() {
                        warn!(
                            failed_lookups = report.lookup_failures.len(),
                            "Some buses could not be checked; results are partial"
                        );
                    }
                }
                FleetAssessment::NeverServicedSweep(report) => {
                    log_sweep_report(report);
                    if !report.lookup_failures.is_empty() {
                        warn!(
                            failed_lookups = report.lookup_failures.len(),
                            "Some buses could not be checked; results are partial"
                        );
                    }
                }
                FleetAssessment::FixedDistanceModulo { entries, .. } => {
                    log_modulo_entries(entries);
                }
            }
        }
        Commands::Tasks => {
            let backend = open_backend(&config, snapshot)?;
            let tasks = backend
                .list_scheduled_tasks(cli.tenant)
                .await
                .context("could not load scheduled tasks")?;
            let total = tasks.len();
            let (usable, issues) = schedulable_tasks(tasks);

            for task in &usable {
                info!(
                    task_id = task.id,
                    name = %task.name,
                    day_interval = task.day_interval,
                    distance_interval = task.distance_interval,
                    "Scheduled task"
                );
            }
            for issue in &issues {
                warn!(issue = %issue, "Task interval problem");
            }
            info!(total, usable = usable.len(), issues = issues.len(), "Task check summary");
        }
        Commands::NextOrder => {
            let backend = open_backend(&config, snapshot)?;
            let number = next_order_number(backend.as_ref(), cli.tenant).await?;
            println!("{number}");
        }
        Commands::Modes => {
            for line in mode_lines() {
                println!("{line}");
            }
        }
    }

    Ok(())
}

/// One line per due rule with its default thresholds. Needs no backend.
fn mode_lines() -> Vec<String> {
    DueMode::ALL
        .iter()
        .map(|mode| format!("{:<24}{}", mode.as_str(), mode.describe()))
        .collect()
}

/// Picks the snapshot file when given, otherwise the hosted backend from
/// `FLEET_BACKEND_URL` / `FLEET_BACKEND_KEY`.
fn open_backend(config: &AppConfig, snapshot: Option<&str>) -> Result<Arc<dyn FleetBackend>> {
    if let Some(path) = snapshot {
        info!(path, "Using snapshot backend");
        let backend =
            MemoryBackend::load(path).with_context(|| format!("cannot load snapshot {path}"))?;
        return Ok(Arc::new(backend));
    }

    let url = config
        .backend_url
        .as_deref()
        .context("FLEET_BACKEND_URL must be set (or pass --snapshot)")?;
    let key = config
        .backend_key
        .as_deref()
        .context("FLEET_BACKEND_KEY must be set")?;

    let client = ApiKey::new(BasicClient::new(config.http_timeout)?, key)?;
    info!(url, "Using hosted backend");
    Ok(Arc::new(RestBackend::new(client, url)?))
}
