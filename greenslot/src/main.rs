/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use greenslot::config::SchedulerConfig;
use greenslot::queue::{load_trace_csv, TaskQueueBuilder};
use greenslot::report::{write_results_csv, write_usage_csv, ScheduleSummary};
use greenslot::scheduler::GreedyScheduler;
use greenslot::timeline::{load_forecast_csv, PowerTimeline};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Schedule a job trace onto slots of available green power.
///
/// Example:
///   greenslot -f data/larks_green_2023_06_01_to_06_07.csv \
///             -t data/pai_job_duration_estimate_100K.csv \
///             -o output/pai_scheduler_result.csv -n 1000
#[derive(Debug, Parser)]
#[command(
    name = "greenslot",
    about = "Greedy green-power admission scheduler",
    long_about = None,
)]
struct Cli {
    /// Power forecast CSV (datetime, forecast_MW, actual_MW).
    #[arg(short = 'f', long = "forecast")]
    forecast: PathBuf,

    /// Job trace CSV (job_id, submit_time, num_gpu, duration).
    #[arg(short = 't', long = "trace")]
    trace: PathBuf,

    /// Where to write the per-task result table.
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Optional per-slot usage table (datetime, available_power, used_power).
    #[arg(short = 'u', long = "usage")]
    usage: Option<PathBuf>,

    /// YAML scheduler configuration.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Number of trace records to schedule (overrides `task_count`).
    #[arg(short = 'n', long = "tasks")]
    tasks: Option<usize>,

    /// Slot length in minutes (overrides `slot_minutes`).
    #[arg(long = "slot-minutes")]
    slot_minutes: Option<u32>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!(
        forecast     = %cli.forecast.display(),
        trace        = %cli.trace.display(),
        output       = %cli.output.display(),
        usage        = ?cli.usage,
        config       = ?cli.config,
        tasks        = ?cli.tasks,
        slot_minutes = ?cli.slot_minutes,
        "greenslot starting"
    );

    if let Err(e) = run(&cli) {
        error!("Scheduling run failed: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    // ── Configuration ─────────────────────────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => SchedulerConfig::load_from_file(path)?,
        None => {
            warn!("No configuration file provided, using default scenario settings");
            SchedulerConfig::default()
        }
    };
    if let Some(n) = cli.tasks {
        config.task_count = Some(n);
    }
    if let Some(minutes) = cli.slot_minutes {
        config.slot_minutes = minutes;
    }
    config.validate().context("Invalid command-line override")?;

    // ── Inputs ────────────────────────────────────────────────────────────────
    let rows = load_forecast_csv(&cli.forecast)?;
    let mut timeline = PowerTimeline::from_forecast(rows, config.slot_duration())
        .with_context(|| format!("Invalid forecast series: {}", cli.forecast.display()))?;

    let builder = TaskQueueBuilder::new(&config);
    let mut tasks = load_trace_csv(&builder, &cli.trace)?;

    // ── Scheduling pass ───────────────────────────────────────────────────────
    GreedyScheduler::new()
        .schedule(&mut timeline, &mut tasks)
        .context("Scheduling pass aborted")?;

    // ── Outputs ───────────────────────────────────────────────────────────────
    write_results_csv(&cli.output, &tasks)?;
    if let Some(path) = &cli.usage {
        write_usage_csv(path, &timeline)?;
    }

    ScheduleSummary::from_run(&tasks, &timeline).log();
    Ok(())
}
