/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Result emission.
//!
//! Two CSV tables leave the crate:
//!
//! * the **result table**, one row per task in queue order:
//!   ```text
//!   task_id,arrival_time,power_requirement_MW,duration_slots,executed,start_time
//!   a1,2023-06-01 00:00:00,0.8,1,True,2023-06-01 09:00:00
//!   a2,2023-06-01 00:02:00,0.5,1,False,
//!   ```
//!   `start_time` is empty for tasks that did not run, so consumers must not
//!   assume every row has one.
//! * the **slot usage table**, one row per timeline slot:
//!   ```text
//!   datetime,available_power,used_power
//!   ```
//!   where `available_power` is the power at load time and `used_power` what
//!   admitted tasks consumed.
//!
//! No scheduling logic lives here: rows are a formatting of the final state.

pub mod summary;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::task::Task;
use crate::timeline::{PowerTimeline, TIMESTAMP_FORMAT};

pub use summary::{PowerBin, ScheduleSummary, POWER_BIN_EDGES_MW};

// ── Row types ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    task_id: &'a str,
    arrival_time: String,
    #[serde(rename = "power_requirement_MW")]
    power_requirement_mw: f64,
    duration_slots: usize,
    executed: &'static str,
    start_time: Option<String>,
}

impl<'a> ResultRow<'a> {
    fn from_task(task: &'a Task) -> Self {
        Self {
            task_id: &task.id,
            arrival_time: task.arrival_time.format(TIMESTAMP_FORMAT).to_string(),
            power_requirement_mw: task.power_requirement_mw,
            duration_slots: task.duration_slots,
            executed: if task.is_executed() { "True" } else { "False" },
            start_time: task
                .start_time()
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct UsageRow {
    datetime: String,
    available_power: f64,
    used_power: f64,
}

// ── Writers ───────────────────────────────────────────────────────────────────

/// Write the result table for `tasks` to `writer`, preserving order.
///
/// A task still `Pending` is written with `executed = False`.
pub fn write_results<W: Write>(writer: W, tasks: &[Task]) -> Result<(), csv::Error> {
    let pending = tasks.iter().filter(|t| !t.is_decided()).count();
    if pending > 0 {
        warn!(pending, "writing results for tasks that were never scheduled");
    }

    let mut out = csv::Writer::from_writer(writer);
    for task in tasks {
        out.serialize(ResultRow::from_task(task))?;
    }
    out.flush()?;
    Ok(())
}

/// Write the slot usage table for `timeline` to `writer`.
pub fn write_usage<W: Write>(writer: W, timeline: &PowerTimeline) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    for (offset, slot) in timeline.slots().iter().enumerate() {
        let initial = timeline.initial_power(offset).unwrap_or(slot.available_power);
        out.serialize(UsageRow {
            datetime: slot.start.format(TIMESTAMP_FORMAT).to_string(),
            available_power: initial,
            used_power: initial - slot.available_power,
        })?;
    }
    out.flush()?;
    Ok(())
}

/// Create (or truncate) `path` and write the result table into it.
pub fn write_results_csv(path: &Path, tasks: &[Task]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Cannot create result file: {}", path.display()))?;
    write_results(file, tasks)
        .with_context(|| format!("Failed to write result file: {}", path.display()))?;

    info!(rows = tasks.len(), "results written to {}", path.display());
    Ok(())
}

/// Create (or truncate) `path` and write the slot usage table into it.
pub fn write_usage_csv(path: &Path, timeline: &PowerTimeline) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Cannot create usage file: {}", path.display()))?;
    write_usage(file, timeline)
        .with_context(|| format!("Failed to write usage file: {}", path.display()))?;

    info!(rows = timeline.len(), "slot usage written to {}", path.display());
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
