/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Task queue builder: raw job trace → normalised [`Task`]s.
//!
//! | Trace field | Task field | Rule |
//! |---|---|---|
//! | `job_id` | `id` | required |
//! | `submit_time` (s) | `arrival_time` | `base_time + ⌊submit_time⌋ s` |
//! | `num_gpu` | `power_requirement_mw` | [`PowerModel::demand_mw`]; missing/NaN → 0 GPUs |
//! | `duration` (s) | `duration_slots` | `⌈duration / slot_seconds⌉`, at least 1 |
//!
//! Only the first `task_count` records are kept, in input order.  Records past
//! that point are never parsed, so a malformed row beyond the cut-off does not
//! fail the run.

pub mod trace;

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, info};

use crate::config::{PowerModel, SchedulerConfig};
use crate::task::Task;

pub use trace::{load_trace_csv, TraceError, TraceRecord};

/// Builds the task queue from trace records.
#[derive(Debug, Clone)]
pub struct TaskQueueBuilder {
    base_time: NaiveDateTime,
    slot_seconds: i64,
    power: PowerModel,
    task_count: Option<usize>,
}

impl TaskQueueBuilder {
    /// Builder for the scenario described by `config`.
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            base_time: config.base_time,
            slot_seconds: config.slot_seconds().max(1),
            power: config.power,
            task_count: config.task_count,
        }
    }

    /// Override the number of records kept.  `None` keeps all of them.
    pub fn with_task_count(mut self, task_count: Option<usize>) -> Self {
        self.task_count = task_count;
        self
    }

    pub fn task_count(&self) -> Option<usize> {
        self.task_count
    }

    /// Convert the first `task_count` records into tasks, preserving order.
    ///
    /// `record` numbers in errors count from 1.
    ///
    /// # Errors
    /// The first [`TraceError`] encountered; no tasks are returned in that case.
    pub fn build<I>(&self, records: I) -> Result<Vec<Task>, TraceError>
    where
        I: IntoIterator<Item = Result<TraceRecord, TraceError>>,
    {
        let limit = self.task_count.unwrap_or(usize::MAX);
        let tasks = records
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, record)| self.build_task(i + 1, &record?))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            tasks = tasks.len(),
            limit = ?self.task_count,
            "task queue built"
        );
        Ok(tasks)
    }

    /// Normalise one trace record.
    ///
    /// # Errors
    /// * [`TraceError::MissingField`] – `job_id`, `submit_time` or `duration`
    ///   is absent.
    /// * [`TraceError::InvalidField`] – `submit_time` or `duration` is not
    ///   finite, or the arrival falls outside the representable date range.
    pub fn build_task(&self, record: usize, raw: &TraceRecord) -> Result<Task, TraceError> {
        let id = raw.job_id.clone().ok_or(TraceError::MissingField {
            record,
            job_id: None,
            field: "job_id",
        })?;

        let submit = require(record, &id, "submit_time", raw.submit_time)?;
        let duration = require(record, &id, "duration", raw.duration)?;

        let arrival_time = Duration::try_seconds(submit.trunc() as i64)
            .and_then(|offset| self.base_time.checked_add_signed(offset))
            .ok_or_else(|| TraceError::InvalidField {
                record,
                job_id: id.clone(),
                field: "submit_time",
                value: submit,
            })?;

        let power_requirement_mw = self.power.demand_mw(raw.num_gpu);
        let duration_slots = self.duration_slots(duration);

        debug!(
            task = %id,
            arrival = %arrival_time,
            power_mw = power_requirement_mw,
            duration_slots,
            "task normalised"
        );
        Ok(Task::new(id, arrival_time, power_requirement_mw, duration_slots))
    }

    /// `⌈duration_seconds / slot_seconds⌉`, never less than one slot.
    pub fn duration_slots(&self, duration_seconds: f64) -> usize {
        let slots = (duration_seconds / self.slot_seconds as f64).ceil();
        if slots >= 1.0 {
            // float → int casts saturate
            slots as usize
        } else {
            1
        }
    }
}

/// Present-and-finite check for a numeric trace field.
fn require(
    record: usize,
    id: &str,
    field: &'static str,
    value: Option<f64>,
) -> Result<f64, TraceError> {
    match value {
        None => Err(TraceError::MissingField {
            record,
            job_id: Some(id.to_string()),
            field,
        }),
        Some(v) if !v.is_finite() => Err(TraceError::InvalidField {
            record,
            job_id: id.to_string(),
            field,
            value: v,
        }),
        Some(v) => Ok(v),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
