/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Aggregate statistics of a finished run.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use tracing::info;

use crate::scheduler::RejectionReason;
use crate::task::{Outcome, Task};
use crate::timeline::PowerTimeline;

/// Demand bin edges in MW.  Bin `i` is `(edges[i], edges[i + 1]]`; the first
/// bin also takes demands of exactly `0.0`.  Larger demands go to an
/// open-ended overflow bin.
pub const POWER_BIN_EDGES_MW: [f64; 6] = [0.0, 0.5, 1.0, 1.5, 2.0, 3.0];

/// Admission statistics for one demand range.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerBin {
    pub lower_mw: f64,
    /// `None` for the overflow bin.
    pub upper_mw: Option<f64>,
    pub total: usize,
    pub admitted: usize,
}

impl PowerBin {
    /// Fraction of tasks in this bin that were admitted, `None` if empty.
    pub fn admission_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.admitted as f64 / self.total as f64)
    }
}

/// Run-level statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSummary {
    pub total: usize,
    pub admitted: usize,
    pub rejected: usize,
    pub pending: usize,
    pub rejections: BTreeMap<RejectionReason, usize>,
    /// Energy committed to admitted tasks, MWh.
    pub scheduled_energy_mwh: f64,
    /// Energy the timeline offered before scheduling, MWh.
    pub available_energy_mwh: f64,
    pub bins: Vec<PowerBin>,
    /// Admitted tasks per start slot, one entry for every timeline slot.
    pub starts_per_slot: Vec<(NaiveDateTime, usize)>,
}

impl ScheduleSummary {
    pub fn from_run(tasks: &[Task], timeline: &PowerTimeline) -> Self {
        let mut bins: Vec<PowerBin> = POWER_BIN_EDGES_MW
            .windows(2)
            .map(|w| PowerBin {
                lower_mw: w[0],
                upper_mw: Some(w[1]),
                total: 0,
                admitted: 0,
            })
            .collect();
        bins.push(PowerBin {
            lower_mw: POWER_BIN_EDGES_MW[POWER_BIN_EDGES_MW.len() - 1],
            upper_mw: None,
            total: 0,
            admitted: 0,
        });

        let mut summary = Self {
            total: tasks.len(),
            admitted: 0,
            rejected: 0,
            pending: 0,
            rejections: RejectionReason::ALL.iter().map(|&r| (r, 0)).collect(),
            scheduled_energy_mwh: 0.0,
            available_energy_mwh: timeline.initial_energy_mwh(),
            bins,
            starts_per_slot: timeline.slots().iter().map(|s| (s.start, 0)).collect(),
        };

        let slot_hours = timeline.slot_hours();
        for task in tasks {
            let bin = bin_index(task.power_requirement_mw);
            summary.bins[bin].total += 1;

            match task.outcome() {
                Outcome::Pending => summary.pending += 1,
                Outcome::Admitted { start_slot, .. } => {
                    summary.admitted += 1;
                    if let Some((_, starts)) = summary.starts_per_slot.get_mut(*start_slot) {
                        *starts += 1;
                    }
                    summary.bins[bin].admitted += 1;
                    summary.scheduled_energy_mwh +=
                        task.power_requirement_mw * task.duration_slots as f64 * slot_hours;
                }
                Outcome::Rejected(reason) => {
                    summary.rejected += 1;
                    *summary.rejections.entry(*reason).or_default() += 1;
                }
            }
        }
        summary
    }

    /// Fraction of all tasks that were admitted, `None` with no tasks.
    pub fn admission_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.admitted as f64 / self.total as f64)
    }

    /// Fraction of the offered green energy committed to tasks.
    pub fn energy_utilisation(&self) -> Option<f64> {
        (self.available_energy_mwh > 0.0)
            .then(|| self.scheduled_energy_mwh / self.available_energy_mwh)
    }

    /// Slot where the most tasks started, earliest on ties.  `None` when
    /// nothing was admitted.
    pub fn busiest_start(&self) -> Option<(NaiveDateTime, usize)> {
        self.starts_per_slot
            .iter()
            .copied()
            .filter(|&(_, n)| n > 0)
            .fold(None, |best, (t, n)| match best {
                Some((_, m)) if m >= n => best,
                _ => Some((t, n)),
            })
    }

    /// Emit the summary as `info!` events.
    pub fn log(&self) {
        info!(
            total = self.total,
            admitted = self.admitted,
            rejected = self.rejected,
            pending = self.pending,
            admission_pct = ?self.admission_rate().map(|r| r * 100.0),
            "run summary"
        );
        info!(
            scheduled_mwh = self.scheduled_energy_mwh,
            available_mwh = self.available_energy_mwh,
            utilisation_pct = ?self.energy_utilisation().map(|r| r * 100.0),
            "green energy use"
        );
        if let Some((start_time, tasks)) = self.busiest_start() {
            info!(start_time = %start_time, tasks, "busiest start slot");
        }
        for (reason, count) in &self.rejections {
            info!(reason = reason.as_str(), count, "rejections");
        }
        for bin in &self.bins {
            info!(
                lower_mw = bin.lower_mw,
                upper_mw = ?bin.upper_mw,
                tasks = bin.total,
                admitted = bin.admitted,
                admission_pct = ?bin.admission_rate().map(|r| r * 100.0),
                "demand bin"
            );
        }
    }
}

/// Index into the bin list for `demand_mw`.
fn bin_index(demand_mw: f64) -> usize {
    POWER_BIN_EDGES_MW[1..]
        .iter()
        .position(|&upper| demand_mw <= upper)
        .unwrap_or(POWER_BIN_EDGES_MW.len() - 1)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
