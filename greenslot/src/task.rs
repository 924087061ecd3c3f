/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core task data structure.
//!
//! ```text
//! trace record ──(queue)──►  Task { Pending }  ──(scheduler)──►  Task { Admitted | Rejected }
//! ```
//!
//! # Lifecycle
//! A `Task` is created by the [`TaskQueueBuilder`](crate::queue::TaskQueueBuilder)
//! in the `Pending` state and moves exactly once to a terminal state.  The
//! transition methods are crate-private and refuse to overwrite a terminal
//! outcome, so an admitted task's start time can never change afterwards.

use chrono::NaiveDateTime;

use crate::scheduler::RejectionReason;

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Scheduling outcome of a task.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Outcome {
    /// Not yet considered by the scheduler.
    #[default]
    Pending,

    /// Runs on slots `[start_slot, start_slot + duration_slots)`.
    Admitted {
        start_slot: usize,
        start_time: NaiveDateTime,
    },

    /// No feasible window exists.  A normal result, not an error.
    Rejected(RejectionReason),
}

// ── Task ──────────────────────────────────────────────────────────────────────

/// One schedulable unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Identifier carried through to the result table.
    pub id: String,

    /// Earliest instant the task may start.
    pub arrival_time: NaiveDateTime,

    /// Constant demand in MW for the whole run.
    pub power_requirement_mw: f64,

    /// Number of consecutive slots required.  `Task::new` clamps it to ≥ 1
    /// and the scheduler refuses a task whose value was later set to 0.
    pub duration_slots: usize,

    outcome: Outcome,
}

impl Task {
    /// Create a pending task.  `duration_slots` is clamped to at least 1.
    pub fn new(
        id: impl Into<String>,
        arrival_time: NaiveDateTime,
        power_requirement_mw: f64,
        duration_slots: usize,
    ) -> Self {
        Self {
            id: id.into(),
            arrival_time,
            power_requirement_mw,
            duration_slots: duration_slots.max(1),
            outcome: Outcome::Pending,
        }
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// `true` once the task has been admitted.
    pub fn is_executed(&self) -> bool {
        matches!(self.outcome, Outcome::Admitted { .. })
    }

    /// `true` once the task has left the `Pending` state.
    pub fn is_decided(&self) -> bool {
        !matches!(self.outcome, Outcome::Pending)
    }

    /// Start instant of the first occupied slot, if admitted.
    pub fn start_time(&self) -> Option<NaiveDateTime> {
        match self.outcome {
            Outcome::Admitted { start_time, .. } => Some(start_time),
            _ => None,
        }
    }

    /// Offset of the first occupied slot, if admitted.
    pub fn start_slot(&self) -> Option<usize> {
        match self.outcome {
            Outcome::Admitted { start_slot, .. } => Some(start_slot),
            _ => None,
        }
    }

    /// Occupied slot offsets, if admitted.
    pub fn slot_range(&self) -> Option<std::ops::Range<usize>> {
        self.start_slot().map(|start| start..start + self.duration_slots)
    }

    pub fn rejection_reason(&self) -> Option<&RejectionReason> {
        match &self.outcome {
            Outcome::Rejected(reason) => Some(reason),
            _ => None,
        }
    }

    /// Move to `Admitted`.  Returns `false` and leaves the task untouched if
    /// it was already decided.
    pub(crate) fn admit(&mut self, start_slot: usize, start_time: NaiveDateTime) -> bool {
        if self.is_decided() {
            return false;
        }
        self.outcome = Outcome::Admitted {
            start_slot,
            start_time,
        };
        true
    }

    /// Move to `Rejected`.  Returns `false` and leaves the task untouched if
    /// it was already decided.
    pub(crate) fn reject(&mut self, reason: RejectionReason) -> bool {
        if self.is_decided() {
            return false;
        }
        self.outcome = Outcome::Rejected(reason);
        true
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
