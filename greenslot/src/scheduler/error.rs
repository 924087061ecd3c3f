/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Rejection reasons and scheduler errors.
//!
//! The two types model two very different things:
//!
//! * [`RejectionReason`] – why a task could not be placed.  This is a normal
//!   scheduling outcome, stored on the task and counted in the run summary.
//! * [`SchedulerError`] – the scheduler was misused and the run cannot
//!   continue.  Never produced by lack of power.

use thiserror::Error;

// ── Rejection ─────────────────────────────────────────────────────────────────

/// Why a task was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectionReason {
    /// No slot starts at or after the task's arrival.  No window was examined.
    ArrivedAfterHorizon,

    /// Even the earliest eligible start leaves fewer than `duration_slots`
    /// slots before the horizon ends.  No window was examined.
    WindowExceedsHorizon,

    /// Every complete window from the earliest eligible start onward contains
    /// at least one slot with less available power than the task needs.
    InsufficientPower,
}

impl RejectionReason {
    pub const ALL: [RejectionReason; 3] = [
        RejectionReason::ArrivedAfterHorizon,
        RejectionReason::WindowExceedsHorizon,
        RejectionReason::InsufficientPower,
    ];

    /// Short machine-friendly label, used as a log field.
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::ArrivedAfterHorizon => "arrived_after_horizon",
            RejectionReason::WindowExceedsHorizon => "window_exceeds_horizon",
            RejectionReason::InsufficientPower => "insufficient_power",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::ArrivedAfterHorizon => {
                write!(f, "task arrives after the last slot of the timeline")
            }
            RejectionReason::WindowExceedsHorizon => write!(
                f,
                "task needs more consecutive slots than remain after its arrival"
            ),
            RejectionReason::InsufficientPower => write!(
                f,
                "no window of consecutive slots has enough available power"
            ),
        }
    }
}

// ── Scheduler errors ──────────────────────────────────────────────────────────

/// Failure of a scheduling pass.
#[derive(Debug, Error, PartialEq)]
pub enum SchedulerError {
    /// A task handed to the scheduler was already admitted or rejected.
    ///
    /// Admission is once-only; re-running a decided task would double-debit
    /// the timeline.
    #[error("task '{task}' has already been decided and cannot be scheduled again")]
    TaskAlreadyDecided { task: String },

    /// A task's demand is negative, infinite or not a number.
    #[error("task '{task}' has an invalid power requirement ({power_mw} MW)")]
    InvalidDemand { task: String, power_mw: f64 },

    /// A task's `duration_slots` is 0, which would admit it without a debit.
    #[error("task '{task}' must occupy at least one slot")]
    ZeroDuration { task: String },
}
