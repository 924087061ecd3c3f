/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Window feasibility and first-fit search.
//!
//! A window `[i, i + len)` is feasible for a demand `d` iff **every** slot in
//! it has `available_power ≥ d`.
//!
//! # Skipping blocked starts
//! The naive first-fit tries `i = from, from + 1, …` and re-checks the whole
//! window each time.  If slot `b` is the *rightmost* slot of window `i` below
//! the demand, every start `i ..= b` also covers `b` and is infeasible, so the
//! search can resume at `b + 1`.  The first start this returns is exactly the
//! first start the naive scan returns; only the number of comparisons changes.

use std::ops::Range;

use crate::timeline::Slot;

use super::RejectionReason;

/// `true` if every slot in `slots` can supply `demand_mw`.
pub fn window_is_feasible(slots: &[Slot], demand_mw: f64) -> bool {
    slots.iter().all(|s| s.available_power >= demand_mw)
}

/// Earliest start `i ≥ from` such that `[i, i + len)` is feasible.
///
/// # Errors
/// * [`RejectionReason::WindowExceedsHorizon`] – `[from, from + len)` already
///   runs past the last slot, so no window was examined.
/// * [`RejectionReason::InsufficientPower`] – windows were examined but none
///   was feasible before the horizon ended.
pub fn first_fit(
    slots: &[Slot],
    from: usize,
    len: usize,
    demand_mw: f64,
) -> Result<usize, RejectionReason> {
    let mut start = from;
    loop {
        let Some(window) = window_range(start, len, slots.len()) else {
            return Err(if start == from {
                RejectionReason::WindowExceedsHorizon
            } else {
                RejectionReason::InsufficientPower
            });
        };

        match slots[window]
            .iter()
            .rposition(|s| s.available_power < demand_mw)
        {
            None => return Ok(start),
            Some(blocker) => start += blocker + 1,
        }
    }
}

/// `[start, start + len)` if it fits inside `total` slots.
fn window_range(start: usize, len: usize, total: usize) -> Option<Range<usize>> {
    let end = start.checked_add(len)?;
    (end <= total).then_some(start..end)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
