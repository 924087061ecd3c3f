/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Power timeline: available green power per fixed-length slot.
//!
//! The timeline is a dense `Vec<Slot>` indexed by *slot offset* from the first
//! slot.  "Slot `i`" is therefore a plain integer and the slot containing (or
//! following) an instant is found with offset arithmetic instead of a scan
//! over timestamps.
//!
//! # Ownership model
//! One `PowerTimeline` is owned by the caller for one scheduling run and lent
//! to [`GreedyScheduler::schedule`](crate::scheduler::GreedyScheduler::schedule)
//! as `&mut`.  Every feasibility check and its debit happen under that single
//! exclusive borrow, so no other code can observe or mutate the timeline
//! between "verify" and "debit".
//!
//! Available power only ever goes down during a run.  The initial value of
//! each slot is kept alongside so consumed power can be reported afterwards.

pub mod forecast;

use std::ops::Range;

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

pub use forecast::{load_forecast_csv, read_forecast, ForecastError, ForecastRow};

/// Timestamp layout used for every CSV the crate reads and writes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Longest run of missing forecast slots that is filled with 0 MW, in hours.
/// A longer hole between two rows is reported as an error.
pub const MAX_FILLED_GAP_HOURS: i64 = 7 * 24;

/// Parse `YYYY-MM-DD HH:MM:SS` (optionally with a `T` separator and
/// fractional seconds).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

// ── Slot ──────────────────────────────────────────────────────────────────────

/// One scheduling slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    /// Wall-clock start of the slot.
    pub start: NaiveDateTime,

    /// Power still available in this slot, in MW.  Never negative.
    pub available_power: f64,
}

// ── PowerTimeline ─────────────────────────────────────────────────────────────

/// Gap-free sequence of slots with per-slot available power.
#[derive(Debug, Clone)]
pub struct PowerTimeline {
    slots: Vec<Slot>,
    /// Power available at load time, same indexing as `slots`.
    initial: Vec<f64>,
    slot_duration: Duration,
}

impl PowerTimeline {
    /// Build a timeline whose slot `i` starts at `origin + i × slot_duration`.
    ///
    /// Negative and non-finite power values are floored to `0.0`, so every
    /// slot holds a finite, non-negative amount.
    ///
    /// # Errors
    /// [`ForecastError::InvalidSlotDuration`] if `slot_duration` is shorter
    /// than one millisecond.
    pub fn from_power(
        origin: NaiveDateTime,
        slot_duration: Duration,
        power_mw: impl IntoIterator<Item = f64>,
    ) -> Result<Self, ForecastError> {
        check_slot_duration(slot_duration)?;

        let mut clamped = 0usize;
        let initial: Vec<f64> = power_mw
            .into_iter()
            .map(|p| {
                if p.is_finite() && p >= 0.0 {
                    p
                } else {
                    clamped += 1;
                    0.0
                }
            })
            .collect();

        if clamped > 0 {
            warn!(clamped, "negative, infinite or missing generation floored to 0 MW");
        }

        let mut slots = Vec::with_capacity(initial.len());
        let mut start = origin;
        for &available_power in &initial {
            slots.push(Slot {
                start,
                available_power,
            });
            start += slot_duration;
        }

        debug!(
            slot_count = slots.len(),
            slot_minutes = slot_duration.num_minutes(),
            origin = %origin,
            "power timeline built"
        );

        Ok(Self {
            slots,
            initial,
            slot_duration,
        })
    }

    /// Build a timeline from forecast rows, consuming only `actual_mw`.
    ///
    /// Rows may arrive in any order; they are sorted by timestamp.  The first
    /// row fixes the slot grid.  Slots missing between the first and last row
    /// are inserted with `0.0` MW.  A missing `actual_mw` also counts as 0 MW.
    ///
    /// # Errors
    /// * [`ForecastError::MisalignedTimestamp`] – a row does not start on the
    ///   slot grid.
    /// * [`ForecastError::DuplicateSlot`] – two rows map to the same slot.
    /// * [`ForecastError::GapTooLong`] – more than [`MAX_FILLED_GAP_HOURS`]
    ///   of slots are missing between two consecutive rows.
    /// * [`ForecastError::InvalidSlotDuration`] – bad `slot_duration`.
    pub fn from_forecast(
        mut rows: Vec<ForecastRow>,
        slot_duration: Duration,
    ) -> Result<Self, ForecastError> {
        check_slot_duration(slot_duration)?;
        rows.sort_by_key(|r| r.datetime);

        let Some(origin) = rows.first().map(|r| r.datetime) else {
            warn!("forecast is empty, every task will be rejected");
            return Self::from_power(NaiveDateTime::default(), slot_duration, Vec::new());
        };

        let slot_ms = slot_duration.num_milliseconds();
        let max_gap_ms = Duration::hours(MAX_FILLED_GAP_HOURS).num_milliseconds();
        let mut power: Vec<f64> = Vec::with_capacity(rows.len());
        let mut gaps = 0usize;

        for row in &rows {
            let elapsed = row.datetime - origin;
            let elapsed_ms = elapsed.num_milliseconds();
            if elapsed_ms % slot_ms != 0 || Duration::milliseconds(elapsed_ms) != elapsed {
                return Err(ForecastError::MisalignedTimestamp {
                    timestamp: row.datetime,
                    slot_minutes: slot_duration.num_minutes(),
                });
            }
            let offset = (elapsed_ms / slot_ms) as usize;
            if offset < power.len() {
                return Err(ForecastError::DuplicateSlot {
                    timestamp: row.datetime,
                });
            }
            let missing = offset - power.len();
            if missing as i64 * slot_ms > max_gap_ms {
                return Err(ForecastError::GapTooLong {
                    after: origin + slot_duration * power.len() as i32,
                    before: row.datetime,
                    missing_slots: missing,
                });
            }
            while power.len() < offset {
                power.push(0.0);
                gaps += 1;
            }
            power.push(row.actual_mw.unwrap_or(0.0));
        }

        if gaps > 0 {
            warn!(gaps, "forecast has missing slots, filled with 0 MW");
        }

        Self::from_power(origin, slot_duration, power)
    }

    // ── Shape ─────────────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot_duration(&self) -> Duration {
        self.slot_duration
    }

    /// Start of slot 0, or `None` for an empty timeline.
    pub fn origin(&self) -> Option<NaiveDateTime> {
        self.slots.first().map(|s| s.start)
    }

    /// Exclusive end of the horizon (end of the last slot).
    pub fn horizon_end(&self) -> Option<NaiveDateTime> {
        self.slots.last().map(|s| s.start + self.slot_duration)
    }

    // ── Lookup ────────────────────────────────────────────────────────────────

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, offset: usize) -> Option<&Slot> {
        self.slots.get(offset)
    }

    pub fn available_power(&self, offset: usize) -> Option<f64> {
        self.slots.get(offset).map(|s| s.available_power)
    }

    pub fn initial_power(&self, offset: usize) -> Option<f64> {
        self.initial.get(offset).copied()
    }

    /// Power consumed so far in slot `offset`.
    pub fn used_power(&self, offset: usize) -> Option<f64> {
        Some(self.initial_power(offset)? - self.available_power(offset)?)
    }

    /// Offset of the first slot whose start is at or after `instant`.
    ///
    /// Instants before the horizon map to slot 0.  Returns `None` when no slot
    /// starts at or after `instant` (including the empty timeline).
    pub fn offset_at_or_after(&self, instant: NaiveDateTime) -> Option<usize> {
        let origin = self.origin()?;
        if instant <= origin {
            return Some(0);
        }
        let elapsed = instant - origin;
        let mut elapsed_ms = elapsed.num_milliseconds();
        if Duration::milliseconds(elapsed_ms) < elapsed {
            elapsed_ms += 1;
        }
        let slot_ms = self.slot_duration.num_milliseconds();
        let offset = usize::try_from((elapsed_ms + slot_ms - 1) / slot_ms).ok()?;
        (offset < self.slots.len()).then_some(offset)
    }

    /// Total energy available at load time, in MWh.
    pub fn initial_energy_mwh(&self) -> f64 {
        self.initial.iter().sum::<f64>() * self.slot_hours()
    }

    /// Slot length in hours.
    pub fn slot_hours(&self) -> f64 {
        self.slot_duration.num_seconds() as f64 / 3600.0
    }

    // ── Mutation ──────────────────────────────────────────────────────────────

    /// Subtract `amount_mw` from every slot in the half-open `range`.
    ///
    /// Does not re-check feasibility: the caller must have verified that every
    /// slot in `range` holds at least `amount_mw` while holding the same
    /// `&mut` borrow.
    ///
    /// # Panics
    /// If `range` is out of bounds.
    pub fn debit(&mut self, range: Range<usize>, amount_mw: f64) {
        for slot in &mut self.slots[range] {
            debug_assert!(
                slot.available_power >= amount_mw,
                "debit below zero at {}",
                slot.start
            );
            slot.available_power -= amount_mw;
        }
    }
}

fn check_slot_duration(slot_duration: Duration) -> Result<(), ForecastError> {
    let millis = slot_duration.num_milliseconds();
    if millis < 1 {
        return Err(ForecastError::InvalidSlotDuration { millis });
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
