//! Greedy first-fit admission of tasks onto the power timeline.
//!
//! [`GreedyScheduler`] walks the task list **in the order given** and, for
//! each task, admits it at the earliest start slot where every slot of its
//! window still has enough power, debiting the timeline as it goes.  Tasks
//! that cannot be placed are marked rejected; that is an outcome, not an
//! error.
//!
//! # Ordering policy
//! Input order is the only tie-break.  A task listed earlier claims power
//! first even when a later-listed task arrives earlier in wall-clock time, as
//! long as the earlier-listed task's own arrival constraint is met.  This is a
//! deliberate fairness policy: reordering the queue changes the result.
//!
//! # Concurrency
//! The pass is strictly sequential.  `schedule()` takes the timeline as
//! `&mut PowerTimeline`, so the feasibility check and the debit for one task
//! happen under a single exclusive borrow and the next task always sees the
//! post-debit state.
//!
//! # Example
//! ```rust
//! use chrono::{Duration, NaiveDate};
//! use greenslot::scheduler::GreedyScheduler;
//! use greenslot::task::Task;
//! use greenslot::timeline::PowerTimeline;
//!
//! let t0 = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let mut timeline = PowerTimeline::from_power(t0, Duration::minutes(30), vec![1.0]).unwrap();
//! let mut tasks = vec![Task::new("a", t0, 0.6, 1), Task::new("b", t0, 0.6, 1)];
//!
//! GreedyScheduler::new().schedule(&mut timeline, &mut tasks).unwrap();
//! assert!(tasks[0].is_executed());
//! assert!(!tasks[1].is_executed());
//! ```

pub mod error;
pub mod feasibility;

pub use error::{RejectionReason, SchedulerError};

use tracing::{debug, info};

use crate::task::Task;
use crate::timeline::PowerTimeline;

use feasibility::first_fit;

// ── GreedyScheduler ───────────────────────────────────────────────────────────

/// Sequential first-fit admission scheduler.
///
/// Holds no per-run state: everything that changes during a run lives in the
/// caller-owned [`PowerTimeline`] and [`Task`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyScheduler;

/// Admitted / rejected counts of one [`GreedyScheduler::schedule`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScheduleCounts {
    pub admitted: usize,
    pub rejected: usize,
}

impl GreedyScheduler {
    pub fn new() -> Self {
        Self
    }

    // ── Public entry points ───────────────────────────────────────────────────

    /// Decide every task in `tasks`, in slice order, against `timeline`.
    ///
    /// Tasks are validated up front, so on error neither the timeline nor
    /// any task has been modified.
    ///
    /// # Errors
    /// * [`SchedulerError::TaskAlreadyDecided`] – a task is not `Pending`.
    /// * [`SchedulerError::InvalidDemand`] – a task's demand is negative or
    ///   not finite.
    /// * [`SchedulerError::ZeroDuration`] – a task needs no slots at all.
    pub fn schedule(
        &self,
        timeline: &mut PowerTimeline,
        tasks: &mut [Task],
    ) -> Result<ScheduleCounts, SchedulerError> {
        // ── Preconditions ─────────────────────────────────────────────────────
        for task in tasks.iter() {
            Self::check_task(task)?;
        }

        info!(
            task_count = tasks.len(),
            slot_count = timeline.len(),
            horizon_start = ?timeline.origin(),
            horizon_end = ?timeline.horizon_end(),
            "=== GreedyScheduler::schedule() ==="
        );
        if timeline.is_empty() {
            info!("timeline has no slots, every task will be rejected");
        }

        let mut counts = ScheduleCounts::default();
        for task in tasks.iter_mut() {
            if Self::place(timeline, task) {
                counts.admitted += 1;
            } else {
                counts.rejected += 1;
            }
        }

        info!(
            admitted = counts.admitted,
            rejected = counts.rejected,
            total = tasks.len(),
            "=== Scheduling complete ==="
        );
        Ok(counts)
    }

    /// Decide a single task against the current timeline state.
    ///
    /// Returns `true` if the task was admitted.
    ///
    /// # Errors
    /// Same as [`schedule`](Self::schedule).
    pub fn schedule_one(
        &self,
        timeline: &mut PowerTimeline,
        task: &mut Task,
    ) -> Result<bool, SchedulerError> {
        Self::check_task(task)?;
        Ok(Self::place(timeline, task))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn check_task(task: &Task) -> Result<(), SchedulerError> {
        if task.is_decided() {
            return Err(SchedulerError::TaskAlreadyDecided {
                task: task.id.clone(),
            });
        }
        if !task.power_requirement_mw.is_finite() || task.power_requirement_mw < 0.0 {
            return Err(SchedulerError::InvalidDemand {
                task: task.id.clone(),
                power_mw: task.power_requirement_mw,
            });
        }
        if task.duration_slots == 0 {
            return Err(SchedulerError::ZeroDuration {
                task: task.id.clone(),
            });
        }
        Ok(())
    }

    /// Verify-then-debit for one pending, validated task.
    fn place(timeline: &mut PowerTimeline, task: &mut Task) -> bool {
        // 1. Earliest eligible start slot
        let Some(earliest) = timeline.offset_at_or_after(task.arrival_time) else {
            Self::reject(task, RejectionReason::ArrivedAfterHorizon);
            return false;
        };

        // 2–4. First feasible window from there on
        let start = match first_fit(
            timeline.slots(),
            earliest,
            task.duration_slots,
            task.power_requirement_mw,
        ) {
            Ok(start) => start,
            Err(reason) => {
                Self::reject(task, reason);
                return false;
            }
        };

        // 5. Admit and debit under the same borrow
        let start_time = timeline.slots()[start].start;
        timeline.debit(start..start + task.duration_slots, task.power_requirement_mw);
        task.admit(start, start_time);

        debug!(
            task = %task.id,
            start_slot = start,
            start_time = %start_time,
            wait_slots = start - earliest,
            duration_slots = task.duration_slots,
            power_mw = task.power_requirement_mw,
            "✓ admitted"
        );
        true
    }

    fn reject(task: &mut Task, reason: RejectionReason) {
        task.reject(reason);
        debug!(
            task = %task.id,
            arrival = %task.arrival_time,
            duration_slots = task.duration_slots,
            power_mw = task.power_requirement_mw,
            reason = reason.as_str(),
            "✗ rejected"
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Outcome;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    // ── Test helpers ──────────────────────────────────────────────────────────

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn slot_start(i: i64) -> NaiveDateTime {
        t0() + Duration::minutes(30 * i)
    }

    fn timeline(power: &[f64]) -> PowerTimeline {
        PowerTimeline::from_power(t0(), Duration::minutes(30), power.to_vec()).unwrap()
    }

    fn task(id: &str, arrival: NaiveDateTime, power_mw: f64, slots: usize) -> Task {
        Task::new(id, arrival, power_mw, slots)
    }

    fn powers(tl: &PowerTimeline) -> Vec<f64> {
        tl.slots().iter().map(|s| s.available_power).collect()
    }

    // ── Reference scenarios ───────────────────────────────────────────────────

    #[test]
    fn exact_fit_single_slot() {
        let mut tl = timeline(&[1.0]);
        let mut tasks = vec![task("a", t0(), 1.0, 1)];
        GreedyScheduler::new().schedule(&mut tl, &mut tasks).unwrap();

        assert!(tasks[0].is_executed());
        assert_eq!(tasks[0].start_time(), Some(t0()));
        assert_eq!(tl.available_power(0), Some(0.0));
    }

    #[test]
    fn list_order_wins_contention() {
        let mut tl = timeline(&[1.0]);
        let mut tasks = vec![task("a", t0(), 0.6, 1), task("b", t0(), 0.6, 1)];
        let counts = GreedyScheduler::new().schedule(&mut tl, &mut tasks).unwrap();

        assert_eq!(counts, ScheduleCounts { admitted: 1, rejected: 1 });
        assert!(tasks[0].is_executed());
        assert!(!tasks[1].is_executed());
        assert_eq!(
            tasks[1].rejection_reason(),
            Some(&RejectionReason::InsufficientPower)
        );
        assert!((tl.available_power(0).unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn multi_slot_task_takes_first_window() {
        let mut tl = timeline(&[1.0, 1.0, 1.0]);
        let arrival = t0() - Duration::minutes(10);
        let mut tasks = vec![task("a", arrival, 1.0, 2)];
        GreedyScheduler::new().schedule(&mut tl, &mut tasks).unwrap();

        assert_eq!(tasks[0].start_slot(), Some(0));
        assert_eq!(tasks[0].start_time(), Some(t0()));
        assert_eq!(powers(&tl), vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn window_longer_than_horizon_is_rejected_without_mutation() {
        let mut tl = timeline(&[1.0, 1.0, 1.0]);
        let mut tasks = vec![task("long", slot_start(1), 0.1, 3)];
        GreedyScheduler::new().schedule(&mut tl, &mut tasks).unwrap();

        assert_eq!(
            tasks[0].outcome(),
            &Outcome::Rejected(RejectionReason::WindowExceedsHorizon)
        );
        assert_eq!(powers(&tl), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn arrival_after_horizon_is_rejected_without_mutation() {
        let mut tl = timeline(&[1.0, 1.0]);
        let mut tasks = vec![task("late", slot_start(2), 0.1, 1)];
        GreedyScheduler::new().schedule(&mut tl, &mut tasks).unwrap();

        assert_eq!(
            tasks[0].rejection_reason(),
            Some(&RejectionReason::ArrivedAfterHorizon)
        );
        assert_eq!(powers(&tl), vec![1.0, 1.0]);
    }

    // ── Behaviour ─────────────────────────────────────────────────────────────

    #[test]
    fn start_is_never_before_arrival() {
        let mut tl = timeline(&[5.0; 6]);
        // arrives mid-slot 2 → first eligible start is slot 3
        let arrival = slot_start(2) + Duration::minutes(1);
        let mut tasks = vec![task("a", arrival, 1.0, 1)];
        GreedyScheduler::new().schedule(&mut tl, &mut tasks).unwrap();

        assert_eq!(tasks[0].start_slot(), Some(3));
        assert!(tasks[0].start_time().unwrap() >= arrival);
    }

    #[test]
    fn waits_for_enough_power() {
        let mut tl = timeline(&[0.2, 0.3, 2.0, 0.1, 2.0, 2.0]);
        let mut tasks = vec![task("a", t0(), 1.5, 2)];
        GreedyScheduler::new().schedule(&mut tl, &mut tasks).unwrap();

        assert_eq!(tasks[0].start_slot(), Some(4));
        assert_eq!(powers(&tl), vec![0.2, 0.3, 2.0, 0.1, 0.5, 0.5]);
    }

    #[test]
    fn earlier_listed_later_arriving_task_claims_power_first() {
        // "late" is listed first and arrives at slot 1; "early" arrives at
        // slot 0 but only slot 1 has power.  Listing order decides.
        let mut tl = timeline(&[0.0, 1.0]);
        let mut tasks = vec![
            task("late", slot_start(1), 1.0, 1),
            task("early", t0(), 1.0, 1),
        ];
        GreedyScheduler::new().schedule(&mut tl, &mut tasks).unwrap();

        assert!(tasks[0].is_executed());
        assert!(!tasks[1].is_executed());
    }

    #[test]
    fn empty_timeline_rejects_everything() {
        let mut tl = timeline(&[]);
        let mut tasks = vec![task("a", t0(), 0.5, 1), task("b", t0(), 0.5, 1)];
        let counts = GreedyScheduler::new().schedule(&mut tl, &mut tasks).unwrap();

        assert_eq!(counts.admitted, 0);
        assert!(tasks
            .iter()
            .all(|t| t.rejection_reason() == Some(&RejectionReason::ArrivedAfterHorizon)));
    }

    #[test]
    fn no_tasks_is_not_an_error() {
        let mut tl = timeline(&[1.0]);
        let counts = GreedyScheduler::new().schedule(&mut tl, &mut []).unwrap();
        assert_eq!(counts, ScheduleCounts::default());
    }

    #[test]
    fn zero_demand_task_is_admitted_on_empty_slot() {
        let mut tl = timeline(&[0.0]);
        let mut tasks = vec![task("idle", t0(), 0.0, 1)];
        GreedyScheduler::new().schedule(&mut tl, &mut tasks).unwrap();
        assert!(tasks[0].is_executed());
        assert_eq!(tl.available_power(0), Some(0.0));
    }

    // ── Errors ────────────────────────────────────────────────────────────────

    #[test]
    fn decided_task_is_refused_and_nothing_changes() {
        let mut tl = timeline(&[1.0, 1.0]);
        let mut tasks = vec![task("a", t0(), 0.5, 1)];
        let sched = GreedyScheduler::new();
        sched.schedule(&mut tl, &mut tasks).unwrap();
        let before = powers(&tl);

        tasks.push(task("b", t0(), 0.5, 1));
        let err = sched.schedule(&mut tl, &mut tasks).unwrap_err();

        assert_eq!(
            err,
            SchedulerError::TaskAlreadyDecided {
                task: "a".to_string()
            }
        );
        assert_eq!(powers(&tl), before);
        assert!(!tasks[1].is_decided(), "validation happens before any placement");
    }

    #[test]
    fn nan_demand_is_refused() {
        let mut tl = timeline(&[1.0]);
        let mut t = task("nan", t0(), f64::NAN, 1);
        let err = GreedyScheduler::new()
            .schedule_one(&mut tl, &mut t)
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidDemand { .. }));
    }

    #[test]
    fn infinite_demand_is_refused_and_leaves_power_finite() {
        let mut tl = PowerTimeline::from_power(t0(), Duration::minutes(30), vec![f64::INFINITY])
            .unwrap();
        let mut tasks = vec![
            task("inf", t0(), f64::INFINITY, 1),
            task("after", t0(), 1000.0, 1),
        ];
        let err = GreedyScheduler::new()
            .schedule(&mut tl, &mut tasks)
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidDemand { task: ref id, .. } if id == "inf"));
        assert!(tasks.iter().all(|t| !t.is_decided()));

        // The unbounded slot was floored at load time, so the large task is
        // turned away for lack of power.
        tasks.remove(0);
        GreedyScheduler::new().schedule(&mut tl, &mut tasks).unwrap();
        assert_eq!(
            tasks[0].rejection_reason(),
            Some(&RejectionReason::InsufficientPower)
        );
        assert_eq!(tl.available_power(0), Some(0.0));
    }

    #[test]
    fn zero_duration_set_after_construction_is_refused() {
        let mut tl = timeline(&[0.0]);
        let mut t = task("empty", t0(), 5.0, 1);
        t.duration_slots = 0;

        let err = GreedyScheduler::new()
            .schedule_one(&mut tl, &mut t)
            .unwrap_err();
        assert_eq!(
            err,
            SchedulerError::ZeroDuration {
                task: "empty".to_string()
            }
        );
        assert!(!t.is_executed());
        assert_eq!(t.slot_range(), None);
    }

    #[test]
    fn schedule_one_sees_previous_debits() {
        let mut tl = timeline(&[1.0, 1.0]);
        let sched = GreedyScheduler::new();
        let mut a = task("a", t0(), 0.7, 1);
        let mut b = task("b", t0(), 0.7, 1);

        assert!(sched.schedule_one(&mut tl, &mut a).unwrap());
        assert!(sched.schedule_one(&mut tl, &mut b).unwrap());
        assert_eq!(a.start_slot(), Some(0));
        assert_eq!(b.start_slot(), Some(1));
    }

    // ── Invariants over generated workloads ───────────────────────────────────

    /// Deterministic workload generator (xorshift64).
    struct Workload {
        state: u64,
    }

    impl Workload {
        fn new(seed: u64) -> Self {
            Self { state: seed | 1 }
        }

        fn next(&mut self) -> u64 {
            self.state ^= self.state << 13;
            self.state ^= self.state >> 7;
            self.state ^= self.state << 17;
            self.state
        }

        fn power(&mut self, slots: usize) -> Vec<f64> {
            (0..slots)
                .map(|_| match self.next() % 4 {
                    0 => 0.0,
                    _ => (self.next() % 40) as f64 * 0.1,
                })
                .collect()
        }

        fn tasks(&mut self, count: usize, horizon: i64) -> Vec<Task> {
            (0..count)
                .map(|i| {
                    // anywhere from one slot before the horizon to one slot past it
                    let minutes = (self.next() % (horizon as u64 * 30 + 60)) as i64 - 30;
                    let arrival = t0() + Duration::minutes(minutes);
                    let gpus = self.next() % 4;
                    let power = if gpus == 0 { 0.5 } else { gpus as f64 * 0.8 };
                    let slots = 1 + (self.next() % 6) as usize;
                    Task::new(format!("t{i}"), arrival, power, slots)
                })
                .collect()
        }
    }

    /// Per-slot power just before task `upto` was considered, replayed from
    /// the admissions of the tasks listed before it.
    fn replay_available(initial: &[f64], tasks: &[Task], upto: usize) -> Vec<f64> {
        let mut avail = initial.to_vec();
        for t in &tasks[..upto] {
            if let Some(range) = t.slot_range() {
                for s in range {
                    avail[s] -= t.power_requirement_mw;
                }
            }
        }
        avail
    }

    #[test]
    fn generated_runs_respect_capacity_causality_and_first_fit() {
        for seed in 1..=40u64 {
            let mut workload = Workload::new(seed.wrapping_mul(0x2545_F491_4F6C_DD1D));
            let horizon = 8 + (workload.next() % 40) as i64;
            let initial = workload.power(horizon as usize);
            let mut tl = timeline(&initial);
            let mut tasks = workload.tasks(30, horizon);

            GreedyScheduler::new().schedule(&mut tl, &mut tasks).unwrap();

            // Capacity: remaining = initial − Σ covering demands, never < 0
            let expected = replay_available(&initial, &tasks, tasks.len());
            for (s, slot) in tl.slots().iter().enumerate() {
                assert!(slot.available_power >= 0.0, "seed {seed} slot {s} negative");
                assert!(
                    (slot.available_power - expected[s]).abs() < 1e-9,
                    "seed {seed} slot {s}: {} vs {}",
                    slot.available_power,
                    expected[s]
                );
            }

            for (i, t) in tasks.iter().enumerate() {
                assert!(t.is_decided());
                let avail = replay_available(&initial, &tasks, i);
                let Some(start) = t.start_slot() else {
                    continue;
                };

                // Causality
                assert!(t.start_time().unwrap() >= t.arrival_time, "seed {seed} task {i}");

                // Feasible at admission time
                let window = start..start + t.duration_slots;
                assert!(avail[window].iter().all(|&p| p >= t.power_requirement_mw));

                // First fit: no earlier eligible start was feasible
                let earliest = tl.offset_at_or_after(t.arrival_time).unwrap();
                for earlier in earliest..start {
                    let w = earlier..earlier + t.duration_slots;
                    assert!(
                        avail[w].iter().any(|&p| p < t.power_requirement_mw),
                        "seed {seed} task {i}: start {earlier} was feasible before {start}"
                    );
                }
            }
        }
    }

    #[test]
    fn scheduling_is_deterministic() {
        let run = || {
            let mut workload = Workload::new(0xDEAD_BEEF);
            let initial = workload.power(48);
            let mut tl = timeline(&initial);
            let mut tasks = workload.tasks(60, 48);
            GreedyScheduler::new().schedule(&mut tl, &mut tasks).unwrap();
            (
                tasks.into_iter().map(|t| t.outcome().clone()).collect::<Vec<_>>(),
                powers(&tl),
            )
        };

        let reference = run();
        for _ in 0..20 {
            assert_eq!(run(), reference, "identical input produced different output");
        }
    }
}
