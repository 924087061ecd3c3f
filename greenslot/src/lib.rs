/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! greenslot – greedy admission of compute jobs onto green-power slots
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── config/      – YAML scheduler configuration (slot size, epoch, power model)
//! ├── timeline/    – per-slot available power + forecast CSV loading
//! ├── task.rs      – Task record and its pending → admitted/rejected outcome
//! ├── queue/       – job trace → normalised Task queue
//! ├── scheduler/   – first-fit admission over the power timeline
//! └── report/      – result table, slot usage table and run summary
//! ```
//!
//! Data flows one way:
//!
//! ```text
//! trace CSV ──(queue)──► Vec<Task> ─┐
//!                                   ├──(scheduler, &mut PowerTimeline)──► Vec<Task> ──(report)──► CSV
//! forecast CSV ──(timeline)─────────┘
//! ```

pub mod config;
pub mod queue;
pub mod report;
pub mod scheduler;
pub mod task;
pub mod timeline;
