/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Job trace CSV reader.
//!
//! Expected columns (any others are ignored):
//! ```text
//! job_id,submit_time,num_gpu,duration
//! 6f1d…,0,1,3600
//! ```
//! `num_gpu` may be empty.  The other three columns are required on every
//! record the builder keeps.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::TaskQueueBuilder;
use crate::task::Task;

// ── Errors ────────────────────────────────────────────────────────────────────

/// A trace record that cannot become a task.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The CSV layer could not read or decode a record.
    #[error("malformed trace record {record}: {source}")]
    Csv {
        record: usize,
        #[source]
        source: csv::Error,
    },

    /// A required column is empty or absent.
    #[error("trace record {record} (job {}): missing required field '{field}'", display_id(.job_id))]
    MissingField {
        record: usize,
        job_id: Option<String>,
        field: &'static str,
    },

    /// A numeric column holds an unusable value.
    #[error("trace record {record} (job {job_id}): invalid value {value} for '{field}'")]
    InvalidField {
        record: usize,
        job_id: String,
        field: &'static str,
        value: f64,
    },
}

fn display_id(job_id: &Option<String>) -> &str {
    job_id.as_deref().unwrap_or("<unknown>")
}

// ── Records ───────────────────────────────────────────────────────────────────

/// One raw row of the job trace.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TraceRecord {
    #[serde(default)]
    pub job_id: Option<String>,

    /// Submission offset from the simulation epoch, in seconds.
    #[serde(default)]
    pub submit_time: Option<f64>,

    #[serde(default)]
    pub num_gpu: Option<f64>,

    /// Run time in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
}

impl TaskQueueBuilder {
    /// Read trace records from `reader` and build the task queue.
    ///
    /// Records are pulled lazily, so nothing past the configured task count
    /// is parsed.
    pub fn build_from_reader<R: Read>(&self, reader: R) -> Result<Vec<Task>, TraceError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let records = csv_reader
            .deserialize::<TraceRecord>()
            .enumerate()
            .map(|(i, r)| r.map_err(|source| TraceError::Csv { record: i + 1, source }));

        self.build(records)
    }
}

/// Open `path` and build the task queue from it.
///
/// # Errors
/// Fails if the file cannot be opened or a kept record is malformed; the path
/// is always part of the error chain.
pub fn load_trace_csv(builder: &TaskQueueBuilder, path: &Path) -> Result<Vec<Task>> {
    info!("Loading job trace from: {}", path.display());

    let file = std::fs::File::open(path)
        .with_context(|| format!("Cannot open trace file: {}", path.display()))?;

    builder
        .build_from_reader(file)
        .with_context(|| format!("Failed to read trace file: {}", path.display()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
