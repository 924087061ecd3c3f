//! Scheduler configuration loading.
//!
//! Every scenario parameter that the pipeline depends on (slot length,
//! simulation epoch, trace truncation and the GPU → MW power model) comes from
//! here, so one binary can be reused across scenarios.
//!
//! The expected YAML structure is:
//! ```yaml
//! slot_minutes: 30
//! base_time: "2023-06-01T00:00:00"
//! task_count: 1000
//! power:
//!   mw_per_gpu: 0.8
//!   floor_mw: 0.5
//!   precision: 2
//! ```
//!
//! All keys are optional; missing keys fall back to [`SchedulerConfig::default`].

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, info};

use crate::timeline::parse_timestamp;

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Slot length used by the reference scenario (half-hourly settlement periods).
pub const DEFAULT_SLOT_MINUTES: u32 = 30;

/// Power drawn per GPU, in MW.
pub const DEFAULT_MW_PER_GPU: f64 = 0.8;

/// Baseline draw for any task, in MW. Also the demand of non-GPU jobs.
pub const DEFAULT_FLOOR_MW: f64 = 0.5;

/// Decimal places kept on computed demands.
pub const DEFAULT_POWER_PRECISION: u32 = 2;

/// Largest precision accepted; beyond this rounding is a no-op for f64 anyway.
const MAX_POWER_PRECISION: u32 = 12;

// ── Private YAML deserialization types ────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    slot_minutes: Option<u32>,
    base_time: Option<String>,
    task_count: Option<usize>,
    #[serde(default)]
    power: PowerSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PowerSection {
    mw_per_gpu: Option<f64>,
    floor_mw: Option<f64>,
    precision: Option<u32>,
}

// ── PowerModel ────────────────────────────────────────────────────────────────

/// Converts a job's GPU count into a constant MW demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerModel {
    /// MW drawn per GPU.
    pub mw_per_gpu: f64,
    /// Minimum demand of any task, in MW.
    pub floor_mw: f64,
    /// Number of decimal places the demand is rounded to.
    pub precision: u32,
}

impl Default for PowerModel {
    fn default() -> Self {
        Self {
            mw_per_gpu: DEFAULT_MW_PER_GPU,
            floor_mw: DEFAULT_FLOOR_MW,
            precision: DEFAULT_POWER_PRECISION,
        }
    }
}

impl PowerModel {
    /// Demand in MW for a job with `gpu_count` GPUs.
    ///
    /// `None`, NaN and non-positive counts all fall back to the floor.
    pub fn demand_mw(&self, gpu_count: Option<f64>) -> f64 {
        let gpus = gpu_count.filter(|g| g.is_finite()).unwrap_or(0.0);
        let raw = if gpus > 0.0 {
            (self.mw_per_gpu * gpus).max(self.floor_mw)
        } else {
            self.floor_mw
        };
        round_to(raw, self.precision)
    }
}

/// Round `value` half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: u32) -> f64 {
    let scale = 10_f64.powi(places.min(MAX_POWER_PRECISION) as i32);
    (value * scale).round() / scale
}

// ── SchedulerConfig ───────────────────────────────────────────────────────────

/// Scenario parameters for one scheduling run.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Length of one slot in minutes. Must be non-zero.
    pub slot_minutes: u32,

    /// Simulation epoch: trace submission offsets are relative to this instant.
    pub base_time: NaiveDateTime,

    /// Keep only the first `task_count` trace records. `None` keeps all.
    pub task_count: Option<usize>,

    pub power: PowerModel,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            slot_minutes: DEFAULT_SLOT_MINUTES,
            base_time: default_base_time(),
            task_count: None,
            power: PowerModel::default(),
        }
    }
}

/// 2023-06-01 00:00:00, the start of the reference forecast week.
fn default_base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 6, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

impl SchedulerConfig {
    /// Parses `path` and returns a validated configuration.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, the YAML is structurally
    /// invalid (including unknown keys), `base_time` is not a timestamp, or
    /// [`validate`](Self::validate) fails.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading scheduler configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid configuration file: {}", path.display()))
    }

    /// Parses a YAML document. An empty document yields the defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = if content.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(content).context("Failed to parse YAML")?
        };

        let defaults = Self::default();
        let base_time = match file.base_time {
            Some(raw) => parse_timestamp(&raw)
                .with_context(|| format!("base_time '{raw}' is not a valid timestamp"))?,
            None => defaults.base_time,
        };

        let config = Self {
            slot_minutes: file.slot_minutes.unwrap_or(defaults.slot_minutes),
            base_time,
            task_count: file.task_count,
            power: PowerModel {
                mw_per_gpu: file.power.mw_per_gpu.unwrap_or(defaults.power.mw_per_gpu),
                floor_mw: file.power.floor_mw.unwrap_or(defaults.power.floor_mw),
                precision: file.power.precision.unwrap_or(defaults.power.precision),
            },
        };
        config.validate()?;

        debug!(
            slot_minutes = config.slot_minutes,
            base_time    = %config.base_time,
            task_count   = ?config.task_count,
            mw_per_gpu   = config.power.mw_per_gpu,
            floor_mw     = config.power.floor_mw,
            precision    = config.power.precision,
            "configuration parsed"
        );
        Ok(config)
    }

    /// Checks the invariants the rest of the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.slot_minutes == 0 {
            bail!("slot_minutes must be greater than zero");
        }
        let PowerModel {
            mw_per_gpu,
            floor_mw,
            precision,
        } = self.power;
        if !mw_per_gpu.is_finite() || mw_per_gpu < 0.0 {
            bail!("power.mw_per_gpu must be a finite, non-negative number (got {mw_per_gpu})");
        }
        if !floor_mw.is_finite() || floor_mw < 0.0 {
            bail!("power.floor_mw must be a finite, non-negative number (got {floor_mw})");
        }
        if precision > MAX_POWER_PRECISION {
            bail!("power.precision must be at most {MAX_POWER_PRECISION} (got {precision})");
        }
        Ok(())
    }

    /// Slot length as a duration.
    pub fn slot_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.slot_minutes))
    }

    /// Slot length in seconds.
    pub fn slot_seconds(&self) -> i64 {
        i64::from(self.slot_minutes) * 60
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
