use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;
use crate::utils::constants::{BUCKET_MINUTES, HOURLY_SCALE_FACTOR};

/// Sampling cadence of the tracked source family's raw records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// One 5-minute sample per hour, expanded to quarter-hour buckets
    Hourly,
    /// One sample every `minutes_per_sample` minutes, rescaled to 15 minutes
    FifteenMin,
}

/// How HOURLY mode synthesizes the four quarter buckets of an hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum HourlyStrategy {
    /// Linear between the current and next top-of-hour value
    CrossHourLinear,
    /// Fixed decay weights 1.0 / 0.7 / 0.4 / 0.2 applied to the hour value
    FixedDecay,
}

/// Run-scoped configuration, supplied once per run and threaded into the
/// interval corrector as an argument.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RunConfig {
    pub sampling_mode: SamplingMode,

    /// Minutes covered by one raw sample; read only in FifteenMin mode
    #[validate(range(min = 1, max = 15))]
    pub minutes_per_sample: u32,

    #[serde(default = "default_hourly_strategy")]
    pub hourly_strategy: HourlyStrategy,
}

fn default_hourly_strategy() -> HourlyStrategy {
    HourlyStrategy::CrossHourLinear
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sampling_mode: SamplingMode::Hourly,
            minutes_per_sample: 5,
            hourly_strategy: HourlyStrategy::CrossHourLinear,
        }
    }
}

impl RunConfig {
    pub fn new(sampling_mode: SamplingMode, minutes_per_sample: u32) -> Self {
        Self {
            sampling_mode,
            minutes_per_sample,
            hourly_strategy: HourlyStrategy::CrossHourLinear,
        }
    }

    pub fn with_hourly_strategy(mut self, strategy: HourlyStrategy) -> Self {
        self.hourly_strategy = strategy;
        self
    }

    /// Load from a JSON config record and validate ranges.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Multiplier taking one raw sample to its bucket value.
    pub fn scale_factor(&self) -> f64 {
        match self.sampling_mode {
            SamplingMode::Hourly => HOURLY_SCALE_FACTOR as f64,
            SamplingMode::FifteenMin => BUCKET_MINUTES as f64 / self.minutes_per_sample as f64,
        }
    }
}
