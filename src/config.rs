//! Pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::post::PostOptimizationRule;

/// Constants used by the rule catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    /// Added on both ends of the working window for home-to-first-stop travel.
    pub extra_time_to_first_location_minutes: i64,
    /// End-of-day extension when service pro availability is not restricted.
    pub extend_working_time_minutes: i64,
    /// Office hours used when availability is restricted.
    pub restricted_start_hour: u32,
    pub restricted_end_hour: u32,
    /// Break offsets from the service pro's day start.
    pub first_break_offset_minutes: i64,
    pub lunch_offset_minutes: i64,
    pub second_break_offset_minutes: i64,
    /// Width of a break's expected-arrival window.
    pub break_window_minutes: i64,
    pub break_duration_minutes: i64,
    pub lunch_duration_minutes: i64,
    pub inside_sales_duration_minutes: i64,
    /// Bounds for averaged service durations.
    pub min_service_duration_minutes: i64,
    pub max_service_duration_minutes: i64,
    /// How far a locked appointment's expected arrival is widened after a
    /// failed solve.
    pub locked_appointment_shift_minutes: i64,
    /// End-of-day extension applied after a failed solve.
    pub additional_working_time_minutes: i64,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            extra_time_to_first_location_minutes: 20,
            extend_working_time_minutes: 60,
            restricted_start_hour: 8,
            restricted_end_hour: 18,
            first_break_offset_minutes: 120,
            lunch_offset_minutes: 240,
            second_break_offset_minutes: 360,
            break_window_minutes: 60,
            break_duration_minutes: 15,
            lunch_duration_minutes: 30,
            inside_sales_duration_minutes: 30,
            min_service_duration_minutes: 15,
            max_service_duration_minutes: 120,
            locked_appointment_shift_minutes: 60,
            additional_working_time_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound on solver invocations per run, the first one included.
    pub max_solver_runs: usize,
    pub rules: RuleSettings,
    /// Post-optimization rules, run in this order.
    pub post_rules: Vec<PostOptimizationRule>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_solver_runs: 3,
            rules: RuleSettings::default(),
            post_rules: PostOptimizationRule::ALL.to_vec(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
