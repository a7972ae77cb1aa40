#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-workflow summary statistics types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregated statistics for one workflow over a date window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStats {
    /// Workflow identifier.
    pub workflow_id: String,
    /// Workflow display name.
    pub workflow_name: String,
    /// Path of the workflow file in the repository.
    pub workflow_path: String,
    /// Latest run start time in the window.
    pub last_run_started: Option<DateTime<Utc>>,
    /// Earliest run start time in the window.
    pub first_run_started: Option<DateTime<Utc>>,
    /// Mean run duration, ignoring runs that never started.
    pub mean_run_duration_seconds: Option<f64>,
    /// Sum of all run durations.
    pub total_running_time_seconds: Option<f64>,
    /// Fraction of runs that concluded successfully (0.0 - 1.0).
    pub success_rate: f64,
    /// Number of runs in the window.
    pub total_runs: u64,
}
