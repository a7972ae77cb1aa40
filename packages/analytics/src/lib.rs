#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Windowed aggregation over stored workflow runs.
//!
//! [`summarize`] runs a single grouped query that joins runs to their
//! workflows and produces one [`WorkflowStats`] row per workflow that has
//! at least one run created inside the [`SummaryWindow`].

pub mod summary;
pub mod window;

pub use summary::summarize;
pub use window::SummaryWindow;
pub use workflow_stats_analytics_models::WorkflowStats;

use thiserror::Error;
use workflow_stats_database::DbError;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A window bound was not a `YYYY-MM-DD` date.
    #[error("Invalid date '{value}': {source}. Expected format: YYYY-MM-DD")]
    InvalidDate {
        /// The rejected input.
        value: String,
        /// Underlying parse failure.
        source: chrono::ParseError,
    },

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Data conversion error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

impl From<duckdb::Error> for AnalyticsError {
    fn from(e: duckdb::Error) -> Self {
        Self::Database(DbError::DuckDb(e))
    }
}
