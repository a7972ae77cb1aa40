#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ingestion options, batch, and result types.

use std::time::Duration;

use workflow_stats_source_models::{Workflow, WorkflowRun};

/// Largest page size the GitHub API accepts.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Configuration for an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Records requested per page.
    pub page_size: u32,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Records collected by one ingestion run, in discovery order, waiting to
/// be written in a single transaction.
#[derive(Debug, Clone, Default)]
pub struct IngestBatch {
    /// Workflows, in the order they were fetched.
    pub workflows: Vec<Workflow>,
    /// Workflow runs, grouped by workflow in the order above.
    pub runs: Vec<WorkflowRun>,
}

/// Result of a completed ingestion run.
#[derive(Debug, Clone)]
pub struct IngestResult {
    /// Repository the records were fetched from (`owner/name`).
    pub repository: String,
    /// Number of workflows stored.
    pub workflows: u64,
    /// Number of workflow runs stored.
    pub runs: u64,
    /// How long the ingestion took.
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_page_size_is_the_api_maximum() {
        assert_eq!(IngestOptions::default().page_size, 100);
    }
}
