//! Shared record counters for progress reporting.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use workflow_stats_source_models::{Workflow, WorkflowRun};

use crate::observer::{IngestObserver, ObserverError};

/// Counts discovered workflows and runs.
///
/// Clones share the same counters, so one clone can observe ingestion
/// while another is read from a reporting task.
#[derive(Debug, Clone, Default)]
pub struct IngestCounters {
    workflows: Arc<AtomicU64>,
    runs: Arc<AtomicU64>,
}

impl IngestCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Workflows seen so far.
    #[must_use]
    pub fn workflows(&self) -> u64 {
        self.workflows.load(Ordering::Relaxed)
    }

    /// Workflow runs seen so far.
    #[must_use]
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    /// Human-readable progress line.
    #[must_use]
    pub fn status_line(&self) -> String {
        format!(
            "Ingested {} runs from {} workflows",
            self.runs(),
            self.workflows()
        )
    }
}

impl IngestObserver for IngestCounters {
    fn on_workflow(&mut self, _workflow: &Workflow) -> Result<(), ObserverError> {
        self.workflows.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn on_workflow_run(&mut self, _run: &WorkflowRun) -> Result<(), ObserverError> {
        self.runs.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
