//! Per-record hooks invoked while ingesting.

use workflow_stats_source_models::{Workflow, WorkflowRun};

/// Error returned by an observer hook. Any error aborts ingestion.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

/// Receives every record as it is discovered, before anything is written.
///
/// Hooks run synchronously on the ingesting task, in discovery order:
/// every workflow first, then the runs of each workflow in turn. Both
/// hooks default to doing nothing, so implementors override only the
/// ones they need.
pub trait IngestObserver {
    /// Called once per workflow.
    ///
    /// # Errors
    ///
    /// Returning an error aborts ingestion before anything is stored.
    fn on_workflow(&mut self, _workflow: &Workflow) -> Result<(), ObserverError> {
        Ok(())
    }

    /// Called once per workflow run.
    ///
    /// # Errors
    ///
    /// Returning an error aborts ingestion before anything is stored.
    fn on_workflow_run(&mut self, _run: &WorkflowRun) -> Result<(), ObserverError> {
        Ok(())
    }
}

/// An observer that ignores every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl IngestObserver for NullObserver {}
