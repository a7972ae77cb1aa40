#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Workflow ingestion library.
//!
//! Fetches every workflow of a repository, then every run of each of
//! those workflows, and stores the whole set in one transaction. Nothing
//! is written unless every page was fetched and every record parsed.

pub mod observer;
pub mod progress;

use std::pin::pin;
use std::time::Instant;

use futures::StreamExt as _;
use thiserror::Error;
use workflow_stats_database::{DbError, WorkflowStore};
use workflow_stats_ingest_models::{IngestBatch, IngestOptions, IngestResult};
use workflow_stats_source::{PageSource, SourceError, paginate};
use workflow_stats_source_models::{ModelError, Repository, Resource, Workflow, WorkflowRun};

pub use observer::{IngestObserver, NullObserver, ObserverError};
pub use progress::IngestCounters;

/// Errors that abort an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A page could not be fetched.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// A fetched record was malformed.
    #[error("Invalid record: {0}")]
    Record(#[from] ModelError),

    /// The batch could not be stored.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// An observer hook failed.
    #[error("Observer failed: {0}")]
    Observer(#[source] ObserverError),
}

/// Fetches all workflows of `repo` and all of their runs, then stores
/// them in a single transaction.
///
/// Workflows are fetched first. Runs are then fetched workflow by
/// workflow, in the order the workflows were listed. `observer` sees
/// every record in that same order, before anything is written.
///
/// # Errors
///
/// Returns [`IngestError`] if a page cannot be fetched, a record cannot be
/// parsed, the observer fails, or the write fails (including when a record
/// is already stored). In every case the store is left as it was.
pub async fn ingest_workflows<S, O>(
    source: &S,
    store: &mut WorkflowStore,
    repo: &Repository,
    options: &IngestOptions,
    observer: &mut O,
) -> Result<IngestResult, IngestError>
where
    S: PageSource,
    O: IngestObserver + ?Sized,
{
    let start = Instant::now();
    let mut batch = IngestBatch::default();

    log::info!("Fetching workflows for {repo} from {}", source.backend());

    let workflows = Resource::Workflows { repo: repo.clone() };
    let mut pages = pin!(paginate(source, &workflows, options.page_size));
    while let Some(page) = pages.next().await {
        for record in page? {
            let workflow = Workflow::try_from(record)?;
            observer
                .on_workflow(&workflow)
                .map_err(IngestError::Observer)?;
            batch.workflows.push(workflow);
        }
    }

    log::info!("Found {} workflows in {repo}", batch.workflows.len());

    for workflow in &batch.workflows {
        let runs = Resource::WorkflowRuns {
            repo: repo.clone(),
            workflow_id: workflow.id.clone(),
        };
        let before = batch.runs.len();

        let mut pages = pin!(paginate(source, &runs, options.page_size));
        while let Some(page) = pages.next().await {
            for record in page? {
                let run = WorkflowRun::try_from(record)?;
                observer
                    .on_workflow_run(&run)
                    .map_err(IngestError::Observer)?;
                batch.runs.push(run);
            }
        }

        log::debug!(
            "{} ({}): {} runs",
            workflow.name,
            workflow.id,
            batch.runs.len() - before
        );
    }

    let counts = store.write_batch(batch)?;
    let duration = start.elapsed();

    log::info!(
        "Ingested {} runs from {} workflows in {:.1}s",
        counts.runs,
        counts.workflows,
        duration.as_secs_f64()
    );

    Ok(IngestResult {
        repository: repo.to_string(),
        workflows: counts.workflows,
        runs: counts.runs,
        duration,
    })
}
