//! The workflow store: schema creation and transactional batch writes.

use std::path::Path;

use duckdb::{Connection, params};
use workflow_stats_ingest_models::IngestBatch;

use crate::{DbError, format_timestamp};

/// Environment variable naming an on-disk database file.
pub const DB_PATH_ENV: &str = "WORKFLOW_STATS_DB";

/// Table definitions. Every statement is `IF NOT EXISTS` so the schema can
/// be applied any number of times.
///
/// `runtime_seconds` is `VIRTUAL`: `DuckDB` evaluates it from
/// `run_started_at` and `updated_at` on every read and never stores it.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS workflows (
        id VARCHAR PRIMARY KEY,
        name VARCHAR NOT NULL,
        path VARCHAR NOT NULL,
        data VARCHAR NOT NULL
    );

    CREATE TABLE IF NOT EXISTS workflow_runs (
        id VARCHAR PRIMARY KEY,
        workflow_id VARCHAR NOT NULL,
        run_started_at TIMESTAMP,
        updated_at TIMESTAMP,
        created_at TIMESTAMP,
        conclusion VARCHAR,
        data VARCHAR NOT NULL,
        runtime_seconds DOUBLE GENERATED ALWAYS AS (
            CAST(date_diff('millisecond', run_started_at, updated_at) AS DOUBLE) / 1000
        ) VIRTUAL
    );
";

/// Number of rows written by a successful [`WorkflowStore::write_batch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteCounts {
    /// Workflows inserted.
    pub workflows: u64,
    /// Workflow runs inserted.
    pub runs: u64,
}

/// A `DuckDB` database holding workflows and their runs.
pub struct WorkflowStore {
    conn: Connection,
}

impl std::fmt::Debug for WorkflowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowStore").finish_non_exhaustive()
    }
}

impl WorkflowStore {
    /// Opens (or creates) an on-disk store and ensures the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the directory, connection, or schema creation
    /// fails.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        log::info!("Opening workflow store at {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    /// Opens a store that lives only as long as the returned value.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection or schema creation fails.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    /// Opens the store named by the `WORKFLOW_STATS_DB` environment
    /// variable, or an in-memory store when it is unset or empty.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store cannot be opened.
    pub fn open_from_env() -> Result<Self, DbError> {
        match std::env::var(DB_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::open(Path::new(&path)),
            _ => {
                log::debug!("{DB_PATH_ENV} not set, using an in-memory store");
                Self::open_in_memory()
            }
        }
    }

    fn with_connection(conn: Connection) -> Result<Self, DbError> {
        let mut store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Creates the `workflows` and `workflow_runs` tables if they do not
    /// exist yet.
    ///
    /// Both tables are created in one transaction, so a failure leaves
    /// neither behind. Calling this repeatedly is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the storage cannot be reached.
    pub fn ensure_schema(&mut self) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(SCHEMA)?;
        tx.commit()?;
        Ok(())
    }

    /// Inserts every workflow, then every run, in a single transaction.
    ///
    /// Records are keyed by their id. A duplicate id (within the batch or
    /// against rows already stored) fails the whole write and nothing from
    /// the batch becomes visible.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if any insert or the commit fails.
    pub fn write_batch(&mut self, batch: IngestBatch) -> Result<WriteCounts, DbError> {
        let IngestBatch { workflows, runs } = batch;
        let mut counts = WriteCounts::default();

        let tx = self.conn.transaction()?;
        {
            let mut insert_workflow =
                tx.prepare("INSERT INTO workflows (id, name, path, data) VALUES (?, ?, ?, ?)")?;
            for workflow in &workflows {
                insert_workflow.execute(params![
                    workflow.id,
                    workflow.name,
                    workflow.path,
                    workflow.payload.to_string()
                ])?;
                counts.workflows += 1;
            }

            let mut insert_run = tx.prepare(
                "INSERT INTO workflow_runs (
                    id, workflow_id, run_started_at, updated_at, created_at, conclusion, data
                ) VALUES (?, ?, ?, ?, ?, ?, ?)",
            )?;
            for run in &runs {
                insert_run.execute(params![
                    run.id,
                    run.workflow_id,
                    run.run_started_at.as_ref().map(format_timestamp),
                    run.updated_at.as_ref().map(format_timestamp),
                    run.created_at.as_ref().map(format_timestamp),
                    run.conclusion,
                    run.payload.to_string()
                ])?;
                counts.runs += 1;
            }
        }
        tx.commit()?;

        log::info!(
            "Stored {} workflows and {} workflow runs",
            counts.workflows,
            counts.runs
        );

        Ok(counts)
    }

    /// Returns the number of stored workflows.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn workflow_count(&self) -> Result<u64, DbError> {
        self.count("SELECT COUNT(*) FROM workflows")
    }

    /// Returns the number of stored workflow runs.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn run_count(&self) -> Result<u64, DbError> {
        self.count("SELECT COUNT(*) FROM workflow_runs")
    }

    fn count(&self, sql: &str) -> Result<u64, DbError> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        u64::try_from(count).map_err(|e| DbError::Conversion {
            message: format!("negative row count {count}: {e}"),
        })
    }

    /// Returns the underlying connection for read queries.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use workflow_stats_source_models::{Workflow, WorkflowRun};

    use super::*;

    fn workflow(id: &str) -> Workflow {
        Workflow::try_from(serde_json::json!({
            "id": id,
            "name": format!("wf-{id}"),
            "path": format!(".github/workflows/{id}.yml"),
            "badge_url": "https://example.com/badge.svg"
        }))
        .unwrap()
    }

    fn run(id: &str, workflow_id: &str, started: &str, updated: &str) -> WorkflowRun {
        WorkflowRun::try_from(serde_json::json!({
            "id": id,
            "workflow_id": workflow_id,
            "run_started_at": started,
            "updated_at": updated,
            "created_at": started,
            "conclusion": "success"
        }))
        .unwrap()
    }

    fn table_names(store: &WorkflowStore) -> Vec<String> {
        let mut stmt = store
            .connection()
            .prepare("SELECT table_name FROM duckdb_tables() WHERE NOT internal ORDER BY table_name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap()
    }

    fn runtime_seconds(store: &WorkflowStore, id: &str) -> Option<f64> {
        store
            .connection()
            .query_row(
                "SELECT runtime_seconds FROM workflow_runs WHERE id = ?",
                [id],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let mut store = WorkflowStore::open_in_memory().unwrap();
        for _ in 0..3 {
            store.ensure_schema().unwrap();
        }
        assert_eq!(table_names(&store), vec!["workflow_runs", "workflows"]);
    }

    #[test]
    fn schema_survives_reopening_a_file() {
        let dir = std::env::temp_dir().join(format!(
            "workflow_stats_store_reopen_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("stats.duckdb");

        {
            let mut store = WorkflowStore::open(&path).unwrap();
            store
                .write_batch(IngestBatch {
                    workflows: vec![workflow("1")],
                    runs: vec![],
                })
                .unwrap();
        }

        let store = WorkflowStore::open(&path).unwrap();
        assert_eq!(table_names(&store), vec!["workflow_runs", "workflows"]);
        assert_eq!(store.workflow_count().unwrap(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn writes_payload_verbatim() {
        let mut store = WorkflowStore::open_in_memory().unwrap();
        let wf = workflow("42");
        store
            .write_batch(IngestBatch {
                workflows: vec![wf.clone()],
                runs: vec![],
            })
            .unwrap();

        let data: String = store
            .connection()
            .query_row("SELECT data FROM workflows WHERE id = '42'", [], |row| {
                row.get(0)
            })
            .unwrap();
        let stored: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(stored, wf.payload);
    }

    #[test]
    fn runtime_is_derived_from_timestamps() {
        let mut store = WorkflowStore::open_in_memory().unwrap();
        let t0: DateTime<Utc> = "2024-01-15T10:00:00Z".parse().unwrap();
        let t1 = t0 + Duration::seconds(125);

        store
            .write_batch(IngestBatch {
                workflows: vec![workflow("1")],
                runs: vec![run("100", "1", &t0.to_rfc3339(), &t1.to_rfc3339())],
            })
            .unwrap();

        assert_eq!(runtime_seconds(&store, "100"), Some(125.0));

        // No stored copy to go stale: moving the end time moves the runtime.
        store
            .connection()
            .execute(
                "UPDATE workflow_runs SET updated_at = TIMESTAMP '2024-01-15 10:05:00' WHERE id = '100'",
                [],
            )
            .unwrap();
        assert_eq!(runtime_seconds(&store, "100"), Some(300.0));
    }

    #[test]
    fn runtime_keeps_fractional_seconds() {
        let mut store = WorkflowStore::open_in_memory().unwrap();

        store
            .write_batch(IngestBatch {
                workflows: vec![workflow("1")],
                runs: vec![run(
                    "100",
                    "1",
                    "2024-01-15T10:00:00.250Z",
                    "2024-01-15T10:00:01.500Z",
                )],
            })
            .unwrap();

        assert_eq!(runtime_seconds(&store, "100"), Some(1.25));
    }

    #[test]
    fn runtime_is_null_without_start_time() {
        let mut store = WorkflowStore::open_in_memory().unwrap();
        let pending = WorkflowRun::try_from(serde_json::json!({
            "id": 7,
            "workflow_id": 1,
            "updated_at": "2024-01-15T10:00:00Z",
            "created_at": "2024-01-15T10:00:00Z",
            "conclusion": null
        }))
        .unwrap();

        store
            .write_batch(IngestBatch {
                workflows: vec![workflow("1")],
                runs: vec![pending],
            })
            .unwrap();

        assert_eq!(runtime_seconds(&store, "7"), None);
    }

    #[test]
    fn failed_insert_rolls_back_the_whole_batch() {
        let mut store = WorkflowStore::open_in_memory().unwrap();
        let runs = vec![
            run("100", "1", "2024-01-01T00:00:00Z", "2024-01-01T00:01:00Z"),
            run("101", "1", "2024-01-01T00:00:00Z", "2024-01-01T00:01:00Z"),
            // Third run insert collides with the first.
            run("100", "1", "2024-01-02T00:00:00Z", "2024-01-02T00:01:00Z"),
        ];

        let result = store.write_batch(IngestBatch {
            workflows: vec![workflow("1"), workflow("2")],
            runs,
        });

        assert!(matches!(result, Err(DbError::DuckDb(_))));
        assert_eq!(store.workflow_count().unwrap(), 0);
        assert_eq!(store.run_count().unwrap(), 0);
    }

    #[test]
    fn rewriting_existing_ids_fails_and_keeps_prior_rows() {
        let mut store = WorkflowStore::open_in_memory().unwrap();
        let batch = || IngestBatch {
            workflows: vec![workflow("1")],
            runs: vec![run("100", "1", "2024-01-01T00:00:00Z", "2024-01-01T00:01:00Z")],
        };

        let counts = store.write_batch(batch()).unwrap();
        assert_eq!(
            counts,
            WriteCounts {
                workflows: 1,
                runs: 1
            }
        );

        assert!(store.write_batch(batch()).is_err());
        assert_eq!(store.workflow_count().unwrap(), 1);
        assert_eq!(store.run_count().unwrap(), 1);
    }
}
