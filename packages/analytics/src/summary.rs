//! The per-workflow summary query.

use workflow_stats_analytics_models::WorkflowStats;
use workflow_stats_database::{WorkflowStore, parse_timestamp};
use workflow_stats_source_models::SUCCESS_CONCLUSION;

use crate::{AnalyticsError, SummaryWindow};

/// Groups runs by workflow over an inclusive `created_at` date range.
///
/// The inner join drops runs whose workflow is not stored, and the group
/// by drops workflows without runs in the window.
const SUMMARY_SQL: &str = "
    SELECT
        w.id,
        w.name,
        w.path,
        CAST(max(r.run_started_at) AS VARCHAR),
        CAST(min(r.run_started_at) AS VARCHAR),
        avg(r.runtime_seconds),
        sum(r.runtime_seconds),
        CAST(sum(CASE WHEN r.conclusion = ? THEN 1 ELSE 0 END) AS DOUBLE) / count(*),
        count(*)
    FROM workflow_runs r
    JOIN workflows w ON r.workflow_id = w.id
    WHERE CAST(r.created_at AS DATE) >= CAST(? AS DATE)
      AND CAST(r.created_at AS DATE) <= CAST(? AS DATE)
    GROUP BY w.id, w.name, w.path
    ORDER BY w.name, w.id
";

/// Summarizes every workflow with at least one run created inside
/// `window`, ordered by workflow name and then id.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the query fails or a row cannot be
/// converted.
pub fn summarize(
    store: &WorkflowStore,
    window: &SummaryWindow,
) -> Result<Vec<WorkflowStats>, AnalyticsError> {
    let start = window.start.format("%Y-%m-%d").to_string();
    let end = window.end.format("%Y-%m-%d").to_string();

    log::debug!("Summarizing workflow runs created {start}..={end}");

    let mut stmt = store.connection().prepare(SUMMARY_SQL)?;
    let mut rows = stmt.query(duckdb::params![SUCCESS_CONCLUSION, start, end])?;

    let mut stats = Vec::new();
    while let Some(row) = rows.next()? {
        let last_run_started: Option<String> = row.get(3)?;
        let first_run_started: Option<String> = row.get(4)?;
        let total_runs: i64 = row.get(8)?;

        stats.push(WorkflowStats {
            workflow_id: row.get(0)?,
            workflow_name: row.get(1)?,
            workflow_path: row.get(2)?,
            last_run_started: last_run_started.as_deref().and_then(parse_timestamp),
            first_run_started: first_run_started.as_deref().and_then(parse_timestamp),
            mean_run_duration_seconds: row.get(5)?,
            total_running_time_seconds: row.get(6)?,
            success_rate: row.get(7)?,
            total_runs: u64::try_from(total_runs).map_err(|e| AnalyticsError::Conversion {
                message: format!("negative run count {total_runs}: {e}"),
            })?,
        });
    }

    log::info!("Summarized {} workflows", stats.len());

    Ok(stats)
}
