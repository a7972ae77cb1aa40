#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point: ingest a repository's workflow runs and print a
//! per-workflow summary.

use std::time::Duration;

use clap::Parser;
use workflow_stats_analytics::{SummaryWindow, WorkflowStats, summarize};
use workflow_stats_cli_utils::{StatusReporter, init_logger};
use workflow_stats_database::WorkflowStore;
use workflow_stats_ingest::{IngestCounters, ingest_workflows};
use workflow_stats_ingest_models::IngestOptions;
use workflow_stats_source::github::GithubClient;
use workflow_stats_source_models::Repository;

#[derive(Parser)]
#[command(
    name = "workflow_stats",
    about = "Ingest GitHub Actions workflow runs and summarize them"
)]
struct Cli {
    /// Repository to ingest, as `owner/name`
    repo: Repository,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = init_logger();
    let cli = Cli::parse();

    let client = GithubClient::from_env()?;
    let mut store = WorkflowStore::open_from_env()?;

    let counters = IngestCounters::new();
    let reporter = {
        let counters = counters.clone();
        StatusReporter::spawn(&multi, Duration::from_secs(1), move || {
            counters.status_line()
        })
    };

    let result = ingest_workflows(
        &client,
        &mut store,
        &cli.repo,
        &IngestOptions::default(),
        &mut counters.clone(),
    )
    .await;

    reporter.stop();
    println!("{}", counters.status_line());
    let result = result?;

    log::info!(
        "Ingest of {} finished in {:.1}s",
        result.repository,
        result.duration.as_secs_f64()
    );

    let window = SummaryWindow::through(chrono::Utc::now().date_naive());
    let stats = summarize(&store, &window)?;

    print_table(&stats);

    Ok(())
}

fn print_table(stats: &[WorkflowStats]) {
    println!(
        "{:<30} {:>6} {:>8} {:>10} {:>12} {:<20} {:<20}",
        "WORKFLOW", "RUNS", "SUCCESS", "MEAN (s)", "TOTAL (s)", "FIRST RUN", "LAST RUN"
    );
    println!("{}", "-".repeat(112));

    for row in stats {
        println!(
            "{:<30} {:>6} {:>7.1}% {:>10} {:>12} {:<20} {:<20}",
            row.workflow_name,
            row.total_runs,
            row.success_rate * 100.0,
            seconds(row.mean_run_duration_seconds),
            seconds(row.total_running_time_seconds),
            timestamp(row.first_run_started.as_ref()),
            timestamp(row.last_run_started.as_ref()),
        );
    }
}

fn seconds(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| format!("{v:.1}"))
}

fn timestamp(value: Option<&chrono::DateTime<chrono::Utc>>) -> String {
    value.map_or_else(
        || "-".to_owned(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}
