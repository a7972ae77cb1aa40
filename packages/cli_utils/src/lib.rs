#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the workflow-stats toolchain.
//!
//! [`init_logger`] sets up `indicatif-log-bridge` so that `log::info!` and
//! friends are suspended while progress output redraws, and
//! [`StatusReporter`] prints a status line on a fixed period from a
//! background task.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub use indicatif::MultiProgress;

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while progress output redraws.
///
/// Returns the [`MultiProgress`] that all progress output must go through.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Ignore error if logger was already set (e.g., in tests)

    log::set_max_level(level);

    multi
}

/// Background task that prints a rendered status line every `period`.
///
/// The first line is printed one full period after spawning. The task
/// stops when [`StatusReporter::stop`] is called or the reporter is
/// dropped.
#[derive(Debug)]
pub struct StatusReporter {
    handle: JoinHandle<()>,
}

impl StatusReporter {
    /// Spawns the reporter on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    #[must_use]
    pub fn spawn<F>(multi: &MultiProgress, period: Duration, render: F) -> Self
    where
        F: Fn() -> String + Send + 'static,
    {
        let multi = multi.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let line = render();
                multi.suspend(|| println!("{line}"));
            }
        });

        Self { handle }
    }

    /// Stops the reporter. No further lines are printed.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for StatusReporter {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
