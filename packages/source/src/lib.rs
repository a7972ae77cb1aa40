#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Paginated retrieval of workflows and workflow runs.
//!
//! Each remote backend implements the [`PageSource`] trait, which fetches a
//! single page for a [`Resource`] at a given cursor. [`paginate`] turns any
//! page source into a lazy stream of pages that stops once the backend
//! signals that no further pages exist.

pub mod github;
pub mod memory;
pub mod paginate;

pub use paginate::paginate;

use workflow_stats_source_models::Resource;

/// Errors that can occur while fetching pages.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response body did not have the expected shape.
    #[error("Malformed page for {resource}: {message}")]
    MalformedPage {
        /// Human-readable resource description.
        resource: String,
        /// Description of what went wrong.
        message: String,
    },

    /// A client could not be configured (bad header value, bad URL, ...).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// Pagination was requested with a page size of zero.
    #[error("Page size must be greater than zero")]
    InvalidPageSize,

    /// The backend cannot serve pages this large.
    #[error("Page size {requested} exceeds the maximum of {max}")]
    PageSizeTooLarge {
        /// Requested page size.
        requested: u32,
        /// Largest page size the backend serves.
        max: u32,
    },
}

/// A single page of raw records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// The records on this page, in server order.
    pub records: Vec<serde_json::Value>,
    /// Opaque cursor for the following page, or `None` if this is the last.
    pub next: Option<String>,
}

/// Trait for a remote service that lists records one page at a time.
pub trait PageSource: Send + Sync {
    /// Fetches a single page of `resource`.
    ///
    /// `cursor` is `None` for the first page and otherwise the
    /// [`Page::next`] value returned by the previous call.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails or the response cannot
    /// be interpreted as a page of records.
    fn fetch_page(
        &self,
        resource: &Resource,
        page_size: u32,
        cursor: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Page, SourceError>> + Send;

    /// Returns the name of the backend (e.g. `"github"`).
    fn backend(&self) -> &str;
}
