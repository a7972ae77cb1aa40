//! In-memory page source.
//!
//! Serves pre-loaded records with offset cursors. Useful for replaying a
//! captured dataset without network access and for exercising the
//! pagination and ingest pipeline in tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use workflow_stats_source_models::Resource;

use crate::{Page, PageSource, SourceError};

/// A [`PageSource`] backed by records held in memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    records: BTreeMap<Resource, Vec<serde_json::Value>>,
    failing: BTreeSet<Resource>,
    requests: AtomicUsize,
}

impl MemorySource {
    /// Creates an empty source. Every resource lists zero records.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the records listed for `resource`, in server order.
    #[must_use]
    pub fn with_records(mut self, resource: Resource, records: Vec<serde_json::Value>) -> Self {
        self.records.insert(resource, records);
        self
    }

    /// Makes every page request for `resource` fail.
    #[must_use]
    pub fn with_failure(mut self, resource: Resource) -> Self {
        self.failing.insert(resource);
        self
    }

    /// Returns the number of page requests served so far, failed ones
    /// included.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl PageSource for MemorySource {
    async fn fetch_page(
        &self,
        resource: &Resource,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<Page, SourceError> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(resource) {
            return Err(SourceError::MalformedPage {
                resource: resource.to_string(),
                message: "simulated failure".to_owned(),
            });
        }

        let offset = cursor
            .map(str::parse::<usize>)
            .transpose()
            .map_err(|e| SourceError::MalformedPage {
                resource: resource.to_string(),
                message: format!("invalid cursor: {e}"),
            })?
            .unwrap_or(0);

        let all = self.records.get(resource).map_or(&[][..], Vec::as_slice);
        let end = offset.saturating_add(page_size as usize).min(all.len());
        let records = all.get(offset..end).unwrap_or_default().to_vec();
        let next = (end < all.len()).then(|| end.to_string());

        Ok(Page { records, next })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
