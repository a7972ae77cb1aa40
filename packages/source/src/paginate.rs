//! Lazy sequential pagination over any [`PageSource`].

use futures::Stream;
use workflow_stats_source_models::Resource;

use crate::{PageSource, SourceError};

/// Streams every page of `resource`, one request per poll.
///
/// The next page is only requested once the consumer asks for it, so at
/// most one page is in flight and in memory at a time. The stream ends
/// after a page that is shorter than `page_size` or carries no `next`
/// cursor. Empty pages are not yielded. The first error ends the stream.
///
/// Calling this again starts over from the first page.
///
/// # Errors
///
/// Yields [`SourceError::InvalidPageSize`] if `page_size` is zero, and
/// otherwise whatever error the page source returns.
pub fn paginate<'a, S>(
    source: &'a S,
    resource: &'a Resource,
    page_size: u32,
) -> impl Stream<Item = Result<Vec<serde_json::Value>, SourceError>> + 'a
where
    S: PageSource + ?Sized,
{
    async_stream::try_stream! {
        if page_size == 0 {
            Err::<(), _>(SourceError::InvalidPageSize)?;
        }

        let mut cursor: Option<String> = None;
        let mut page_num: u32 = 0;
        let mut total: u64 = 0;

        loop {
            let page = source
                .fetch_page(resource, page_size, cursor.as_deref())
                .await?;

            let count = page.records.len();
            total += count as u64;
            let exhausted = count < page_size as usize || page.next.is_none();

            log::debug!(
                "[{}] {resource} page {page_num}: {count} records (total: {total}, more: {})",
                source.backend(),
                !exhausted
            );

            if count > 0 {
                yield page.records;
            }

            if exhausted {
                break;
            }

            cursor = page.next;
            page_num += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt as _;
    use workflow_stats_source_models::Repository;

    use super::*;
    use crate::memory::MemorySource;

    fn repo() -> Repository {
        "octo/widgets".parse().unwrap()
    }

    fn workflows(n: u64) -> Vec<serde_json::Value> {
        (1..=n)
            .map(|i| serde_json::json!({"id": i, "name": format!("wf-{i}"), "path": "ci.yml"}))
            .collect()
    }

    #[tokio::test]
    async fn concatenated_pages_preserve_order_for_any_page_size() {
        let records = workflows(23);
        let resource = Resource::Workflows { repo: repo() };
        let source = MemorySource::new().with_records(resource.clone(), records.clone());

        for page_size in [1, 2, 5, 10, 22, 23, 24, 100] {
            let pages: Vec<Vec<serde_json::Value>> = paginate(&source, &resource, page_size)
                .try_collect()
                .await
                .unwrap();
            let flattened: Vec<serde_json::Value> = pages.into_iter().flatten().collect();
            assert_eq!(flattened, records, "page_size={page_size}");
        }
    }

    #[tokio::test]
    async fn yields_one_page_per_request() {
        let resource = Resource::Workflows { repo: repo() };
        let source = MemorySource::new().with_records(resource.clone(), workflows(10));

        let pages: Vec<Vec<serde_json::Value>> = paginate(&source, &resource, 4)
            .try_collect()
            .await
            .unwrap();

        let sizes: Vec<usize> = pages.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(source.requests(), 3);
    }

    #[tokio::test]
    async fn full_last_page_without_cursor_stops() {
        let resource = Resource::Workflows { repo: repo() };
        let source = MemorySource::new().with_records(resource.clone(), workflows(8));

        let pages: Vec<Vec<serde_json::Value>> = paginate(&source, &resource, 4)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(source.requests(), 2);
    }

    #[tokio::test]
    async fn empty_resource_yields_nothing() {
        let resource = Resource::Workflows { repo: repo() };
        let source = MemorySource::new();

        let pages: Vec<Vec<serde_json::Value>> = paginate(&source, &resource, 10)
            .try_collect()
            .await
            .unwrap();

        assert!(pages.is_empty());
        assert_eq!(source.requests(), 1);
    }

    #[tokio::test]
    async fn restarts_from_first_page() {
        let resource = Resource::Workflows { repo: repo() };
        let source = MemorySource::new().with_records(resource.clone(), workflows(5));

        let first: Vec<Vec<serde_json::Value>> = paginate(&source, &resource, 2)
            .try_collect()
            .await
            .unwrap();
        let second: Vec<Vec<serde_json::Value>> = paginate(&source, &resource, 2)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failure_ends_the_stream() {
        let resource = Resource::Workflows { repo: repo() };
        let source = MemorySource::new()
            .with_records(resource.clone(), workflows(5))
            .with_failure(resource.clone());

        let result: Result<Vec<Vec<serde_json::Value>>, SourceError> =
            paginate(&source, &resource, 2).try_collect().await;

        assert!(matches!(result, Err(SourceError::MalformedPage { .. })));
    }

    #[tokio::test]
    async fn rejects_zero_page_size() {
        let resource = Resource::Workflows { repo: repo() };
        let source = MemorySource::new().with_records(resource.clone(), workflows(3));

        let result: Result<Vec<Vec<serde_json::Value>>, SourceError> =
            paginate(&source, &resource, 0).try_collect().await;

        assert!(matches!(result, Err(SourceError::InvalidPageSize)));
        assert_eq!(source.requests(), 0);
    }
}
