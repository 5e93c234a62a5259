//! Paginated full fetch

use crate::adapters::cristin::{ListQuery, SourceFetcher, SourceResult};
use crate::core::context::ExecutionContext;
use crate::core::progress::{Progress, ProgressReporter};
use crate::domain::EntityKind;
use serde_json::Value;

/// Fetches a kind's complete list, page by page
///
/// Pages are numbered from 1. Fetching stops after a page shorter than
/// `page_size` or once `max_pages` pages have been fetched. Progress is
/// reported after every page against `ceil(total / page_size)`. A page error
/// fails the whole fetch; nothing is checkpointed.
pub async fn fetch_all_pages(
    fetcher: &dyn SourceFetcher,
    ctx: &ExecutionContext,
    kind: EntityKind,
    query: &ListQuery,
    page_size: usize,
    max_pages: usize,
    progress: &dyn ProgressReporter,
) -> SourceResult<Vec<Value>> {
    let page_size = page_size.max(1);
    let mut entries = Vec::new();

    for page in 1..=max_pages {
        if ctx.is_cancelled() {
            tracing::info!(kind = %kind, page, "Cancellation requested, stopping list fetch");
            break;
        }

        let result = fetcher.fetch_page(ctx, kind, query, page, page_size).await?;
        let received = result.data.len();
        entries.extend(result.data);

        // A source reporting fewer entries than it served still counts this page
        let total_pages = result.total.div_ceil(page_size).max(page);
        progress.report(Progress::new(
            page,
            total_pages,
            format!("Fetch {} data page {} of {}", kind.label(), page, total_pages),
        ));

        tracing::debug!(
            kind = %kind,
            page,
            received,
            accumulated = entries.len(),
            "Fetched list page"
        );

        if received < page_size {
            break;
        }
    }

    Ok(entries)
}

/// Fetches a list that fits in a single request
pub async fn fetch_single_page(
    fetcher: &dyn SourceFetcher,
    ctx: &ExecutionContext,
    kind: EntityKind,
    query: &ListQuery,
    page_size: usize,
    progress: &dyn ProgressReporter,
) -> SourceResult<Vec<Value>> {
    let result = fetcher.fetch_page(ctx, kind, query, 1, page_size.max(1)).await?;
    progress.report(Progress::new(
        1,
        1,
        format!("Fetch {} data page 1 of 1", kind.label()),
    ));
    Ok(result.data)
}
