//! Timeline query executor: one paginated fetch against the posts store.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::application::pagination::{CursorPage, FeedCursor, PageRequest, PaginationError};
use crate::application::repos::{PostsRepo, RepoError, TimelineFilter};
use crate::domain::posts::FeedPost;

pub const MIN_PAGE_LIMIT: u32 = 1;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// One fetched batch of timeline posts plus its resume cursor.
pub type FeedPage = CursorPage<FeedPost>;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("page limit {limit} outside {MIN_PAGE_LIMIT}..={MAX_PAGE_LIMIT}")]
    InvalidLimit { limit: u32 },
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error("feed fetch failed: {0}")]
    FetchFailed(#[from] RepoError),
}

/// Executes paginated timeline queries.
///
/// Over-fetches one item beyond the requested limit; a full over-fetch means
/// more pages exist, and the popped extra item's sort key becomes the next
/// cursor. No separate count query is ever issued.
pub struct TimelineService {
    repo: Arc<dyn PostsRepo>,
}

impl TimelineService {
    pub fn new(repo: Arc<dyn PostsRepo>) -> Self {
        Self { repo }
    }

    pub async fn fetch_page(
        &self,
        filter: &TimelineFilter,
        viewer: Option<Uuid>,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<FeedPage, TimelineError> {
        if !(MIN_PAGE_LIMIT..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(TimelineError::InvalidLimit { limit });
        }

        let decoded = cursor.map(FeedCursor::decode).transpose()?;

        let mut items = self
            .repo
            .list_after(filter, viewer, PageRequest::new(limit + 1, decoded))
            .await?;

        let next_cursor = if items.len() > limit as usize {
            items
                .pop()
                .map(|extra| FeedCursor::new(extra.created_at, extra.id).encode())
        } else {
            None
        };

        debug!(
            author = filter.author.as_deref().unwrap_or("*"),
            limit,
            returned = items.len(),
            has_more = next_cursor.is_some(),
            "timeline page served"
        );
        counter!("brusio_timeline_pages_total").increment(1);

        Ok(CursorPage::new(items, next_cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::MemoryPosts;

    #[tokio::test]
    async fn limit_zero_is_rejected_before_the_store() {
        let service = TimelineService::new(Arc::new(MemoryPosts::new()));
        let err = service
            .fetch_page(&TimelineFilter::default(), None, None, 0)
            .await
            .expect_err("zero limit rejected");
        assert!(matches!(err, TimelineError::InvalidLimit { limit: 0 }));
    }

    #[tokio::test]
    async fn limit_above_hundred_is_rejected() {
        let service = TimelineService::new(Arc::new(MemoryPosts::new()));
        let err = service
            .fetch_page(&TimelineFilter::default(), None, None, 101)
            .await
            .expect_err("oversized limit rejected");
        assert!(matches!(err, TimelineError::InvalidLimit { limit: 101 }));
    }

    #[tokio::test]
    async fn malformed_cursor_is_rejected() {
        let service = TimelineService::new(Arc::new(MemoryPosts::new()));
        let err = service
            .fetch_page(&TimelineFilter::default(), None, Some("@@@"), 10)
            .await
            .expect_err("malformed cursor rejected");
        assert!(matches!(
            err,
            TimelineError::Pagination(PaginationError::InvalidCursor(_))
        ));
    }

    #[tokio::test]
    async fn short_feed_has_no_cursor() {
        let repo = Arc::new(MemoryPosts::new());
        repo.seed_posts("ada", 3);
        let service = TimelineService::new(repo);

        let page = service
            .fetch_page(&TimelineFilter::default(), None, None, 10)
            .await
            .expect("page");
        assert_eq!(page.items.len(), 3);
        assert!(page.next_cursor.is_none());
    }
}
