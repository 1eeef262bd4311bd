//! Feed session: one mounted timeline view over the page cache.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::likes::LikeOutcome;
use crate::application::repos::TimelineFilter;
use crate::application::timeline::{TimelineError, TimelineService};
use crate::cache::{
    FeedCache, FetchDirective, LikeReconciler, QueryIdentity, ScrollEvent, ScrollFetchController,
};
use crate::config::FeedSettings;
use crate::domain::posts::FeedPost;

/// Drives one timeline query from mount to teardown.
///
/// Owns the query identity, feeds scroll events through the fetch
/// controller, appends fetched pages to the shared cache, and forwards
/// completed like mutations to the reconciler. All methods that advance
/// pagination take `&mut self`, so fetches for one identity are strictly
/// sequential; the controller's `Fetching` state is the only guard.
pub struct FeedSession {
    identity: QueryIdentity,
    viewer: Option<Uuid>,
    timeline: Arc<TimelineService>,
    cache: Arc<FeedCache>,
    reconciler: LikeReconciler,
    controller: ScrollFetchController,
}

impl FeedSession {
    /// Mount the session: fetch the first page and seed the cache entry.
    pub async fn open(
        timeline: Arc<TimelineService>,
        cache: Arc<FeedCache>,
        settings: &FeedSettings,
        filter: TimelineFilter,
        viewer: Option<Uuid>,
    ) -> Result<Self, TimelineError> {
        let identity = QueryIdentity::new(filter, settings.page_size);
        let page = timeline
            .fetch_page(identity.filter(), viewer, None, identity.limit())
            .await?;
        cache.replace(&identity, vec![Arc::new(page)]);

        debug!(identity = %identity.canonical(), "feed session opened");
        Ok(Self {
            identity,
            viewer,
            timeline,
            reconciler: LikeReconciler::new(cache.clone()),
            cache,
            controller: ScrollFetchController::new(settings.scroll_threshold),
        })
    }

    pub fn identity(&self) -> &QueryIdentity {
        &self.identity
    }

    /// The flattened cache, in feed order, for the rendering layer.
    pub fn items(&self) -> Vec<FeedPost> {
        self.cache
            .get(&self.identity)
            .map(|pages| {
                pages
                    .iter()
                    .flat_map(|page| page.items.iter().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor().is_some()
    }

    pub fn is_fetching(&self) -> bool {
        self.controller.is_fetching()
    }

    /// Feed one scroll-position update through the controller; fetch and
    /// append the next page when the transition asks for one.
    ///
    /// A failed fetch appends nothing and leaves the tail cursor where it
    /// was, so the same boundary is retried on the next qualifying scroll
    /// event. There is no automatic retry loop.
    pub async fn handle_scroll(&mut self, event: ScrollEvent) -> Result<(), TimelineError> {
        let next_cursor = self.next_cursor();
        let cursor = match self.controller.observe(event, next_cursor.as_deref()) {
            FetchDirective::Hold => return Ok(()),
            FetchDirective::Fetch { cursor } => cursor,
        };

        let fetched = self
            .timeline
            .fetch_page(
                self.identity.filter(),
                self.viewer,
                Some(&cursor),
                self.identity.limit(),
            )
            .await;
        self.controller.settle();

        match fetched {
            Ok(page) => {
                self.cache.append(&self.identity, Arc::new(page));
                Ok(())
            }
            Err(err) => {
                warn!(
                    identity = %self.identity.canonical(),
                    error = %err,
                    "page fetch failed; boundary left for retry"
                );
                Err(err)
            }
        }
    }

    /// Reconcile a completed like mutation into the cached pages.
    pub fn apply(&self, outcome: &LikeOutcome) {
        self.reconciler.apply(&self.identity, outcome);
    }

    /// Refetch the first page and replace the entry wholesale, dropping
    /// every locally patched projection in favor of store-confirmed counts.
    pub async fn refresh(&mut self) -> Result<(), TimelineError> {
        let page = self
            .timeline
            .fetch_page(self.identity.filter(), self.viewer, None, self.identity.limit())
            .await?;
        self.cache.replace(&self.identity, vec![Arc::new(page)]);
        self.controller.settle();
        Ok(())
    }

    /// Unmount: discard the cache entry. In-flight work cannot outlive the
    /// session, so there is nothing to cancel.
    pub fn close(self) {
        self.cache.remove(&self.identity);
        debug!(identity = %self.identity.canonical(), "feed session closed");
    }

    fn next_cursor(&self) -> Option<String> {
        self.cache
            .get(&self.identity)
            .and_then(|pages| pages.last().and_then(|page| page.next_cursor.clone()))
    }
}
