//! Mutation reconciliation: patch cached items after a like/unlike.

use std::sync::Arc;

use metrics::counter;
use tracing::debug;

use crate::application::likes::LikeOutcome;
use crate::domain::posts::FeedPost;
use crate::domain::types::LikeAction;

use super::keys::QueryIdentity;
use super::store::FeedCache;

/// Translates completed like mutations into in-place cache patches.
///
/// Runs only after the mutation has resolved; it issues no network calls and
/// never triggers a refetch. Patches are check-then-set: a like lands only on
/// an item not yet marked liked, an unlike only on one that is, so duplicate
/// delivery of the same outcome (a retried mutation, a double-wired handler)
/// leaves the cache untouched instead of double-counting.
pub struct LikeReconciler {
    cache: Arc<FeedCache>,
}

impl LikeReconciler {
    pub fn new(cache: Arc<FeedCache>) -> Self {
        Self { cache }
    }

    pub fn apply(&self, identity: &QueryIdentity, outcome: &LikeOutcome) {
        let found = match outcome.action {
            LikeAction::Like => self.cache.patch_item(identity, outcome.post_id, like_patch),
            LikeAction::Unlike => self
                .cache
                .patch_item(identity, outcome.post_id, unlike_patch),
        };

        if found {
            let action = match outcome.action {
                LikeAction::Like => "like",
                LikeAction::Unlike => "unlike",
            };
            counter!("brusio_feed_reconcile_total", "action" => action).increment(1);
        } else {
            debug!(
                identity = %identity.canonical(),
                post = %outcome.post_id,
                action = ?outcome.action,
                "mutation outcome had no cached target"
            );
        }
    }
}

fn like_patch(item: &FeedPost) -> FeedPost {
    if item.liked_by_viewer {
        return item.clone();
    }
    let mut item = item.clone();
    item.like_count += 1;
    item.liked_by_viewer = true;
    item
}

fn unlike_patch(item: &FeedPost) -> FeedPost {
    if !item.liked_by_viewer {
        return item.clone();
    }
    let mut item = item.clone();
    // The store owns the authoritative count; clamp rather than trust it here.
    item.like_count = item.like_count.saturating_sub(1);
    item.liked_by_viewer = false;
    item
}
