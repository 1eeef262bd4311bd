//! Page cache storage.
//!
//! Pages are held behind `Arc` so a patch can rewrite one page while every
//! untouched page keeps its allocation; observers compare snapshots with
//! `Arc::ptr_eq` instead of walking items.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

use metrics::counter;
use tracing::debug;
use uuid::Uuid;

use crate::application::pagination::CursorPage;
use crate::application::timeline::FeedPage;
use crate::domain::posts::FeedPost;

use super::keys::QueryIdentity;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// Ordered pages materialized for the active timeline queries.
pub struct FeedCache {
    entries: RwLock<HashMap<QueryIdentity, Vec<Arc<FeedPage>>>>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Snapshot of the entry's pages, cheap to clone and compare.
    pub fn get(&self, identity: &QueryIdentity) -> Option<Vec<Arc<FeedPage>>> {
        rw_read(&self.entries, SOURCE, "get").get(identity).cloned()
    }

    /// Append a page at the tail, creating the entry on first append.
    ///
    /// Forward pagination is the only caller; pages are never inserted
    /// mid-sequence, reordered, or removed individually.
    pub fn append(&self, identity: &QueryIdentity, page: Arc<FeedPage>) {
        let mut entries = rw_write(&self.entries, SOURCE, "append");
        let pages = entries.entry(identity.clone()).or_default();
        pages.push(page);
        counter!("brusio_feed_page_append_total").increment(1);
        debug!(
            identity = %identity.canonical(),
            pages = pages.len(),
            "page appended"
        );
    }

    /// Replace the entry wholesale (refresh or explicit invalidation).
    pub fn replace(&self, identity: &QueryIdentity, pages: Vec<Arc<FeedPage>>) {
        rw_write(&self.entries, SOURCE, "replace").insert(identity.clone(), pages);
    }

    /// Rewrite the first cached occurrence of `item_id` with `transform`.
    ///
    /// Only the page containing the item gets a new container; if the
    /// transform returns the item unchanged, the entry is left untouched
    /// entirely. A missing entry or id is a no-op, not an error: the item
    /// may simply sit outside the materialized window.
    ///
    /// Returns whether the item was found.
    pub fn patch_item(
        &self,
        identity: &QueryIdentity,
        item_id: Uuid,
        transform: impl Fn(&FeedPost) -> FeedPost,
    ) -> bool {
        let mut entries = rw_write(&self.entries, SOURCE, "patch_item");
        let Some(pages) = entries.get_mut(identity) else {
            debug!(
                identity = %identity.canonical(),
                item = %item_id,
                "patch target has no cache entry"
            );
            counter!("brusio_feed_patch_miss_total").increment(1);
            return false;
        };

        for slot in pages.iter_mut() {
            let Some(index) = slot.items.iter().position(|item| item.id == item_id) else {
                continue;
            };

            let current = &slot.items[index];
            let updated = transform(current);
            if updated == *current {
                return true;
            }

            let mut items = slot.items.clone();
            items[index] = updated;
            *slot = Arc::new(CursorPage::new(items, slot.next_cursor.clone()));
            counter!("brusio_feed_patch_total").increment(1);
            return true;
        }

        debug!(
            identity = %identity.canonical(),
            item = %item_id,
            "patch target outside materialized window"
        );
        counter!("brusio_feed_patch_miss_total").increment(1);
        false
    }

    /// Discard an entry on session teardown. Returns whether it existed.
    pub fn remove(&self, identity: &QueryIdentity) -> bool {
        rw_write(&self.entries, SOURCE, "remove")
            .remove(identity)
            .is_some()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FeedCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use time::OffsetDateTime;

    use super::*;
    use crate::application::repos::TimelineFilter;

    fn sample_item(n: u64) -> FeedPost {
        FeedPost {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            author_name: "ada".to_string(),
            title: format!("post {n}"),
            slug: format!("post-{n}"),
            body: "body".to_string(),
            like_count: n,
            liked_by_viewer: false,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn identity() -> QueryIdentity {
        QueryIdentity::new(TimelineFilter::default(), 10)
    }

    fn page(items: Vec<FeedPost>, next_cursor: Option<&str>) -> Arc<FeedPage> {
        Arc::new(CursorPage::new(
            items,
            next_cursor.map(|cursor| cursor.to_string()),
        ))
    }

    #[test]
    fn append_creates_entry_then_extends_it() {
        let cache = FeedCache::new();
        let identity = identity();

        assert!(cache.get(&identity).is_none());

        cache.append(&identity, page(vec![sample_item(1)], Some("c1")));
        cache.append(&identity, page(vec![sample_item(2)], None));

        let pages = cache.get(&identity).expect("entry");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].next_cursor.as_deref(), Some("c1"));
        assert!(pages[1].next_cursor.is_none());
    }

    #[test]
    fn patch_rewrites_only_the_containing_page() {
        let cache = FeedCache::new();
        let identity = identity();

        let target = sample_item(3);
        let target_id = target.id;
        cache.append(&identity, page(vec![sample_item(1)], Some("c1")));
        cache.append(&identity, page(vec![sample_item(2), target], None));

        let before = cache.get(&identity).expect("entry");
        let found = cache.patch_item(&identity, target_id, |item| {
            let mut item = item.clone();
            item.like_count += 1;
            item.liked_by_viewer = true;
            item
        });
        assert!(found);

        let after = cache.get(&identity).expect("entry");
        assert!(Arc::ptr_eq(&before[0], &after[0]));
        assert!(!Arc::ptr_eq(&before[1], &after[1]));

        let patched = after[1]
            .items
            .iter()
            .find(|item| item.id == target_id)
            .expect("patched item");
        assert_eq!(patched.like_count, 4);
        assert!(patched.liked_by_viewer);

        // Sibling on the same page keeps its value, cursor survives the rewrite.
        assert_eq!(after[1].items[0].like_count, 2);
        assert!(after[1].next_cursor.is_none());
    }

    #[test]
    fn identity_transform_keeps_page_allocation() {
        let cache = FeedCache::new();
        let identity = identity();

        let item = sample_item(1);
        let item_id = item.id;
        cache.append(&identity, page(vec![item], None));

        let before = cache.get(&identity).expect("entry");
        let found = cache.patch_item(&identity, item_id, |item| item.clone());
        assert!(found);

        let after = cache.get(&identity).expect("entry");
        assert!(Arc::ptr_eq(&before[0], &after[0]));
    }

    #[test]
    fn patching_unknown_id_is_a_noop() {
        let cache = FeedCache::new();
        let identity = identity();
        cache.append(&identity, page(vec![sample_item(1)], None));

        let before = cache.get(&identity).expect("entry");
        let found = cache.patch_item(&identity, Uuid::new_v4(), |item| {
            let mut item = item.clone();
            item.like_count += 1;
            item
        });
        assert!(!found);

        let after = cache.get(&identity).expect("entry");
        assert_eq!(before.len(), after.len());
        assert!(Arc::ptr_eq(&before[0], &after[0]));
    }

    #[test]
    fn patching_unmounted_identity_is_a_noop() {
        let cache = FeedCache::new();
        assert!(!cache.patch_item(&identity(), Uuid::new_v4(), |item| item.clone()));
    }

    #[test]
    fn replace_swaps_the_whole_entry() {
        let cache = FeedCache::new();
        let identity = identity();
        cache.append(&identity, page(vec![sample_item(1)], Some("c1")));
        cache.append(&identity, page(vec![sample_item(2)], None));

        cache.replace(&identity, vec![page(vec![sample_item(9)], None)]);

        let pages = cache.get(&identity).expect("entry");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].items[0].like_count, 9);
    }

    #[test]
    fn remove_discards_the_entry() {
        let cache = FeedCache::new();
        let identity = identity();
        cache.append(&identity, page(vec![sample_item(1)], None));

        assert!(cache.remove(&identity));
        assert!(cache.get(&identity).is_none());
        assert!(!cache.remove(&identity));
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_recovers_from_poisoned_lock() {
        let cache = FeedCache::new();
        let identity = identity();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = cache.entries.write().expect("entries lock acquired");
            panic!("poison entries lock");
        }));

        cache.append(&identity, page(vec![sample_item(1)], None));
        assert_eq!(cache.len(), 1);
    }
}
