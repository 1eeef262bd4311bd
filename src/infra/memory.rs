//! In-memory posts adapter: the reference implementation of [`PostsRepo`]
//! and the fixture store for tests.

use std::collections::HashSet;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::application::pagination::{FeedCursor, PageRequest};
use crate::application::repos::{CreatePostParams, PostsRepo, RepoError, TimelineFilter};
use crate::cache::lock::{rw_read, rw_write};
use crate::domain::posts::FeedPost;

const SOURCE: &str = "infra::memory";
const SEED_EPOCH: OffsetDateTime = datetime!(2024-06-01 12:00:00 UTC);

#[derive(Debug, Clone)]
struct PostRow {
    id: Uuid,
    author_id: Uuid,
    author_name: String,
    title: String,
    slug: String,
    body: String,
    created_at: OffsetDateTime,
}

#[derive(Default)]
struct Inner {
    posts: Vec<PostRow>,
    likes: HashSet<(Uuid, Uuid)>,
}

pub struct MemoryPosts {
    inner: RwLock<Inner>,
    seed_seq: AtomicI64,
}

impl MemoryPosts {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            seed_seq: AtomicI64::new(0),
        }
    }

    /// Seed `count` posts with strictly increasing creation times.
    ///
    /// Returns the new ids in feed order (newest first).
    pub fn seed_posts(&self, author_name: &str, count: usize) -> Vec<Uuid> {
        let mut ids = Vec::with_capacity(count);
        for n in 0..count {
            let seq = self.seed_seq.fetch_add(1, Ordering::SeqCst);
            let id = self.insert_row(author_name, n, SEED_EPOCH + Duration::seconds(seq));
            ids.push(id);
        }
        ids.reverse();
        ids
    }

    /// Seed one post at an explicit creation time (for tie-break fixtures).
    pub fn seed_post_at(&self, author_name: &str, created_at: OffsetDateTime) -> Uuid {
        self.insert_row(author_name, 0, created_at)
    }

    fn insert_row(&self, author_name: &str, n: usize, created_at: OffsetDateTime) -> Uuid {
        let id = Uuid::new_v4();
        let row = PostRow {
            id,
            author_id: Uuid::new_v4(),
            author_name: author_name.to_string(),
            title: format!("post {n}"),
            slug: format!("post-{n}-{}", &id.simple().to_string()[..4]),
            body: "seeded".to_string(),
            created_at,
        };
        rw_write(&self.inner, SOURCE, "insert_row").posts.push(row);
        id
    }

    fn project(row: &PostRow, likes: &HashSet<(Uuid, Uuid)>, viewer: Option<Uuid>) -> FeedPost {
        let like_count = likes.iter().filter(|(post, _)| *post == row.id).count() as u64;
        let liked_by_viewer =
            viewer.is_some_and(|viewer| likes.contains(&(row.id, viewer)));
        FeedPost {
            id: row.id,
            author_id: row.author_id,
            author_name: row.author_name.clone(),
            title: row.title.clone(),
            slug: row.slug.clone(),
            body: row.body.clone(),
            like_count,
            liked_by_viewer,
            created_at: row.created_at,
        }
    }

    /// Descending `(created_at, id)` feed order.
    fn feed_order(a: &PostRow, b: &PostRow) -> std::cmp::Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    }

    /// Whether `row` sits at or after the cursor boundary in feed order.
    fn at_or_after(row: &PostRow, cursor: &FeedCursor) -> bool {
        row.created_at < cursor.created_at()
            || (row.created_at == cursor.created_at() && row.id <= cursor.id())
    }
}

impl Default for MemoryPosts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostsRepo for MemoryPosts {
    async fn list_after(
        &self,
        filter: &TimelineFilter,
        viewer: Option<Uuid>,
        page: PageRequest<FeedCursor>,
    ) -> Result<Vec<FeedPost>, RepoError> {
        let inner = rw_read(&self.inner, SOURCE, "list_after");

        let mut rows: Vec<&PostRow> = inner
            .posts
            .iter()
            .filter(|row| {
                filter
                    .author
                    .as_deref()
                    .is_none_or(|author| row.author_name == author)
            })
            .filter(|row| {
                page.cursor
                    .as_ref()
                    .is_none_or(|cursor| Self::at_or_after(row, cursor))
            })
            .collect();
        rows.sort_by(|a, b| Self::feed_order(a, b));

        Ok(rows
            .into_iter()
            .take(page.limit as usize)
            .map(|row| Self::project(row, &inner.likes, viewer))
            .collect())
    }

    async fn find_post(&self, id: Uuid, viewer: Option<Uuid>) -> Result<FeedPost, RepoError> {
        let inner = rw_read(&self.inner, SOURCE, "find_post");
        inner
            .posts
            .iter()
            .find(|row| row.id == id)
            .map(|row| Self::project(row, &inner.likes, viewer))
            .ok_or(RepoError::NotFound)
    }

    async fn create_post(&self, params: CreatePostParams) -> Result<FeedPost, RepoError> {
        let row = PostRow {
            id: Uuid::new_v4(),
            author_id: params.author_id,
            author_name: params.author_name,
            title: params.title,
            slug: params.slug,
            body: params.body,
            created_at: OffsetDateTime::now_utc(),
        };
        let mut inner = rw_write(&self.inner, SOURCE, "create_post");
        let post = Self::project(&row, &inner.likes, None);
        inner.posts.push(row);
        Ok(post)
    }

    async fn insert_like(&self, post_id: Uuid, user_id: Uuid) -> Result<(), RepoError> {
        let mut inner = rw_write(&self.inner, SOURCE, "insert_like");
        if !inner.posts.iter().any(|row| row.id == post_id) {
            return Err(RepoError::NotFound);
        }
        if !inner.likes.insert((post_id, user_id)) {
            return Err(RepoError::Duplicate {
                constraint: "likes_post_id_user_id_key".to_string(),
            });
        }
        Ok(())
    }

    async fn delete_like(&self, post_id: Uuid, user_id: Uuid) -> Result<(), RepoError> {
        let mut inner = rw_write(&self.inner, SOURCE, "delete_like");
        if !inner.likes.remove(&(post_id, user_id)) {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
