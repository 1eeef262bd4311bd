//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::{FeedCursor, PageRequest};
use crate::domain::posts::FeedPost;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Constraints selecting which posts a timeline query returns.
///
/// Structurally comparable: together with the page limit it forms the
/// identity under which fetched pages are cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TimelineFilter {
    /// Restrict the feed to posts authored under this display name.
    pub author: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub author_id: Uuid,
    pub author_name: String,
    pub title: String,
    pub slug: String,
    pub body: String,
}

/// Persistence contract for posts and their like rows.
///
/// `list_after` must order by descending `(created_at, id)` and resume at the
/// cursor's sort key inclusively; `page.limit` already includes the
/// over-fetch the query executor uses for has-more detection.
#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn list_after(
        &self,
        filter: &TimelineFilter,
        viewer: Option<Uuid>,
        page: PageRequest<FeedCursor>,
    ) -> Result<Vec<FeedPost>, RepoError>;

    async fn find_post(&self, id: Uuid, viewer: Option<Uuid>) -> Result<FeedPost, RepoError>;

    async fn create_post(&self, params: CreatePostParams) -> Result<FeedPost, RepoError>;

    async fn insert_like(&self, post_id: Uuid, user_id: Uuid) -> Result<(), RepoError>;

    async fn delete_like(&self, post_id: Uuid, user_id: Uuid) -> Result<(), RepoError>;
}
