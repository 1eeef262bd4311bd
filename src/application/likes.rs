//! Like/unlike mutations and the outcome tuple the reconciler consumes.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::PostsRepo;
use crate::domain::types::LikeAction;

/// A successfully persisted like mutation.
///
/// This is the exact tuple the cache reconciler consumes; it carries no
/// payload beyond what is needed to locate and patch the cached item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    pub post_id: Uuid,
    pub viewer: Uuid,
    pub action: LikeAction,
}

/// Persists like rows and reports completed mutations.
///
/// The service never touches the page cache itself; callers forward the
/// returned [`LikeOutcome`] to the reconciler once the mutation has resolved.
pub struct LikeService {
    repo: Arc<dyn PostsRepo>,
}

impl LikeService {
    pub fn new(repo: Arc<dyn PostsRepo>) -> Self {
        Self { repo }
    }

    pub async fn like(&self, post_id: Uuid, viewer: Uuid) -> Result<LikeOutcome, AppError> {
        self.repo.insert_like(post_id, viewer).await?;
        info!(post = %post_id, viewer = %viewer, "post liked");
        Ok(LikeOutcome {
            post_id,
            viewer,
            action: LikeAction::Like,
        })
    }

    pub async fn unlike(&self, post_id: Uuid, viewer: Uuid) -> Result<LikeOutcome, AppError> {
        self.repo.delete_like(post_id, viewer).await?;
        info!(post = %post_id, viewer = %viewer, "post unliked");
        Ok(LikeOutcome {
            post_id,
            viewer,
            action: LikeAction::Unlike,
        })
    }
}
