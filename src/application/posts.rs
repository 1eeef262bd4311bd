//! Post creation.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{CreatePostParams, PostsRepo};
use crate::domain::error::DomainError;
use crate::domain::posts::{FeedPost, permalink_slug};

pub struct PostService {
    repo: Arc<dyn PostsRepo>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostsRepo>) -> Self {
        Self { repo }
    }

    pub async fn create(
        &self,
        author_id: Uuid,
        author_name: &str,
        title: &str,
        body: &str,
    ) -> Result<FeedPost, AppError> {
        let title = title.trim();
        let body = body.trim();
        if title.is_empty() {
            return Err(DomainError::validation("post title must not be empty").into());
        }
        if body.is_empty() {
            return Err(DomainError::validation("post body must not be empty").into());
        }

        let slug = unique_slug(title);
        let post = self
            .repo
            .create_post(CreatePostParams {
                author_id,
                author_name: author_name.to_string(),
                title: title.to_string(),
                slug: slug.clone(),
                body: body.to_string(),
            })
            .await?;

        info!(post = %post.id, slug, "post created");
        Ok(post)
    }
}

/// Permalink slug plus a short random suffix so equal titles stay unique.
fn unique_slug(title: &str) -> String {
    let base = permalink_slug(title);
    let suffix = Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..4];
    if base.is_empty() {
        suffix.to_string()
    } else {
        format!("{base}-{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::MemoryPosts;

    #[tokio::test]
    async fn creates_post_with_sluggified_title() {
        let service = PostService::new(Arc::new(MemoryPosts::new()));

        let post = service
            .create(Uuid::new_v4(), "ada", "Hello World", "first post")
            .await
            .expect("created");

        assert!(post.slug.starts_with("hello-world-"));
        assert_eq!(post.like_count, 0);
        assert!(!post.liked_by_viewer);
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let service = PostService::new(Arc::new(MemoryPosts::new()));

        let err = service
            .create(Uuid::new_v4(), "ada", "   ", "body")
            .await
            .expect_err("blank title rejected");
        assert!(matches!(
            err,
            AppError::Domain(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn equal_titles_get_distinct_slugs() {
        let service = PostService::new(Arc::new(MemoryPosts::new()));
        let author = Uuid::new_v4();

        let first = service
            .create(author, "ada", "Same Title", "one")
            .await
            .expect("first");
        let second = service
            .create(author, "ada", "Same Title", "two")
            .await
            .expect("second");

        assert_ne!(first.slug, second.slug);
    }
}
