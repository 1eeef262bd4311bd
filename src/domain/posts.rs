//! The feed post entity as projected for one viewer.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::DomainError;

/// A post as it appears in a timeline, projected for the requesting viewer.
///
/// `like_count` and `liked_by_viewer` are aggregate fields recomputed by the
/// store on every fetch; the cache layer additionally patches them in place
/// after a local mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPost {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub like_count: u64,
    pub liked_by_viewer: bool,
    pub created_at: OffsetDateTime,
}

impl FeedPost {
    /// A liked post must carry at least the viewer's own like in its count.
    pub fn check_like_invariant(&self) -> Result<(), DomainError> {
        if self.liked_by_viewer && self.like_count == 0 {
            return Err(DomainError::invariant(format!(
                "post {} is liked by the viewer but reports zero likes",
                self.id
            )));
        }
        Ok(())
    }
}

/// Derive a URL-safe permalink slug from a post title.
///
/// Lowercases, strips non-word characters, and collapses runs of whitespace,
/// underscores, and hyphens into single hyphens. Callers append a short
/// uniqueness suffix before persisting.
pub fn permalink_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for ch in title.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
        } else if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_hyphen = true;
        }
    }

    slug
}
