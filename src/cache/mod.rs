//! Client-side feed cache.
//!
//! Holds the pages a timeline query has materialized so far, keyed by the
//! query's identity (filter + page limit). Three things touch it:
//!
//! - forward pagination appends pages at the tail,
//! - the reconciler patches individual items in place after a like/unlike,
//! - session teardown or refresh discards/replaces the whole entry.
//!
//! There is no eviction: an entry lives exactly as long as its session.

mod controller;
mod keys;
pub(crate) mod lock;
mod reconciler;
mod store;

pub use controller::{FetchDirective, FetchState, ScrollEvent, ScrollFetchController};
pub use keys::QueryIdentity;
pub use reconciler::LikeReconciler;
pub use store::FeedCache;
