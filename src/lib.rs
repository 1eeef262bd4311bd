//! Brusio, the feed core of a social posting application.
//!
//! The crate centers on a cursor-paginated timeline ("infinite list") whose
//! fetched pages are held in a client-side page cache. Completed like/unlike
//! mutations are reconciled into that cache in place, without a refetch, and
//! a scroll-driven controller advances pagination with at most one page fetch
//! in flight per query.
//!
//! Transport, authentication, and rendering are external collaborators. The
//! persistence engine sits behind [`application::repos::PostsRepo`]; an
//! in-memory adapter lives in [`infra::memory`].

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
