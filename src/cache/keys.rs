//! Cache key definitions.

use crate::application::repos::TimelineFilter;

/// Identity of one timeline query: its filter plus its page limit.
///
/// Two queries with equal filter and limit share one cache entry; an
/// identity never changes once a session holds it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryIdentity {
    filter: TimelineFilter,
    limit: u32,
}

impl QueryIdentity {
    pub fn new(filter: TimelineFilter, limit: u32) -> Self {
        Self { filter, limit }
    }

    pub fn filter(&self) -> &TimelineFilter {
        &self.filter
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Stable textual form for log fields and diagnostics.
    pub fn canonical(&self) -> String {
        format!(
            "timeline:author={};limit={}",
            self.filter.author.as_deref().unwrap_or("*"),
            self.limit
        )
    }
}
