//! Shared domain enums.

use serde::{Deserialize, Serialize};

/// Direction of a completed like mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeAction {
    Like,
    Unlike,
}
