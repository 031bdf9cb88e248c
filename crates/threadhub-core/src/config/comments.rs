//! Comment content and thread limits.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Limits applied to comment content and thread depth.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CommentsConfig {
    /// Maximum content length in characters, after trimming.
    #[serde(default = "default_max_content_length")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub max_content_length: usize,
    /// HTML tags permitted inside comment content.
    #[serde(default = "default_allowed_tags")]
    pub allowed_tags: Vec<String>,
    /// Deepest reply level a new comment may sit at. Top-level comments
    /// are at depth 0.
    #[serde(default = "default_max_thread_depth")]
    #[validate(range(min = 1))]
    pub max_thread_depth: u32,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            max_content_length: default_max_content_length(),
            allowed_tags: default_allowed_tags(),
            max_thread_depth: default_max_thread_depth(),
        }
    }
}

fn default_max_content_length() -> usize {
    10_000
}

fn default_allowed_tags() -> Vec<String> {
    ["a", "code", "i", "strong"]
        .iter()
        .map(|t| t.to_string())
        .collect()
}

fn default_max_thread_depth() -> u32 {
    1_000
}
