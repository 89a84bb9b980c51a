//! Relational record types and the queries that read and write them.

pub mod category;
pub mod post;
pub mod thread;
pub mod user;

pub use category::Category;
pub use post::Post;
pub use thread::Thread;
pub use user::{Role, User};

use crate::error::{ForumError, Result};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Limit/offset window for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl Page {
    /// Build a page from optional client arguments. The limit is clamped,
    /// a negative offset is rejected.
    ///
    /// # Errors
    /// Returns a validation error when `offset` is negative.
    pub fn new(limit: Option<i32>, offset: Option<i32>) -> Result<Self> {
        let limit = limit
            .map_or(DEFAULT_PAGE_SIZE, i64::from)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = i64::from(offset.unwrap_or(0));
        if offset < 0 {
            return Err(ForumError::validation("offset", "must not be negative"));
        }
        Ok(Self { limit, offset })
    }
}
