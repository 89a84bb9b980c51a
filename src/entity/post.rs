use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};

use super::Page;
use crate::error::Result;

#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: i32,
    pub thread_id: i32,
    pub author_id: i32,
    pub body: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Deletion is terminal.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

const COLUMNS: &str = "id, thread_id, author_id, body, deleted_at, created_at, updated_at";

pub async fn find_by_id<'e>(exec: impl PgExecutor<'e>, id: i32) -> Result<Option<Post>> {
    let post = sqlx::query_as::<_, Post>(&format!("SELECT {COLUMNS} FROM posts WHERE id = $1"))
        .bind(id)
        .fetch_optional(exec)
        .await?;
    Ok(post)
}

/// Posts of a thread in reading order.
pub async fn list_by_thread<'e>(
    exec: impl PgExecutor<'e>,
    thread_id: i32,
    page: Page,
) -> Result<Vec<Post>> {
    let posts = sqlx::query_as::<_, Post>(&format!(
        r"
        SELECT {COLUMNS} FROM posts
        WHERE thread_id = $1
        ORDER BY created_at ASC, id ASC
        LIMIT $2 OFFSET $3
        "
    ))
    .bind(thread_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(exec)
    .await?;
    Ok(posts)
}

pub async fn list_by_author<'e>(
    exec: impl PgExecutor<'e>,
    author_id: i32,
    page: Page,
) -> Result<Vec<Post>> {
    let posts = sqlx::query_as::<_, Post>(&format!(
        r"
        SELECT {COLUMNS} FROM posts
        WHERE author_id = $1 AND deleted_at IS NULL
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "
    ))
    .bind(author_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(exec)
    .await?;
    Ok(posts)
}

pub async fn count_by_thread<'e>(exec: impl PgExecutor<'e>, thread_id: i32) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM posts WHERE thread_id = $1 AND deleted_at IS NULL",
    )
    .bind(thread_id)
    .fetch_one(exec)
    .await?;
    Ok(count)
}

pub async fn insert<'e>(
    exec: impl PgExecutor<'e>,
    thread_id: i32,
    author_id: i32,
    body: &str,
) -> Result<Post> {
    let post = sqlx::query_as::<_, Post>(&format!(
        r"
        INSERT INTO posts (thread_id, author_id, body)
        VALUES ($1, $2, $3)
        RETURNING {COLUMNS}
        "
    ))
    .bind(thread_id)
    .bind(author_id)
    .bind(body)
    .fetch_one(exec)
    .await?;
    Ok(post)
}

/// Replace the body of a live post. Returns `None` if it is missing or deleted.
pub async fn update_body<'e>(exec: impl PgExecutor<'e>, id: i32, body: &str) -> Result<Option<Post>> {
    let post = sqlx::query_as::<_, Post>(&format!(
        r"
        UPDATE posts SET body = $2, updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {COLUMNS}
        "
    ))
    .bind(id)
    .bind(body)
    .fetch_optional(exec)
    .await?;
    Ok(post)
}

/// Mark a live post deleted. Returns `None` if it is missing or already deleted.
pub async fn soft_delete<'e>(exec: impl PgExecutor<'e>, id: i32) -> Result<Option<Post>> {
    let post = sqlx::query_as::<_, Post>(&format!(
        r"
        UPDATE posts SET deleted_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {COLUMNS}
        "
    ))
    .bind(id)
    .fetch_optional(exec)
    .await?;
    Ok(post)
}
