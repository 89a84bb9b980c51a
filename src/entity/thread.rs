use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};

use super::Page;
use crate::error::Result;

#[derive(Debug, Clone, FromRow)]
pub struct Thread {
    pub id: i32,
    pub category_id: i32,
    pub author_id: i32,
    pub title: String,
    pub locked: bool,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, category_id, author_id, title, locked, pinned, created_at, updated_at";

pub async fn find_by_id<'e>(exec: impl PgExecutor<'e>, id: i32) -> Result<Option<Thread>> {
    let thread =
        sqlx::query_as::<_, Thread>(&format!("SELECT {COLUMNS} FROM threads WHERE id = $1"))
            .bind(id)
            .fetch_optional(exec)
            .await?;
    Ok(thread)
}

/// Threads of a category, pinned ones first, then newest first.
pub async fn list_by_category<'e>(
    exec: impl PgExecutor<'e>,
    category_id: i32,
    page: Page,
) -> Result<Vec<Thread>> {
    let threads = sqlx::query_as::<_, Thread>(&format!(
        r"
        SELECT {COLUMNS} FROM threads
        WHERE category_id = $1
        ORDER BY pinned DESC, created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "
    ))
    .bind(category_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(exec)
    .await?;
    Ok(threads)
}

pub async fn list_by_author<'e>(
    exec: impl PgExecutor<'e>,
    author_id: i32,
    page: Page,
) -> Result<Vec<Thread>> {
    let threads = sqlx::query_as::<_, Thread>(&format!(
        r"
        SELECT {COLUMNS} FROM threads
        WHERE author_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "
    ))
    .bind(author_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(exec)
    .await?;
    Ok(threads)
}

pub async fn insert<'e>(
    exec: impl PgExecutor<'e>,
    category_id: i32,
    author_id: i32,
    title: &str,
) -> Result<Thread> {
    let thread = sqlx::query_as::<_, Thread>(&format!(
        r"
        INSERT INTO threads (category_id, author_id, title)
        VALUES ($1, $2, $3)
        RETURNING {COLUMNS}
        "
    ))
    .bind(category_id)
    .bind(author_id)
    .bind(title)
    .fetch_one(exec)
    .await?;
    Ok(thread)
}

pub async fn set_locked<'e>(exec: impl PgExecutor<'e>, id: i32, locked: bool) -> Result<Option<Thread>> {
    let thread = sqlx::query_as::<_, Thread>(&format!(
        "UPDATE threads SET locked = $2, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(locked)
    .fetch_optional(exec)
    .await?;
    Ok(thread)
}

pub async fn set_pinned<'e>(exec: impl PgExecutor<'e>, id: i32, pinned: bool) -> Result<Option<Thread>> {
    let thread = sqlx::query_as::<_, Thread>(&format!(
        "UPDATE threads SET pinned = $2, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(pinned)
    .fetch_optional(exec)
    .await?;
    Ok(thread)
}
