use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};

use crate::error::Result;

#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

const COLUMNS: &str = "id, name, slug, description, created_at, updated_at";

pub async fn find_by_id<'e>(exec: impl PgExecutor<'e>, id: i32) -> Result<Option<Category>> {
    let category =
        sqlx::query_as::<_, Category>(&format!("SELECT {COLUMNS} FROM categories WHERE id = $1"))
            .bind(id)
            .fetch_optional(exec)
            .await?;
    Ok(category)
}

pub async fn find_by_slug<'e>(exec: impl PgExecutor<'e>, slug: &str) -> Result<Option<Category>> {
    let category =
        sqlx::query_as::<_, Category>(&format!("SELECT {COLUMNS} FROM categories WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(exec)
            .await?;
    Ok(category)
}

pub async fn list<'e>(exec: impl PgExecutor<'e>) -> Result<Vec<Category>> {
    let categories =
        sqlx::query_as::<_, Category>(&format!("SELECT {COLUMNS} FROM categories ORDER BY name"))
            .fetch_all(exec)
            .await?;
    Ok(categories)
}

pub async fn insert<'e>(exec: impl PgExecutor<'e>, new: &NewCategory) -> Result<Category> {
    let category = sqlx::query_as::<_, Category>(&format!(
        r"
        INSERT INTO categories (name, slug, description)
        VALUES ($1, $2, $3)
        RETURNING {COLUMNS}
        "
    ))
    .bind(&new.name)
    .bind(&new.slug)
    .bind(&new.description)
    .fetch_one(exec)
    .await?;
    Ok(category)
}
