use async_graphql::{Context, Object, Result};
use chrono::{DateTime, Utc};

use super::{Category, Post, User};
use crate::api::graphql::context::ApiContext;
use crate::entity::{self, Page};
use crate::error::{ForumError, IntoGraphql};

pub struct Thread(pub entity::Thread);

#[Object]
impl Thread {
    async fn id(&self) -> i32 {
        self.0.id
    }

    async fn title(&self) -> &str {
        &self.0.title
    }

    async fn locked(&self) -> bool {
        self.0.locked
    }

    async fn pinned(&self) -> bool {
        self.0.pinned
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }

    async fn category(&self, ctx: &Context<'_>) -> Result<Category> {
        let db = &ctx.data_unchecked::<ApiContext>().db;
        entity::category::find_by_id(db, self.0.category_id)
            .await
            .and_then(|found| {
                found.ok_or_else(|| ForumError::not_found("Category", self.0.category_id))
            })
            .map(Category)
            .gql()
    }

    async fn author(&self, ctx: &Context<'_>) -> Result<User> {
        let db = &ctx.data_unchecked::<ApiContext>().db;
        entity::user::find_by_id(db, self.0.author_id)
            .await
            .and_then(|found| found.ok_or_else(|| ForumError::not_found("User", self.0.author_id)))
            .map(User)
            .gql()
    }

    /// Posts in reading order, deleted ones included as tombstones
    async fn posts(
        &self,
        ctx: &Context<'_>,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<Post>> {
        let page = Page::new(limit, offset).gql()?;
        let db = &ctx.data_unchecked::<ApiContext>().db;
        let posts = entity::post::list_by_thread(db, self.0.id, page).await.gql()?;
        Ok(posts.into_iter().map(Post).collect())
    }

    /// Number of live posts
    async fn post_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let db = &ctx.data_unchecked::<ApiContext>().db;
        entity::post::count_by_thread(db, self.0.id).await.gql()
    }
}
