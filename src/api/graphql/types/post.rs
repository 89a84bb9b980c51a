use async_graphql::{Context, Object, Result};
use chrono::{DateTime, Utc};

use super::{Thread, User};
use crate::api::graphql::context::ApiContext;
use crate::entity;
use crate::error::{ForumError, IntoGraphql};

pub struct Post(pub entity::Post);

#[Object]
impl Post {
    async fn id(&self) -> i32 {
        self.0.id
    }

    /// Empty once the post is deleted
    async fn body(&self) -> &str {
        if self.0.is_deleted() {
            ""
        } else {
            &self.0.body
        }
    }

    async fn deleted(&self) -> bool {
        self.0.is_deleted()
    }

    async fn edited(&self) -> bool {
        !self.0.is_deleted() && self.0.updated_at > self.0.created_at
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }

    async fn thread(&self, ctx: &Context<'_>) -> Result<Thread> {
        let db = &ctx.data_unchecked::<ApiContext>().db;
        entity::thread::find_by_id(db, self.0.thread_id)
            .await
            .and_then(|found| found.ok_or_else(|| ForumError::not_found("Thread", self.0.thread_id)))
            .map(Thread)
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
}
