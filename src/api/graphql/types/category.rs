use async_graphql::{Context, Object, Result};
use chrono::{DateTime, Utc};

use super::Thread;
use crate::api::graphql::context::ApiContext;
use crate::entity::{self, Page};
use crate::error::IntoGraphql;

pub struct Category(pub entity::Category);

#[Object]
impl Category {
    async fn id(&self) -> i32 {
        self.0.id
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn slug(&self) -> &str {
        &self.0.slug
    }

    async fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    /// Pinned threads first, then newest first
    async fn threads(
        &self,
        ctx: &Context<'_>,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<Thread>> {
        let page = Page::new(limit, offset).gql()?;
        let db = &ctx.data_unchecked::<ApiContext>().db;
        let threads = entity::thread::list_by_category(db, self.0.id, page)
            .await
            .gql()?;
        Ok(threads.into_iter().map(Thread).collect())
    }
}
