use async_graphql::{ComplexObject, Context, Object, Result, SimpleObject};
use chrono::{DateTime, Utc};

use super::{Post, Thread};
use crate::api::graphql::context::{current_user, ApiContext};
use crate::entity::{self, Page, Role};
use crate::error::IntoGraphql;

/// A registered account.
pub struct User(pub entity::User);

#[Object]
impl User {
    async fn id(&self) -> i32 {
        self.0.id
    }

    async fn username(&self) -> &str {
        &self.0.username
    }

    /// Only visible to the account owner and administrators
    async fn email(&self, ctx: &Context<'_>) -> Option<&str> {
        let viewer = current_user(ctx)?;
        (viewer.id == self.0.id || viewer.role == Role::Admin).then_some(self.0.email.as_str())
    }

    async fn display_name(&self) -> &str {
        self.0.display_name.as_deref().unwrap_or(&self.0.username)
    }

    async fn bio(&self) -> Option<&str> {
        self.0.bio.as_deref()
    }

    async fn role(&self) -> Role {
        self.0.role
    }

    async fn active(&self) -> bool {
        self.0.is_active()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    /// Threads started by this user, newest first
    async fn threads(
        &self,
        ctx: &Context<'_>,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<Thread>> {
        let page = Page::new(limit, offset).gql()?;
        let db = &ctx.data_unchecked::<ApiContext>().db;
        let threads = entity::thread::list_by_author(db, self.0.id, page).await.gql()?;
        Ok(threads.into_iter().map(Thread).collect())
    }

    /// Live posts written by this user, newest first
    async fn posts(
        &self,
        ctx: &Context<'_>,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<Post>> {
        let page = Page::new(limit, offset).gql()?;
        let db = &ctx.data_unchecked::<ApiContext>().db;
        let posts = entity::post::list_by_author(db, self.0.id, page).await.gql()?;
        Ok(posts.into_iter().map(Post).collect())
    }
}

/// Returned by `register` and `login`.
#[derive(SimpleObject)]
#[graphql(complex)]
pub struct AuthPayload {
    /// Bearer token for the `Authorization` header
    pub token: String,
    #[graphql(skip)]
    pub user: entity::User,
}

#[ComplexObject]
impl AuthPayload {
    async fn user(&self) -> User {
        User(self.user.clone())
    }
}
