use async_graphql::{Context, ErrorExtensions, Object, Result, Subscription};
use futures_util::stream::{Stream, StreamExt};

use crate::api::graphql::{
    context::{require_role, require_user, ApiContext},
    pubsub::ForumEvents,
    schema::{fragment_fields, SchemaModule},
    types::{CreateThreadInput, Thread},
};
use crate::entity::{self, Page, Role};
use crate::error::{ForumError, IntoGraphql};

pub const MODULE: SchemaModule = SchemaModule {
    name: "threads",
    types: &["Thread", "CreateThreadInput"],
    fields: fragment_fields::<ThreadQuery, ThreadMutation, ThreadSubscription>,
};

#[derive(Default)]
pub struct ThreadQuery;

#[Object]
impl ThreadQuery {
    async fn thread(&self, ctx: &Context<'_>, id: i32) -> Result<Option<Thread>> {
        let db = &ctx.data_unchecked::<ApiContext>().db;
        let thread = entity::thread::find_by_id(db, id).await.gql()?;
        Ok(thread.map(Thread))
    }

    /// Threads of a category, pinned first, then newest first
    async fn threads(
        &self,
        ctx: &Context<'_>,
        category_id: i32,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<Thread>> {
        let page = Page::new(limit, offset).gql()?;
        let db = &ctx.data_unchecked::<ApiContext>().db;
        if entity::category::find_by_id(db, category_id)
            .await
            .gql()?
            .is_none()
        {
            return Err(ForumError::not_found("Category", category_id).extend());
        }
        let threads = entity::thread::list_by_category(db, category_id, page)
            .await
            .gql()?;
        Ok(threads.into_iter().map(Thread).collect())
    }
}

#[derive(Default)]
pub struct ThreadMutation;

#[Object]
impl ThreadMutation {
    /// Start a discussion. The thread and its opening post are written together.
    async fn create_thread(&self, ctx: &Context<'_>, input: CreateThreadInput) -> Result<Thread> {
        let author = require_user(ctx).gql()?;
        let input = input.validate().gql()?;
        let db = &ctx.data_unchecked::<ApiContext>().db;

        let (thread, opening) = create_with_opening_post(db, author.id, &input)
            .await
            .gql()?;

        if let Some(events) = ForumEvents::from_context(ctx) {
            events.publish_thread(thread.clone());
            events.publish_post(opening);
        }
        Ok(Thread(thread))
    }

    /// Moderators only
    async fn set_thread_locked(&self, ctx: &Context<'_>, id: i32, locked: bool) -> Result<Thread> {
        require_role(ctx, Role::Moderator).gql()?;
        let db = &ctx.data_unchecked::<ApiContext>().db;
        let thread = entity::thread::set_locked(db, id, locked)
            .await
            .and_then(|found| found.ok_or_else(|| ForumError::not_found("Thread", id)))
            .gql()?;
        Ok(announce(ctx, thread))
    }

    /// Moderators only
    async fn set_thread_pinned(&self, ctx: &Context<'_>, id: i32, pinned: bool) -> Result<Thread> {
        require_role(ctx, Role::Moderator).gql()?;
        let db = &ctx.data_unchecked::<ApiContext>().db;
        let thread = entity::thread::set_pinned(db, id, pinned)
            .await
            .and_then(|found| found.ok_or_else(|| ForumError::not_found("Thread", id)))
            .gql()?;
        Ok(announce(ctx, thread))
    }
}

async fn create_with_opening_post(
    db: &sqlx::PgPool,
    author_id: i32,
    input: &CreateThreadInput,
) -> crate::error::Result<(entity::Thread, entity::Post)> {
    let mut tx = db.begin().await?;

    if entity::category::find_by_id(&mut *tx, input.category_id)
        .await?
        .is_none()
    {
        return Err(ForumError::not_found("Category", input.category_id));
    }

    let thread = entity::thread::insert(&mut *tx, input.category_id, author_id, &input.title).await?;
    let opening = entity::post::insert(&mut *tx, thread.id, author_id, &input.body).await?;

    tx.commit().await?;
    Ok((thread, opening))
}

fn announce(ctx: &Context<'_>, thread: entity::Thread) -> Thread {
    if let Some(events) = ForumEvents::from_context(ctx) {
        events.publish_thread(thread.clone());
    }
    Thread(thread)
}

#[derive(Default)]
pub struct ThreadSubscription;

#[Subscription]
impl ThreadSubscription {
    /// Threads created, locked or pinned, optionally within one category
    async fn thread_updated(
        &self,
        ctx: &Context<'_>,
        category_id: Option<i32>,
    ) -> Result<impl Stream<Item = Thread>> {
        let events = ForumEvents::from_context(ctx)
            .ok_or_else(|| ForumError::Internal(anyhow::anyhow!("event hub not registered")).extend())?;
        Ok(events.threads_in(category_id).map(Thread))
    }
}
