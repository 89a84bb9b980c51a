use async_graphql::{Context, ErrorExtensions, Object, Result, Subscription};
use futures_util::stream::{Stream, StreamExt};

use crate::api::graphql::{
    context::{require_user, ApiContext},
    pubsub::ForumEvents,
    schema::{fragment_fields, SchemaModule},
    types::{CreatePostInput, EditPostInput, Post},
};
use crate::auth::AuthUser;
use crate::entity::{self, Page, Role};
use crate::error::{ForumError, IntoGraphql};

pub const MODULE: SchemaModule = SchemaModule {
    name: "posts",
    types: &["Post", "CreatePostInput", "EditPostInput"],
    fields: fragment_fields::<PostQuery, PostMutation, PostSubscription>,
};

/// Authors may change their own posts; moderators may change any.
fn ensure_can_modify(user: &AuthUser, post: &entity::Post) -> crate::error::Result<()> {
    if post.is_deleted() {
        return Err(ForumError::Forbidden("deleted posts cannot be changed".to_string()));
    }
    if user.id != post.author_id && user.role < Role::Moderator {
        return Err(ForumError::Forbidden("not the author of this post".to_string()));
    }
    Ok(())
}

/// Locked threads only accept replies from moderators.
fn ensure_can_reply(user: &AuthUser, thread: &entity::Thread) -> crate::error::Result<()> {
    if thread.locked && user.role < Role::Moderator {
        return Err(ForumError::Forbidden("thread is locked".to_string()));
    }
    Ok(())
}

#[derive(Default)]
pub struct PostQuery;

#[Object]
impl PostQuery {
    async fn post(&self, ctx: &Context<'_>, id: i32) -> Result<Option<Post>> {
        let db = &ctx.data_unchecked::<ApiContext>().db;
        let post = entity::post::find_by_id(db, id).await.gql()?;
        Ok(post.map(Post))
    }

    /// Posts of a thread in reading order
    async fn posts(
        &self,
        ctx: &Context<'_>,
        thread_id: i32,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<Post>> {
        let page = Page::new(limit, offset).gql()?;
        let db = &ctx.data_unchecked::<ApiContext>().db;
        let posts = entity::post::list_by_thread(db, thread_id, page).await.gql()?;
        Ok(posts.into_iter().map(Post).collect())
    }
}

#[derive(Default)]
pub struct PostMutation;

#[Object]
impl PostMutation {
    async fn create_post(&self, ctx: &Context<'_>, input: CreatePostInput) -> Result<Post> {
        let author = require_user(ctx).gql()?;
        let input = input.validate().gql()?;
        let db = &ctx.data_unchecked::<ApiContext>().db;

        let thread = entity::thread::find_by_id(db, input.thread_id)
            .await
            .and_then(|found| found.ok_or_else(|| ForumError::not_found("Thread", input.thread_id)))
            .gql()?;
        ensure_can_reply(author, &thread).gql()?;

        let post = entity::post::insert(db, thread.id, author.id, &input.body)
            .await
            .gql()?;

        if let Some(events) = ForumEvents::from_context(ctx) {
            events.publish_post(post.clone());
        }
        Ok(Post(post))
    }

    /// Authors and moderators only
    async fn edit_post(&self, ctx: &Context<'_>, input: EditPostInput) -> Result<Post> {
        let user = require_user(ctx).gql()?;
        let input = input.validate().gql()?;
        let db = &ctx.data_unchecked::<ApiContext>().db;

        let post = load(db, input.id).await.gql()?;
        ensure_can_modify(user, &post).gql()?;

        // Deleted between the check and the write.
        entity::post::update_body(db, post.id, &input.body)
            .await
            .and_then(|found| found.ok_or_else(|| ForumError::not_found("Post", post.id)))
            .map(Post)
            .gql()
    }

    /// Soft delete; the post stays in its thread as a tombstone
    async fn delete_post(&self, ctx: &Context<'_>, id: i32) -> Result<Post> {
        let user = require_user(ctx).gql()?;
        let db = &ctx.data_unchecked::<ApiContext>().db;

        let post = load(db, id).await.gql()?;
        ensure_can_modify(user, &post).gql()?;

        let post = entity::post::soft_delete(db, id)
            .await
            .and_then(|found| found.ok_or_else(|| ForumError::not_found("Post", id)))
            .gql()?;
        tracing::info!("{} deleted post {}", user.username, post.id);
        Ok(Post(post))
    }
}

async fn load(db: &sqlx::PgPool, id: i32) -> crate::error::Result<entity::Post> {
    entity::post::find_by_id(db, id)
        .await?
        .ok_or_else(|| ForumError::not_found("Post", id))
}

#[derive(Default)]
pub struct PostSubscription;

#[Subscription]
impl PostSubscription {
    /// Posts added to a thread after subscribing
    async fn post_added(&self, ctx: &Context<'_>, thread_id: i32) -> Result<impl Stream<Item = Post>> {
        let events = ForumEvents::from_context(ctx)
            .ok_or_else(|| ForumError::Internal(anyhow::anyhow!("event hub not registered")).extend())?;
        Ok(events.posts_in(thread_id).map(Post))
    }
}
