use async_graphql::{Context, EmptySubscription, ErrorExtensions, Object, Result};

use crate::api::graphql::{
    context::{current_user, require_user, ApiContext},
    schema::{fragment_fields, SchemaModule},
    types::{AuthPayload, RegisterInput, UpdateProfileInput, User},
};
use crate::auth::password::{spawn_hash, spawn_verify};
use crate::entity::{self, user::NewUser, Page};
use crate::error::{ForumError, IntoGraphql};

pub const MODULE: SchemaModule = SchemaModule {
    name: "users",
    types: &["User", "Role", "AuthPayload", "RegisterInput", "UpdateProfileInput"],
    fields: fragment_fields::<UserQuery, UserMutation, EmptySubscription>,
};

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// The caller's own account, or null when anonymous
    async fn me(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let Some(viewer) = current_user(ctx) else {
            return Ok(None);
        };
        let db = &ctx.data_unchecked::<ApiContext>().db;
        let user = entity::user::find_active(db, viewer.id).await.gql()?;
        Ok(user.map(User))
    }

    async fn user(&self, ctx: &Context<'_>, id: i32) -> Result<Option<User>> {
        let db = &ctx.data_unchecked::<ApiContext>().db;
        let user = entity::user::find_by_id(db, id).await.gql()?;
        Ok(user.map(User))
    }

    /// Active accounts ordered by id
    async fn users(
        &self,
        ctx: &Context<'_>,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<User>> {
        let page = Page::new(limit, offset).gql()?;
        let db = &ctx.data_unchecked::<ApiContext>().db;
        let users = entity::user::list(db, page).await.gql()?;
        Ok(users.into_iter().map(User).collect())
    }
}

#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    /// Create an account and sign the caller in
    async fn register(&self, ctx: &Context<'_>, input: RegisterInput) -> Result<AuthPayload> {
        let api = ctx.data_unchecked::<ApiContext>();
        let input = input.validate().gql()?;
        let password_hash = spawn_hash(input.password).await.gql()?;

        let user = entity::user::insert(
            &api.db,
            &NewUser {
                username: input.username,
                email: input.email,
                password_hash,
                display_name: input.display_name,
            },
        )
        .await
        .gql()?;

        tracing::info!("Registered user {} ({})", user.username, user.id);
        issue(api, user)
    }

    /// Exchange credentials for a token. `login` is a username or an email.
    async fn login(&self, ctx: &Context<'_>, login: String, password: String) -> Result<AuthPayload> {
        let api = ctx.data_unchecked::<ApiContext>();
        let user = entity::user::find_by_login(&api.db, login.trim()).await.gql()?;
        let verified = spawn_verify(password, user.as_ref().map(|u| u.password_hash.clone())).await;

        match user {
            Some(user) if verified => issue(api, user),
            _ => Err(ForumError::InvalidCredentials.extend()),
        }
    }

    async fn update_profile(&self, ctx: &Context<'_>, input: UpdateProfileInput) -> Result<User> {
        let viewer = require_user(ctx).gql()?;
        let input = input.validate().gql()?;
        let db = &ctx.data_unchecked::<ApiContext>().db;

        entity::user::update_profile(
            db,
            viewer.id,
            input.display_name.as_deref(),
            input.bio.as_deref(),
        )
        .await
        .map(User)
        .gql()
    }
}

fn issue(api: &ApiContext, user: entity::User) -> Result<AuthPayload> {
    let token = api
        .tokens
        .issue(user.id)
        .map_err(|e| ForumError::Internal(e.into()))
        .gql()?;
    Ok(AuthPayload { token, user })
}
