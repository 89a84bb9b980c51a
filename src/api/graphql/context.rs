use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{AuthUser, RequestContext, TokenService};
use crate::entity::Role;
use crate::error::{ForumError, Result};

/// Process-wide resources shared by every resolver.
#[derive(Clone)]
pub struct ApiContext {
    /// Database connection pool
    pub db: PgPool,
    /// Signs tokens handed out by `register` and `login`
    pub tokens: Arc<TokenService>,
}

impl ApiContext {
    pub fn new(db: PgPool, tokens: Arc<TokenService>) -> Self {
        Self { db, tokens }
    }
}

/// The caller's identity, or anonymous if none was attached.
#[must_use]
pub fn current_user<'a>(ctx: &'a async_graphql::Context<'_>) -> Option<&'a AuthUser> {
    ctx.data_opt::<RequestContext>()
        .and_then(|request| request.user.as_ref())
}

/// # Errors
/// Returns `Unauthenticated` for anonymous callers.
pub fn require_user<'a>(ctx: &'a async_graphql::Context<'_>) -> Result<&'a AuthUser> {
    current_user(ctx).ok_or(ForumError::Unauthenticated)
}

/// # Errors
/// Returns `Unauthenticated` for anonymous callers and `Forbidden` when the
/// caller's role is below `minimum`.
pub fn require_role<'a>(ctx: &'a async_graphql::Context<'_>, minimum: Role) -> Result<&'a AuthUser> {
    let user = require_user(ctx)?;
    if user.role < minimum {
        return Err(ForumError::Forbidden(format!("requires the {minimum} role")));
    }
    Ok(user)
}
