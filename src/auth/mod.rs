//! Turns the `Authorization` header of a request into the identity that
//! resolvers see.
//!
//! Resolution never fails: a missing, malformed, expired or forged token,
//! or one naming a user that no longer exists, produces an anonymous
//! context. Whether anonymity is acceptable is decided where the identity
//! is used.

pub mod password;
pub mod token;

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::entity::{self, Role, User};
pub use token::{bearer_token, TokenService};

/// The identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// Per-request data available to every resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub user: Option<AuthUser>,
}

impl RequestContext {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn authenticated(user: AuthUser) -> Self {
        Self { user: Some(user) }
    }
}

/// Lookup of active accounts by id.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_active_user(&self, id: i32) -> anyhow::Result<Option<AuthUser>>;
}

#[async_trait]
impl UserDirectory for PgPool {
    async fn find_active_user(&self, id: i32) -> anyhow::Result<Option<AuthUser>> {
        let user = entity::user::find_active(self, id).await?;
        Ok(user.as_ref().map(AuthUser::from))
    }
}

#[derive(Clone)]
pub struct AuthContextResolver {
    tokens: Arc<TokenService>,
    users: Arc<dyn UserDirectory>,
}

impl AuthContextResolver {
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserDirectory>) -> Self {
        Self { tokens, users }
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Build the context for a raw `Authorization` header value.
    pub async fn resolve(&self, authorization: Option<&str>) -> RequestContext {
        let Some(token) = authorization.and_then(bearer_token) else {
            return RequestContext::anonymous();
        };

        let user_id = match self.tokens.verify(token) {
            Ok(id) => id,
            Err(e) => {
                debug!("Ignoring bearer token: {}", e);
                return RequestContext::anonymous();
            }
        };

        match self.users.find_active_user(user_id).await {
            Ok(Some(user)) => RequestContext::authenticated(user),
            Ok(None) => {
                debug!("Token subject {} is not an active user", user_id);
                RequestContext::anonymous()
            }
            Err(e) => {
                warn!("User lookup failed while resolving token: {:#}", e);
                RequestContext::anonymous()
            }
        }
    }
}
