pub mod api;
pub mod auth;
pub mod db;
pub mod entity;
pub mod error;
pub mod options;

pub use options::ForumOptions;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use crate::api::{
    graphql::{context::ApiContext, create_schema, pubsub::ForumEvents},
    router, AppState,
};
use crate::auth::{AuthContextResolver, TokenService};

pub struct Forum {
    options: ForumOptions,
}

impl Forum {
    pub fn new(options: ForumOptions) -> Self {
        Self { options }
    }

    /// Connect, assemble the schema, then serve until Ctrl-C.
    ///
    /// The listener is bound only once the database is reachable.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable, the schema cannot be
    /// assembled, or the port cannot be bound.
    pub async fn run(&self) -> Result<()> {
        let settings = self.options.database();
        let pool = db::connect(&settings).await.map_err(|e| {
            error!("Database connection failed: {}", e);
            e
        })?;

        let tokens = Arc::new(TokenService::new(
            &self.options.jwt_secret(),
            self.options.token_ttl(),
        ));
        let schema = create_schema(
            ApiContext::new(pool.clone(), tokens.clone()),
            ForumEvents::new(),
        )
        .context("Failed to assemble GraphQL schema")?;

        let state = AppState {
            schema,
            auth: AuthContextResolver::new(tokens, Arc::new(pool.clone())),
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], self.options.port));
        let server = axum::Server::try_bind(&addr)
            .with_context(|| format!("Failed to bind {addr}"))?
            .serve(router(state).into_make_service());

        info!("Server ready at http://{}/", addr);
        info!("Subscriptions ready at ws://{}/", addr);

        server
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("API server error")?;

        pool.close().await;
        info!("Shut down cleanly");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
