pub mod graphql;
pub mod handlers;
pub mod middleware;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::api::graphql::ForumSchema;
use crate::auth::AuthContextResolver;

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    pub schema: ForumSchema,
    pub auth: AuthContextResolver,
}

/// Queries, mutations and subscriptions all live on `/`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::graphql_get).post(handlers::graphql_handler),
        )
        .route("/health", get(handlers::health_check))
        .layer(axum::middleware::from_fn(middleware::cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
