//! Throwaway databases for integration tests.
//!
//! Point `FORUM_TEST_DATABASE_URL` at a Postgres server whose user may
//! create databases. Each [`TestDatabase`] gets a freshly created,
//! migrated database that [`TestDatabase::close`] drops again.

#![allow(dead_code)]

use forum_api::api::graphql::{context::ApiContext, create_schema, pubsub::ForumEvents, ForumSchema};
use forum_api::auth::{AuthContextResolver, RequestContext, TokenService};
use rand::{distributions::Alphanumeric, Rng};
use secrecy::SecretString;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;

pub const DATABASE_URL_VAR: &str = "FORUM_TEST_DATABASE_URL";

pub struct TestDatabase {
    pub pool: PgPool,
    admin: PgPool,
    name: String,
}

impl TestDatabase {
    /// `None` when no test server is configured; callers skip.
    pub async fn create() -> Option<Self> {
        let Ok(url) = std::env::var(DATABASE_URL_VAR) else {
            eprintln!("{DATABASE_URL_VAR} not set; skipping database test");
            return None;
        };

        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .expect("connect to test server");

        let name = format!("forum_test_{}", generate_random_text(12).to_lowercase());
        sqlx::query(&format!("CREATE DATABASE \"{name}\""))
            .execute(&admin)
            .await
            .expect("create test database");

        let options: PgConnectOptions = url.parse::<PgConnectOptions>().expect("valid url").database(&name);
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .expect("connect to test database");

        forum_api::db::synchronize(&pool).await.expect("migrate test database");

        Some(Self { pool, admin, name })
    }

    /// Drop the database. Call at the end of every test that created one.
    pub async fn close(self) {
        self.pool.close().await;
        sqlx::query(&format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", self.name))
            .execute(&self.admin)
            .await
            .expect("drop test database");
        self.admin.close().await;
    }
}

pub struct TestApp {
    pub schema: ForumSchema,
    pub auth: AuthContextResolver,
}

impl TestApp {
    pub fn new(db: &TestDatabase) -> Self {
        let tokens = Arc::new(TokenService::new(
            &SecretString::from("integration-secret".to_string()),
            Duration::from_secs(600),
        ));
        let schema = create_schema(
            ApiContext::new(db.pool.clone(), tokens.clone()),
            ForumEvents::new(),
        )
        .expect("schema assembles");
        let auth = AuthContextResolver::new(tokens, Arc::new(db.pool.clone()));
        Self { schema, auth }
    }

    pub async fn context_for(&self, token: &str) -> RequestContext {
        self.auth.resolve(Some(&format!("Bearer {token}"))).await
    }
}

/// Random alphanumeric text of the given length.
pub fn generate_random_text(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
