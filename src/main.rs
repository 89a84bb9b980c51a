use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use forum_api::{api::graphql::schema::schema_sdl, Forum, ForumOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let opts = ForumOptions::parse();

    if opts.print_schema {
        println!("{}", schema_sdl()?);
        return Ok(());
    }

    tracing::info!("Configuration:");
    tracing::info!("  Database: {}", opts.database());
    tracing::info!("  Max connections: {}", opts.db_max_connections);
    tracing::info!("  Connect timeout (s): {}", opts.db_connect_timeout_secs);
    tracing::info!("  Synchronize schema: {}", opts.db_synchronize);
    tracing::info!("  Port: {}", opts.port);
    tracing::info!("  Token lifetime (s): {}", opts.token_ttl_secs);

    if opts.uses_default_secret() {
        tracing::warn!("JWT_SECRET is not set; using the development default. Do not run like this in production.");
    }

    let forum = Forum::new(opts);
    forum.run().await?;

    Ok(())
}
