use clap::Parser;
use secrecy::SecretString;
use std::fmt;
use std::time::Duration;

use crate::db::DatabaseSettings;

/// Token secret used when nothing else is configured. Local development only.
pub const DEFAULT_JWT_SECRET: &str = "insecure-development-secret";

#[derive(Parser, Clone)]
#[command(version, about = "Forum GraphQL API")]
pub struct ForumOptions {
    /// Database host
    #[arg(long, env = "PGHOST", default_value = "localhost")]
    pub db_host: String,

    /// Database port
    #[arg(long, env = "PGPORT", default_value = "5432")]
    pub db_port: u16,

    /// Database user
    #[arg(long, env = "PGUSER", default_value = "postgres")]
    pub db_user: String,

    /// Database password
    #[arg(long, env = "PGPASSWORD", default_value = "postgres", hide_env_values = true)]
    pub db_password: String,

    /// Database name
    #[arg(long, env = "PGDBNAME", default_value = "forum")]
    pub db_name: String,

    /// Upper bound on pooled database connections
    #[arg(long, default_value = "10", env = "DB_MAX_CONNECTIONS")]
    pub db_max_connections: u32,

    /// Seconds to wait for the initial database connection before giving up
    #[arg(long, default_value = "5", env = "DB_CONNECT_TIMEOUT_SECS")]
    pub db_connect_timeout_secs: u64,

    /// Apply pending schema migrations at startup. Never enable implicitly in production.
    #[arg(long, default_value_t = false, env = "DB_SYNCHRONIZE")]
    pub db_synchronize: bool,

    /// HTTP and WebSocket listen port
    #[arg(long, default_value = "4000", env = "PORT")]
    pub port: u16,

    /// HMAC secret used to sign and verify bearer tokens
    #[arg(long, env = "JWT_SECRET", default_value = DEFAULT_JWT_SECRET, hide_env_values = true)]
    pub jwt_secret: String,

    /// Lifetime of issued tokens in seconds
    #[arg(long, default_value = "86400", env = "TOKEN_TTL_SECS")]
    pub token_ttl_secs: u64,

    /// Print the merged GraphQL schema and exit
    #[arg(long, default_value_t = false)]
    pub print_schema: bool,
}

impl fmt::Debug for ForumOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForumOptions")
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_user", &self.db_user)
            .field("db_password", &"***REDACTED***")
            .field("db_name", &self.db_name)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_connect_timeout_secs", &self.db_connect_timeout_secs)
            .field("db_synchronize", &self.db_synchronize)
            .field("port", &self.port)
            .field("jwt_secret", &"***REDACTED***")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("print_schema", &self.print_schema)
            .finish()
    }
}

impl ForumOptions {
    #[must_use]
    pub fn database(&self) -> DatabaseSettings {
        DatabaseSettings {
            host: self.db_host.clone(),
            port: self.db_port,
            username: self.db_user.clone(),
            password: SecretString::from(self.db_password.clone()),
            database: self.db_name.clone(),
            max_connections: self.db_max_connections,
            connect_timeout: Duration::from_secs(self.db_connect_timeout_secs),
            synchronize: self.db_synchronize,
        }
    }

    #[must_use]
    pub fn jwt_secret(&self) -> SecretString {
        SecretString::from(self.jwt_secret.clone())
    }

    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    #[must_use]
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_defaults_apply_without_flags() {
        let opts = ForumOptions::try_parse_from(["forum-api"]).unwrap();
        // Environment may override some of these in CI; only check the ones we never export.
        assert!(!opts.print_schema);
        let settings = opts.database();
        assert_eq!(settings.max_connections, opts.db_max_connections);
        assert_eq!(
            settings.connect_timeout,
            Duration::from_secs(opts.db_connect_timeout_secs)
        );
    }

    #[test]
    fn test_flags_override_everything() {
        let opts = ForumOptions::try_parse_from([
            "forum-api",
            "--db-host",
            "db.internal",
            "--db-port",
            "6543",
            "--db-password",
            "hunter22",
            "--db-synchronize",
            "--port",
            "8081",
            "--jwt-secret",
            "s3cret",
        ])
        .unwrap();

        let settings = opts.database();
        assert_eq!(settings.host, "db.internal");
        assert_eq!(settings.port, 6543);
        assert_eq!(settings.password.expose_secret(), "hunter22");
        assert!(settings.synchronize);
        assert_eq!(opts.port, 8081);
        assert!(!opts.uses_default_secret());
        assert_eq!(opts.jwt_secret().expose_secret(), "s3cret");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let opts = ForumOptions::try_parse_from([
            "forum-api",
            "--db-password",
            "hunter22",
            "--jwt-secret",
            "s3cret-signing-key",
        ])
        .unwrap();

        let shown = format!("{opts:?}");
        assert!(!shown.contains("hunter22"));
        assert!(!shown.contains("s3cret-signing-key"));
        assert!(shown.contains("***REDACTED***"));
    }
}
