use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::Page;
use crate::error::Result;

/// Privilege level, ordered from least to most privileged.
#[derive(async_graphql::Enum, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Role {
    #[default]
    Member,
    Moderator,
    Admin,
}

#[derive(Error, Debug)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(String);

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.deactivated_at.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
}

const COLUMNS: &str = "id, username, email, password_hash, display_name, bio, role, \
                       deactivated_at, created_at, updated_at";

pub async fn find_by_id<'e>(exec: impl PgExecutor<'e>, id: i32) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(exec)
        .await?;
    Ok(user)
}

/// Like [`find_by_id`] but skips deactivated accounts.
pub async fn find_active<'e>(exec: impl PgExecutor<'e>, id: i32) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users WHERE id = $1 AND deactivated_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(exec)
    .await?;
    Ok(user)
}

/// Look an active account up by username or email. Emails are stored
/// lowercase, so the email match ignores case.
pub async fn find_by_login<'e>(exec: impl PgExecutor<'e>, login: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        r"
        SELECT {COLUMNS} FROM users
        WHERE (username = $1 OR email = lower($1))
          AND deactivated_at IS NULL
        "
    ))
    .bind(login)
    .fetch_optional(exec)
    .await?;
    Ok(user)
}

pub async fn list<'e>(exec: impl PgExecutor<'e>, page: Page) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users WHERE deactivated_at IS NULL ORDER BY id LIMIT $1 OFFSET $2"
    ))
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(exec)
    .await?;
    Ok(users)
}

pub async fn insert<'e>(exec: impl PgExecutor<'e>, new: &NewUser) -> Result<User> {
    let user = sqlx::query_as::<_, User>(&format!(
        r"
        INSERT INTO users (username, email, password_hash, display_name)
        VALUES ($1, $2, $3, $4)
        RETURNING {COLUMNS}
        "
    ))
    .bind(&new.username)
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(&new.display_name)
    .fetch_one(exec)
    .await?;
    Ok(user)
}

/// Overwrite the profile fields that are `Some`; `None` leaves a field as is.
pub async fn update_profile<'e>(
    exec: impl PgExecutor<'e>,
    id: i32,
    display_name: Option<&str>,
    bio: Option<&str>,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(&format!(
        r"
        UPDATE users
        SET display_name = COALESCE($2, display_name),
            bio = COALESCE($3, bio),
            updated_at = NOW()
        WHERE id = $1 AND deactivated_at IS NULL
        RETURNING {COLUMNS}
        "
    ))
    .bind(id)
    .bind(display_name)
    .bind(bio)
    .fetch_one(exec)
    .await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_text() {
        for role in [Role::Member, Role::Moderator, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin > Role::Moderator);
        assert!(Role::Moderator > Role::Member);
        assert_eq!(Role::default(), Role::Member);
    }
}
