//! Domain error type and its translation into GraphQL errors.

use async_graphql::ErrorExtensions;
use sqlx::error::ErrorKind;
use thiserror::Error;
use tracing::error;

/// Message shown to clients for anything that is not their fault.
pub const INTERNAL_MESSAGE: &str = "internal server error";

#[derive(Error, Debug)]
pub enum ForumError {
    /// Bad input shape or a rule the input breaks
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// No (valid) identity attached to the request
    #[error("authentication required")]
    Unauthenticated,

    /// Login failed; deliberately does not say which part was wrong
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Identity present but not allowed to do this
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Unique constraint hit
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ForumError>;

impl ForumError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable code placed under `extensions.code`.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "BAD_USER_INPUT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Unauthenticated | Self::InvalidCredentials => "UNAUTHENTICATED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) | Self::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Message the client sees. Internal failures never expose their detail.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<sqlx::Error> for ForumError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound {
                entity: "record",
                id: "?".to_string(),
            },
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().unwrap_or("constraint").to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => {
                        Self::Conflict(format!("{} already exists", unique_subject(&constraint)))
                    }
                    ErrorKind::ForeignKeyViolation => Self::validation(
                        referenced_field(&constraint),
                        "refers to a record that does not exist",
                    ),
                    ErrorKind::NotNullViolation => Self::validation(
                        db_err.message().to_string(),
                        "a required value was missing",
                    ),
                    ErrorKind::CheckViolation => {
                        Self::validation(constraint, "value is not allowed")
                    }
                    _ => Self::Database(err),
                }
            }
            _ => Self::Database(err),
        }
    }
}

impl ErrorExtensions for ForumError {
    fn extend(&self) -> async_graphql::Error {
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            error!("Resolver failed: {:?}", self);
        }

        async_graphql::Error::new(self.public_message()).extend_with(|_, e| {
            e.set("code", self.code());
            if let Self::Validation { field, .. } = self {
                e.set("field", field.as_str());
            }
        })
    }
}

/// Convert a domain result into the resolver-facing result, attaching codes.
pub trait IntoGraphql<T> {
    /// # Errors
    /// Returns the extended GraphQL error when `self` is an error.
    fn gql(self) -> async_graphql::Result<T>;
}

impl<T> IntoGraphql<T> for Result<T> {
    fn gql(self) -> async_graphql::Result<T> {
        self.map_err(|e| e.extend())
    }
}

// Postgres names unique constraints `<table>_<column>_key`.
fn unique_subject(constraint: &str) -> String {
    constraint
        .strip_suffix("_key")
        .and_then(|rest| rest.split_once('_'))
        .map_or_else(|| "value".to_string(), |(_, column)| column.to_string())
}

// And foreign keys `<table>_<column>_fkey`.
fn referenced_field(constraint: &str) -> String {
    constraint
        .strip_suffix("_fkey")
        .and_then(|rest| rest.split_once('_'))
        .map_or_else(|| constraint.to_string(), |(_, column)| column.to_string())
}
