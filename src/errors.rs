use diesel::r2d2;
use thiserror::Error;

/// Application-wide error types.
///
/// Ingestion-cycle errors are logged by the scheduler; everything else is
/// propagated to the CLI, which prints it as a single line.
#[derive(Debug, Error)]
pub enum AppError {
    // Session
    #[error("no user is logged in - run `register` or `login` first")]
    Unauthenticated,

    // Validation
    #[error("invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    // Lookups & constraints
    #[error("{resource} not found")]
    NotFound { resource: String },
    #[error("user '{name}' already exists")]
    DuplicateUser { name: String },
    #[error("a feed with url '{url}' already exists")]
    DuplicateUrl { url: String },
    #[error("already following this feed")]
    DuplicateFollow,

    // Feed retrieval
    #[error("network error: {0}")]
    Network(String),
    #[error("feed responded with HTTP {status}")]
    Http { status: u16 },
    #[error("unable to parse feed: {0}")]
    Parse(String),

    // Storage
    #[error("database error: {0}")]
    Storage(#[source] diesel::result::Error),
    #[error("database connection unavailable: {0}")]
    ConnectionPool(#[from] r2d2::PoolError),

    // System
    #[error("configuration error: {0}")]
    Config(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Helper functions for common error conversions
impl AppError {
    pub fn invalid_input(field: &str, message: &str) -> Self {
        AppError::InvalidInput {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn resource_not_found(resource: &str) -> Self {
        AppError::NotFound {
            resource: resource.to_string(),
        }
    }

    /// Errors the scheduler expects to see during normal operation.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Network(_) | AppError::Http { .. } | AppError::ConnectionPool(_)
        )
    }
}

/// Returns true when a diesel error is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &diesel::result::Error) -> bool {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

/// Convert diesel database errors
impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::Error as DieselError;

        match err {
            DieselError::NotFound => AppError::resource_not_found("record"),
            _ => AppError::Storage(err),
        }
    }
}

/// Convert network/reqwest errors
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => AppError::Http {
                status: status.as_u16(),
            },
            None if err.is_timeout() => AppError::Network(format!("request timed out: {err}")),
            None => AppError::Network(err.to_string()),
        }
    }
}

/// Convert feed parsing errors
impl From<rss::Error> for AppError {
    fn from(err: rss::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("background task failed: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(format!("malformed config file: {err}"))
    }
}
