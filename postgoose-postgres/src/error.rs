//! Error types for PostgreSQL operations.

use postgoose_migrate::MigrationError;
use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Result type for PostgreSQL operations.
pub type PgResult<T> = Result<T, PgError>;

/// Errors that can occur during PostgreSQL operations.
#[derive(Error, Debug)]
pub enum PgError {
    /// PostgreSQL error.
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Row deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl PgError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization(message.into())
    }

    /// SQLSTATE of the server error, if any.
    pub fn sql_state(&self) -> Option<&SqlState> {
        match self {
            Self::Postgres(e) => e.code(),
            _ => None,
        }
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
            || matches!(self, Self::Postgres(e) if e.is_closed())
    }

    /// Check if the server gave up waiting for a lock.
    pub fn is_lock_contention(&self) -> bool {
        matches!(
            self.sql_state(),
            Some(state) if *state == SqlState::LOCK_NOT_AVAILABLE
                || *state == SqlState::T_R_DEADLOCK_DETECTED
        )
    }

    /// Check if a `CREATE TABLE` collided with an existing relation.
    pub fn is_duplicate_relation(&self) -> bool {
        matches!(
            self.sql_state(),
            Some(state) if *state == SqlState::UNIQUE_VIOLATION
                || *state == SqlState::DUPLICATE_TABLE
        )
    }
}

impl From<PgError> for MigrationError {
    fn from(err: PgError) -> Self {
        if err.is_lock_contention() {
            return MigrationError::in_progress(err.to_string());
        }
        MigrationError::database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PgError::config("invalid URL");
        assert!(matches!(err, PgError::Config(_)));

        let err = PgError::connection("connection refused");
        assert!(err.is_connection_error());
        assert!(err.sql_state().is_none());
    }

    #[test]
    fn test_into_migration_error() {
        let err: MigrationError = PgError::deserialization("bad column").into();
        assert!(matches!(err, MigrationError::Database(msg) if msg.contains("bad column")));
    }

    #[test]
    fn test_non_server_errors_are_not_contention() {
        assert!(!PgError::config("x").is_lock_contention());
        assert!(!PgError::config("x").is_duplicate_relation());
    }
}
