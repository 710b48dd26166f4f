//! Error types for the reconciliation engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::history::LedgerEntry;
use crate::migration::{Direction, MigrationId};

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that can occur while loading, diffing or reconciling migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// File system error while reading a migration script.
    #[error("I/O error reading '{}': {source}", .path.display())]
    Io {
        /// File or directory being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The migrations path is missing or not a directory.
    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// A `.sql` file whose name does not start with an integer id.
    #[error("File '{0}' is not of pattern '(id)_up.sql' or '(id)_down.sql'")]
    MalformedFilename(String),

    /// One half of a migration pair is missing.
    #[error("Migration {id} is missing its {direction} script ({id}_{})", .direction.file_suffix())]
    IncompleteMigration {
        /// Migration ID.
        id: MigrationId,
        /// The missing half.
        direction: Direction,
    },

    /// Files that match the `.sql` filter but are not expected migration names.
    #[error("Unexpected files not of pattern '(id)_up.sql' or '(id)_down.sql': {}", .0.join(", "))]
    UnexpectedFile(Vec<String>),

    /// The ledger table exists with an incompatible structure, or its creation raced.
    #[error("Ledger table conflict: {0}")]
    LedgerConflict(String),

    /// Another run holds the ledger lock.
    #[error("Migrations already in progress: {0}")]
    MigrationInProgress(String),

    /// The old branch is non-empty and rollbacks were not authorized.
    #[error("{}", format_pending_downs(.0))]
    DownsRequireConfirmation(Vec<LedgerEntry>),

    /// Executing a migration body or its ledger mutation failed.
    #[error("Migration {id} ({direction}) failed: {source}")]
    MigrationExecutionFailed {
        /// Migration ID.
        id: MigrationId,
        /// Whether the up or down body was running.
        direction: Direction,
        /// Underlying storage error.
        #[source]
        source: Box<MigrationError>,
    },

    /// Database operation error.
    #[error("Database error: {0}")]
    Database(String),
}

impl MigrationError {
    /// Create an I/O error for a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a ledger conflict error.
    pub fn ledger_conflict(msg: impl Into<String>) -> Self {
        Self::LedgerConflict(msg.into())
    }

    /// Create a migration-in-progress error.
    pub fn in_progress(msg: impl Into<String>) -> Self {
        Self::MigrationInProgress(msg.into())
    }

    /// Wrap a storage error raised while running migration `id`.
    pub fn execution_failed(id: MigrationId, direction: Direction, source: MigrationError) -> Self {
        Self::MigrationExecutionFailed {
            id,
            direction,
            source: Box::new(source),
        }
    }

    /// Check if this error came from validating the migrations directory.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::NotADirectory(_)
                | Self::MalformedFilename(_)
                | Self::IncompleteMigration { .. }
                | Self::UnexpectedFile(_)
        )
    }

    /// Check if this is a recoverable error.
    ///
    /// Only lock contention qualifies: the state is untouched and the run can be
    /// retried once the other invocation finishes.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MigrationInProgress(_))
    }
}

fn format_pending_downs(pending: &[LedgerEntry]) -> String {
    let mut out = String::from("Downs detected:\n\n");
    for entry in pending {
        out.push_str(&format!("/* migration_id: {} */\n", entry.id));
        out.push_str(&entry.down_body);
        out.push_str("\n\n");
    }
    out.push_str("Re-run with --auto-apply-down if you would like downs executed");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::Migration;

    #[test]
    fn test_incomplete_migration_display() {
        let err = MigrationError::IncompleteMigration {
            id: 4,
            direction: Direction::Down,
        };
        let msg = err.to_string();
        assert!(msg.contains("Migration 4"));
        assert!(msg.contains("4_down.sql"));
    }

    #[test]
    fn test_unexpected_file_lists_every_file() {
        let err = MigrationError::UnexpectedFile(vec!["0_up.sql".into(), "2_sideways.sql".into()]);
        let msg = err.to_string();
        assert!(msg.contains("0_up.sql"));
        assert!(msg.contains("2_sideways.sql"));
    }

    #[test]
    fn test_downs_require_confirmation_discloses_bodies() {
        let entry = LedgerEntry::from_migration(&Migration::new(3, "insert 'c'", "DELETE FROM xs;"));
        let err = MigrationError::DownsRequireConfirmation(vec![entry]);
        let msg = err.to_string();
        assert!(msg.contains("/* migration_id: 3 */"));
        assert!(msg.contains("DELETE FROM xs;"));
        assert!(msg.contains("--auto-apply-down"));
    }

    #[test]
    fn test_execution_failed_keeps_source() {
        use std::error::Error;

        let err = MigrationError::execution_failed(
            2,
            Direction::Up,
            MigrationError::database("relation \"xs\" does not exist"),
        );
        assert!(err.to_string().contains("Migration 2 (up)"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(MigrationError::in_progress("timeout").is_recoverable());
        assert!(!MigrationError::database("connection").is_recoverable());
        assert!(!MigrationError::ledger_conflict("duplicate").is_recoverable());
    }

    #[test]
    fn test_is_load_error() {
        assert!(MigrationError::MalformedFilename("x.sql".into()).is_load_error());
        assert!(!MigrationError::in_progress("busy").is_load_error());
    }
}
