//! CLI error types, result alias and process exit codes.

use std::path::PathBuf;

use miette::Diagnostic;
use postgoose_migrate::MigrationError;
use postgoose_postgres::PgError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Process exit codes.
pub mod exit_code {
    /// Usage, configuration or connection error.
    pub const FAILURE: i32 = 1;
    /// Another run holds the ledger lock.
    pub const IN_PROGRESS: i32 = 2;
    /// A migration file is misnamed, unpaired or unreadable.
    pub const INVALID_MIGRATIONS: i32 = 3;
    /// The ledger table exists with an incompatible structure.
    pub const LEDGER_CONFLICT: i32 = 4;
    /// A migration script failed; nothing was committed.
    pub const EXECUTION_FAILED: i32 = 5;
    /// The migrations directory holds no migrations.
    pub const NOTHING_TO_DO: i32 = 6;
    /// Rollbacks are needed but `--auto-apply-down` was not given.
    pub const DOWNS_REQUIRED: i32 = 42;
}

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(postgoose::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(postgoose::config))]
    Config(String),

    /// Migration error
    #[error("{0}")]
    #[diagnostic(code(postgoose::migration))]
    Migration(#[from] MigrationError),

    /// Database error
    #[error("Database error: {0}")]
    #[diagnostic(code(postgoose::database))]
    Database(#[from] PgError),

    /// The migrations directory is empty
    #[error("No migrations found in '{}'", .0.display())]
    #[diagnostic(
        code(postgoose::nothing_to_do),
        help("add {{id}}_up.sql and {{id}}_down.sql files starting at id 1")
    )]
    NothingToDo(PathBuf),
}

impl CliError {
    /// Exit code reported to the shell for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Io(_) | CliError::Config(_) | CliError::Database(_) => exit_code::FAILURE,
            CliError::NothingToDo(_) => exit_code::NOTHING_TO_DO,
            CliError::Migration(err) => match err {
                MigrationError::MigrationInProgress(_) => exit_code::IN_PROGRESS,
                MigrationError::LedgerConflict(_) => exit_code::LEDGER_CONFLICT,
                MigrationError::MigrationExecutionFailed { .. } => exit_code::EXECUTION_FAILED,
                MigrationError::DownsRequireConfirmation(_) => exit_code::DOWNS_REQUIRED,
                MigrationError::NotADirectory(_) => exit_code::FAILURE,
                err if err.is_load_error() => exit_code::INVALID_MIGRATIONS,
                _ => exit_code::FAILURE,
            },
        }
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postgoose_migrate::Direction;

    #[test]
    fn test_exit_codes() {
        let cases = [
            (CliError::Config("bad".into()), 1),
            (CliError::NothingToDo(PathBuf::from("m")), 6),
            (MigrationError::in_progress("locked").into(), 2),
            (MigrationError::MalformedFilename("x.sql".into()).into(), 3),
            (MigrationError::NotADirectory(PathBuf::from("m")).into(), 1),
            (MigrationError::ledger_conflict("columns").into(), 4),
            (
                MigrationError::execution_failed(
                    2,
                    Direction::Up,
                    MigrationError::database("syntax error"),
                )
                .into(),
                5,
            ),
            (MigrationError::DownsRequireConfirmation(vec![]).into(), 42),
            (MigrationError::database("connection refused").into(), 1),
            (PgError::connection("refused").into(), 1),
        ];

        for (err, code) in cases {
            let err: CliError = err;
            assert_eq!(err.exit_code(), code, "{err}");
        }
    }

    #[test]
    fn test_toml_error_is_config() {
        let err: CliError = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert!(matches!(err, CliError::Config(_)));
        assert_eq!(err.exit_code(), exit_code::FAILURE);
    }
}
