//! CLI argument definitions using clap.

use clap::{Args, Parser};
use std::path::PathBuf;

/// postgoose - reconcile a PostgreSQL database with numbered SQL migrations
#[derive(Parser, Debug)]
#[command(name = "postgoose")]
#[command(author = "Pegasus Heavy Industries LLC")]
#[command(version)]
#[command(
    about = "Reconcile a PostgreSQL database with a directory of numbered SQL migrations",
    long_about = None
)]
pub struct Cli {
    /// Directory containing `{id}_up.sql` and `{id}_down.sql` files
    pub directory: PathBuf,

    /// Connection options
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Reconciliation options
    #[command(flatten)]
    pub reconcile: ReconcileArgs,

    /// Path to a configuration file (defaults to ./postgoose.toml if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

// =============================================================================
// Connection
// =============================================================================

/// Database connection arguments
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// Full connection URL; individual flags override its parts
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Database server host
    #[arg(long, env = "PGHOST")]
    pub host: Option<String>,

    /// Database server port
    #[arg(short, long, env = "PGPORT")]
    pub port: Option<u16>,

    /// Database user name
    #[arg(short = 'U', long, env = "PGUSER")]
    pub username: Option<String>,

    /// Database password
    #[arg(long, env = "PGPASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Database name
    #[arg(short, long, env = "PGDATABASE")]
    pub dbname: Option<String>,

    /// Schema search path for the session (default: public)
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Role to assume after connecting
    #[arg(long)]
    pub role: Option<String>,
}

// =============================================================================
// Reconcile
// =============================================================================

/// Reconciliation behavior arguments
#[derive(Args, Debug, Default, Clone)]
pub struct ReconcileArgs {
    /// Ledger table name (default: goose_migrations)
    #[arg(long)]
    pub table: Option<String>,

    /// Execute down scripts when applied migrations were edited or removed
    #[arg(long, visible_alias = "force-downs")]
    pub auto_apply_down: bool,

    /// Compare stored digests instead of re-hashing recorded up scripts
    #[arg(long)]
    pub no_strict_digest_check: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "postgoose",
            "migrations",
            "--host",
            "db.internal",
            "-p",
            "5433",
            "-U",
            "deploy",
            "-d",
            "app",
            "-s",
            "app,public",
            "--table",
            "ledger",
            "--force-downs",
            "--no-strict-digest-check",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.directory, PathBuf::from("migrations"));
        assert_eq!(cli.connection.host.as_deref(), Some("db.internal"));
        assert_eq!(cli.connection.port, Some(5433));
        assert_eq!(cli.connection.username.as_deref(), Some("deploy"));
        assert_eq!(cli.connection.dbname.as_deref(), Some("app"));
        assert_eq!(cli.connection.schema.as_deref(), Some("app,public"));
        assert_eq!(cli.reconcile.table.as_deref(), Some("ledger"));
        assert!(cli.reconcile.auto_apply_down);
        assert!(cli.reconcile.no_strict_digest_check);
        assert!(cli.verbose);
    }

    #[test]
    fn test_directory_is_required() {
        assert!(Cli::try_parse_from(["postgoose"]).is_err());
    }
}
