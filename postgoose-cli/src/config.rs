//! CLI configuration handling.
//!
//! Settings come from three layers, lowest precedence first: built-in
//! defaults, an optional `postgoose.toml`, then command-line flags (which in
//! turn fall back to the libpq environment variables).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use postgoose_migrate::{DEFAULT_LEDGER_TABLE, LedgerConfig, ReconcileOptions};
use postgoose_postgres::PgConfig;

use crate::cli::Cli;
use crate::error::{CliError, CliResult};

/// Default config file name (looked up in the working directory)
pub const CONFIG_FILE_NAME: &str = "postgoose.toml";

/// Schema used when neither the flags nor the file name one
pub const DEFAULT_SCHEMA: &str = "public";

/// postgoose configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Migration configuration
    pub migrations: MigrationConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the explicitly named file, or `postgoose.toml` from `cwd` if it exists.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> CliResult<Option<(PathBuf, Self)>> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = cwd.join(CONFIG_FILE_NAME);
                if !candidate.is_file() {
                    return Ok(None);
                }
                candidate
            }
        };

        let config = Self::load(&path)?;
        Ok(Some((path, config)))
    }
}

/// Database configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: Option<String>,

    /// Server host
    pub host: Option<String>,

    /// Server port
    pub port: Option<u16>,

    /// User name
    pub user: Option<String>,

    /// Password
    pub password: Option<String>,

    /// Database name
    pub dbname: Option<String>,

    /// Schema search path
    pub schema: Option<String>,

    /// Role to assume after connecting
    pub role: Option<String>,
}

/// Migration configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrationConfig {
    /// Ledger table name
    pub table: Option<String>,

    /// Execute down scripts without asking
    pub auto_apply_down: Option<bool>,

    /// Re-hash recorded up scripts when comparing
    pub strict_digest_check: Option<bool>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Connection configuration
    pub database: PgConfig,

    /// Ledger table configuration
    pub ledger: LedgerConfig,

    /// Reconciliation behavior
    pub options: ReconcileOptions,
}

impl Settings {
    /// Merge command-line flags over the file configuration.
    pub fn resolve(cli: &Cli, file: &Config) -> CliResult<Self> {
        let conn = &cli.connection;
        let db = &file.database;

        let mut builder = PgConfig::builder();
        if let Some(url) = conn.url.as_ref().or(db.url.as_ref()) {
            builder = builder.url(url);
        }
        if let Some(host) = conn.host.as_ref().or(db.host.as_ref()) {
            builder = builder.host(host);
        }
        if let Some(port) = conn.port.or(db.port) {
            builder = builder.port(port);
        }
        if let Some(user) = conn.username.as_ref().or(db.user.as_ref()) {
            builder = builder.user(user);
        }
        if let Some(password) = conn.password.as_ref().or(db.password.as_ref()) {
            builder = builder.password(password);
        }
        if let Some(dbname) = conn.dbname.as_ref().or(db.dbname.as_ref()) {
            builder = builder.database(dbname);
        }
        if let Some(role) = conn.role.as_ref().or(db.role.as_ref()) {
            builder = builder.role(role);
        }

        let schema = conn
            .schema
            .as_deref()
            .or(db.schema.as_deref())
            .unwrap_or(DEFAULT_SCHEMA);
        let database = builder.schema(schema).build()?;

        let table = cli
            .reconcile
            .table
            .as_deref()
            .or(file.migrations.table.as_deref())
            .unwrap_or(DEFAULT_LEDGER_TABLE);
        if table.trim().is_empty() {
            return Err(CliError::Config("ledger table name is empty".to_string()));
        }

        let auto_apply_down =
            cli.reconcile.auto_apply_down || file.migrations.auto_apply_down.unwrap_or(false);
        let strict_digest_check = !cli.reconcile.no_strict_digest_check
            && file.migrations.strict_digest_check.unwrap_or(true);

        Ok(Self {
            database,
            ledger: LedgerConfig::new().table(table),
            options: ReconcileOptions::new()
                .auto_apply_down(auto_apply_down)
                .strict_digest_check(strict_digest_check),
        })
    }
}
