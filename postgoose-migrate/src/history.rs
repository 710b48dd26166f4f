//! Migration ledger: the persisted record of applied migrations.

use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::MigrateResult;
use crate::migration::{Migration, MigrationId};

/// Default name of the ledger table.
pub const DEFAULT_LEDGER_TABLE: &str = "goose_migrations";

/// Default bounded wait for the exclusive ledger lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

/// A record of an applied migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Migration ID.
    pub id: MigrationId,
    /// Up body as it was applied.
    pub up_body: String,
    /// Digest stored alongside the up body.
    pub up_digest: String,
    /// Down body recorded at apply time; this is what a rollback runs.
    pub down_body: String,
    /// Digest stored alongside the down body.
    pub down_digest: String,
    /// When the row was inserted. `None` until the row is read back.
    pub created_at: Option<NaiveDateTime>,
    /// When the row was last modified. `None` until the row is read back.
    pub modified_at: Option<NaiveDateTime>,
}

impl LedgerEntry {
    /// Build the entry that applying `migration` records.
    pub fn from_migration(migration: &Migration) -> Self {
        Self {
            id: migration.id,
            up_body: migration.up_body.clone(),
            up_digest: migration.up_digest.clone(),
            down_body: migration.down_body.clone(),
            down_digest: migration.down_digest.clone(),
            created_at: None,
            modified_at: None,
        }
    }

    /// Check if running the recorded down body would do anything.
    pub fn has_down(&self) -> bool {
        !self.down_body.trim().is_empty()
    }
}

/// Configuration for a ledger store.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Name of the ledger table.
    pub table: String,
    /// How long to wait for the exclusive lock before giving up.
    pub lock_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_LEDGER_TABLE.to_string(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl LedgerConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ledger table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set the lock wait.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

/// Access to the migration ledger and the SQL executor behind it.
///
/// Every method runs inside one enclosing transaction owned by the caller, so a
/// body execution and its ledger mutation commit or roll back together.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Create the ledger table if absent. Idempotent.
    async fn ensure_ledger(&self) -> MigrateResult<()>;

    /// Get every ledger entry, ascending by id.
    async fn read_history(&self) -> MigrateResult<Vec<LedgerEntry>>;

    /// Take the exclusive ledger lock for the rest of the transaction.
    async fn lock_exclusive(&self) -> MigrateResult<()>;

    /// Execute a migration body.
    async fn execute(&self, body: &str) -> MigrateResult<()>;

    /// Insert the ledger entry for an applied migration.
    async fn record_apply(&self, migration: &Migration) -> MigrateResult<()>;

    /// Delete the ledger entry for a rolled back migration.
    async fn record_rollback(&self, id: MigrationId) -> MigrateResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_from_migration() {
        let migration = Migration::new(1, "CREATE TABLE xs (x text);", "DROP TABLE xs;");
        let entry = LedgerEntry::from_migration(&migration);

        assert_eq!(entry.id, 1);
        assert_eq!(entry.up_digest, migration.up_digest);
        assert_eq!(entry.down_body, "DROP TABLE xs;");
        assert!(entry.created_at.is_none());
        assert!(entry.has_down());
    }

    #[test]
    fn test_ledger_config_default() {
        let config = LedgerConfig::default();
        assert_eq!(config.table, "goose_migrations");
        assert_eq!(config.lock_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_ledger_config_builder() {
        let config = LedgerConfig::new()
            .table("schema_ledger")
            .lock_timeout(Duration::from_millis(500));

        assert_eq!(config.table, "schema_ledger");
        assert_eq!(config.lock_timeout, Duration::from_millis(500));
    }
}
