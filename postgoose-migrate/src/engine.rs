//! Reconciliation runner.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::diff::{Divergence, diff};
use crate::error::{MigrateResult, MigrationError};
use crate::file::MigrationFileManager;
use crate::history::{LedgerEntry, LedgerStore};
use crate::migration::{Direction, Migration, MigrationId};

/// Options for a reconciliation run.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Whether rollbacks of the old branch may run without confirmation.
    pub auto_apply_down: bool,
    /// Whether to re-hash up bodies instead of trusting stored digests.
    pub strict_digest_check: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            auto_apply_down: false,
            strict_digest_check: true,
        }
    }
}

impl ReconcileOptions {
    /// Create new options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow the old branch to be rolled back automatically.
    pub fn auto_apply_down(mut self, auto: bool) -> Self {
        self.auto_apply_down = auto;
        self
    }

    /// Set whether digests are recomputed during the diff.
    pub fn strict_digest_check(mut self, strict: bool) -> Self {
        self.strict_digest_check = strict;
        self
    }
}

/// Result of a successful reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// IDs rolled back, in execution order.
    pub rolled_back: Vec<MigrationId>,
    /// Ledger entries rolled back, in execution order, with the down bodies that ran.
    pub rolled_back_entries: Vec<LedgerEntry>,
    /// IDs applied, in execution order.
    pub applied: Vec<MigrationId>,
    /// Total duration in milliseconds.
    pub duration_ms: i64,
}

impl ReconcileReport {
    /// Check if the run changed anything.
    pub fn has_changes(&self) -> bool {
        !self.rolled_back.is_empty() || !self.applied.is_empty()
    }

    /// Get a summary of the result.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if !self.rolled_back.is_empty() {
            parts.push(format!("{} rolled back", self.rolled_back.len()));
        }

        if !self.applied.is_empty() {
            parts.push(format!("{} applied", self.applied.len()));
        }

        if parts.is_empty() {
            "No migrations applied".to_string()
        } else {
            format!("{} in {}ms", parts.join(", "), self.duration_ms)
        }
    }
}

/// Drives a ledger store from its current history to the filesystem set.
///
/// The runner never commits: the caller owns the transaction the store runs
/// in and commits it only when [`Reconciler::run`] returns `Ok`.
pub struct Reconciler<'s, S: LedgerStore + ?Sized> {
    store: &'s S,
    options: ReconcileOptions,
}

impl<'s, S: LedgerStore + ?Sized> Reconciler<'s, S> {
    /// Create a new runner over `store`.
    pub fn new(store: &'s S, options: ReconcileOptions) -> Self {
        Self { store, options }
    }

    /// Get the options.
    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Load `migrations_dir` and reconcile the ledger with it.
    pub async fn run(&self, migrations_dir: impl AsRef<Path>) -> MigrateResult<ReconcileReport> {
        let migrations = MigrationFileManager::new(migrations_dir.as_ref())
            .load()
            .await?;
        self.run_set(&migrations).await
    }

    /// Reconcile the ledger with an already loaded filesystem set.
    pub async fn run_set(&self, migrations: &[Migration]) -> MigrateResult<ReconcileReport> {
        let start = Instant::now();

        self.store.ensure_ledger().await?;

        let mut history = self.store.read_history().await?;
        history.sort_by_key(|e| e.id);

        let divergence = diff(&history, migrations, self.options.strict_digest_check);
        info!(
            applied = history.len(),
            on_disk = migrations.len(),
            strict = self.options.strict_digest_check,
            "{}",
            divergence.summary()
        );

        self.store.lock_exclusive().await?;

        let mut report = self.execute(divergence).await?;
        report.duration_ms = start.elapsed().as_millis() as i64;

        info!(summary = %report.summary(), "Reconciliation finished");
        Ok(report)
    }

    async fn execute(&self, divergence: Divergence) -> MigrateResult<ReconcileReport> {
        let mut report = ReconcileReport::default();

        if divergence.requires_rollback() {
            if !self.options.auto_apply_down {
                warn!(
                    ids = ?divergence.old_ids(),
                    "Rollback required but not authorized"
                );
                return Err(MigrationError::DownsRequireConfirmation(
                    divergence.old_branch,
                ));
            }
            report.rolled_back = self.unapply_all(&divergence.old_branch).await?;
            report.rolled_back_entries = divergence.old_branch;
        }

        report.applied = self.apply_all(&divergence.new_branch).await?;
        Ok(report)
    }

    async fn unapply_all(&self, entries: &[LedgerEntry]) -> MigrateResult<Vec<MigrationId>> {
        assert!(
            entries.windows(2).all(|w| w[0].id > w[1].id),
            "migrations must be unapplied in descending order"
        );

        let mut done = Vec::with_capacity(entries.len());
        for entry in entries {
            self.apply_down(entry)
                .await
                .map_err(|e| MigrationError::execution_failed(entry.id, Direction::Down, e))?;
            done.push(entry.id);
        }
        Ok(done)
    }

    async fn apply_all(&self, migrations: &[Migration]) -> MigrateResult<Vec<MigrationId>> {
        assert!(
            migrations.windows(2).all(|w| w[0].id < w[1].id),
            "migrations must be applied in ascending order"
        );

        let mut done = Vec::with_capacity(migrations.len());
        for migration in migrations {
            self.apply_up(migration)
                .await
                .map_err(|e| MigrationError::execution_failed(migration.id, Direction::Up, e))?;
            done.push(migration.id);
        }
        Ok(done)
    }

    async fn apply_down(&self, entry: &LedgerEntry) -> MigrateResult<()> {
        info!(migration_id = entry.id, "Rolling back migration");
        if entry.has_down() {
            debug!(migration_id = entry.id, sql = %entry.down_body, "Executing down");
            self.store.execute(&entry.down_body).await?;
        } else {
            debug!(migration_id = entry.id, "Empty down, nothing to execute");
        }
        self.store.record_rollback(entry.id).await
    }

    async fn apply_up(&self, migration: &Migration) -> MigrateResult<()> {
        info!(migration_id = migration.id, "Applying migration");
        debug!(migration_id = migration.id, sql = %migration.up_body, "Executing up");
        self.store.execute(&migration.up_body).await?;
        self.store.record_apply(migration).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default() {
        let options = ReconcileOptions::default();
        assert!(!options.auto_apply_down);
        assert!(options.strict_digest_check);
    }

    #[test]
    fn test_options_builder() {
        let options = ReconcileOptions::new()
            .auto_apply_down(true)
            .strict_digest_check(false);

        assert!(options.auto_apply_down);
        assert!(!options.strict_digest_check);
    }

    #[test]
    fn test_report_summary() {
        let report = ReconcileReport {
            rolled_back: vec![3, 2],
            applied: vec![2, 3, 4],
            duration_ms: 150,
            ..Default::default()
        };

        assert!(report.has_changes());
        assert_eq!(report.summary(), "2 rolled back, 3 applied in 150ms");
    }

    #[test]
    fn test_report_summary_noop() {
        let report = ReconcileReport::default();
        assert!(!report.has_changes());
        assert_eq!(report.summary(), "No migrations applied");
    }
}
