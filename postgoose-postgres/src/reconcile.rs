//! One reconciliation run against PostgreSQL.
//!
//! Everything after connecting happens in a single transaction: session
//! options, ledger creation, history read, locking and every rollback/apply.
//! The transaction commits only if the whole run succeeds.

use std::path::Path;

use postgoose_migrate::{
    LedgerConfig, MigrateResult, Migration, MigrationFileManager, ReconcileOptions,
    ReconcileReport, Reconciler,
};
use tracing::{debug, info, warn};

use crate::config::PgConfig;
use crate::connection::{PgConnection, PgTransaction};
use crate::error::PgResult;
use crate::ledger::{PgLedgerStore, quote_ident, quote_search_path};

/// Reconciles a PostgreSQL database with a migration set.
#[derive(Debug, Clone)]
pub struct PgReconciler {
    config: PgConfig,
    ledger: LedgerConfig,
    options: ReconcileOptions,
}

impl PgReconciler {
    /// Create a new reconciler.
    pub fn new(config: PgConfig, ledger: LedgerConfig, options: ReconcileOptions) -> Self {
        Self {
            config,
            ledger,
            options,
        }
    }

    /// Get the connection configuration.
    pub fn config(&self) -> &PgConfig {
        &self.config
    }

    /// Load `migrations_dir` and reconcile the database with it.
    pub async fn run_dir(&self, migrations_dir: impl AsRef<Path>) -> MigrateResult<ReconcileReport> {
        let migrations = MigrationFileManager::new(migrations_dir.as_ref())
            .load()
            .await?;
        self.run(&migrations).await
    }

    /// Reconcile the database with an already loaded migration set.
    pub async fn run(&self, migrations: &[Migration]) -> MigrateResult<ReconcileReport> {
        let mut conn = PgConnection::connect(&self.config).await?;
        let txn = conn.transaction().await?;

        apply_session_options(&txn, &self.config).await?;

        let outcome = {
            let store = PgLedgerStore::new(&txn, self.ledger.clone());
            Reconciler::new(&store, self.options.clone())
                .run_set(migrations)
                .await
        };

        match outcome {
            Ok(report) => {
                txn.commit().await?;
                info!(summary = %report.summary(), "Transaction committed");
                Ok(report)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed run also failed");
                }
                Err(e)
            }
        }
    }
}

/// Select the schema search path and role for the rest of the session.
pub async fn apply_session_options(txn: &PgTransaction<'_>, config: &PgConfig) -> PgResult<()> {
    if let Some(schema) = config.schema.as_deref().filter(|s| !s.trim().is_empty()) {
        let sql = format!("SET search_path TO {}", quote_search_path(schema));
        debug!(schema = %schema, "Setting search path");
        txn.batch_execute(&sql).await?;
    }

    if let Some(role) = config.role.as_deref() {
        let sql = format!("SET ROLE {}", quote_ident(role));
        debug!(role = %role, "Setting role");
        txn.batch_execute(&sql).await?;
    }

    Ok(())
}
