//! PostgreSQL-backed migration ledger.

use postgoose_migrate::{
    LedgerConfig, LedgerEntry, LedgerStore, MigrateResult, Migration, MigrationError, MigrationId,
};
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;
use tracing::{debug, info};

use crate::connection::PgTransaction;
use crate::error::{PgError, PgResult};

/// Columns every ledger table must carry, with their `information_schema` data types.
pub const LEDGER_COLUMNS: [(&str, &str); 7] = [
    ("migration_id", "integer"),
    ("up_digest", "character"),
    ("up", "text"),
    ("down_digest", "character"),
    ("down", "text"),
    ("created_at", "timestamp without time zone"),
    ("modified_at", "timestamp without time zone"),
];

/// Quote an identifier for interpolation into SQL.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote every element of a comma-separated search path.
pub fn quote_search_path(path: &str) -> String {
    path.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ")
}

/// SQL creating the ledger table when absent.
pub fn create_table_sql(table: &str) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS {} (
    migration_id INTEGER   NOT NULL PRIMARY KEY,
    up_digest    CHAR(64)  NOT NULL,
    up           TEXT      NOT NULL,
    down_digest  CHAR(64)  NOT NULL,
    down         TEXT      NOT NULL,
    created_at   TIMESTAMP NOT NULL DEFAULT now(),
    modified_at  TIMESTAMP NOT NULL DEFAULT now()
)"#,
        quote_ident(table)
    )
}

/// SQL taking the exclusive ledger lock with a bounded wait.
///
/// Timeouts under one millisecond are rounded up to one.
pub fn lock_sql(config: &LedgerConfig) -> String {
    format!(
        "SET LOCAL lock_timeout TO '{}ms'; LOCK TABLE {} IN EXCLUSIVE MODE",
        // 0 disables the timeout entirely
        config.lock_timeout.as_millis().max(1),
        quote_ident(&config.table)
    )
}

/// The ledger store over an open transaction.
pub struct PgLedgerStore<'t> {
    txn: &'t PgTransaction<'t>,
    config: LedgerConfig,
    table: String,
}

impl<'t> PgLedgerStore<'t> {
    /// Create a store running every statement inside `txn`.
    pub fn new(txn: &'t PgTransaction<'t>, config: LedgerConfig) -> Self {
        let table = quote_ident(&config.table);
        Self { txn, config, table }
    }

    /// Get the configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Describe every way the existing ledger table deviates from the expected columns.
    async fn verify_columns(&self) -> PgResult<Vec<String>> {
        let rows = self
            .txn
            .query(
                "SELECT column_name::text, data_type::text FROM information_schema.columns \
                 WHERE table_schema = current_schema() AND table_name::text = $1",
                &[&self.config.table],
            )
            .await?;

        let present = rows
            .iter()
            .map(|row| Ok((get_column(row, "column_name")?, get_column(row, "data_type")?)))
            .collect::<PgResult<Vec<(String, String)>>>()?;

        Ok(column_mismatches(&present))
    }
}

/// Compare `(column, data_type)` pairs against [`LEDGER_COLUMNS`].
pub fn column_mismatches(present: &[(String, String)]) -> Vec<String> {
    LEDGER_COLUMNS
        .iter()
        .filter_map(|(column, expected)| {
            match present.iter().find(|(name, _)| name == column) {
                None => Some(format!("{} is missing", column)),
                Some((_, actual)) if actual != expected => {
                    Some(format!("{} is {}, expected {}", column, actual, expected))
                }
                Some(_) => None,
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl LedgerStore for PgLedgerStore<'_> {
    async fn ensure_ledger(&self) -> MigrateResult<()> {
        self.txn
            .batch_execute(&create_table_sql(&self.config.table))
            .await
            .map_err(|e| {
                if e.is_duplicate_relation() {
                    MigrationError::ledger_conflict(format!(
                        "creating '{}' collided with another relation: {}",
                        self.config.table, e
                    ))
                } else {
                    e.into()
                }
            })?;

        let mismatches = self.verify_columns().await?;
        if !mismatches.is_empty() {
            return Err(MigrationError::ledger_conflict(format!(
                "table '{}' exists with an incompatible structure: {}",
                self.config.table,
                mismatches.join("; ")
            )));
        }

        debug!(table = %self.config.table, "Ledger table ready");
        Ok(())
    }

    async fn read_history(&self) -> MigrateResult<Vec<LedgerEntry>> {
        let sql = format!(
            "SELECT migration_id, up_digest, up, down_digest, down, created_at, modified_at \
             FROM {} ORDER BY migration_id",
            self.table
        );
        let rows = self.txn.query(&sql, &[]).await?;

        let entries = rows
            .iter()
            .map(entry_from_row)
            .collect::<PgResult<Vec<_>>>()?;

        debug!(count = entries.len(), "Read ledger history");
        Ok(entries)
    }

    async fn lock_exclusive(&self) -> MigrateResult<()> {
        self.txn
            .batch_execute(&lock_sql(&self.config))
            .await
            .map_err(|e| {
                if e.is_lock_contention() {
                    MigrationError::in_progress(format!(
                        "could not lock '{}' within {}ms",
                        self.config.table,
                        self.config.lock_timeout.as_millis()
                    ))
                } else {
                    e.into()
                }
            })?;

        info!(table = %self.config.table, "Acquired exclusive ledger lock");
        Ok(())
    }

    async fn execute(&self, body: &str) -> MigrateResult<()> {
        self.txn.batch_execute(body).await?;
        Ok(())
    }

    async fn record_apply(&self, migration: &Migration) -> MigrateResult<()> {
        let sql = format!(
            "INSERT INTO {} (migration_id, up_digest, up, down_digest, down) \
             VALUES ($1, $2, $3, $4, $5)",
            self.table
        );
        self.txn
            .execute(
                &sql,
                &[
                    &migration.id,
                    &migration.up_digest,
                    &migration.up_body,
                    &migration.down_digest,
                    &migration.down_body,
                ],
            )
            .await?;
        Ok(())
    }

    async fn record_rollback(&self, id: MigrationId) -> MigrateResult<()> {
        let sql = format!("DELETE FROM {} WHERE migration_id = $1", self.table);
        let deleted = self.txn.execute(&sql, &[&id]).await?;
        if deleted != 1 {
            return Err(MigrationError::database(format!(
                "expected to delete one ledger row for migration {}, deleted {}",
                id, deleted
            )));
        }
        Ok(())
    }
}

fn get_column<T>(row: &Row, column: &str) -> PgResult<T>
where
    T: for<'a> FromSql<'a>,
{
    row.try_get(column).map_err(|e| {
        PgError::deserialization(format!("failed to get column '{}': {}", column, e))
    })
}

fn entry_from_row(row: &Row) -> PgResult<LedgerEntry> {
    Ok(LedgerEntry {
        id: get_column(row, "migration_id")?,
        up_digest: get_column::<String>(row, "up_digest")?.trim_end().to_string(),
        up_body: get_column(row, "up")?,
        down_digest: get_column::<String>(row, "down_digest")?.trim_end().to_string(),
        down_body: get_column(row, "down")?,
        created_at: Some(get_column(row, "created_at")?),
        modified_at: Some(get_column(row, "modified_at")?),
    })
}
