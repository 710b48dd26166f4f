//! PostgreSQL connection wrapper.

use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error, info};

use crate::config::PgConfig;
use crate::error::{PgError, PgResult};

/// A single PostgreSQL connection, one per reconciliation run.
pub struct PgConnection {
    client: Client,
}

impl PgConnection {
    /// Connect using `config`.
    ///
    /// The connection driver is spawned onto the current Tokio runtime and
    /// exits when the client is dropped.
    pub async fn connect(config: &PgConfig) -> PgResult<Self> {
        let (client, connection) = config
            .to_pg_config()
            .connect(NoTls)
            .await
            .map_err(|e| PgError::connection(format!("{}: {}", config.display_target(), e)))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgreSQL connection closed with error");
            }
        });

        info!(
            host = %config.host,
            port = %config.port,
            database = %config.database,
            "PostgreSQL connection established"
        );

        Ok(Self { client })
    }

    /// Execute a batch of statements in a single round-trip.
    pub async fn batch_execute(&self, sql: &str) -> PgResult<()> {
        debug!(sql = %sql, "Executing batch");
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    /// Begin a transaction.
    pub async fn transaction(&mut self) -> PgResult<PgTransaction<'_>> {
        debug!("Beginning transaction");
        let txn = self.client.transaction().await?;
        Ok(PgTransaction { txn })
    }

    /// Get the underlying tokio-postgres client.
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// A PostgreSQL transaction.
///
/// Dropping it without calling [`PgTransaction::commit`] rolls it back.
pub struct PgTransaction<'a> {
    txn: tokio_postgres::Transaction<'a>,
}

impl<'a> PgTransaction<'a> {
    /// Execute a query and return all rows.
    pub async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> PgResult<Vec<Row>> {
        debug!(sql = %sql, "Executing query in transaction");
        let rows = self.txn.query(sql, params).await?;
        Ok(rows)
    }

    /// Execute a statement and return the number of affected rows.
    pub async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> PgResult<u64> {
        debug!(sql = %sql, "Executing statement in transaction");
        let count = self.txn.execute(sql, params).await?;
        Ok(count)
    }

    /// Execute a batch of statements with the simple query protocol.
    ///
    /// Migration bodies go through here since they may hold several
    /// statements.
    pub async fn batch_execute(&self, sql: &str) -> PgResult<()> {
        debug!(sql = %sql, "Executing batch in transaction");
        self.txn.batch_execute(sql).await?;
        Ok(())
    }

    /// Commit the transaction.
    pub async fn commit(self) -> PgResult<()> {
        debug!("Committing transaction");
        self.txn.commit().await?;
        Ok(())
    }

    /// Rollback the transaction.
    pub async fn rollback(self) -> PgResult<()> {
        debug!("Rolling back transaction");
        self.txn.rollback().await?;
        Ok(())
    }
}
