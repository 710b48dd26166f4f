//! # postgoose-postgres
//!
//! PostgreSQL backend for postgoose.
//!
//! This crate provides:
//! - Connection configuration from URLs or individual parameters
//! - A single-connection, transaction-scoped SQL executor
//! - [`PgLedgerStore`], the ledger table implementation of
//!   [`postgoose_migrate::LedgerStore`]
//! - [`PgReconciler`], which runs a whole reconciliation in one transaction
//!
//! ## Example
//!
//! ```rust,ignore
//! use postgoose_migrate::{LedgerConfig, ReconcileOptions};
//! use postgoose_postgres::{PgConfig, PgReconciler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PgConfig::builder()
//!         .url("postgresql://postgres@localhost/app")
//!         .schema("public")
//!         .build()?;
//!
//!     let reconciler = PgReconciler::new(
//!         config,
//!         LedgerConfig::default(),
//!         ReconcileOptions::new().auto_apply_down(true),
//!     );
//!     let report = reconciler.run_dir("./migrations").await?;
//!     println!("{}", report.summary());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod ledger;
pub mod reconcile;

pub use config::{PgConfig, PgConfigBuilder};
pub use connection::{PgConnection, PgTransaction};
pub use error::{PgError, PgResult};
pub use ledger::PgLedgerStore;
pub use reconcile::PgReconciler;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{PgConfig, PgConfigBuilder};
    pub use crate::connection::PgConnection;
    pub use crate::error::{PgError, PgResult};
    pub use crate::ledger::PgLedgerStore;
    pub use crate::reconcile::PgReconciler;
}
