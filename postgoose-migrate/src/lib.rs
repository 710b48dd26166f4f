//! # postgoose-migrate
//!
//! Reconciliation engine for linear, numbered SQL migrations.
//!
//! This crate provides:
//! - Loading and validation of `{id}_up.sql` / `{id}_down.sql` directories
//! - The ledger abstraction recording which migrations are applied
//! - Digest-based divergence detection between the ledger and the filesystem
//! - An ordered, transactional rollback/apply runner
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐                        ┌──────────────┐
//! │ Migrations   │                        │ Ledger table │
//! │ directory    │                        │ (history)    │
//! └──────┬───────┘                        └──────┬───────┘
//!        │ MigrationFileManager                  │ LedgerStore
//!        ▼                                       ▼
//!        └──────────────▶ diff() ◀───────────────┘
//!                           │
//!                           ▼
//!                   ┌────────────────┐
//!                   │ Divergence     │  old branch (desc) / new branch (asc)
//!                   └───────┬────────┘
//!                           ▼
//!                   ┌────────────────┐
//!                   │ Reconciler     │  downs, then ups, in one transaction
//!                   └────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use postgoose_migrate::{ReconcileOptions, Reconciler};
//!
//! async fn reconcile(store: &impl postgoose_migrate::LedgerStore) -> postgoose_migrate::MigrateResult<()> {
//!     let options = ReconcileOptions::new().auto_apply_down(true);
//!     let report = Reconciler::new(store, options).run("./migrations").await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! The database driver is not part of this crate; `postgoose-postgres`
//! implements [`LedgerStore`] over a PostgreSQL transaction.

pub mod diff;
pub mod engine;
pub mod error;
pub mod file;
pub mod history;
pub mod migration;

// Re-exports
pub use diff::{Divergence, diff};
pub use engine::{ReconcileOptions, ReconcileReport, Reconciler};
pub use error::{MigrateResult, MigrationError};
pub use file::MigrationFileManager;
pub use history::{
    DEFAULT_LEDGER_TABLE, DEFAULT_LOCK_TIMEOUT, LedgerConfig, LedgerEntry, LedgerStore,
};
pub use migration::{Direction, Migration, MigrationId, compute_digest};
