//! # postgoose
//!
//! Reconciles a PostgreSQL database with a directory of linearly numbered SQL
//! migrations (`{id}_up.sql` / `{id}_down.sql`).
//!
//! postgoose provides:
//! - A migration set loader that validates naming and contiguity
//! - A pure divergence engine comparing recorded history with the directory
//! - A reconciliation runner that rolls back edited migrations and applies new
//!   ones inside a single transaction
//! - A PostgreSQL ledger store with an exclusive table lock
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use postgoose::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PgConfig::from_url("postgresql://postgres@localhost/app")?;
//!     let reconciler = PgReconciler::new(
//!         config,
//!         LedgerConfig::default(),
//!         ReconcileOptions::new().auto_apply_down(true),
//!     );
//!
//!     let report = reconciler.run_dir("./migrations").await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Migration loading, divergence and the reconciliation runner.
pub mod migrate {
    pub use postgoose_migrate::*;
}

/// PostgreSQL ledger store and transactional runner.
pub mod postgres {
    pub use postgoose_postgres::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::migrate::{
        Divergence, LedgerConfig, LedgerStore, MigrateResult, Migration, MigrationError,
        MigrationFileManager, ReconcileOptions, ReconcileReport, Reconciler, diff,
    };
    pub use crate::postgres::{PgConfig, PgReconciler};
}

// Re-export key types at the crate root
pub use migrate::{MigrationError, ReconcileOptions, ReconcileReport};
