//! Migration records and content digests.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Numeric migration identifier, matching the ledger's `INTEGER` column.
pub type MigrationId = i32;

/// A migration loaded from the filesystem.
///
/// Instances are immutable once built; the digests always describe the bodies
/// they were constructed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    /// Position in the linear sequence, starting at 1.
    pub id: MigrationId,
    /// Contents of `{id}_up.sql`.
    pub up_body: String,
    /// SHA-256 of `up_body`, lowercase hex.
    pub up_digest: String,
    /// Contents of `{id}_down.sql`. May be empty.
    pub down_body: String,
    /// SHA-256 of `down_body`, lowercase hex.
    pub down_digest: String,
}

impl Migration {
    /// Create a migration, computing both digests.
    pub fn new(id: MigrationId, up_body: impl Into<String>, down_body: impl Into<String>) -> Self {
        let up_body = up_body.into();
        let down_body = down_body.into();

        Self {
            id,
            up_digest: compute_digest(&up_body),
            down_digest: compute_digest(&down_body),
            up_body,
            down_body,
        }
    }

    /// Check if running the down body would do anything.
    pub fn has_down(&self) -> bool {
        !self.down_body.trim().is_empty()
    }
}

/// Which half of a migration pair is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Apply the migration (`{id}_up.sql`).
    Up,
    /// Reverse the migration (`{id}_down.sql`).
    Down,
}

impl Direction {
    /// File name suffix for this half, e.g. `up.sql`.
    pub fn file_suffix(self) -> &'static str {
        match self {
            Self::Up => "up.sql",
            Self::Down => "down.sql",
        }
    }

    /// Expected file name for migration `id`.
    pub fn file_name(self, id: MigrationId) -> String {
        format!("{}_{}", id, self.file_suffix())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Compute the digest of a migration body.
///
/// SHA-256 over the raw UTF-8 bytes, hex encoded to 64 characters so it fits
/// the ledger's `CHAR(64)` columns.
pub fn compute_digest(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}
