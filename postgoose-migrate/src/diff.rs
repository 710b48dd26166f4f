//! Divergence detection between the database history and the filesystem set.
//!
//! Both sequences are walked in lockstep by ascending id. The first position
//! where the up scripts disagree is the divergence point: everything applied
//! from there on is rolled back (highest id first) and everything on disk from
//! there on is applied (lowest id first). Without a divergence point only the
//! filesystem tail beyond the last applied id is applied.

use serde::{Deserialize, Serialize};

use crate::history::LedgerEntry;
use crate::migration::{Migration, MigrationId, compute_digest};

/// Result of comparing the two histories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Divergence {
    /// Ledger entries to roll back, strictly descending by id.
    pub old_branch: Vec<LedgerEntry>,
    /// Filesystem migrations to apply, strictly ascending by id.
    pub new_branch: Vec<Migration>,
}

impl Divergence {
    /// Check if there's nothing to do.
    pub fn is_empty(&self) -> bool {
        self.old_branch.is_empty() && self.new_branch.is_empty()
    }

    /// Check if any rollback is required.
    pub fn requires_rollback(&self) -> bool {
        !self.old_branch.is_empty()
    }

    /// IDs of the old branch, in rollback order.
    pub fn old_ids(&self) -> Vec<MigrationId> {
        self.old_branch.iter().map(|e| e.id).collect()
    }

    /// IDs of the new branch, in apply order.
    pub fn new_ids(&self) -> Vec<MigrationId> {
        self.new_branch.iter().map(|m| m.id).collect()
    }

    /// Get a summary of the divergence.
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "Database is up to date".to_string();
        }

        let mut parts = Vec::new();
        if !self.old_branch.is_empty() {
            parts.push(format!("{} to roll back", self.old_branch.len()));
        }
        if !self.new_branch.is_empty() {
            parts.push(format!("{} to apply", self.new_branch.len()));
        }
        parts.join(", ")
    }
}

/// Compute the divergence between `history` and `filesystem`.
///
/// Both inputs must be ascending by id. With `strict` the up bodies on both
/// sides are re-hashed; otherwise the stored `up_digest` fields are compared.
pub fn diff(history: &[LedgerEntry], filesystem: &[Migration], strict: bool) -> Divergence {
    match find_divergence(history, filesystem, strict) {
        Some(divergent_id) => {
            let mut old_branch: Vec<LedgerEntry> = history
                .iter()
                .filter(|e| e.id >= divergent_id)
                .cloned()
                .collect();
            old_branch.sort_by(|a, b| b.id.cmp(&a.id));

            let mut new_branch: Vec<Migration> = filesystem
                .iter()
                .filter(|m| m.id >= divergent_id)
                .cloned()
                .collect();
            new_branch.sort_by_key(|m| m.id);

            Divergence {
                old_branch,
                new_branch,
            }
        }
        None => {
            let max_applied = history.iter().map(|e| e.id).max().unwrap_or(0);

            let mut new_branch: Vec<Migration> = filesystem
                .iter()
                .filter(|m| m.id > max_applied)
                .cloned()
                .collect();
            new_branch.sort_by_key(|m| m.id);

            Divergence {
                old_branch: Vec::new(),
                new_branch,
            }
        }
    }
}

/// Find the id of the first position where the two sequences disagree.
///
/// A position whose ids differ (a hole in the recorded history) counts as a
/// disagreement at the smaller id.
fn find_divergence(
    history: &[LedgerEntry],
    filesystem: &[Migration],
    strict: bool,
) -> Option<MigrationId> {
    history
        .iter()
        .zip(filesystem)
        .find(|(applied, on_disk)| {
            applied.id != on_disk.id || !same_up(applied, on_disk, strict)
        })
        .map(|(applied, on_disk)| applied.id.min(on_disk.id))
}

fn same_up(applied: &LedgerEntry, on_disk: &Migration, strict: bool) -> bool {
    if strict {
        compute_digest(&applied.up_body) == compute_digest(&on_disk.up_body)
    } else {
        applied.up_digest == on_disk.up_digest
    }
}
