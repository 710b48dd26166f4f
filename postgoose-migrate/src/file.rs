//! Migration directory loading and validation.
//!
//! A migrations directory holds pairs of `{id}_up.sql` / `{id}_down.sql` files
//! for every id from 1 up to the highest id present:
//!
//! ```text
//! migrations/
//! ├── 1_up.sql
//! ├── 1_down.sql
//! ├── 2_up.sql
//! └── 2_down.sql
//! ```
//!
//! Files that do not end in `.sql` are ignored. Everything else must fit the
//! pattern or the whole load fails.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{MigrateResult, MigrationError};
use crate::migration::{Direction, Migration, MigrationId};

const SQL_EXTENSION: &str = ".sql";

/// Reads the filesystem migration set from a directory.
#[derive(Debug, Clone)]
pub struct MigrationFileManager {
    migrations_dir: PathBuf,
}

impl MigrationFileManager {
    /// Create a new file manager.
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
        }
    }

    /// Get the migrations directory.
    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Load and validate every migration, ascending by id.
    ///
    /// An empty directory yields an empty set. Any validation or read failure
    /// aborts the load; a partial set is never returned.
    pub async fn load(&self) -> MigrateResult<Vec<Migration>> {
        let names = self.list_sql_files().await?;
        let max_id = validate_names(&names)?;

        let mut migrations = Vec::with_capacity(max_id.max(0) as usize);
        for id in 1..=max_id {
            let up_body = self.read_body(id, Direction::Up).await?;
            let down_body = self.read_body(id, Direction::Down).await?;
            migrations.push(Migration::new(id, up_body, down_body));
        }

        debug!(
            dir = %self.migrations_dir.display(),
            count = migrations.len(),
            "Loaded filesystem migrations"
        );

        Ok(migrations)
    }

    /// List the names of all `.sql` files, sorted.
    async fn list_sql_files(&self) -> MigrateResult<Vec<String>> {
        let dir = &self.migrations_dir;

        match tokio::fs::metadata(dir).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(MigrationError::NotADirectory(dir.clone())),
        }

        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| MigrationError::io(dir, e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| MigrationError::io(dir, e))?
        {
            let path = entry.path();
            if path.is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(SQL_EXTENSION) {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    async fn read_body(&self, id: MigrationId, direction: Direction) -> MigrateResult<String> {
        let path = self.migrations_dir.join(direction.file_name(id));
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| MigrationError::io(path, e))
    }
}

/// Validate a directory listing and return the highest migration id.
///
/// Returns 0 for an empty listing.
pub fn validate_names(names: &[String]) -> MigrateResult<MigrationId> {
    let mut max_id: MigrationId = 0;
    for name in names {
        max_id = max_id.max(parse_migration_id(name)?);
    }

    if names.is_empty() {
        return Ok(0);
    }

    let present: BTreeSet<&str> = names.iter().map(String::as_str).collect();
    let mut expected = BTreeSet::new();

    for id in 1..=max_id {
        for direction in [Direction::Up, Direction::Down] {
            let file_name = direction.file_name(id);
            if !present.contains(file_name.as_str()) {
                return Err(MigrationError::IncompleteMigration { id, direction });
            }
            expected.insert(file_name);
        }
    }

    let unexpected: Vec<String> = names
        .iter()
        .filter(|name| !expected.contains(name.as_str()))
        .cloned()
        .collect();

    if !unexpected.is_empty() {
        return Err(MigrationError::UnexpectedFile(unexpected));
    }

    Ok(max_id)
}

/// Extract the leading integer id from a file name such as `12_up.sql`.
pub fn parse_migration_id(file_name: &str) -> MigrateResult<MigrationId> {
    let (prefix, _) = file_name
        .split_once('_')
        .ok_or_else(|| MigrationError::MalformedFilename(file_name.to_string()))?;

    prefix
        .parse()
        .map_err(|_| MigrationError::MalformedFilename(file_name.to_string()))
}
