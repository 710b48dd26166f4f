//! Integration tests for loading a migrations directory and diffing it
//! against a recorded history.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use postgoose::migrate::{LedgerEntry, MigrationFileManager, diff};

fn write_migration(dir: &Path, id: i32, up: &str, down: &str) {
    fs::write(dir.join(format!("{id}_up.sql")), up).unwrap();
    fs::write(dir.join(format!("{id}_down.sql")), down).unwrap();
}

fn xs_directory() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_migration(
        dir.path(),
        1,
        "CREATE TABLE xs (x text); INSERT INTO xs VALUES ('a');",
        "DROP TABLE xs;",
    );
    write_migration(
        dir.path(),
        2,
        "INSERT INTO xs VALUES ('b');",
        "DELETE FROM xs WHERE x = 'b';",
    );
    write_migration(
        dir.path(),
        3,
        "INSERT INTO xs VALUES ('c');",
        "DELETE FROM xs WHERE x = 'c';",
    );
    dir
}

async fn load(dir: &TempDir) -> Vec<postgoose::migrate::Migration> {
    MigrationFileManager::new(dir.path()).load().await.unwrap()
}

#[tokio::test]
async fn test_fresh_database_applies_everything() {
    let dir = xs_directory();
    let migrations = load(&dir).await;

    let divergence = diff(&[], &migrations, true);

    assert!(divergence.old_branch.is_empty());
    assert_eq!(divergence.new_ids(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_applied_directory_is_up_to_date() {
    let dir = xs_directory();
    let migrations = load(&dir).await;
    let history: Vec<LedgerEntry> = migrations.iter().map(LedgerEntry::from_migration).collect();

    let divergence = diff(&history, &load(&dir).await, true);

    assert!(divergence.is_empty());
    assert_eq!(divergence.summary(), "Database is up to date");
}

#[tokio::test]
async fn test_appended_migration_is_the_only_change() {
    let dir = xs_directory();
    let history: Vec<LedgerEntry> = load(&dir)
        .await
        .iter()
        .map(LedgerEntry::from_migration)
        .collect();

    write_migration(dir.path(), 4, "INSERT INTO xs VALUES ('d');", "");
    let divergence = diff(&history, &load(&dir).await, true);

    assert!(!divergence.requires_rollback());
    assert_eq!(divergence.new_ids(), vec![4]);
}

#[tokio::test]
async fn test_edited_migration_diverges_at_its_id() {
    let dir = xs_directory();
    let history: Vec<LedgerEntry> = load(&dir)
        .await
        .iter()
        .map(LedgerEntry::from_migration)
        .collect();

    write_migration(
        dir.path(),
        2,
        "INSERT INTO xs VALUES ('b2');",
        "DELETE FROM xs WHERE x = 'b2';",
    );
    let divergence = diff(&history, &load(&dir).await, true);

    assert_eq!(divergence.old_ids(), vec![3, 2]);
    assert_eq!(divergence.new_ids(), vec![2, 3]);
    assert_eq!(
        divergence.old_branch[1].down_body,
        "DELETE FROM xs WHERE x = 'b';"
    );
    assert_eq!(divergence.summary(), "2 to roll back, 2 to apply");
}

#[tokio::test]
async fn test_removed_tail_is_left_applied() {
    let dir = xs_directory();
    let history: Vec<LedgerEntry> = load(&dir)
        .await
        .iter()
        .map(LedgerEntry::from_migration)
        .collect();

    fs::remove_file(dir.path().join("3_up.sql")).unwrap();
    fs::remove_file(dir.path().join("3_down.sql")).unwrap();
    let divergence = diff(&history, &load(&dir).await, true);

    assert!(divergence.is_empty());
}
