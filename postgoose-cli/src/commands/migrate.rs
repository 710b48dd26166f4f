//! `postgoose <DIRECTORY>` - reconcile the database with the migrations directory.

use std::path::Path;

use postgoose_migrate::{LedgerEntry, Migration, MigrationFileManager, ReconcileReport};
use postgoose_postgres::PgReconciler;
use tracing::info;

use crate::cli::Cli;
use crate::config::{Config, Settings};
use crate::error::{CliError, CliResult};
use crate::output::{self, kv, success};

/// Run a reconciliation
pub async fn run(cli: Cli) -> CliResult<()> {
    let cwd = std::env::current_dir()?;
    let file = match Config::discover(cli.config.as_deref(), &cwd)? {
        Some((path, config)) => {
            info!(path = %path.display(), "Loaded configuration file");
            config
        }
        None => Config::default(),
    };
    let settings = Settings::resolve(&cli, &file)?;

    output::header("postgoose");
    print_settings(&cli.directory, &settings);

    // Validate the directory before touching the database
    let migrations = MigrationFileManager::new(&cli.directory).load().await?;
    if migrations.is_empty() {
        return Err(CliError::NothingToDo(cli.directory));
    }
    kv("Migrations", &migrations.len().to_string());
    output::newline();

    let reconciler = PgReconciler::new(settings.database, settings.ledger, settings.options);
    let report = reconciler.run(&migrations).await?;

    print_report(&report, &migrations, cli.verbose);
    Ok(())
}

fn print_settings(directory: &Path, settings: &Settings) {
    let db = &settings.database;

    output::section("Arguments");
    kv("Directory", &directory.display().to_string());
    kv("Host", &db.host);
    kv("Port", &db.port.to_string());
    kv("User", &db.user);
    if let Some(password) = &db.password {
        kv("Password", &output::mask_password(password));
    }
    kv("Database", &db.database);
    kv("Schema", db.schema.as_deref().unwrap_or_default());
    if let Some(role) = &db.role {
        kv("Role", role);
    }
    kv("Ledger table", &settings.ledger.table);
    kv("Auto apply down", &settings.options.auto_apply_down.to_string());
    kv(
        "Strict digest check",
        &settings.options.strict_digest_check.to_string(),
    );
}

fn print_report(report: &ReconcileReport, migrations: &[Migration], verbose: bool) {
    if !report.has_changes() {
        success("Database is up to date");
        return;
    }

    for line in report_lines(report, migrations, verbose) {
        match line {
            ReportLine::Step(text) => output::list_item(&text),
            ReportLine::Body(body) => output::dim(body),
        }
    }

    output::newline();
    success(&report.summary());
}

/// One line of the run report.
#[derive(Debug, PartialEq, Eq)]
enum ReportLine<'a> {
    Step(String),
    Body(&'a str),
}

/// Lines describing each rollback and apply; `verbose` adds the SQL that ran.
fn report_lines<'a>(
    report: &'a ReconcileReport,
    migrations: &'a [Migration],
    verbose: bool,
) -> Vec<ReportLine<'a>> {
    let mut lines = Vec::new();

    for id in &report.rolled_back {
        lines.push(ReportLine::Step(format!("Rolled back {} (down)", id)));
        if verbose {
            if let Some(entry) = report.rolled_back_entries.iter().find(|e| e.id == *id) {
                lines.push(ReportLine::Body(&entry.down_body));
            }
        }
    }

    for id in &report.applied {
        lines.push(ReportLine::Step(format!("Applied {} (up)", id)));
        if verbose {
            if let Some(migration) = migrations.iter().find(|m| m.id == *id) {
                lines.push(ReportLine::Body(&migration.up_body));
            }
        }
    }

    lines
}

/// Print every down script that would run, for a blocked rollback.
pub fn print_pending_downs(pending: &[LedgerEntry]) {
    let rule = "=".repeat(60);

    output::error(&rule);
    output::error("Downs detected:");
    for entry in pending {
        output::code(&format!(
            "/* migration_id: {} */\n{}",
            entry.id, entry.down_body
        ));
    }
    output::error(&rule);
    output::error("Re-run with --auto-apply-down if you would like downs executed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn edited_run() -> (ReconcileReport, Vec<Migration>) {
        let old = Migration::new(2, "INSERT INTO xs VALUES ('b');", "DELETE FROM xs WHERE x = 'b';");
        let new = Migration::new(2, "INSERT INTO xs VALUES ('b2');", "DELETE FROM xs WHERE x = 'b2';");
        let report = ReconcileReport {
            rolled_back: vec![2],
            rolled_back_entries: vec![LedgerEntry::from_migration(&old)],
            applied: vec![2],
            duration_ms: 3,
        };
        (report, vec![new])
    }

    #[test]
    fn test_report_lines_verbose_shows_down_and_up_bodies() {
        let (report, migrations) = edited_run();

        assert_eq!(
            report_lines(&report, &migrations, true),
            vec![
                ReportLine::Step("Rolled back 2 (down)".to_string()),
                ReportLine::Body("DELETE FROM xs WHERE x = 'b';"),
                ReportLine::Step("Applied 2 (up)".to_string()),
                ReportLine::Body("INSERT INTO xs VALUES ('b2');"),
            ]
        );
    }

    #[test]
    fn test_report_lines_quiet_lists_ids_only() {
        let (report, migrations) = edited_run();

        assert_eq!(
            report_lines(&report, &migrations, false),
            vec![
                ReportLine::Step("Rolled back 2 (down)".to_string()),
                ReportLine::Step("Applied 2 (up)".to_string()),
            ]
        );
    }
}
