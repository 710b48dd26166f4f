//! postgoose - reconcile a PostgreSQL database with numbered SQL migrations.

use clap::Parser;

use postgoose_cli::cli::Cli;
use postgoose_cli::commands;
use postgoose_cli::error::{CliError, CliResult, exit_code};
use postgoose_cli::logging;
use postgoose_cli::output;
use postgoose_migrate::MigrationError;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if e.print().is_err() {
                eprintln!("{e}");
            }
            let code = if e.use_stderr() { exit_code::FAILURE } else { 0 };
            std::process::exit(code);
        }
    };

    logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        output::newline();
        match &e {
            CliError::Migration(MigrationError::DownsRequireConfirmation(pending)) => {
                commands::migrate::print_pending_downs(pending);
            }
            _ => output::error(&e.to_string()),
        }
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    commands::migrate::run(cli).await
}
