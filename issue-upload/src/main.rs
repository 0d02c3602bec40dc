use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use colored::*;

mod api;
mod cli;
mod config;
mod context;
mod issues;
mod logging;
mod progress;
mod sheet;

use cli::Cli;
use config::Config;
use context::AppContext;
use issues::DispatchSummary;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{:#}", err);
            eprintln!("{} {:#}", "Error:".bright_red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<DispatchSummary> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let (config, config_path) = Config::load(cli.config.as_deref())?;
    logging::init(cli.verbose.level_filter(), &cli.log_file, &config.logging.format)?;

    log::debug!("options = {:?}", cli);
    log::debug!("configuration read from {}", config_path.display());

    cli.validate()?;
    let sheet = sheet::read_issue_sheet(&cli.spreadsheet)?;

    let ctx = AppContext::connect(config, cli).await?;
    issues::run(&ctx, &sheet).await
}

fn print_summary(summary: &DispatchSummary) {
    println!(
        "{} {} of {} rows updated, {} skipped, {} blank",
        "Done:".bright_green().bold(),
        summary.committed.to_string().bright_green(),
        summary.total(),
        summary.skipped().to_string().yellow(),
        summary.blank
    );
    if summary.not_found > 0 {
        println!("  {} rows referenced records that do not exist", summary.not_found);
    }
    if summary.unresolved > 0 {
        println!("  {} rows had no usable key", summary.unresolved);
    }
}
