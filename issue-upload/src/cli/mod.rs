//! Command-line interface

use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;

/// Date format of the tour date argument
pub const DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Parser, Debug, Clone)]
#[command(name = "issue-upload")]
#[command(version)]
#[command(about = "Upload inspection issues from a spreadsheet to Salesforce")]
#[command(long_about = "Upload inspection issues from a spreadsheet to Salesforce.

The first column of the spreadsheet holds either the contract reference of an
inspection or the Salesforce id of the inspection itself; contract references
are resolved against the inspections created one day around the tour date.
The other columns are picked by caption prefix (AD, BT, SW, Date, Status),
case-insensitive and in any order. Columns with other captions are ignored.")]
pub struct Cli {
    /// Spreadsheet holding the issues (xlsx, xls or ods)
    pub spreadsheet: PathBuf,

    /// Tour date the inspections were created around (DD.MM.YYYY)
    #[arg(value_parser = parse_date)]
    pub date: NaiveDate,

    /// Log level
    #[arg(short = 'v', long, value_enum, default_value_t = Verbosity::Error)]
    pub verbose: Verbosity,

    /// Log file, appended to
    #[arg(short = 'l', long = "logging", default_value = "issue-upload.log")]
    pub log_file: PathBuf,

    /// Don't show progress
    #[arg(short, long)]
    pub quiet: bool,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Skip rows whose key matches no inspection instead of using it as a record id
    #[arg(long)]
    pub strict: bool,

    /// Print the updates instead of sending them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Everything, including trace output
    Notset,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Verbosity {
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Notset => LevelFilter::Trace,
            Verbosity::Debug => LevelFilter::Debug,
            Verbosity::Info => LevelFilter::Info,
            Verbosity::Warning => LevelFilter::Warn,
            // `log` has no level above error
            Verbosity::Error | Verbosity::Critical => LevelFilter::Error,
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| format!("'{}' is not a valid date, expected DD.MM.YYYY", value))
}

impl Cli {
    /// Checks clap cannot express
    pub fn validate(&self) -> Result<()> {
        if !self.spreadsheet.is_file() {
            bail!("File not found: {}", self.spreadsheet.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_arguments() {
        let cli = Cli::try_parse_from(["issue-upload", "issues.xlsx", "16.02.2018"]).unwrap();
        assert_eq!(cli.spreadsheet, PathBuf::from("issues.xlsx"));
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2018, 2, 16).unwrap());
        assert_eq!(cli.verbose, Verbosity::Error);
        assert_eq!(cli.log_file, PathBuf::from("issue-upload.log"));
        assert!(!cli.quiet);
        assert!(!cli.strict);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_options() {
        let cli = Cli::try_parse_from([
            "issue-upload",
            "-v",
            "warning",
            "-l",
            "/tmp/upload.log",
            "-q",
            "--strict",
            "issues.xlsx",
            "1.3.2018",
        ])
        .unwrap();
        assert_eq!(cli.verbose.level_filter(), LevelFilter::Warn);
        assert_eq!(cli.log_file, PathBuf::from("/tmp/upload.log"));
        assert!(cli.quiet);
        assert!(cli.strict);
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2018, 3, 1).unwrap());
    }

    #[test]
    fn test_too_few_arguments() {
        assert!(Cli::try_parse_from(["issue-upload", "issues.xlsx"]).is_err());
        assert!(Cli::try_parse_from(["issue-upload"]).is_err());
    }

    #[test]
    fn test_invalid_date() {
        let err = Cli::try_parse_from(["issue-upload", "issues.xlsx", "2018-02-16"]).unwrap_err();
        assert!(err.to_string().contains("not a valid date"));
        assert!(Cli::try_parse_from(["issue-upload", "issues.xlsx", "31.02.2018"]).is_err());
    }

    #[test]
    fn test_unknown_level_rejected() {
        assert!(
            Cli::try_parse_from(["issue-upload", "-v", "loud", "issues.xlsx", "16.02.2018"])
                .is_err()
        );
    }

    #[test]
    fn test_validate_missing_file() {
        let cli = Cli::try_parse_from(["issue-upload", "/nonexistent/x.xlsx", "16.02.2018"]).unwrap();
        let err = cli.validate().unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_notset_logs_everything() {
        let cli =
            Cli::try_parse_from(["issue-upload", "-v", "notset", "issues.xlsx", "16.02.2018"])
                .unwrap();
        assert_eq!(cli.verbose, Verbosity::Notset);
        assert_eq!(cli.verbose.level_filter(), LevelFilter::Trace);
    }

    #[test]
    fn test_critical_maps_to_error() {
        assert_eq!(Verbosity::Critical.level_filter(), LevelFilter::Error);
    }
}
