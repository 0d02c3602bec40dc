//! File logging setup
//!
//! Log records go through the `log` facade to an `env_logger` instance that
//! appends to the log file given on the command line. Lines are rendered
//! from the template in the `[logging]` config section. Known placeholders:
//! `{asctime}`, `{level}`, `{target}`, `{module}`, `{file}`, `{line}` and
//! `{message}`.

use anyhow::{Context, Result};
use chrono::Local;
use log::LevelFilter;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// The parts of a log record a template can refer to
#[derive(Debug, Clone)]
pub struct LogLine<'a> {
    pub asctime: String,
    pub level: &'a str,
    pub target: &'a str,
    pub module: &'a str,
    pub file: &'a str,
    pub line: Option<u32>,
    pub message: String,
}

/// Substitute the placeholders of `template`
pub fn render(template: &str, line: &LogLine<'_>) -> String {
    let line_no = line.line.map(|l| l.to_string()).unwrap_or_default();
    template
        .replace("{asctime}", &line.asctime)
        .replace("{level}", line.level)
        .replace("{target}", line.target)
        .replace("{module}", line.module)
        .replace("{file}", line.file)
        .replace("{line}", &line_no)
        // Message last so braces inside it are left alone
        .replace("{message}", &line.message)
}

/// Install the global logger
pub fn init(level: LevelFilter, log_file: &Path, template: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file: {}", log_file.display()))?;

    let template = template.to_string();

    env_logger::Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(move |buf, record| {
            let line = LogLine {
                asctime: Local::now().format("%Y-%m-%d %H:%M:%S,%3f").to_string(),
                level: record.level().as_str(),
                target: record.target(),
                module: record.module_path().unwrap_or_default(),
                file: record.file().unwrap_or_default(),
                line: record.line(),
                message: record.args().to_string(),
            };
            writeln!(buf, "{}", render(&template, &line))
        })
        .try_init()
        .context("Logger already initialized")?;

    Ok(())
}
