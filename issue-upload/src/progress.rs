//! Terminal progress bar

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

const BAR_LENGTH: usize = 50;
const FILL: char = '#';

/// Single-line progress bar redrawn in place on stdout
#[derive(Debug)]
pub struct Progress {
    enabled: bool,
    prefix: String,
    /// A bar is drawn and its line not yet ended
    mid_line: AtomicBool,
}

impl Progress {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            enabled: true,
            prefix: prefix.into(),
            mid_line: AtomicBool::new(false),
        }
    }

    /// A progress bar that prints nothing (quiet mode)
    pub fn hidden() -> Self {
        Self {
            enabled: false,
            prefix: String::new(),
            mid_line: AtomicBool::new(false),
        }
    }

    /// Redraw the bar for `iteration` of `total`
    pub fn update(&self, iteration: usize, total: usize) {
        if !self.enabled || total == 0 {
            return;
        }

        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "\r{}", render(&self.prefix, iteration, total));
        if iteration >= total {
            let _ = writeln!(stdout);
        }
        let _ = stdout.flush();
        self.mid_line.store(iteration < total, Ordering::Relaxed);
    }

    /// End a partially drawn bar so following output starts on a fresh line.
    /// Returns whether a line had to be ended.
    pub fn finish(&self) -> bool {
        if !self.mid_line.swap(false, Ordering::Relaxed) {
            return false;
        }
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout);
        let _ = stdout.flush();
        true
    }

    /// Print a message on its own line without garbling the bar
    pub fn message(&self, msg: &str) {
        if self.enabled {
            // Overwrites the bar; the next update redraws it
            let width = self.prefix.len() + BAR_LENGTH + 24;
            eprintln!("\r{:<width$}", msg, width = width);
            self.mid_line.store(false, Ordering::Relaxed);
        } else {
            eprintln!("{}", msg);
        }
    }
}

/// `prefix [####------] 40.0% (4/10)`
pub fn render(prefix: &str, iteration: usize, total: usize) -> String {
    let iteration = iteration.min(total);
    let percent = if total == 0 {
        100.0
    } else {
        100.0 * iteration as f64 / total as f64
    };
    let filled = if total == 0 {
        BAR_LENGTH
    } else {
        BAR_LENGTH * iteration / total
    };

    let bar: String = std::iter::repeat_n(FILL, filled)
        .chain(std::iter::repeat_n('-', BAR_LENGTH - filled))
        .collect();

    format!("{} [{}] {:.1}% ({}/{})", prefix, bar, percent, iteration, total)
}
