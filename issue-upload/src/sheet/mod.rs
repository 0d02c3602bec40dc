//! Spreadsheet input

pub mod reader;

pub use reader::{DataRow, IssueSheet, read_issue_sheet};
