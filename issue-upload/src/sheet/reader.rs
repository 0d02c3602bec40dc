//! Read the issue sheet from a workbook
//!
//! The first worksheet is used. Its first row holds the captions, every
//! following row is a data row. Cells are rendered to text the way they
//! would be sent to the API.

use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDate};
use std::path::Path;

/// A data row and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    /// 1-based row number as shown by spreadsheet applications
    pub number: usize,
    pub cells: Vec<String>,
}

impl DataRow {
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

/// Captions and data rows of one worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct IssueSheet {
    pub sheet_name: String,
    pub captions: Vec<String>,
    pub rows: Vec<DataRow>,
}

/// Open a workbook (xlsx, xlsm, xls, ods) and read its first worksheet
pub fn read_issue_sheet<P: AsRef<Path>>(path: P) -> Result<IssueSheet> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open spreadsheet: {}", path.display()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .with_context(|| format!("Spreadsheet has no worksheets: {}", path.display()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed to read sheet: {}", sheet_name))?;

    // Ranges start at the first used cell, not necessarily A1
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

    let mut rows = range.rows();
    let captions: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(cell_text).collect(),
        None => bail!("Sheet '{}' is empty, expected a caption row", sheet_name),
    };

    let rows: Vec<DataRow> = rows
        .enumerate()
        .map(|(idx, row)| DataRow {
            number: first_row + idx + 2,
            cells: row.iter().map(cell_text).collect(),
        })
        .collect();

    log::info!(
        "read {} data rows with captions {:?} from sheet '{}'",
        rows.len(),
        captions,
        sheet_name
    );

    Ok(IssueSheet {
        sheet_name,
        captions,
        rows,
    })
}

/// Render a cell as text
///
/// Whole numbers lose their fraction (keys are often typed as numbers),
/// dates become `YYYY-MM-DD`, errors and empty cells become "".
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_text(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

/// Convert an Excel serial date (days since 1899-12-30) to text
fn excel_serial_to_text(serial: f64) -> String {
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30) else {
        return serial.to_string();
    };

    let days = serial.trunc() as i64;
    let seconds = ((serial - serial.trunc()) * 86_400.0).round() as i64;

    let Some(datetime) = epoch
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.checked_add_signed(Duration::days(days)))
        .and_then(|day| day.checked_add_signed(Duration::seconds(seconds)))
    else {
        return serial.to_string();
    };

    if seconds == 0 {
        datetime.format("%Y-%m-%d").to_string()
    } else {
        datetime.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    #[test]
    fn test_cell_text_numbers() {
        assert_eq!(cell_text(&Data::Float(4711.0)), "4711");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Int(-3)), "-3");
        assert_eq!(cell_text(&Data::Bool(true)), "true");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn test_excel_serial_dates() {
        assert_eq!(excel_serial_to_text(43147.0), "2018-02-16");
        assert_eq!(excel_serial_to_text(43147.5), "2018-02-16T12:00:00");
    }

    #[test]
    fn test_read_issue_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let date_format = Format::new().set_num_format("dd.mm.yyyy");

        sheet.write_string(0, 0, "Key").unwrap();
        sheet.write_string(0, 1, "AD Issue").unwrap();
        sheet.write_string(0, 2, "Date").unwrap();

        sheet.write_string(1, 0, "X1").unwrap();
        sheet.write_string(1, 1, "missing stock").unwrap();
        let date = ExcelDateTime::from_ymd(2018, 2, 16).unwrap();
        sheet.write_datetime_with_format(1, 2, &date, &date_format).unwrap();

        sheet.write_number(2, 0, 1234.0).unwrap();
        sheet.write_string(2, 1, "display broken").unwrap();

        workbook.save(&path).unwrap();

        let issues = read_issue_sheet(&path).unwrap();
        assert_eq!(issues.sheet_name, "Sheet1");
        assert_eq!(issues.captions, vec!["Key", "AD Issue", "Date"]);
        assert_eq!(issues.rows.len(), 2);

        assert_eq!(issues.rows[0].number, 2);
        assert_eq!(issues.rows[0].cells, vec!["X1", "missing stock", "2018-02-16"]);

        assert_eq!(issues.rows[1].number, 3);
        assert_eq!(issues.rows[1].cells, vec!["1234", "display broken", ""]);
    }

    #[test]
    fn test_missing_file() {
        let err = read_issue_sheet("/nonexistent/issues.xlsx").unwrap_err();
        assert!(err.to_string().contains("Failed to open spreadsheet"));
    }

    #[test]
    fn test_blank_row() {
        let row = DataRow {
            number: 5,
            cells: vec!["".into(), "  ".into()],
        };
        assert!(row.is_blank());
    }
}
