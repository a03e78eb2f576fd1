//! Excel/ODS data source using calamine.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{DataError, Result};
use crate::row::{RowSet, Value};
use crate::sources::DataSource;

/// Spreadsheet workbook data source (.xlsx, .xlsm, .xls, .ods)
pub struct ExcelSource {
    /// Path to the workbook
    path: PathBuf,
    /// Sheet names cache
    sheet_names: Vec<String>,
}

impl ExcelSource {
    /// Open a workbook, detecting its format from the extension
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DataError::FileNotFound(path.display().to_string()));
        }

        let workbook = open_workbook_auto(path)
            .map_err(|e| DataError::WorkbookOpen(format!("{}: {}", path.display(), e)))?;

        let sheet_names = workbook.sheet_names().to_vec();

        Ok(Self {
            path: path.to_path_buf(),
            sheet_names,
        })
    }

    fn worksheet(&self, sheet: &str) -> Result<Range<Data>> {
        if !self.sheet_names.iter().any(|s| s == sheet) {
            return Err(DataError::SheetNotFound(sheet.to_string()));
        }

        // Re-open workbook for reading (calamine requires this pattern)
        let mut workbook = open_workbook_auto(&self.path)
            .map_err(|e| DataError::WorkbookOpen(format!("{}: {}", self.path.display(), e)))?;

        Ok(workbook.worksheet_range(sheet)?)
    }
}

impl DataSource for ExcelSource {
    fn read_rows(&self, sheet: Option<&str>) -> Result<RowSet> {
        let sheet = match sheet {
            Some(s) => s.to_string(),
            None => self
                .default_sheet()
                .ok_or_else(|| DataError::SheetNotFound("No sheets in workbook".to_string()))?,
        };

        let sheet_range = self.worksheet(&sheet)?;
        let grid = sheet_range
            .rows()
            .map(|cells| cells.iter().map(cell_to_value).collect::<Vec<_>>());

        Ok(RowSet::from_grid(grid))
    }

    fn list_sheets(&self) -> Result<Vec<String>> {
        Ok(self.sheet_names.clone())
    }

    fn default_sheet(&self) -> Option<String> {
        self.sheet_names.first().cloned()
    }
}

/// Map a calamine cell to a row value
fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => Value::from(*f),
        Data::Bool(b) => Value::Text(if *b { "True" } else { "False" }.to_string()),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                Value::from(dt.as_f64())
            } else {
                dt.as_datetime()
                    .map(Value::Date)
                    .unwrap_or_else(|| Value::from(dt.as_f64()))
            }
        }
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(Value::Date)
            .unwrap_or_else(|| Value::Text(s.clone())),
        Data::DurationIso(s) => Value::Text(s.clone()),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    s.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| s.parse::<NaiveDate>().ok().map(|d| d.and_time(NaiveTime::MIN)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_to_value() {
        assert_eq!(cell_to_value(&Data::Empty), Value::Null);
        assert_eq!(
            cell_to_value(&Data::String("hello".to_string())),
            Value::from("hello")
        );
        assert_eq!(cell_to_value(&Data::Int(42)), Value::Number(42.0));
        assert_eq!(cell_to_value(&Data::Float(3.14)), Value::Number(3.14));
        assert_eq!(cell_to_value(&Data::Float(f64::NAN)), Value::Null);
        assert_eq!(cell_to_value(&Data::Bool(true)), Value::from("True"));
        assert_eq!(cell_to_value(&Data::Bool(false)), Value::from("False"));
        assert_eq!(
            cell_to_value(&Data::Error(calamine::CellErrorType::NA)),
            Value::Null
        );
    }

    #[test]
    fn test_iso_strings() {
        let date = cell_to_value(&Data::DateTimeIso("2024-01-15".to_string()));
        assert_eq!(date.to_string(), "2024-01-15 00:00:00");

        let stamp = cell_to_value(&Data::DateTimeIso("2024-01-15T08:30:00".to_string()));
        assert_eq!(stamp.to_string(), "2024-01-15 08:30:00");

        let junk = cell_to_value(&Data::DateTimeIso("soon".to_string()));
        assert_eq!(junk, Value::from("soon"));
    }
}
