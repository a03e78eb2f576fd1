//! Data source implementations.
//!
//! This module contains adapters for the tabular formats rows can come from.

pub mod csv;
pub mod excel;

pub use csv::{CsvOptions, CsvSource};
pub use excel::ExcelSource;

use std::path::Path;

use crate::error::{DataError, Result};
use crate::row::RowSet;

/// Trait for data sources that can provide row data
pub trait DataSource {
    /// Read every row of a sheet
    ///
    /// # Arguments
    /// * `sheet` - Sheet name for multi-sheet sources; `None` picks the default sheet
    ///
    /// # Returns
    /// The header and the non-blank rows below it
    fn read_rows(&self, sheet: Option<&str>) -> Result<RowSet>;

    /// List available sheets/tables in the source
    fn list_sheets(&self) -> Result<Vec<String>>;

    /// Get the default sheet name
    fn default_sheet(&self) -> Option<String>;
}

/// Open a data file with the reader its extension calls for
pub fn open_source(path: impl AsRef<Path>) -> Result<Box<dyn DataSource>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Box::new(ExcelSource::new(path)?)),
        "csv" => Ok(Box::new(CsvSource::new(path)?)),
        "tsv" => Ok(Box::new(CsvSource::with_options(path, CsvOptions::tsv())?)),
        _ => Err(DataError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Read all rows of `path`, optionally from a named sheet
pub fn open_rows(path: impl AsRef<Path>, sheet: Option<&str>) -> Result<RowSet> {
    open_source(path)?.read_rows(sheet)
}
