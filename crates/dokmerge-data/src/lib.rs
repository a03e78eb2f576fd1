//! # dokmerge-data
//!
//! Row data for dokmerge: typed cell values and the readers that produce
//! them from spreadsheets and CSV files.
//!
//! ## Features
//!
//! - **Typed values**: cells become text, numbers, dates or nulls, each with
//!   one canonical textual form
//! - **Excel Support**: Read `.xlsx`/`.xls`/`.ods` sheets using `calamine`
//! - **CSV Support**: Read delimited text using `csv`
//!
//! ## Example
//!
//! ```rust,no_run
//! use dokmerge_data::open_rows;
//!
//! let rows = open_rows("activities.xlsx", None)?;
//! rows.require_columns(&["id", "name"])?;
//!
//! for row in &rows {
//!     println!("{:?}", row.get("name"));
//! }
//! # Ok::<(), dokmerge_data::DataError>(())
//! ```

pub mod error;
pub mod row;
pub mod sources;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-exports
pub use error::{DataError, Result};
pub use row::{Row, RowSet, Value};
pub use sources::{open_rows, open_source, CsvOptions, CsvSource, DataSource, ExcelSource};
