//! CSV data source.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{DataError, Result};
use crate::row::{RowSet, Value};
use crate::sources::DataSource;

/// The single pseudo-sheet a CSV file exposes
const CSV_SHEET: &str = "data";

/// Options for CSV parsing
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Whether to trim whitespace from fields
    pub trim: bool,
    /// Whether to allow flexible column counts
    pub flexible: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            trim: false,
            flexible: false,
        }
    }
}

impl CsvOptions {
    /// Create options for tab-separated values (TSV)
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Default::default()
        }
    }

    /// Create options for semicolon-separated values (common in European locales)
    pub fn semicolon() -> Self {
        Self {
            delimiter: b';',
            ..Default::default()
        }
    }
}

/// CSV file data source
///
/// Every field is text; empty fields are nulls. No type inference is done.
pub struct CsvSource {
    /// Path to the CSV file
    path: PathBuf,
    /// Parsing options
    options: CsvOptions,
}

impl CsvSource {
    /// Create a new CSV source from a file path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(path, CsvOptions::default())
    }

    /// Create a new CSV source with custom options
    pub fn with_options(path: impl AsRef<Path>, options: CsvOptions) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DataError::FileNotFound(path.display().to_string()));
        }

        Ok(Self {
            path: path.to_path_buf(),
            options,
        })
    }

    /// Parsing options in use
    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    fn read_grid(&self) -> Result<Vec<Vec<Value>>> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .has_headers(false) // RowSet handles the header itself
            .trim(if self.options.trim {
                csv::Trim::All
            } else {
                csv::Trim::None
            })
            .flexible(self.options.flexible)
            .from_reader(reader);

        let mut grid: Vec<Vec<Value>> = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            grid.push(
                record
                    .iter()
                    .map(|field| {
                        if field.is_empty() {
                            Value::Null
                        } else {
                            Value::from(field)
                        }
                    })
                    .collect(),
            );
        }

        if let Some(Value::Text(first)) = grid.first_mut().and_then(|line| line.first_mut()) {
            if let Some(stripped) = first.strip_prefix('\u{feff}') {
                *first = stripped.to_string();
            }
        }

        Ok(grid)
    }
}

impl DataSource for CsvSource {
    /// CSV has no sheets; `sheet` is ignored
    fn read_rows(&self, _sheet: Option<&str>) -> Result<RowSet> {
        Ok(RowSet::from_grid(self.read_grid()?))
    }

    fn list_sheets(&self) -> Result<Vec<String>> {
        Ok(vec![CSV_SHEET.to_string()])
    }

    fn default_sheet(&self) -> Option<String> {
        Some(CSV_SHEET.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_csv_read_rows() {
        let csv_content = "Name,Age,Score\nAlice,30,95\nBob,25,87\n";
        let file = create_test_csv(csv_content);

        let source = CsvSource::new(file.path()).unwrap();
        let rows = source.read_rows(None).unwrap();

        assert_eq!(rows.headers(), &["Name", "Age", "Score"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.rows()[0].get("Name"), Some(&Value::from("Alice")));
        // No type inference for CSV
        assert_eq!(rows.rows()[1].get("Age"), Some(&Value::from("25")));
    }

    #[test]
    fn test_csv_empty_field_is_null() {
        let file = create_test_csv("id,note\nRD001,\n");

        let source = CsvSource::new(file.path()).unwrap();
        let rows = source.read_rows(None).unwrap();

        assert_eq!(rows.rows()[0].get("note"), Some(&Value::Null));
    }

    #[test]
    fn test_csv_tsv() {
        let tsv_content = "Name\tAge\tScore\nAlice\t30\t95\n";
        let file = create_test_csv(tsv_content);

        let source = CsvSource::with_options(file.path(), CsvOptions::tsv()).unwrap();
        let rows = source.read_rows(None).unwrap();

        assert_eq!(rows.headers(), &["Name", "Age", "Score"]);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_csv_semicolon() {
        let csv_content = "Name;Age;Score\nAlice;30;95\n";
        let file = create_test_csv(csv_content);

        let source = CsvSource::with_options(file.path(), CsvOptions::semicolon()).unwrap();
        let rows = source.read_rows(None).unwrap();

        assert_eq!(rows.headers(), &["Name", "Age", "Score"]);
    }

    #[test]
    fn test_csv_quoted_fields() {
        let csv_content = r#"Name,Description
"Alice","A ""quoted"" value"
"Bob","Value with, comma"
"#;
        let file = create_test_csv(csv_content);

        let source = CsvSource::new(file.path()).unwrap();
        let rows = source.read_rows(None).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows.rows()[0].get("Description"),
            Some(&Value::from(r#"A "quoted" value"#))
        );
        assert_eq!(
            rows.rows()[1].get("Description"),
            Some(&Value::from("Value with, comma"))
        );
    }

    #[test]
    fn test_csv_byte_order_mark_is_stripped() {
        let file = create_test_csv("\u{feff}研发活动编号,研发活动名称\nRD001,测试项目\n");

        let source = CsvSource::new(file.path()).unwrap();
        let rows = source.read_rows(None).unwrap();

        assert_eq!(rows.headers(), &["研发活动编号", "研发活动名称"]);
    }

    #[test]
    fn test_csv_blank_lines_are_dropped() {
        let file = create_test_csv("a,b\n1,2\n,\n3,4\n");

        let source = CsvSource::new(file.path()).unwrap();
        let rows = source.read_rows(None).unwrap();

        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_csv_ragged_rows() {
        let file = create_test_csv("a,b\n1\n");

        let strict = CsvSource::new(file.path()).unwrap();
        assert!(matches!(strict.read_rows(None), Err(DataError::Csv(_))));

        let options = CsvOptions {
            flexible: true,
            ..Default::default()
        };
        let lenient = CsvSource::with_options(file.path(), options).unwrap();
        let rows = lenient.read_rows(None).unwrap();
        assert_eq!(rows.rows()[0].get("b"), Some(&Value::Null));
    }

    #[test]
    fn test_csv_list_sheets() {
        let file = create_test_csv("A,B\n1,2\n");

        let source = CsvSource::new(file.path()).unwrap();
        assert_eq!(source.list_sheets().unwrap(), vec!["data".to_string()]);
        assert_eq!(source.default_sheet(), Some("data".to_string()));
    }

    #[test]
    fn test_csv_file_not_found() {
        let result = CsvSource::new("/nonexistent/path/file.csv");
        assert!(matches!(result, Err(DataError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_trim_whitespace() {
        let csv_content = "Name , Age \n Alice , 30 \n";
        let file = create_test_csv(csv_content);

        let options = CsvOptions {
            trim: true,
            ..Default::default()
        };
        let source = CsvSource::with_options(file.path(), options).unwrap();
        let rows = source.read_rows(None).unwrap();

        assert_eq!(rows.headers(), &["Name", "Age"]);
        assert_eq!(rows.rows()[0].get("Name"), Some(&Value::from("Alice")));
    }
}
