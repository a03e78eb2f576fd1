//! Output file naming
//!
//! Each generated document is named `<first field>-<second field>.<ext>`
//! from two designated columns of its row.

use dokmerge_data::Row;

use crate::error::{MergeError, Result};

/// Default first naming field (activity number)
pub const DEFAULT_ID_FIELD: &str = "研发活动编号";

/// Default second naming field (activity name)
pub const DEFAULT_NAME_FIELD: &str = "研发活动名称";

/// Default output extension
pub const DEFAULT_EXTENSION: &str = "docx";

/// Characters Windows and Unix file systems refuse in a file name
const ILLEGAL: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Builds output file names from row fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNamer {
    id_field: String,
    name_field: String,
    extension: String,
}

impl OutputNamer {
    /// Name files from the two given fields
    pub fn new(id_field: impl Into<String>, name_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
            name_field: name_field.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Use another extension (given without the dot)
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// The two naming fields, in order
    pub fn fields(&self) -> [&str; 2] {
        [self.id_field.as_str(), self.name_field.as_str()]
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// File name for `row`
    ///
    /// Null values contribute nothing; characters that are illegal in file
    /// names become `_`.
    pub fn file_name(&self, row: &Row) -> Result<String> {
        let part = |field: &str| -> Result<String> {
            row.get(field)
                .map(|v| v.to_string())
                .ok_or_else(|| MergeError::MissingNamingField(field.to_string()))
        };
        let stem = format!("{}-{}", part(&self.id_field)?, part(&self.name_field)?);
        Ok(format!("{}.{}", sanitize_file_name(&stem), self.extension))
    }
}

impl Default for OutputNamer {
    fn default() -> Self {
        Self::new(DEFAULT_ID_FIELD, DEFAULT_NAME_FIELD)
    }
}

/// Replace path separators, reserved characters and controls with `_`
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if ILLEGAL.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dokmerge_data::Value;

    #[test]
    fn test_default_fields() {
        let row: Row = [("研发活动编号", "RD001"), ("研发活动名称", "测试项目")]
            .into_iter()
            .collect();
        let name = OutputNamer::default().file_name(&row).unwrap();
        assert_eq!(name, "RD001-测试项目.docx");
    }

    #[test]
    fn test_canonical_values() {
        let row: Row = [("id", Value::Number(7.0)), ("name", Value::Null)]
            .into_iter()
            .collect();
        let name = OutputNamer::new("id", "name").file_name(&row).unwrap();
        assert_eq!(name, "7-.docx");
    }

    #[test]
    fn test_missing_field() {
        let row: Row = [("id", "1")].into_iter().collect();
        match OutputNamer::new("id", "name").file_name(&row) {
            Err(MergeError::MissingNamingField(field)) => assert_eq!(field, "name"),
            other => panic!("expected MissingNamingField, got {:?}", other),
        }
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_file_name("a/b\\c:d*e?f\"g<h>i|j"), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_file_name("line\nbreak"), "line_break");
        assert_eq!(sanitize_file_name("研发 v1.0"), "研发 v1.0");
    }

    #[test]
    fn test_path_traversal_is_flattened() {
        let row: Row = [("id", "../.."), ("name", "etc/passwd")].into_iter().collect();
        let name = OutputNamer::new("id", "name").file_name(&row).unwrap();
        assert!(!name.contains('/'));
        assert_eq!(name, ".._..-etc_passwd.docx");
    }

    #[test]
    fn test_with_extension() {
        let namer = OutputNamer::new("a", "b").with_extension(".docm");
        assert_eq!(namer.extension(), "docm");
        assert_eq!(namer.fields(), ["a", "b"]);
    }
}
