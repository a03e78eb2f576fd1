//! Batch generation: one filled document per data row
//!
//! The template is parsed once. Every row gets its own clone of the parsed
//! document, which is filled, written into the output directory and
//! dropped before the next row starts.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use dokmerge_data::{Row, RowSet};
use dokmerge_ooxml::Template;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{MergeError, Result};
use crate::naming::OutputNamer;
use crate::pattern::scan_placeholders;
use crate::walker::{DocumentWalker, MergeOptions};

/// Default output directory, relative to the working directory
pub const DEFAULT_OUTPUT_DIR: &str = "批量生成的文档";

/// What to do when one row fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowErrorPolicy {
    /// Stop the batch at the first failing row
    #[default]
    Abort,
    /// Log the failure, record it in the report and continue
    Skip,
}

/// Settings for one batch run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory receiving the generated files (created if absent)
    pub output_dir: PathBuf,
    /// Output file naming
    pub namer: OutputNamer,
    /// Paragraph rewriting options
    pub merge: MergeOptions,
    /// Row failure handling
    pub on_error: RowErrorPolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            namer: OutputNamer::default(),
            merge: MergeOptions::default(),
            on_error: RowErrorPolicy::default(),
        }
    }
}

/// Progress notifications emitted while a batch runs
#[derive(Debug)]
pub enum Progress<'a> {
    /// The batch is about to process `total` rows
    Started { total: usize },
    /// Row `index` (zero-based) is being generated
    Generating { index: usize, total: usize },
    /// Row `index` was written to `path`
    Generated { index: usize, path: &'a Path },
    /// Row `index` failed and was skipped
    Skipped { index: usize, error: &'a MergeError },
    /// All rows were handled
    Finished { generated: usize, failed: usize },
}

/// A row that could not be generated
#[derive(Debug)]
pub struct RowFailure {
    /// Zero-based position of the row in the data set
    pub index: usize,
    pub error: MergeError,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Written files, in row order
    pub generated: Vec<PathBuf>,
    /// Rows skipped under [`RowErrorPolicy::Skip`]
    pub failed: Vec<RowFailure>,
    /// Output names produced by more than one row
    pub collisions: Vec<String>,
}

impl BatchReport {
    /// Whether every row produced a document
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Generate one document per row of `rows`
///
/// The naming columns are checked before anything is written. With
/// [`RowErrorPolicy::Abort`] the first failing row ends the batch with a
/// [`MergeError::Row`]; files written for earlier rows stay on disk.
pub fn run_batch<F>(
    template: &Template,
    rows: &RowSet,
    options: &BatchOptions,
    mut progress: F,
) -> Result<BatchReport>
where
    F: FnMut(&Progress<'_>),
{
    rows.require_columns(&options.namer.fields())?;
    fs::create_dir_all(&options.output_dir)?;

    warn_unknown_placeholders(template, rows, options.merge.nested_tables);

    let total = rows.len();
    info!(
        "Generating {} document(s) into {}",
        total,
        options.output_dir.display()
    );
    progress(&Progress::Started { total });

    let mut report = BatchReport::default();
    let mut seen = HashSet::new();

    for (index, row) in rows.iter().enumerate() {
        progress(&Progress::Generating { index, total });

        match generate_row(template, row, options) {
            Ok((file_name, path)) => {
                if !seen.insert(file_name.clone()) {
                    warn!(
                        "Row {} overwrites {}, produced by an earlier row",
                        index + 1,
                        file_name
                    );
                    report.collisions.push(file_name);
                }
                debug!("Row {} -> {}", index + 1, path.display());
                progress(&Progress::Generated { index, path: &path });
                report.generated.push(path);
            }
            Err(error) => match options.on_error {
                RowErrorPolicy::Abort => return Err(error.in_row(index)),
                RowErrorPolicy::Skip => {
                    warn!("Skipping row {}: {}", index + 1, error);
                    progress(&Progress::Skipped {
                        index,
                        error: &error,
                    });
                    report.failed.push(RowFailure { index, error });
                }
            },
        }
    }

    info!(
        "Generated {} document(s), {} row(s) failed",
        report.generated.len(),
        report.failed.len()
    );
    progress(&Progress::Finished {
        generated: report.generated.len(),
        failed: report.failed.len(),
    });

    Ok(report)
}

/// Fill and write the document for one row
fn generate_row(template: &Template, row: &Row, options: &BatchOptions) -> Result<(String, PathBuf)> {
    let file_name = options.namer.file_name(row)?;

    let mut document = template.instantiate();
    let stats = DocumentWalker::new(row, options.merge)?.fill(&mut document)?;
    debug!(
        "{}: {} substitution(s) in {} paragraph(s)",
        file_name, stats.substitutions, stats.paragraphs_rewritten
    );

    let path = options.output_dir.join(&file_name);
    template.render_to_file(&document, &path)?;
    Ok((file_name, path))
}

fn warn_unknown_placeholders(template: &Template, rows: &RowSet, nested_tables: bool) {
    for name in scan_placeholders(template.document(), nested_tables) {
        if !rows.headers().iter().any(|h| *h == name) {
            warn!("Template placeholder {{{{{}}}}} has no data column", name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parses_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            on_error: RowErrorPolicy,
        }
        let w: Wrapper = toml::from_str(r#"on_error = "skip""#).unwrap();
        assert_eq!(w.on_error, RowErrorPolicy::Skip);
        assert_eq!(RowErrorPolicy::default(), RowErrorPolicy::Abort);
    }

    #[test]
    fn test_default_options() {
        let options = BatchOptions::default();
        assert_eq!(options.output_dir, PathBuf::from("批量生成的文档"));
        assert_eq!(options.namer.fields(), ["研发活动编号", "研发活动名称"]);
        assert_eq!(options.on_error, RowErrorPolicy::Abort);
    }
}
