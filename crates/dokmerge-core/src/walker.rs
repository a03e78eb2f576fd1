//! Document walker: fills every placeholder paragraph of a document
//!
//! Visited paragraphs are the body paragraphs, then every paragraph of every
//! cell of every body table. Each paragraph is handled in two phases:
//!
//! 1. flatten its runs and substitute on the flattened text;
//! 2. only if something matched, empty every existing run and append one
//!    new run holding the whole replacement.
//!
//! The second phase throws away character formatting inside rewritten
//! paragraphs. Paragraphs without a known placeholder are left untouched.

use dokmerge_data::Row;
use dokmerge_ooxml::{Document, Paragraph, Table};
use tracing::trace;

use crate::error::Result;
use crate::flatten::flatten;
use crate::pattern::PlaceholderPattern;
use crate::resolve::RowResolver;
use crate::substitute::substitute_counted;

/// Knobs for how paragraphs are rewritten
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Give the new run the run properties of the paragraph's first run
    pub inherit_run_style: bool,
    /// Also visit tables nested inside table cells, at any depth
    pub nested_tables: bool,
}

/// Counters from one [`DocumentWalker::fill`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillStats {
    /// Paragraphs examined
    pub paragraphs_visited: usize,
    /// Paragraphs that contained a placeholder and were rewritten
    pub paragraphs_rewritten: usize,
    /// Placeholders replaced in total
    pub substitutions: usize,
}

/// Fills a document from one data row
#[derive(Debug, Clone)]
pub struct DocumentWalker<'r> {
    pattern: PlaceholderPattern,
    resolver: RowResolver<'r>,
    options: MergeOptions,
}

impl<'r> DocumentWalker<'r> {
    /// Compile the placeholder pattern for `row`
    pub fn new(row: &'r Row, options: MergeOptions) -> Result<Self> {
        Ok(Self {
            pattern: PlaceholderPattern::new(row.keys())?,
            resolver: RowResolver::new(row),
            options,
        })
    }

    pub fn options(&self) -> MergeOptions {
        self.options
    }

    pub fn pattern(&self) -> &PlaceholderPattern {
        &self.pattern
    }

    /// Substitute every visited paragraph of `document` in place
    ///
    /// On error, paragraphs visited earlier keep their new text; the failing
    /// paragraph is left as it was.
    pub fn fill(&self, document: &mut Document) -> Result<FillStats> {
        let mut stats = FillStats::default();
        let mut visit = |p: &mut Paragraph| -> Result<()> {
            stats.paragraphs_visited += 1;
            let replaced = self.fill_paragraph(p)?;
            if replaced > 0 {
                stats.paragraphs_rewritten += 1;
                stats.substitutions += replaced;
            }
            Ok(())
        };

        for paragraph in document.paragraphs_mut() {
            visit(paragraph)?;
        }
        for table in document.tables_mut() {
            visit_table_mut(table, self.options.nested_tables, &mut visit)?;
        }

        trace!(
            "visited {} paragraphs, rewrote {}",
            stats.paragraphs_visited,
            stats.paragraphs_rewritten
        );
        Ok(stats)
    }

    /// Substitute one paragraph; returns the number of placeholders replaced
    pub fn fill_paragraph(&self, paragraph: &mut Paragraph) -> Result<usize> {
        let text = flatten(paragraph);
        let Some((new_text, count)) = substitute_counted(&text, &self.pattern, &self.resolver)?
        else {
            return Ok(0);
        };

        let properties = if self.options.inherit_run_style {
            paragraph.runs().next().and_then(|r| r.properties().cloned())
        } else {
            None
        };

        for run in paragraph.runs_mut() {
            run.clear();
        }
        paragraph.add_styled_run(&new_text, properties);

        Ok(count)
    }
}

/// Fill `document` from `row` with default options
pub fn fill_document(document: &mut Document, row: &Row) -> Result<()> {
    DocumentWalker::new(row, MergeOptions::default())?.fill(document)?;
    Ok(())
}

/// Paragraphs a merge visits, in visiting order
pub(crate) fn paragraphs(document: &Document, nested_tables: bool) -> Vec<&Paragraph> {
    let mut out: Vec<&Paragraph> = document.paragraphs().collect();
    for table in document.tables() {
        collect_table(table, nested_tables, &mut out);
    }
    out
}

fn collect_table<'d>(table: &'d Table, nested_tables: bool, out: &mut Vec<&'d Paragraph>) {
    for cell in table.rows().flat_map(|row| row.cells()) {
        out.extend(cell.paragraphs());
        if nested_tables {
            for inner in cell.tables() {
                collect_table(inner, nested_tables, out);
            }
        }
    }
}

fn visit_table_mut<F>(table: &mut Table, nested_tables: bool, visit: &mut F) -> Result<()>
where
    F: FnMut(&mut Paragraph) -> Result<()>,
{
    for row in table.rows_mut() {
        for cell in row.cells_mut() {
            for paragraph in cell.paragraphs_mut() {
                visit(paragraph)?;
            }
            if nested_tables {
                for inner in cell.tables_mut() {
                    visit_table_mut(inner, nested_tables, visit)?;
                }
            }
        }
    }
    Ok(())
}
