//! # dokmerge-core
//!
//! Placeholder substitution for Word templates.
//!
//! Templates carry `{{field}}` placeholders; each data row fills one copy of
//! the template. Word often splits a placeholder across several runs
//! (`{{na` + `me}}`), so matching happens on the flattened text of a whole
//! paragraph, never on individual runs.
//!
//! ## Pipeline
//!
//! 1. [`PlaceholderPattern`] - a matcher over the row's field names
//! 2. [`flatten`] - concatenate a paragraph's run texts
//! 3. [`RowResolver`] - map a matched key to its replacement
//! 4. [`substitute`] - single left-to-right pass over the flattened text
//! 5. [`DocumentWalker`] - visit body and table paragraphs, rewrite matches
//!
//! [`run_batch`] drives the pipeline over a whole [`RowSet`](dokmerge_data::RowSet),
//! writing one document per row.
//!
//! ## Example
//!
//! ```no_run
//! use dokmerge_core::{DocumentWalker, MergeOptions};
//! use dokmerge_data::Row;
//! use dokmerge_ooxml::Template;
//!
//! let template = Template::load("letter.dotx")?;
//! let row: Row = [("name", "Ada")].into_iter().collect();
//!
//! let mut doc = template.instantiate();
//! DocumentWalker::new(&row, MergeOptions::default())?.fill(&mut doc)?;
//! template.render_to_file(&doc, "Ada.docx")?;
//! # Ok::<(), dokmerge_core::MergeError>(())
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod flatten;
pub mod naming;
pub mod pattern;
pub mod resolve;
pub mod substitute;
pub mod walker;

pub use batch::{
    run_batch, BatchOptions, BatchReport, Progress, RowErrorPolicy, RowFailure, DEFAULT_OUTPUT_DIR,
};
pub use config::{MergeConfig, CONFIG_FILE_NAME};
pub use error::{MergeError, Result};
pub use flatten::flatten;
pub use naming::{sanitize_file_name, OutputNamer};
pub use pattern::{scan_placeholders, PlaceholderPattern};
pub use resolve::{RowResolver, ValueResolver};
pub use substitute::substitute;
pub use walker::{fill_document, DocumentWalker, FillStats, MergeOptions};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
