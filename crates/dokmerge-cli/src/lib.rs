//! dokmerge CLI - Command-line interface library
//!
//! This library provides the CLI functionality for dokmerge:
//! - Merge: fill a template once per data row
//! - Placeholders: list the `{{fields}}` a template expects
//! - Inspect: show the columns and row count of a data file
//!
//! # Library Usage
//!
//! ```ignore
//! use dokmerge_cli::{merge_command, MergeArgs};
//!
//! let report = merge_command(&MergeArgs {
//!     template: "letter.dotx".into(),
//!     data: "people.xlsx".into(),
//!     ..Default::default()
//! })?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # One document per row, named "<研发活动编号>-<研发活动名称>.docx"
//! dokmerge merge --template 模板.docx --data 研发活动.xlsx
//!
//! # Custom naming columns, keep going past bad rows
//! dokmerge merge -t letter.dotx -d people.csv --name-fields id,name --on-error skip
//!
//! # What does the template expect?
//! dokmerge placeholders --template letter.dotx
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{inspect_command, merge_command, placeholders_command};
pub use app::{run_cli, MergeArgs, OnError};
