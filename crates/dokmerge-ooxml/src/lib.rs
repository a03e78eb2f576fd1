//! # dokmerge-ooxml
//!
//! WordprocessingML document model and package I/O for dokmerge.
//!
//! This crate provides functionality to:
//! - Read DOCX/DOTX packages and write them back
//! - Parse `word/document.xml` into paragraphs, runs and tables
//! - Edit run text while preserving every other piece of markup
//!
//! ## Example: Reading a Document
//!
//! ```no_run
//! use dokmerge_ooxml::{Document, OoxmlArchive};
//!
//! let archive = OoxmlArchive::open("document.docx")?;
//! let document = Document::parse(archive.document_xml()?)?;
//!
//! for paragraph in document.paragraphs() {
//!     println!("{}", paragraph.text());
//! }
//! # Ok::<(), dokmerge_ooxml::OoxmlError>(())
//! ```

pub mod archive;
pub mod document;
pub mod error;
pub mod template;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod xml;

pub use archive::OoxmlArchive;
pub use document::{
    Body, BodyChild, CellChild, Document, Paragraph, ParagraphChild, RowChild, Run, RunContent,
    Table, TableCell, TableChild, TableRow, TextElement, WORDPROCESSINGML_NS,
};
pub use error::{OoxmlError, Result};
pub use template::Template;
pub use xml::{XmlElement, XmlNode, XmlTree};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
