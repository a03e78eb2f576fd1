//! Error types for merging

use dokmerge_data::DataError;
use dokmerge_ooxml::OoxmlError;
use thiserror::Error;

/// Errors that can occur while filling templates
#[derive(Error, Debug)]
pub enum MergeError {
    /// Template package or document structure problem
    #[error(transparent)]
    Ooxml(#[from] OoxmlError),

    /// Row data could not be read or lacks required columns
    #[error(transparent)]
    Data(#[from] DataError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration file
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The placeholder matcher could not be compiled
    #[error("Cannot build placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A value holds a character that XML cannot carry
    #[error("Value of '{key}' contains character U+{code:04X}, which a document cannot store")]
    InvalidValue {
        /// Field whose value was rejected
        key: String,
        /// Offending code point
        code: u32,
    },

    /// A field used for the output file name is absent from the row
    #[error("Naming field '{0}' is missing from the row")]
    MissingNamingField(String),

    /// Processing of one data row failed
    #[error("Row {} failed", .index + 1)]
    Row {
        /// Zero-based position of the row in the data set
        index: usize,
        #[source]
        source: Box<MergeError>,
    },
}

impl MergeError {
    /// Wrap an error with the row it happened on
    pub fn in_row(self, index: usize) -> Self {
        MergeError::Row {
            index,
            source: Box::new(self),
        }
    }
}

/// Result type for merge operations
pub type Result<T> = std::result::Result<T, MergeError>;
