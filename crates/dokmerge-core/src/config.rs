//! Merge configuration
//!
//! Settings are read from `dokmerge.toml`. Every section and key is
//! optional:
//!
//! ```toml
//! [naming]
//! id_field = "研发活动编号"
//! name_field = "研发活动名称"
//! extension = "docx"
//!
//! [output]
//! dir = "批量生成的文档"
//!
//! [data]
//! sheet = "Sheet1"
//!
//! [merge]
//! inherit_run_style = false
//! nested_tables = false
//! on_error = "abort"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::batch::{BatchOptions, RowErrorPolicy, DEFAULT_OUTPUT_DIR};
use crate::error::{MergeError, Result};
use crate::naming::{OutputNamer, DEFAULT_EXTENSION, DEFAULT_ID_FIELD, DEFAULT_NAME_FIELD};
use crate::walker::MergeOptions;

/// File looked up in the working directory when no config is given
pub const CONFIG_FILE_NAME: &str = "dokmerge.toml";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MergeConfig {
    pub naming: NamingSettings,
    pub output: OutputSettings,
    pub data: DataSettings,
    pub merge: MergeSettings,
}

/// Output file naming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingSettings {
    /// Column giving the first part of the file name
    pub id_field: String,
    /// Column giving the second part of the file name
    pub name_field: String,
    /// Output extension, without the dot
    pub extension: String,
}

impl Default for NamingSettings {
    fn default() -> Self {
        Self {
            id_field: DEFAULT_ID_FIELD.to_string(),
            name_field: DEFAULT_NAME_FIELD.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory receiving generated documents
    pub dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

/// Data source selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DataSettings {
    /// Worksheet to read; the first sheet when unset
    pub sheet: Option<String>,
}

/// Paragraph rewriting and failure handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MergeSettings {
    pub inherit_run_style: bool,
    pub nested_tables: bool,
    pub on_error: RowErrorPolicy,
}

impl MergeConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Read configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| MergeError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
            .map_err(|e| MergeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load `explicit` if given, else `dokmerge.toml` from the working
    /// directory if it exists, else defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            debug!("Loading configuration from {}", path.display());
            return Self::load(path);
        }
        let local = Path::new(CONFIG_FILE_NAME);
        if local.is_file() {
            debug!("Loading configuration from {}", local.display());
            return Self::load(local);
        }
        Ok(Self::default())
    }

    /// File namer described by the `[naming]` section
    pub fn namer(&self) -> OutputNamer {
        OutputNamer::new(&self.naming.id_field, &self.naming.name_field)
            .with_extension(&self.naming.extension)
    }

    /// Rewriting options described by the `[merge]` section
    pub fn options(&self) -> MergeOptions {
        MergeOptions {
            inherit_run_style: self.merge.inherit_run_style,
            nested_tables: self.merge.nested_tables,
        }
    }

    /// Complete batch settings
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            output_dir: self.output.dir.clone(),
            namer: self.namer(),
            merge: self.options(),
            on_error: self.merge.on_error,
        }
    }
}
