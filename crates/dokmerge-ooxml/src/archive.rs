//! Archive handling for DOCX/DOTX files
//!
//! A package is unpacked fully into memory. Parts are written back in path
//! order, so rendering the same content twice gives identical bytes.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use zip::read::ZipArchive;
use zip::write::ZipWriter;
use zip::CompressionMethod;

use crate::error::{OoxmlError, Result};

/// Path of the main document part
pub const DOCUMENT_PATH: &str = "word/document.xml";

/// Path of the package content types
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// Represents an unpacked OOXML document
#[derive(Debug, Clone)]
pub struct OoxmlArchive {
    /// All files in the archive, keyed by path
    files: HashMap<String, Vec<u8>>,
}

impl OoxmlArchive {
    /// Open and unpack a DOCX/DOTX file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Create from any reader that implements Read + Seek
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut files = HashMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            // Skip directories
            if name.ends_with('/') {
                continue;
            }

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            files.insert(name, contents);
        }

        Ok(Self { files })
    }

    /// Get a file's contents by path
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(|v| v.as_slice())
    }

    /// Get a file's contents as a string
    pub fn get_string(&self, path: &str) -> Result<Option<String>> {
        match self.files.get(path) {
            Some(bytes) => {
                let s = String::from_utf8_lossy(bytes).into_owned();
                Ok(Some(s))
            }
            None => Ok(None),
        }
    }

    /// Get the main document content (word/document.xml)
    pub fn document_xml(&self) -> Result<&[u8]> {
        self.get(DOCUMENT_PATH)
            .ok_or_else(|| OoxmlError::MissingFile(DOCUMENT_PATH.to_string()))
    }

    /// Check if a file exists in the archive
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Set or update a file's contents
    pub fn set(&mut self, path: impl Into<String>, contents: Vec<u8>) {
        self.files.insert(path.into(), contents);
    }

    /// Set a file's contents from a string
    pub fn set_string(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into().into_bytes());
    }

    /// Remove a file from the archive
    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(path)
    }

    /// Write the archive to a file
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }

    /// Write the archive to any writer
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        self.write_with_overrides(writer, &[])
    }

    /// Write the archive to an in-memory buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.write_to(&mut buffer)?;
        Ok(buffer.into_inner())
    }

    /// Write the archive, substituting the contents of some parts
    ///
    /// Overridden parts replace the stored bytes (or are added if absent)
    /// without touching the archive itself, so one template archive can be
    /// written many times with different document parts.
    pub fn write_with_overrides<W: Write + Seek>(
        &self,
        writer: W,
        overrides: &[(&str, &[u8])],
    ) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated);

        // Sort keys for deterministic output
        let mut paths: Vec<&str> = self.files.keys().map(|s| s.as_str()).collect();
        for (path, _) in overrides {
            if !self.files.contains_key(*path) {
                paths.push(*path);
            }
        }
        paths.sort_unstable();

        for path in paths {
            let contents = overrides
                .iter()
                .find(|(p, _)| *p == path)
                .map(|(_, bytes)| *bytes)
                .unwrap_or_else(|| self.files[path].as_slice());
            zip.start_file(path, options)?;
            zip.write_all(contents)?;
        }

        zip.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> OoxmlArchive {
        OoxmlArchive {
            files: HashMap::new(),
        }
    }

    #[test]
    fn test_file_operations() {
        let mut archive = empty();

        archive.set_string("test.xml", "<root/>");
        assert!(archive.contains("test.xml"));
        assert_eq!(
            archive.get_string("test.xml").unwrap(),
            Some("<root/>".to_string())
        );

        archive.remove("test.xml");
        assert!(!archive.contains("test.xml"));
    }

    #[test]
    fn test_missing_document_xml() {
        let archive = empty();
        assert!(matches!(
            archive.document_xml(),
            Err(OoxmlError::MissingFile(_))
        ));
    }

    #[test]
    fn test_roundtrip_through_bytes() {
        let mut archive = empty();
        archive.set_string(CONTENT_TYPES_PATH, "<Types/>");
        archive.set_string(DOCUMENT_PATH, "<w:document/>");

        let bytes = archive.to_bytes().unwrap();
        let restored = OoxmlArchive::from_reader(Cursor::new(bytes)).unwrap();

        assert_eq!(restored.get(DOCUMENT_PATH), Some(&b"<w:document/>"[..]));
        assert!(restored.contains(CONTENT_TYPES_PATH));
    }

    #[test]
    fn test_write_with_overrides_leaves_archive_untouched() {
        let mut archive = empty();
        archive.set_string(DOCUMENT_PATH, "original");
        archive.set_string("word/styles.xml", "styles");

        let mut buffer = Cursor::new(Vec::new());
        archive
            .write_with_overrides(
                &mut buffer,
                &[
                    (DOCUMENT_PATH, &b"filled"[..]),
                    ("docProps/extra.xml", &b"new"[..]),
                ],
            )
            .unwrap();

        buffer.set_position(0);
        let written = OoxmlArchive::from_reader(buffer).unwrap();
        assert_eq!(written.get(DOCUMENT_PATH), Some(&b"filled"[..]));
        assert_eq!(written.get("word/styles.xml"), Some(&b"styles"[..]));
        assert_eq!(written.get("docProps/extra.xml"), Some(&b"new"[..]));

        assert_eq!(archive.get(DOCUMENT_PATH), Some(&b"original"[..]));
        assert!(!archive.contains("docProps/extra.xml"));
    }

    #[test]
    fn test_write_to_file_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = empty();
        archive.set_string("b.xml", "<b/>");
        archive.set_string("a.xml", "<a/>");

        let first = dir.path().join("first.docx");
        let second = dir.path().join("second.docx");
        archive.write_to_file(&first).unwrap();
        archive.write_to_file(&second).unwrap();

        assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
        let reopened = OoxmlArchive::open(&first).unwrap();
        assert_eq!(reopened.get("a.xml"), Some(&b"<a/>"[..]));
    }

    #[test]
    fn test_from_invalid_bytes() {
        let result = OoxmlArchive::from_reader(Cursor::new(b"not a zip".to_vec()));
        assert!(matches!(result, Err(OoxmlError::Archive(_))));
    }
}
