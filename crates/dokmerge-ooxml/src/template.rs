//! Template loader for DOTX/DOCX mail-merge templates
//!
//! A [`Template`] is loaded once per batch. Each output document starts as a
//! clone of the parsed [`Document`], gets filled, and is rendered back into
//! a copy of the template package.
//!
//! # Example
//!
//! ```no_run
//! use dokmerge_ooxml::Template;
//!
//! let template = Template::load("letter.dotx")?;
//! let mut doc = template.instantiate();
//! if let Some(p) = doc.paragraphs_mut().next() {
//!     p.add_run("P.S.");
//! }
//! template.render_to_file(&doc, "letter.docx")?;
//! # Ok::<(), dokmerge_ooxml::OoxmlError>(())
//! ```

use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::archive::{OoxmlArchive, CONTENT_TYPES_PATH, DOCUMENT_PATH};
use crate::document::Document;
use crate::error::Result;

/// Main-part content types of template packages and their document equivalents
const TEMPLATE_CONTENT_TYPES: &[(&str, &str)] = &[
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
    ),
    (
        "application/vnd.ms-word.template.macroEnabledTemplate.main+xml",
        "application/vnd.ms-word.document.macroEnabled.main+xml",
    ),
];

/// A Word template (.dotx/.docx) ready for filling
#[derive(Debug, Clone)]
pub struct Template {
    /// The underlying OOXML archive
    archive: OoxmlArchive,
    /// Parsed main document
    document: Document,
}

impl Template {
    /// Load a template from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let archive = OoxmlArchive::open(path)?;
        Self::from_archive(archive)
    }

    /// Load a template from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let archive = OoxmlArchive::from_reader(Cursor::new(bytes))?;
        Self::from_archive(archive)
    }

    /// Wrap an already unpacked archive
    ///
    /// A `.dotx` main part is retyped as a document part so that rendered
    /// output opens as a regular `.docx`.
    pub fn from_archive(mut archive: OoxmlArchive) -> Result<Self> {
        let document = Document::parse(archive.document_xml()?)?;

        if let Some(types) = archive.get_string(CONTENT_TYPES_PATH)? {
            let mut retyped = types.clone();
            for (template_type, document_type) in TEMPLATE_CONTENT_TYPES {
                retyped = retyped.replace(template_type, document_type);
            }
            if retyped != types {
                archive.set_string(CONTENT_TYPES_PATH, retyped);
            }
        }

        Ok(Self { archive, document })
    }

    /// The parsed template document
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// A fresh, independent copy of the template document
    pub fn instantiate(&self) -> Document {
        self.document.clone()
    }

    /// Get a reference to the underlying archive
    pub fn archive(&self) -> &OoxmlArchive {
        &self.archive
    }

    /// Render a filled document into a copy of the template package
    pub fn render(&self, document: &Document) -> Result<Vec<u8>> {
        let xml = document.to_xml()?;
        let mut buffer = Cursor::new(Vec::new());
        self.archive
            .write_with_overrides(&mut buffer, &[(DOCUMENT_PATH, xml.as_slice())])?;
        Ok(buffer.into_inner())
    }

    /// Render a filled document and write it to `path`
    pub fn render_to_file<P: AsRef<Path>>(&self, document: &Document, path: P) -> Result<()> {
        let bytes = self.render(document)?;
        fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OoxmlError;
    use crate::test_utils::{create_template, create_template_with_content_type, DOTX_CONTENT_TYPE};

    #[test]
    fn test_load_from_bytes() {
        let bytes = create_template("<w:p><w:r><w:t>Dear {{name}}</w:t></w:r></w:p>");
        let template = Template::from_bytes(&bytes).unwrap();
        assert_eq!(template.document().plain_text(), "Dear {{name}}");
    }

    #[test]
    fn test_instantiate_is_independent() {
        let bytes = create_template("<w:p><w:r><w:t>A</w:t></w:r></w:p>");
        let template = Template::from_bytes(&bytes).unwrap();

        let mut copy = template.instantiate();
        copy.paragraphs_mut().next().unwrap().add_run("B");

        assert_eq!(copy.plain_text(), "AB");
        assert_eq!(template.document().plain_text(), "A");
    }

    #[test]
    fn test_render_replaces_document_part() {
        let bytes = create_template("<w:p><w:r><w:t>A</w:t></w:r></w:p>");
        let template = Template::from_bytes(&bytes).unwrap();

        let mut doc = template.instantiate();
        doc.paragraphs_mut().next().unwrap().add_run("B");
        let rendered = template.render(&doc).unwrap();

        let reopened = Template::from_bytes(&rendered).unwrap();
        assert_eq!(reopened.document().plain_text(), "AB");
        assert!(reopened.archive().contains("word/styles.xml"));
    }

    #[test]
    fn test_dotx_content_type_becomes_docx() {
        let bytes = create_template_with_content_type(
            "<w:p><w:r><w:t>x</w:t></w:r></w:p>",
            DOTX_CONTENT_TYPE,
        );
        let template = Template::from_bytes(&bytes).unwrap();
        let rendered = template.render(template.document()).unwrap();

        let archive = OoxmlArchive::from_reader(Cursor::new(rendered)).unwrap();
        let types = archive.get_string(CONTENT_TYPES_PATH).unwrap().unwrap();
        assert!(types.contains("wordprocessingml.document.main+xml"));
        assert!(!types.contains("wordprocessingml.template.main+xml"));
    }

    #[test]
    fn test_load_from_invalid_bytes() {
        let result = Template::from_bytes(b"This is not a ZIP file");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_truncated_zip() {
        let truncated = &[0x50, 0x4b, 0x03, 0x04, 0x00, 0x00];
        assert!(Template::from_bytes(truncated).is_err());
    }

    #[test]
    fn test_missing_document_part() {
        let mut archive = OoxmlArchive::from_reader(Cursor::new(create_template("<w:p/>"))).unwrap();
        archive.remove(DOCUMENT_PATH);
        let result = Template::from_archive(archive);
        assert!(matches!(result, Err(OoxmlError::MissingFile(_))));
    }
}
