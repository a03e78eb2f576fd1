//! Shared test utilities for dokmerge-data
//!
//! Writes small `.xlsx` workbooks from code so tests do not need binary
//! fixtures. Enabled for this crate's tests and, through the `test-utils`
//! feature, for the other workspace crates.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

/// A fixture cell
#[derive(Debug, Clone, Copy)]
pub enum Cell<'a> {
    /// Inline string
    Text(&'a str),
    /// Plain number
    Number(f64),
    /// Date serial number formatted with the built-in date format
    Date(f64),
    /// Boolean
    Bool(bool),
    /// Error value such as `#N/A`
    Error(&'a str),
    /// No cell at all
    Empty,
}

/// Rows of one worksheet
pub type Sheet<'a> = (&'a str, Vec<Vec<Cell<'a>>>);

/// Build an `.xlsx` package holding the given sheets, in order
pub fn create_workbook(sheets: &[Sheet<'_>]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut overrides = String::new();
    let mut entries = String::new();
    let mut rels = String::new();
    for (i, (name, _)) in sheets.iter().enumerate() {
        let n = i + 1;
        overrides.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        entries.push_str(&format!(
            r#"<sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#,
            escape(name)
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        ));
    }
    let styles_id = sheets.len() + 1;
    rels.push_str(&format!(
        r#"<Relationship Id="rId{styles_id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#
    ));

    let mut parts: Vec<(String, String)> = vec![
        (
            "[Content_Types].xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>{overrides}</Types>"#
            ),
        ),
        (
            "_rels/.rels".to_string(),
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
                .to_string(),
        ),
        (
            "xl/workbook.xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{entries}</sheets></workbook>"#
            ),
        ),
        (
            "xl/_rels/workbook.xml.rels".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
            ),
        ),
        (
            "xl/styles.xml".to_string(),
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#
                .to_string(),
        ),
    ];
    for (i, (_, rows)) in sheets.iter().enumerate() {
        parts.push((format!("xl/worksheets/sheet{}.xml", i + 1), sheet_xml(rows)));
    }

    for (path, contents) in &parts {
        zip.start_file(path.as_str(), options).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }

    zip.finish().unwrap();
    buffer.into_inner()
}

/// Write a workbook to `dir/file_name` and return its path
pub fn write_workbook(dir: &Path, file_name: &str, sheets: &[Sheet<'_>]) -> PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, create_workbook(sheets)).unwrap();
    path
}

fn sheet_xml(rows: &[Vec<Cell<'_>>]) -> String {
    let mut data = String::new();
    for (r, cells) in rows.iter().enumerate() {
        let row_ref = r + 1;
        data.push_str(&format!(r#"<row r="{row_ref}">"#));
        for (c, cell) in cells.iter().enumerate() {
            let cell_ref = format!("{}{}", column_letters(c), row_ref);
            let xml = match cell {
                Cell::Text(s) => format!(
                    r#"<c r="{cell_ref}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    escape(s)
                ),
                Cell::Number(n) => format!(r#"<c r="{cell_ref}"><v>{n}</v></c>"#),
                Cell::Date(serial) => format!(r#"<c r="{cell_ref}" s="1"><v>{serial}</v></c>"#),
                Cell::Bool(b) => format!(r#"<c r="{cell_ref}" t="b"><v>{}</v></c>"#, u8::from(*b)),
                Cell::Error(e) => format!(r#"<c r="{cell_ref}" t="e"><v>{}</v></c>"#, escape(e)),
                Cell::Empty => continue,
            };
            data.push_str(&xml);
        }
        data.push_str("</row>");
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{data}</sheetData></worksheet>"#
    )
}

fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap()
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
