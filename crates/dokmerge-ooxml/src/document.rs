//! Document content model (word/document.xml)
//!
//! This module exposes the structure a mail-merge needs: body paragraphs,
//! body tables, their rows, cells and cell paragraphs, and the runs inside
//! every paragraph. Everything else in the part (section properties,
//! hyperlinks, bookmarks, drawings, content controls...) is carried along as
//! opaque [`XmlNode`]s so that serializing an unedited document reproduces
//! its markup.

use crate::error::{OoxmlError, Result};
use crate::xml::{qualified, XmlElement, XmlNode, XmlTree};

/// WordprocessingML main namespace
pub const WORDPROCESSINGML_NS: &str =
    "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// A parsed Word document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The part with the body element taken out
    tree: XmlTree,
    /// Position of the body among the root's children
    body_index: usize,
    /// Document body
    pub body: Body,
}

/// The `<w:body>` element
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    name: String,
    attributes: Vec<(String, String)>,
    /// Block-level children in document order
    pub children: Vec<BodyChild>,
}

/// Block-level children of the body
#[derive(Debug, Clone, PartialEq)]
pub enum BodyChild {
    /// A paragraph
    Paragraph(Paragraph),
    /// A table
    Table(Table),
    /// Anything else (section properties, content controls, whitespace)
    Other(XmlNode),
}

/// A paragraph with its runs
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    name: String,
    attributes: Vec<(String, String)>,
    /// Children in document order
    pub children: Vec<ParagraphChild>,
}

/// Child elements of a paragraph
#[derive(Debug, Clone, PartialEq)]
pub enum ParagraphChild {
    /// A direct text run
    Run(Run),
    /// Paragraph properties, hyperlinks, bookmarks, proofing marks...
    Other(XmlNode),
}

/// A text run: opaque style properties plus content
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    name: String,
    attributes: Vec<(String, String)>,
    /// Content in document order
    pub content: Vec<RunContent>,
}

/// Content of a run
#[derive(Debug, Clone, PartialEq)]
pub enum RunContent {
    /// A `<w:t>` element
    Text(TextElement),
    /// A `<w:tab>` or `<w:ptab>` element
    Tab(XmlElement),
    /// A `<w:br>` element
    Break(XmlElement),
    /// A `<w:cr>` element
    CarriageReturn(XmlElement),
    /// Run properties, drawings, field characters...
    Other(XmlNode),
}

/// A `<w:t>` element
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    name: String,
    attributes: Vec<(String, String)>,
    /// The text payload
    pub value: String,
}

/// A table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    attributes: Vec<(String, String)>,
    /// Rows and table-level markup (properties, grid)
    pub children: Vec<TableChild>,
}

/// Children of a table
#[derive(Debug, Clone, PartialEq)]
pub enum TableChild {
    Row(TableRow),
    Other(XmlNode),
}

/// A table row
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    name: String,
    attributes: Vec<(String, String)>,
    pub children: Vec<RowChild>,
}

/// Children of a table row
#[derive(Debug, Clone, PartialEq)]
pub enum RowChild {
    Cell(TableCell),
    Other(XmlNode),
}

/// A table cell
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    name: String,
    attributes: Vec<(String, String)>,
    pub children: Vec<CellChild>,
}

/// Children of a table cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellChild {
    Paragraph(Paragraph),
    /// A table nested inside the cell
    Table(Table),
    Other(XmlNode),
}

impl Document {
    /// Create an empty document using the `w` prefix
    pub fn new() -> Self {
        let root = XmlElement::new("w:document").with_attribute("xmlns:w", WORDPROCESSINGML_NS);
        Self {
            tree: XmlTree::new(root),
            body_index: 0,
            body: Body {
                name: "w:body".to_string(),
                attributes: Vec::new(),
                children: Vec::new(),
            },
        }
    }

    /// Parse a document from XML bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut tree = XmlTree::parse(xml)?;

        if tree.root.local_name() != "document" {
            return Err(OoxmlError::InvalidStructure(format!(
                "expected <w:document> root, found <{}>",
                tree.root.name
            )));
        }

        let body_index = tree
            .root
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if el.local_name() == "body"))
            .ok_or_else(|| OoxmlError::InvalidStructure("missing <w:body>".to_string()))?;

        let body = match tree.root.children.remove(body_index) {
            XmlNode::Element(el) => Body::from_element(el),
            _ => unreachable!("position matched an element"),
        };

        Ok(Self {
            tree,
            body_index,
            body,
        })
    }

    /// Serialize the document back to XML bytes
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut tree = self.tree.clone();
        let index = self.body_index.min(tree.root.children.len());
        tree.root
            .children
            .insert(index, XmlNode::Element(self.body.to_element()));
        tree.to_bytes()
    }

    /// Append a paragraph to the body
    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.body.children.push(BodyChild::Paragraph(paragraph));
    }

    /// Append a table to the body
    pub fn push_table(&mut self, table: Table) {
        self.body.children.push(BodyChild::Table(table));
    }

    /// Body-level paragraphs in document order (table content excluded)
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.children.iter().filter_map(|child| match child {
            BodyChild::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Mutable body-level paragraphs
    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.body.children.iter_mut().filter_map(|child| match child {
            BodyChild::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Body-level tables in document order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.children.iter().filter_map(|child| match child {
            BodyChild::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Mutable body-level tables
    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.body.children.iter_mut().filter_map(|child| match child {
            BodyChild::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Plain text of body paragraphs and table cells, blank-line separated
    pub fn plain_text(&self) -> String {
        let mut parts = Vec::new();
        for child in &self.body.children {
            match child {
                BodyChild::Paragraph(p) => parts.push(p.text()),
                BodyChild::Table(t) => collect_table_text(t, &mut parts),
                BodyChild::Other(_) => {}
            }
        }
        parts.join("\n\n")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_table_text(table: &Table, parts: &mut Vec<String>) {
    for cell in table.rows().flat_map(|row| row.cells()) {
        for child in &cell.children {
            match child {
                CellChild::Paragraph(p) => parts.push(p.text()),
                CellChild::Table(t) => collect_table_text(t, parts),
                CellChild::Other(_) => {}
            }
        }
    }
}

impl Body {
    fn from_element(el: XmlElement) -> Self {
        let children = el
            .children
            .into_iter()
            .map(|node| match node {
                XmlNode::Element(child) if child.local_name() == "p" => {
                    BodyChild::Paragraph(Paragraph::from_element(child))
                }
                XmlNode::Element(child) if child.local_name() == "tbl" => {
                    BodyChild::Table(Table::from_element(child))
                }
                other => BodyChild::Other(other),
            })
            .collect();
        Self {
            name: el.name,
            attributes: el.attributes,
            children,
        }
    }

    fn to_element(&self) -> XmlElement {
        XmlElement {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            children: self
                .children
                .iter()
                .map(|child| match child {
                    BodyChild::Paragraph(p) => XmlNode::Element(p.to_element()),
                    BodyChild::Table(t) => XmlNode::Element(t.to_element()),
                    BodyChild::Other(node) => node.clone(),
                })
                .collect(),
        }
    }
}

impl Paragraph {
    /// Create an empty `<w:p>`
    pub fn new() -> Self {
        Self {
            name: "w:p".to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create a paragraph with one plain run per text fragment
    pub fn from_runs<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut para = Self::new();
        for fragment in fragments {
            para.add_run(fragment.as_ref());
        }
        para
    }

    /// Parse a standalone `<w:p>` element
    pub fn from_element(el: XmlElement) -> Self {
        let children = el
            .children
            .into_iter()
            .map(|node| match node {
                XmlNode::Element(child) if child.local_name() == "r" => {
                    ParagraphChild::Run(Run::from_element(child))
                }
                other => ParagraphChild::Other(other),
            })
            .collect();
        Self {
            name: el.name,
            attributes: el.attributes,
            children,
        }
    }

    /// Convert back to an element
    pub fn to_element(&self) -> XmlElement {
        XmlElement {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            children: self
                .children
                .iter()
                .map(|child| match child {
                    ParagraphChild::Run(r) => XmlNode::Element(r.to_element()),
                    ParagraphChild::Other(node) => node.clone(),
                })
                .collect(),
        }
    }

    /// Direct runs in order
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.children.iter().filter_map(|child| match child {
            ParagraphChild::Run(r) => Some(r),
            _ => None,
        })
    }

    /// Mutable direct runs in order
    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.children.iter_mut().filter_map(|child| match child {
            ParagraphChild::Run(r) => Some(r),
            _ => None,
        })
    }

    /// Number of direct runs
    pub fn run_count(&self) -> usize {
        self.runs().count()
    }

    /// Concatenated text of the direct runs
    pub fn text(&self) -> String {
        self.runs().map(Run::text).collect()
    }

    /// Append a new unstyled run carrying `text`
    pub fn add_run(&mut self, text: &str) -> &mut Run {
        self.add_styled_run(text, None)
    }

    /// Append a new run carrying `text` with the given `<w:rPr>`
    pub fn add_styled_run(&mut self, text: &str, properties: Option<XmlElement>) -> &mut Run {
        let prefix = self.name.split_once(':').map(|(p, _)| p.to_string());
        let run = Run::with_text(prefix.as_deref(), text, properties);
        self.children.push(ParagraphChild::Run(run));
        match self.children.last_mut() {
            Some(ParagraphChild::Run(r)) => r,
            _ => unreachable!("run was just pushed"),
        }
    }
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Run {
    /// Build a run from plain text
    ///
    /// Tabs become `<w:tab/>` and line feeds / carriage returns become
    /// `<w:br/>`, mirroring how the text is read back.
    pub fn with_text(prefix: Option<&str>, text: &str, properties: Option<XmlElement>) -> Self {
        let mut run = Self {
            name: qualified(prefix, "r"),
            attributes: Vec::new(),
            content: Vec::new(),
        };
        if let Some(props) = properties {
            run.content.push(RunContent::Other(XmlNode::Element(props)));
        }
        run.append_text(prefix, text);
        run
    }

    /// Parse a standalone `<w:r>` element
    pub fn from_element(el: XmlElement) -> Self {
        let content = el
            .children
            .into_iter()
            .map(|node| match node {
                XmlNode::Element(child) => RunContent::from_element(child),
                other => RunContent::Other(other),
            })
            .collect();
        Self {
            name: el.name,
            attributes: el.attributes,
            content,
        }
    }

    /// Convert back to an element
    pub fn to_element(&self) -> XmlElement {
        XmlElement {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            children: self.content.iter().map(RunContent::to_node).collect(),
        }
    }

    /// Run properties (`<w:rPr>`), the opaque style of this run
    pub fn properties(&self) -> Option<&XmlElement> {
        self.content.iter().find_map(|item| match item {
            RunContent::Other(XmlNode::Element(el)) if el.local_name() == "rPr" => Some(el),
            _ => None,
        })
    }

    /// Visible text of this run
    pub fn text(&self) -> String {
        self.content.iter().map(RunContent::text).collect()
    }

    /// Remove all content except the run properties
    pub fn clear(&mut self) {
        self.content.retain(|item| {
            matches!(item, RunContent::Other(XmlNode::Element(el)) if el.local_name() == "rPr")
        });
    }

    fn append_text(&mut self, prefix: Option<&str>, text: &str) {
        let mut pending = String::new();
        for ch in text.chars() {
            match ch {
                '\t' | '\n' | '\r' => {
                    if !pending.is_empty() {
                        self.content
                            .push(RunContent::Text(TextElement::new(prefix, &pending)));
                        pending.clear();
                    }
                    let item = if ch == '\t' {
                        RunContent::Tab(XmlElement::new(qualified(prefix, "tab")))
                    } else {
                        RunContent::Break(XmlElement::new(qualified(prefix, "br")))
                    };
                    self.content.push(item);
                }
                _ => pending.push(ch),
            }
        }
        if !pending.is_empty() {
            self.content
                .push(RunContent::Text(TextElement::new(prefix, &pending)));
        }
    }
}

impl RunContent {
    fn from_element(el: XmlElement) -> Self {
        match el.local_name() {
            "t" if el.has_only_text() => RunContent::Text(TextElement {
                value: el.text(),
                name: el.name,
                attributes: el.attributes,
            }),
            "tab" | "ptab" => RunContent::Tab(el),
            "br" => RunContent::Break(el),
            "cr" => RunContent::CarriageReturn(el),
            _ => RunContent::Other(XmlNode::Element(el)),
        }
    }

    fn to_node(&self) -> XmlNode {
        match self {
            RunContent::Text(t) => XmlNode::Element(t.to_element()),
            RunContent::Tab(el) | RunContent::Break(el) | RunContent::CarriageReturn(el) => {
                XmlNode::Element(el.clone())
            }
            RunContent::Other(node) => node.clone(),
        }
    }

    /// Visible text contributed by this item
    pub fn text(&self) -> &str {
        match self {
            RunContent::Text(t) => &t.value,
            RunContent::Tab(_) => "\t",
            RunContent::Break(el) => match el.attribute_local("type") {
                // Page and column breaks are layout, not text
                Some("page") | Some("column") => "",
                _ => "\n",
            },
            RunContent::CarriageReturn(_) => "\n",
            RunContent::Other(_) => "",
        }
    }
}

impl TextElement {
    fn new(prefix: Option<&str>, value: &str) -> Self {
        let mut attributes = Vec::new();
        if value.starts_with(char::is_whitespace) || value.ends_with(char::is_whitespace) {
            attributes.push(("xml:space".to_string(), "preserve".to_string()));
        }
        Self {
            name: qualified(prefix, "t"),
            attributes,
            value: value.to_string(),
        }
    }

    fn to_element(&self) -> XmlElement {
        let mut el = XmlElement {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            children: Vec::new(),
        };
        if !self.value.is_empty() {
            el.children.push(XmlNode::Text(self.value.clone()));
        }
        el
    }
}

impl Table {
    /// Build a table from rows
    pub fn from_rows(rows: Vec<TableRow>) -> Self {
        Self {
            name: "w:tbl".to_string(),
            attributes: Vec::new(),
            children: rows.into_iter().map(TableChild::Row).collect(),
        }
    }

    fn from_element(el: XmlElement) -> Self {
        let children = el
            .children
            .into_iter()
            .map(|node| match node {
                XmlNode::Element(child) if child.local_name() == "tr" => {
                    TableChild::Row(TableRow::from_element(child))
                }
                other => TableChild::Other(other),
            })
            .collect();
        Self {
            name: el.name,
            attributes: el.attributes,
            children,
        }
    }

    fn to_element(&self) -> XmlElement {
        XmlElement {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            children: self
                .children
                .iter()
                .map(|child| match child {
                    TableChild::Row(r) => XmlNode::Element(r.to_element()),
                    TableChild::Other(node) => node.clone(),
                })
                .collect(),
        }
    }

    /// Rows in order
    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        self.children.iter().filter_map(|child| match child {
            TableChild::Row(r) => Some(r),
            _ => None,
        })
    }

    /// Mutable rows in order
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut TableRow> {
        self.children.iter_mut().filter_map(|child| match child {
            TableChild::Row(r) => Some(r),
            _ => None,
        })
    }
}

impl TableRow {
    /// Build a row from cells
    pub fn from_cells(cells: Vec<TableCell>) -> Self {
        Self {
            name: "w:tr".to_string(),
            attributes: Vec::new(),
            children: cells.into_iter().map(RowChild::Cell).collect(),
        }
    }

    fn from_element(el: XmlElement) -> Self {
        let children = el
            .children
            .into_iter()
            .map(|node| match node {
                XmlNode::Element(child) if child.local_name() == "tc" => {
                    RowChild::Cell(TableCell::from_element(child))
                }
                other => RowChild::Other(other),
            })
            .collect();
        Self {
            name: el.name,
            attributes: el.attributes,
            children,
        }
    }

    fn to_element(&self) -> XmlElement {
        XmlElement {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            children: self
                .children
                .iter()
                .map(|child| match child {
                    RowChild::Cell(c) => XmlNode::Element(c.to_element()),
                    RowChild::Other(node) => node.clone(),
                })
                .collect(),
        }
    }

    /// Cells in order (each `<w:tc>` once, merged cells included)
    pub fn cells(&self) -> impl Iterator<Item = &TableCell> {
        self.children.iter().filter_map(|child| match child {
            RowChild::Cell(c) => Some(c),
            _ => None,
        })
    }

    /// Mutable cells in order
    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut TableCell> {
        self.children.iter_mut().filter_map(|child| match child {
            RowChild::Cell(c) => Some(c),
            _ => None,
        })
    }
}

impl TableCell {
    /// Build a cell from paragraphs
    pub fn from_paragraphs(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            name: "w:tc".to_string(),
            attributes: Vec::new(),
            children: paragraphs.into_iter().map(CellChild::Paragraph).collect(),
        }
    }

    fn from_element(el: XmlElement) -> Self {
        let children = el
            .children
            .into_iter()
            .map(|node| match node {
                XmlNode::Element(child) if child.local_name() == "p" => {
                    CellChild::Paragraph(Paragraph::from_element(child))
                }
                XmlNode::Element(child) if child.local_name() == "tbl" => {
                    CellChild::Table(Table::from_element(child))
                }
                other => CellChild::Other(other),
            })
            .collect();
        Self {
            name: el.name,
            attributes: el.attributes,
            children,
        }
    }

    fn to_element(&self) -> XmlElement {
        XmlElement {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            children: self
                .children
                .iter()
                .map(|child| match child {
                    CellChild::Paragraph(p) => XmlNode::Element(p.to_element()),
                    CellChild::Table(t) => XmlNode::Element(t.to_element()),
                    CellChild::Other(node) => node.clone(),
                })
                .collect(),
        }
    }

    /// Paragraphs directly inside this cell
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.children.iter().filter_map(|child| match child {
            CellChild::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Mutable paragraphs directly inside this cell
    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.children.iter_mut().filter_map(|child| match child {
            CellChild::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Tables nested directly inside this cell
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.children.iter().filter_map(|child| match child {
            CellChild::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Mutable tables nested directly inside this cell
    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.children.iter_mut().filter_map(|child| match child {
            CellChild::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Concatenated text of the cell's paragraphs, newline separated
    pub fn text(&self) -> String {
        self.paragraphs()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
