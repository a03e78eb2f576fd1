//! Lossless XML element tree
//!
//! OOXML parts carry far more markup than dokmerge models (section
//! properties, drawings, revision marks, vendor extensions...). To write a
//! filled document back without dropping any of it, parts are read into a
//! plain element tree that keeps every element, attribute, text node,
//! comment and CDATA section, and is serialized again in the same order.

use std::borrow::Cow;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{OoxmlError, Result};

/// A node inside an element
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// A child element
    Element(XmlElement),
    /// Character data (stored unescaped)
    Text(String),
    /// A CDATA section (stored verbatim)
    CData(String),
    /// A comment (stored verbatim)
    Comment(String),
}

/// An XML element with its qualified name, attributes and children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Qualified name as written in the source (e.g. `w:p`)
    pub name: String,
    /// Attributes in source order, values unescaped
    pub attributes: Vec<(String, String)>,
    /// Child nodes in source order
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Builder-style child appender
    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    /// Local part of the qualified name (`p` for `w:p`)
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Look up an attribute by local name, ignoring its prefix
    pub fn attribute_local(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| local_name(k) == local)
            .map(|(_, v)| v.as_str())
    }

    /// Set or replace an attribute
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Concatenated character data of direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) | XmlNode::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether every child is character data (no elements or comments)
    pub fn has_only_text(&self) -> bool {
        self.children
            .iter()
            .all(|node| matches!(node, XmlNode::Text(_) | XmlNode::CData(_)))
    }

    fn from_start(start: &BytesStart) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| OoxmlError::Xml(e.into()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| OoxmlError::Xml(e.into()))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }
}

/// Strip the namespace prefix from a qualified name
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

/// Join an optional prefix and a local name
pub fn qualified(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) => format!("{}:{}", p, local),
        None => local.to_string(),
    }
}

/// The `<?xml ...?>` declaration of a part
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Default for XmlDeclaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: Some("UTF-8".to_string()),
            standalone: Some("yes".to_string()),
        }
    }
}

impl XmlDeclaration {
    fn from_decl(decl: &BytesDecl) -> Result<Self> {
        let version = decl.version().map_err(|e| OoxmlError::Xml(e.into()))?;
        let encoding = match decl.encoding() {
            Some(enc) => Some(lossy(enc.map_err(|e| OoxmlError::Xml(e.into()))?)),
            None => None,
        };
        let standalone = match decl.standalone() {
            Some(sa) => Some(lossy(sa.map_err(|e| OoxmlError::Xml(e.into()))?)),
            None => None,
        };
        Ok(Self {
            version: lossy(version),
            encoding,
            standalone,
        })
    }
}

fn lossy(bytes: Cow<'_, [u8]>) -> String {
    String::from_utf8_lossy(&bytes).into_owned()
}

/// A parsed XML part: declaration, prolog nodes and the root element
#[derive(Debug, Clone, PartialEq)]
pub struct XmlTree {
    /// XML declaration, if the source had one
    pub declaration: Option<XmlDeclaration>,
    /// Comments and whitespace between the declaration and the root
    pub prolog: Vec<XmlNode>,
    /// The document element
    pub root: XmlElement,
}

impl XmlTree {
    /// Wrap a root element with the default declaration
    pub fn new(root: XmlElement) -> Self {
        Self {
            declaration: Some(XmlDeclaration::default()),
            prolog: Vec::new(),
            root,
        }
    }

    /// Parse XML bytes into a tree
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        // Whitespace inside runs is significant
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut declaration = None;
        let mut prolog = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let node = match reader.read_event_into(&mut buf)? {
                Event::Decl(ref d) => {
                    declaration = Some(XmlDeclaration::from_decl(d)?);
                    None
                }
                Event::Start(ref e) => {
                    stack.push(XmlElement::from_start(e)?);
                    None
                }
                Event::Empty(ref e) => Some(XmlNode::Element(XmlElement::from_start(e)?)),
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| OoxmlError::structure("unbalanced end tag"))?;
                    Some(XmlNode::Element(element))
                }
                Event::Text(ref t) => {
                    let text = t.unescape().map_err(|e| OoxmlError::Xml(e.into()))?;
                    Some(XmlNode::Text(text.into_owned()))
                }
                Event::CData(ref c) => Some(XmlNode::CData(String::from_utf8_lossy(c).into_owned())),
                Event::Comment(ref c) => {
                    Some(XmlNode::Comment(String::from_utf8_lossy(c).into_owned()))
                }
                Event::Eof => break,
                _ => None,
            };

            if let Some(node) = node {
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => match node {
                        XmlNode::Element(el) => {
                            if root.is_some() {
                                return Err(OoxmlError::structure("multiple root elements"));
                            }
                            root = Some(el);
                        }
                        // Trailing whitespace after the root is dropped
                        other if root.is_none() => prolog.push(other),
                        _ => {}
                    },
                }
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(OoxmlError::structure(format!(
                "unclosed element <{}>",
                open.name
            )));
        }

        let root = root.ok_or_else(|| OoxmlError::structure("no root element"))?;
        Ok(Self {
            declaration,
            prolog,
            root,
        })
    }

    /// Serialize the tree back to XML bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        if let Some(decl) = &self.declaration {
            writer.write_event(Event::Decl(BytesDecl::new(
                &decl.version,
                decl.encoding.as_deref(),
                decl.standalone.as_deref(),
            )))?;
        }
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        Ok(writer.into_inner())
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<()> {
    match node {
        XmlNode::Element(el) => write_element(writer, el)?,
        XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        XmlNode::CData(data) => writer.write_event(Event::CData(BytesCData::new(data.as_str())))?,
        XmlNode::Comment(comment) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?
        }
    }
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let start = BytesStart::new(element.name.as_str()).with_attributes(
        element
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str())),
    );

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(xml: &str) -> String {
        let tree = XmlTree::parse(xml.as_bytes()).unwrap();
        String::from_utf8(tree.to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn test_parse_nested_elements() {
        let tree = XmlTree::parse(br#"<a:root xmlns:a="urn:x"><a:child k="v">hi</a:child></a:root>"#)
            .unwrap();

        assert_eq!(tree.root.name, "a:root");
        assert_eq!(tree.root.local_name(), "root");

        let XmlNode::Element(child) = &tree.root.children[0] else {
            panic!("expected an element child");
        };
        assert_eq!(child.attribute_local("k"), Some("v"));
        assert_eq!(child.text(), "hi");
    }

    #[test]
    fn test_roundtrip_preserves_markup() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="urn:w"><w:body>
  <!-- keep me -->
  <w:p w:rsidR="00AB"><w:r><w:t xml:space="preserve"> spaced </w:t></w:r></w:p>
</w:body></w:document>"#;
        assert_eq!(roundtrip(xml), xml);
    }

    #[test]
    fn test_roundtrip_escapes_text_and_attributes() {
        let tree = XmlTree::parse(br#"<r a="x &amp; &quot;y&quot;">1 &lt; 2 &amp; 3</r>"#).unwrap();
        assert_eq!(tree.root.attribute_local("a"), Some(r#"x & "y""#));
        assert_eq!(tree.root.text(), "1 < 2 & 3");

        let again = XmlTree::parse(&tree.to_bytes().unwrap()).unwrap();
        assert_eq!(again, tree);
    }

    #[test]
    fn test_cdata_preserved() {
        let tree = XmlTree::parse(b"<r><![CDATA[<raw>]]></r>").unwrap();
        assert_eq!(tree.root.children, vec![XmlNode::CData("<raw>".to_string())]);
        assert_eq!(roundtrip("<r><![CDATA[<raw>]]></r>"), "<r><![CDATA[<raw>]]></r>");
    }

    #[test]
    fn test_empty_element_written_self_closing() {
        assert_eq!(roundtrip("<r><e></e></r>"), "<r><e/></r>");
    }

    #[test]
    fn test_set_attribute_replaces() {
        let mut el = XmlElement::new("w:t").with_attribute("xml:space", "default");
        el.set_attribute("xml:space", "preserve");
        assert_eq!(el.attributes.len(), 1);
        assert_eq!(el.attribute_local("space"), Some("preserve"));
    }

    #[test]
    fn test_mismatched_end_tag_is_error() {
        assert!(XmlTree::parse(b"<a><b></a>").is_err());
    }

    #[test]
    fn test_unclosed_element_is_error() {
        assert!(XmlTree::parse(b"<a><b>").is_err());
    }

    #[test]
    fn test_missing_root_is_error() {
        let result = XmlTree::parse(br#"<?xml version="1.0"?>"#);
        assert!(matches!(result, Err(OoxmlError::InvalidStructure(_))));
    }
}
