//! Placeholder value resolution

use std::borrow::Cow;

use dokmerge_data::{Row, Value};

use crate::error::{MergeError, Result};

/// Maps a matched placeholder to its replacement text
pub trait ValueResolver {
    /// Resolve `key`, matched as the literal `token` (`{{key}}`)
    fn resolve<'a>(&'a self, key: &str, token: &'a str) -> Result<Cow<'a, str>>;
}

/// Resolves placeholders against one data row
///
/// - an absent key keeps the literal token;
/// - a null value becomes the empty string;
/// - anything else uses the value's canonical text.
#[derive(Debug, Clone, Copy)]
pub struct RowResolver<'r> {
    row: &'r Row,
}

impl<'r> RowResolver<'r> {
    pub fn new(row: &'r Row) -> Self {
        Self { row }
    }

    /// The row values come from
    pub fn row(&self) -> &'r Row {
        self.row
    }
}

impl ValueResolver for RowResolver<'_> {
    fn resolve<'a>(&'a self, key: &str, token: &'a str) -> Result<Cow<'a, str>> {
        let text = match self.row.get(key) {
            None => return Ok(Cow::Borrowed(token)),
            Some(Value::Null) => return Ok(Cow::Borrowed("")),
            Some(Value::Text(s)) => Cow::Borrowed(s.as_str()),
            Some(other) => Cow::Owned(other.to_string()),
        };
        check_xml_chars(key, &text)?;
        Ok(text)
    }
}

/// Reject characters that XML 1.0 cannot represent
fn check_xml_chars(key: &str, text: &str) -> Result<()> {
    let bad = text.chars().find(|&c| {
        matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
    });
    match bad {
        Some(c) => Err(MergeError::InvalidValue {
            key: key.to_string(),
            code: c as u32,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        [
            ("name", Value::from("Ada")),
            ("n", Value::Number(42.0)),
            ("empty", Value::Null),
            ("bell", Value::from("ding\u{7}")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_present_key() {
        let row = row();
        let resolver = RowResolver::new(&row);
        assert_eq!(resolver.resolve("name", "{{name}}").unwrap(), "Ada");
        assert_eq!(resolver.resolve("n", "{{n}}").unwrap(), "42");
    }

    #[test]
    fn test_absent_key_keeps_token() {
        let row = row();
        let resolver = RowResolver::new(&row);
        assert_eq!(resolver.resolve("nope", "{{nope}}").unwrap(), "{{nope}}");
    }

    #[test]
    fn test_null_is_empty() {
        let row = row();
        let resolver = RowResolver::new(&row);
        assert_eq!(resolver.resolve("empty", "{{empty}}").unwrap(), "");
    }

    #[test]
    fn test_control_characters_are_rejected() {
        let row = row();
        let resolver = RowResolver::new(&row);
        match resolver.resolve("bell", "{{bell}}") {
            Err(MergeError::InvalidValue { key, code }) => {
                assert_eq!(key, "bell");
                assert_eq!(code, 7);
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_tabs_and_newlines_are_allowed() {
        assert!(check_xml_chars("k", "a\tb\nc\r").is_ok());
        assert!(check_xml_chars("k", "\u{FFFE}").is_err());
    }
}
