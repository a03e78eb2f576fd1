//! Placeholder matching
//!
//! A placeholder is `{{name}}` where `name` is a field of the current row.
//! One [`PlaceholderPattern`] is compiled per row from that row's field
//! names, so tokens naming anything else are never matched and stay in the
//! document as literal text.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use dokmerge_ooxml::Document;
use regex::{CaptureMatches, Match, Regex};

use crate::error::Result;
use crate::flatten::flatten;
use crate::walker::paragraphs;

/// Any `{{...}}` token, known key or not
static ANY_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("valid placeholder regex"));

/// Matcher for `{{key}}` tokens over a fixed key set
#[derive(Debug, Clone)]
pub struct PlaceholderPattern {
    /// `None` when the key set is empty: nothing can match
    regex: Option<Regex>,
    key_count: usize,
}

impl PlaceholderPattern {
    /// Compile a matcher for the given keys
    ///
    /// Keys are matched literally. Empty keys are ignored.
    pub fn new<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: BTreeSet<String> = keys
            .into_iter()
            .map(|k| k.as_ref().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if keys.is_empty() {
            return Ok(Self {
                regex: None,
                key_count: 0,
            });
        }

        let alternation = keys
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let regex = Regex::new(&format!(r"\{{\{{({})\}}\}}", alternation))?;

        Ok(Self {
            regex: Some(regex),
            key_count: keys.len(),
        })
    }

    /// Whether `text` contains at least one known placeholder
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(text))
    }

    /// Spans of the known placeholders in `text`, left to right
    pub fn find_iter<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Match<'a>> + 'a {
        self.regex.iter().flat_map(move |re| re.find_iter(text))
    }

    /// Known placeholders in `text`, left to right; group 1 is the key
    pub fn captures_iter<'r, 'h>(&'r self, text: &'h str) -> Option<CaptureMatches<'r, 'h>> {
        self.regex.as_ref().map(|re| re.captures_iter(text))
    }

    /// The compiled expression, if any key was given
    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }

    /// Number of distinct keys
    pub fn key_count(&self) -> usize {
        self.key_count
    }
}

/// Every `{{name}}` token in the paragraphs a merge would visit
///
/// Names are collected whether or not any data column matches them.
pub fn scan_placeholders(document: &Document, nested_tables: bool) -> BTreeSet<String> {
    paragraphs(document, nested_tables)
        .into_iter()
        .flat_map(|p| {
            let text = flatten(p);
            ANY_PLACEHOLDER
                .captures_iter(&text)
                .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
                .collect::<Vec<_>>()
        })
        .collect()
}
