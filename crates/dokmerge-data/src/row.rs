//! Row data: typed cell values, one row per output document.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{DataError, Result};

/// Largest magnitude printed as an integer
const INTEGRAL_LIMIT: f64 = 1e15;

/// A single cell value, typed at the data boundary
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text, used verbatim
    Text(String),
    /// Any numeric cell
    Number(f64),
    /// A date or timestamp
    Date(NaiveDateTime),
    /// An empty or unreadable cell
    Null,
}

impl Value {
    /// Whether this is [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Canonical text, `None` for nulls
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    /// Canonical formatting; nulls print as nothing
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < INTEGRAL_LIMIT {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            // Midnight keeps its time part
            Value::Date(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::Null => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        if n.is_nan() {
            Value::Null
        } else {
            Value::Number(n)
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::Date(dt)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d.and_time(NaiveTime::MIN))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One record: field name to value, in column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether the row has a field named `key`
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Field names in column order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Fields in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Set a field, replacing any previous value under the same name
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

/// A header plus the records below it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl RowSet {
    /// Create an empty set with the given header
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a set from a grid whose first line is the header
    ///
    /// Header cells are turned into column names: blanks become
    /// `Unnamed: <index>` and repeated names get `.1`, `.2`... suffixes.
    /// Lines whose cells are all null are dropped; short lines are padded
    /// with nulls and cells beyond the header are ignored.
    pub fn from_grid<I>(grid: I) -> Self
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        let mut lines = grid.into_iter();
        let header = match lines.next() {
            Some(header) => header,
            None => return Self::default(),
        };

        let mut set = Self::new(column_names(&header));
        for line in lines {
            if line.iter().all(Value::is_null) {
                continue;
            }
            let mut cells = line.into_iter();
            let row = set
                .headers
                .iter()
                .map(|h| (h.clone(), cells.next().unwrap_or(Value::Null)))
                .collect();
            set.rows.push(row);
        }
        set
    }

    /// Append a record
    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Column names
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Records in source order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Number of records (header excluded)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fail unless every named column is present in the header
    pub fn require_columns(&self, columns: &[&str]) -> Result<()> {
        let missing: Vec<String> = columns
            .iter()
            .filter(|c| !self.headers.iter().any(|h| h.as_str() == **c))
            .map(|c| c.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DataError::MissingColumns(missing))
        }
    }
}

impl IntoIterator for RowSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn column_names(header: &[Value]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(header.len());
    for (index, cell) in header.iter().enumerate() {
        let base = match cell.as_text() {
            Some(text) if !text.is_empty() => text,
            _ => format!("Unnamed: {}", index),
        };
        let mut name = base.clone();
        let mut n = 1;
        while names.contains(&name) {
            name = format!("{}.{}", base, n);
            n += 1;
        }
        names.push(name);
    }
    names
}
