//! The persistent key→value correlation database.
//!
//! In memory this is an ordered map from composite string keys to
//! [`CellValue`]s. Ambiguity is a proper variant, not a magic string;
//! the literal `*` exists only at the file boundary. The merge rule is
//! write-once with degradation: the first observed value sticks,
//! re-observing the same value is a no-op, and observing a different
//! value permanently demotes the cell to [`CellValue::Ambiguous`].

use crate::errors::EngineError;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// The ambiguity sentinel as written to disk.
const SENTINEL: &str = "*";

/// A database cell: a resolved value, or "more than one distinct value
/// was observed; do not guess".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Resolved(String),
    Ambiguous,
}

impl CellValue {
    pub fn as_resolved(&self) -> Option<&str> {
        match self {
            CellValue::Resolved(value) => Some(value),
            CellValue::Ambiguous => None,
        }
    }
}

/// Ordered map of composite keys to cell values, persisted as a flat
/// `key=value` text file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Database {
    entries: BTreeMap<String, CellValue>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.entries.get(key)
    }

    /// Resolved value for a key; `None` for missing or ambiguous cells.
    pub fn resolved(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(CellValue::as_resolved)
    }

    /// Merge one observation into the database.
    ///
    /// Absent keys are inserted; identical repeated writes are
    /// idempotent; a differing value demotes the cell to ambiguous.
    /// Once ambiguous, a cell never changes again.
    pub fn merge(&mut self, key: &str, value: &str) {
        match self.entries.get_mut(key) {
            None => {
                self.entries
                    .insert(key.to_string(), CellValue::Resolved(value.to_string()));
            }
            Some(cell) => {
                if let CellValue::Resolved(existing) = cell {
                    if existing != value {
                        *cell = CellValue::Ambiguous;
                    }
                }
            }
        }
    }

    /// Overwrite a cell unconditionally. Used only by passes that own
    /// the whole key space they write (never by the merge passes).
    pub fn set(&mut self, key: impl Into<String>, value: CellValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Load a database from its flat-file form. Missing files are not
    /// an error here; callers decide whether to start empty.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = fs::read_to_string(path).map_err(|e| EngineError::Database {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&text).map_err(|message| EngineError::Database {
            path: path.display().to_string(),
            message,
        })
    }

    /// Serialize to the flat-file form and write it out.
    pub fn store(&self, path: &Path) -> Result<(), EngineError> {
        fs::write(path, self.serialize()).map_err(|e| EngineError::Database {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        let mut entries = BTreeMap::new();
        for (lineno, line) in text.lines().enumerate() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, raw_value) = split_entry(line)
                .ok_or_else(|| format!("line {}: missing key/value separator", lineno + 1))?;
            let value = if raw_value == SENTINEL {
                CellValue::Ambiguous
            } else {
                CellValue::Resolved(unescape(&raw_value)?)
            };
            entries.insert(unescape(&key)?, value);
        }
        Ok(Self { entries })
    }

    pub fn serialize(&self) -> String {
        let mut out = String::from("# verse-align database\n");
        for (key, cell) in &self.entries {
            out.push_str(&escape(key, true));
            out.push('=');
            match cell {
                CellValue::Resolved(value) => out.push_str(&escape(value, false)),
                CellValue::Ambiguous => out.push_str(SENTINEL),
            }
            out.push('\n');
        }
        out
    }
}

/// Split a line on the first unescaped `=`. Returns the still-escaped
/// halves.
fn split_entry(line: &str) -> Option<(String, String)> {
    let mut escaped = false;
    for (pos, ch) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '=' {
            return Some((line[..pos].to_string(), line[pos + 1..].to_string()));
        }
    }
    None
}

fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '=' if is_key => out.push_str("\\="),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('=') => out.push('='),
            Some(other) => return Err(format!("bad escape \\{}", other)),
            None => return Err("trailing backslash".to_string()),
        }
    }
    Ok(out)
}
