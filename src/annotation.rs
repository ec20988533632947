//! Annotation payloads attached to grammar spans.
//!
//! An [`Annotation`] carries up to four parallel relations over the
//! same span: Strong's dictionary links, morphology codes, source-word
//! indices, and free-form key/value attributes. Parallel lists that
//! describe the same span should have the same length when both are
//! present; the engine treats a length mismatch as "this relation does
//! not apply here" rather than guessing an alignment.

use crate::reference::VerseRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute key marking "this occurrence is the same underlying word
/// as any other occurrence sharing the value" (used for list
/// correlation dedup).
pub const STRONG_REF_ATTR: &str = "strong:ref";

/// Attribute key holding raw source-word index tokens for the
/// attribute-sourced modes.
pub const SRC_ATTR: &str = "src";

/// One Strong's dictionary link: optional prefix letter, number,
/// optional disambiguation suffix letter (`G5457b`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrongsNumber {
    pub prefix: Option<char>,
    pub number: u32,
    pub suffix: Option<char>,
}

impl StrongsNumber {
    pub fn new(prefix: Option<char>, number: u32, suffix: Option<char>) -> Self {
        Self {
            prefix,
            number,
            suffix,
        }
    }

    /// Render with an explicit prefix, falling back to the testament
    /// default when none was recorded.
    pub fn format(&self, nt: bool) -> String {
        let prefix = self.prefix.unwrap_or(if nt { 'G' } else { 'H' });
        match self.suffix {
            Some(suffix) => format!("{}{}{}", prefix, self.number, suffix),
            None => format!("{}{}", prefix, self.number),
        }
    }
}

/// A source-word index, optionally pointing into a different verse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceIndex {
    /// Cross-verse reference; `None` means "this verse".
    pub source: Option<VerseRef>,
    pub index: u32,
}

impl SourceIndex {
    pub fn here(index: u32) -> Self {
        Self {
            source: None,
            index,
        }
    }

    pub fn at(source: VerseRef, index: u32) -> Self {
        Self {
            source: Some(source),
            index,
        }
    }
}

impl fmt::Display for SourceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}@{}", source, self.index),
            None => write!(f, "{}", self.index),
        }
    }
}

/// The full annotation payload of one grammar span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub strongs: Option<Vec<StrongsNumber>>,
    pub morph: Option<Vec<String>>,
    pub source_index: Option<Vec<SourceIndex>>,
    /// Ordered pairs; keys may repeat (one value per token position).
    pub attributes: Vec<(String, String)>,
}

impl Annotation {
    pub fn is_empty(&self) -> bool {
        self.strongs.is_none()
            && self.morph.is_none()
            && self.source_index.is_none()
            && self.attributes.is_empty()
    }

    /// First value of the given attribute key, if any.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values recorded for the given attribute key, in order.
    pub fn attribute_values(&self, key: &str) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// The span's `strong:ref` dedup token, if present.
    pub fn strong_ref_key(&self) -> Option<&str> {
        self.attribute(STRONG_REF_ATTR)
    }

    /// True when the span carries no attributes apart from the
    /// reserved `src` / `strong:ref` keys. This is the "attributes are
    /// absent" test used before augmenting the attribute dimension.
    pub fn lacks_payload_attributes(&self) -> bool {
        self.attributes
            .iter()
            .all(|(k, _)| k == SRC_ATTR || k == STRONG_REF_ATTR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::BookId;

    #[test]
    fn test_strongs_format_defaults() {
        let n = StrongsNumber::new(None, 25, None);
        assert_eq!(n.format(true), "G25");
        assert_eq!(n.format(false), "H25");

        let n = StrongsNumber::new(Some('A'), 7, Some('b'));
        assert_eq!(n.format(true), "A7b");
    }

    #[test]
    fn test_source_index_display() {
        assert_eq!(SourceIndex::here(3).to_string(), "3");
        let cross = SourceIndex::at(VerseRef::new(BookId::new("Gen"), 1, "2"), 5);
        assert_eq!(cross.to_string(), "Gen.1.2@5");
    }

    #[test]
    fn test_payload_attribute_test_ignores_reserved_keys() {
        let mut ann = Annotation::default();
        assert!(ann.lacks_payload_attributes());

        ann.attributes.push(("src".into(), "4".into()));
        ann.attributes.push(("strong:ref".into(), "w1".into()));
        assert!(ann.lacks_payload_attributes());

        ann.attributes.push(("lemma".into(), "φῶς".into()));
        assert!(!ann.lacks_payload_attributes());
    }

    #[test]
    fn test_repeated_attribute_values() {
        let ann = Annotation {
            attributes: vec![
                ("acc".into(), "w1".into()),
                ("lemma".into(), "x".into()),
                ("acc".into(), "w2".into()),
            ],
            ..Annotation::default()
        };
        assert_eq!(ann.attribute("acc"), Some("w1"));
        assert_eq!(ann.attribute_values("acc"), vec!["w1", "w2"]);
    }
}
