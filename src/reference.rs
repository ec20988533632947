//! Book and verse references.
//!
//! References are small immutable value types constructed once per
//! traversal position. Verse labels are strings rather than numbers so
//! sub-verse suffixes like `6a` survive round-trips.

use serde::{Deserialize, Serialize};
use std::fmt;

/// OSIS identifiers of the 27 New Testament books, in canon order.
const NT_BOOKS: [&str; 27] = [
    "Matt", "Mark", "Luke", "John", "Acts", "Rom", "1Cor", "2Cor", "Gal", "Eph", "Phil", "Col",
    "1Thess", "2Thess", "1Tim", "2Tim", "Titus", "Phlm", "Heb", "Jas", "1Pet", "2Pet", "1John",
    "2John", "3John", "Jude", "Rev",
];

/// Identifier of one book, carrying its OSIS id and testament.
///
/// The NT flag drives the default Strong's prefix (`G` for NT, `H`
/// otherwise) when a token was stored without an explicit prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId {
    osis: String,
    nt: bool,
}

impl BookId {
    pub fn new(osis: impl Into<String>) -> Self {
        let osis = osis.into();
        let nt = NT_BOOKS.contains(&osis.as_str());
        Self { osis, nt }
    }

    pub fn osis(&self) -> &str {
        &self.osis
    }

    pub fn is_nt(&self) -> bool {
        self.nt
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.osis)
    }
}

/// Position of one verse: book, 1-based chapter, verse label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerseRef {
    pub book: BookId,
    pub chapter: u32,
    pub verse: String,
}

impl VerseRef {
    pub fn new(book: BookId, chapter: u32, verse: impl Into<String>) -> Self {
        Self {
            book,
            chapter,
            verse: verse.into(),
        }
    }
}

impl fmt::Display for VerseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.book, self.chapter, self.verse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testament_classification() {
        assert!(BookId::new("Matt").is_nt());
        assert!(BookId::new("Rev").is_nt());
        assert!(!BookId::new("Gen").is_nt());
        assert!(!BookId::new("Mal").is_nt());
    }

    #[test]
    fn test_reference_display() {
        let r = VerseRef::new(BookId::new("Gen"), 1, "1");
        assert_eq!(r.to_string(), "Gen.1.1");

        let r = VerseRef::new(BookId::new("John"), 3, "16a");
        assert_eq!(r.to_string(), "John.3.16a");
    }
}
