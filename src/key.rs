//! Composite key/value codec for the correlation database.
//!
//! Pure string composition and decomposition; no validation beyond the
//! token grammars. The key shape is
//! `<book>.<chapter>.<verse><sep><token><suffix>` where `<sep>` is `*`
//! for Strong's-keyed entries and `@` for index-keyed entries, and
//! `<token>` is a Strong's token, a decimal index, or a cross-verse
//! index `<book>.<chapter>.<verse>@<index>`.

use crate::annotation::{SourceIndex, StrongsNumber};
use crate::reference::{BookId, VerseRef};
use once_cell::sync::Lazy;
use regex::Regex;

static STRONGS_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z])0*([1-9][0-9]*)([a-zA-Z])?$").unwrap());

static CROSS_VERSE_INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([1-3]?[A-Za-z]+)\.([0-9]+)\.([^@]+)@([0-9]+)$").unwrap());

/// Compose a database key for one span token.
pub fn encode_key(reference: &VerseRef, sep: char, token: &str, suffix: &str) -> String {
    format!("{}{}{}{}", reference, sep, token, suffix)
}

/// Parse a Strong's token like `G25` or `H7225b`.
pub fn parse_strongs(token: &str) -> Option<StrongsNumber> {
    let caps = STRONGS_TOKEN.captures(token)?;
    let prefix = caps.get(1).and_then(|m| m.as_str().chars().next());
    let number: u32 = caps.get(2)?.as_str().parse().ok()?;
    let suffix = caps.get(3).and_then(|m| m.as_str().chars().next());
    Some(StrongsNumber::new(prefix, number, suffix))
}

/// Parse an index token: a decimal index, or the cross-verse form
/// `<book>.<chapter>.<verse>@<index>`.
pub fn parse_index(token: &str) -> Option<SourceIndex> {
    if let Ok(index) = token.parse::<u32>() {
        return Some(SourceIndex::here(index));
    }
    let caps = CROSS_VERSE_INDEX.captures(token)?;
    let book = BookId::new(caps.get(1)?.as_str());
    let chapter: u32 = caps.get(2)?.as_str().parse().ok()?;
    let verse = caps.get(3)?.as_str();
    let index: u32 = caps.get(4)?.as_str().parse().ok()?;
    Some(SourceIndex::at(VerseRef::new(book, chapter, verse), index))
}

/// Join list-mode cell values.
pub fn join_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(",")
}

/// Split a list-mode cell value into its ordered tokens.
pub fn split_list(value: &str) -> Vec<&str> {
    value.split(',').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genesis() -> VerseRef {
        VerseRef::new(BookId::new("Gen"), 1, "1")
    }

    #[test]
    fn test_encode_key_shapes() {
        let r = genesis();
        assert_eq!(encode_key(&r, '*', "G25", ""), "Gen.1.1*G25");
        assert_eq!(encode_key(&r, '@', "7", "@"), "Gen.1.1@7@");
        assert_eq!(encode_key(&r, '*', "G25", "@L"), "Gen.1.1*G25@L");
        assert_eq!(encode_key(&r, '*', "H7225", "+"), "Gen.1.1*H7225+");
    }

    #[test]
    fn test_parse_strongs_tokens() {
        assert_eq!(
            parse_strongs("G25"),
            Some(StrongsNumber::new(Some('G'), 25, None))
        );
        assert_eq!(
            parse_strongs("H7225b"),
            Some(StrongsNumber::new(Some('H'), 7225, Some('b')))
        );
        // Leading zeros are tolerated but not preserved.
        assert_eq!(
            parse_strongs("G0025"),
            Some(StrongsNumber::new(Some('G'), 25, None))
        );
        assert_eq!(parse_strongs("25"), None);
        assert_eq!(parse_strongs("G"), None);
        assert_eq!(parse_strongs("*"), None);
    }

    #[test]
    fn test_parse_index_tokens() {
        assert_eq!(parse_index("7"), Some(SourceIndex::here(7)));
        let cross = parse_index("Gen.1.2@5").unwrap();
        assert_eq!(cross.index, 5);
        assert_eq!(cross.source.unwrap().to_string(), "Gen.1.2");
        assert_eq!(parse_index("*"), None);
        assert_eq!(parse_index("Gen.1.2"), None);
    }

    #[test]
    fn test_cross_verse_token_round_trip() {
        let token = "1Cor.13.4@12";
        assert_eq!(parse_index(token).unwrap().to_string(), token);
    }

    #[test]
    fn test_list_round_trip() {
        assert_eq!(join_list(&["3", "7"]), "3,7");
        assert_eq!(split_list("3,7"), vec!["3", "7"]);
        assert_eq!(split_list("3"), vec!["3"]);
    }
}
