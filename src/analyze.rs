//! The database-building pass.
//!
//! For each configured mode, every span contributes key/value
//! observations which are merged into the database under the
//! ambiguity-degrading rule. The list mode accumulates index tokens
//! across the whole run and is folded into the database only at
//! [`Analyzer::finish`]; attribute modes route through the attribute
//! merger instead of the plain scalar merge.

use crate::annotation::{Annotation, SourceIndex, SRC_ATTR, STRONG_REF_ATTR};
use crate::attr::{merge_in, MergeRules};
use crate::bible::Bible;
use crate::database::{CellValue, Database};
use crate::errors::EngineResult;
use crate::key::{encode_key, join_list};
use crate::mode::{Mode, TargetDim};
use crate::tokens::{index_positions, source_tokens};
use crate::walker::{run_operation, GrammarOp, SpanContext};
use std::collections::{BTreeMap, HashSet};

/// Build (or extend) a database from one document.
pub fn analyze(
    bible: &mut Bible,
    db: &mut Database,
    modes: &[Mode],
    rules: &MergeRules,
) -> EngineResult<()> {
    let mut analyzer = Analyzer::new(db, modes.to_vec(), rules);
    run_operation(bible, &mut analyzer)?;
    analyzer.finish();
    Ok(())
}

/// The analyze callback. Owns the list-mode accumulation state for the
/// duration of one run.
pub struct Analyzer<'a> {
    db: &'a mut Database,
    modes: Vec<Mode>,
    rules: &'a MergeRules,
    /// List-mode accumulation: key → index tokens in document order.
    lists: BTreeMap<String, Vec<String>>,
    /// Global (refkey, token) pairs already counted, so one underlying
    /// word re-rendered several times is not appended twice.
    seen_refkeys: HashSet<(String, String)>,
}

impl<'a> Analyzer<'a> {
    pub fn new(db: &'a mut Database, modes: Vec<Mode>, rules: &'a MergeRules) -> Self {
        Self {
            db,
            modes,
            rules,
            lists: BTreeMap::new(),
            seen_refkeys: HashSet::new(),
        }
    }

    /// Fold the accumulated lists into the database.
    ///
    /// A list that ended up with a single element is dropped ("no list
    /// needed", a preserved quirk of the observed behavior); the rest go
    /// through the scalar merge, so a joined value conflicting with a
    /// previously stored one degrades to ambiguous like any other.
    pub fn finish(self) {
        for (key, list) in self.lists {
            if list.len() < 2 {
                continue;
            }
            self.db.merge(&key, &join_list(&list));
        }
    }

    fn scalar(&mut self, mode: Mode, ctx: &SpanContext<'_>, ann: &Annotation) {
        let sources = match source_tokens(mode, ctx, ann) {
            Some(s) => s,
            None => return,
        };
        let values = match target_values(mode, ctx, ann) {
            Some(v) => v,
            None => return,
        };
        // A length mismatch means the relation does not apply here.
        if sources.tokens.len() != values.len() {
            return;
        }
        for (token, value) in sources.tokens.iter().zip(&values) {
            let key = encode_key(ctx.reference, mode.separator(), token, mode.suffix());
            self.db.merge(&key, value);
        }
    }

    fn list(&mut self, mode: Mode, ctx: &SpanContext<'_>, ann: &Annotation) {
        let sources = match source_tokens(mode, ctx, ann) {
            Some(s) => s,
            None => return,
        };
        let refkey = ann.strong_ref_key().map(str::to_string);
        for (token, position) in sources.tokens.iter().zip(&sources.positions) {
            if let Some(refkey) = &refkey {
                if !self
                    .seen_refkeys
                    .insert((refkey.clone(), token.clone()))
                {
                    continue;
                }
            }
            let key = encode_key(ctx.reference, mode.separator(), token, mode.suffix());
            self.lists.entry(key).or_default().push(position.to_string());
        }
    }

    fn attributes(&mut self, mode: Mode, ctx: &SpanContext<'_>, ann: &Annotation) {
        let sources = match source_tokens(mode, ctx, ann) {
            Some(s) => s,
            None => return,
        };
        let payload = payload_attributes(ann);
        if payload.is_empty() {
            return;
        }
        for (token, positions) in group_tokens(&sources.tokens, &sources.positions) {
            let key = encode_key(ctx.reference, mode.separator(), token, mode.suffix());
            match self.db.get(&key) {
                Some(CellValue::Ambiguous) => continue,
                existing => {
                    let existing = existing.and_then(CellValue::as_resolved).map(str::to_string);
                    let merged = merge_in(existing.as_deref(), &payload, &positions, self.rules);
                    self.db.set(key, CellValue::Resolved(merged));
                }
            }
        }
    }
}

impl GrammarOp for Analyzer<'_> {
    fn span(&mut self, ctx: &SpanContext<'_>, ann: &mut Annotation) -> EngineResult<()> {
        for mode in self.modes.clone() {
            match mode.target() {
                TargetDim::IndexList => self.list(mode, ctx, ann),
                TargetDim::Attributes => self.attributes(mode, ctx, ann),
                _ => self.scalar(mode, ctx, ann),
            }
        }
        Ok(())
    }
}

/// The span's target-dimension value tokens for a scalar mode.
fn target_values(mode: Mode, ctx: &SpanContext<'_>, ann: &Annotation) -> Option<Vec<String>> {
    match mode.target() {
        TargetDim::Morph => ann.morph.clone(),
        TargetDim::Strongs => {
            let nt = ctx.reference.book.is_nt();
            ann.strongs
                .as_ref()
                .map(|s| s.iter().map(|n| n.format(nt)).collect())
        }
        TargetDim::Index => Some(
            index_positions(ann, ctx.counter)
                .iter()
                .map(SourceIndex::to_string)
                .collect(),
        ),
        TargetDim::IndexList | TargetDim::Attributes => None,
    }
}

/// The span's attributes minus the reserved bookkeeping keys.
pub(crate) fn payload_attributes(ann: &Annotation) -> Vec<(String, String)> {
    ann.attributes
        .iter()
        .filter(|(k, _)| k != SRC_ATTR && k != STRONG_REF_ATTR)
        .cloned()
        .collect()
}

/// Group equal tokens of one span, keeping first-occurrence order and
/// collecting each token's positions.
pub(crate) fn group_tokens<'t>(
    tokens: &'t [String],
    positions: &[SourceIndex],
) -> Vec<(&'t str, Vec<SourceIndex>)> {
    let mut groups: Vec<(&str, Vec<SourceIndex>)> = Vec::new();
    for (token, position) in tokens.iter().zip(positions) {
        match groups.iter_mut().find(|(t, _)| *t == token) {
            Some((_, ps)) => ps.push(position.clone()),
            None => groups.push((token, vec![position.clone()])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::StrongsNumber;
    use crate::bible::{grammar_span, Book, Chapter, ContentNode, Verse};
    use crate::reference::BookId;

    fn span(strongs: &[u32], morph: &[&str], indices: &[u32]) -> ContentNode {
        let ann = Annotation {
            strongs: if strongs.is_empty() {
                None
            } else {
                Some(
                    strongs
                        .iter()
                        .map(|&n| StrongsNumber::new(Some('G'), n, None))
                        .collect(),
                )
            },
            morph: if morph.is_empty() {
                None
            } else {
                Some(morph.iter().map(|s| s.to_string()).collect())
            },
            source_index: if indices.is_empty() {
                None
            } else {
                Some(indices.iter().map(|&i| SourceIndex::here(i)).collect())
            },
            attributes: Vec::new(),
        };
        grammar_span(ann, "w")
    }

    fn one_verse(book: &str, nodes: Vec<ContentNode>) -> Bible {
        let mut bible = Bible::new("src");
        let mut b = Book::new(BookId::new(book));
        let mut c = Chapter::default();
        let mut v = Verse::new("1");
        v.content = nodes;
        c.verses.push(v);
        b.chapters.push(c);
        bible.books.push(b);
        bible
    }

    fn run(bible: &mut Bible, db: &mut Database, modes: &[Mode]) {
        analyze(bible, db, modes, &MergeRules::default()).unwrap();
    }

    #[test]
    fn test_strongs_to_morph() {
        let mut bible = one_verse("John", vec![span(&[25], &["N-NSM"], &[])]);
        let mut db = Database::new();
        run(&mut bible, &mut db, &[Mode::Strongs2Morph]);
        assert_eq!(db.resolved("John.1.1*G25"), Some("N-NSM"));
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let make = || {
            one_verse(
                "John",
                vec![span(&[25], &["N-NSM"], &[3]), span(&[30], &["V-PAI"], &[4])],
            )
        };
        let mut db1 = Database::new();
        run(&mut make(), &mut db1, &[Mode::Strongs2Morph, Mode::Strongs2Index]);

        let mut db2 = Database::new();
        run(&mut make(), &mut db2, &[Mode::Strongs2Morph, Mode::Strongs2Index]);
        run(&mut make(), &mut db2, &[Mode::Strongs2Morph, Mode::Strongs2Index]);

        assert_eq!(db1, db2);
    }

    #[test]
    fn test_conflicting_morph_goes_ambiguous() {
        let mut bible = one_verse(
            "John",
            vec![span(&[25], &["N-NSM"], &[]), span(&[25], &["V-PAI"], &[])],
        );
        let mut db = Database::new();
        run(&mut bible, &mut db, &[Mode::Strongs2Morph]);
        assert_eq!(db.get("John.1.1*G25"), Some(&CellValue::Ambiguous));
    }

    #[test]
    fn test_length_mismatch_skips_span() {
        let mut bible = one_verse("John", vec![span(&[25, 30], &["N-NSM"], &[])]);
        let mut db = Database::new();
        run(&mut bible, &mut db, &[Mode::Strongs2Morph]);
        assert!(db.is_empty());
    }

    #[test]
    fn test_index_keyed_modes_use_counter_fallback() {
        let mut bible = one_verse(
            "John",
            vec![span(&[25], &[], &[]), span(&[30], &[], &[])],
        );
        let mut db = Database::new();
        run(&mut bible, &mut db, &[Mode::Index2Strongs]);
        assert_eq!(db.resolved("John.1.1@1@"), Some("G25"));
        assert_eq!(db.resolved("John.1.1@2@"), Some("G30"));
    }

    #[test]
    fn test_list_mode_accumulates_in_document_order() {
        let mut bible = one_verse(
            "Gen",
            vec![span(&[25], &[], &[3]), span(&[25], &[], &[7])],
        );
        let mut db = Database::new();
        run(&mut bible, &mut db, &[Mode::StrongsList2Index]);
        assert_eq!(db.resolved("Gen.1.1*G25@L"), Some("3,7"));
    }

    #[test]
    fn test_demotes_singleton_lists() {
        // Documented quirk: a list of length 1 is dropped entirely
        // rather than stored as a singleton.
        let mut bible = one_verse("Gen", vec![span(&[25], &[], &[3])]);
        let mut db = Database::new();
        run(&mut bible, &mut db, &[Mode::StrongsList2Index]);
        assert_eq!(db.get("Gen.1.1*G25@L"), None);
    }

    #[test]
    fn test_list_mode_dedups_by_strong_ref() {
        let mut with_ref = span(&[25], &[], &[3]);
        if let ContentNode::Grammar { annotation, .. } = &mut with_ref {
            annotation
                .attributes
                .push(("strong:ref".into(), "w9".into()));
        }
        let mut duplicate = span(&[25], &[], &[3]);
        if let ContentNode::Grammar { annotation, .. } = &mut duplicate {
            annotation
                .attributes
                .push(("strong:ref".into(), "w9".into()));
        }
        let third = span(&[25], &[], &[7]);

        let mut bible = one_verse("Gen", vec![with_ref, duplicate, third]);
        let mut db = Database::new();
        run(&mut bible, &mut db, &[Mode::StrongsList2Index]);
        // The duplicate occurrence is not counted twice.
        assert_eq!(db.resolved("Gen.1.1*G25@L"), Some("3,7"));
    }

    #[test]
    fn test_list_conflict_degrades_to_ambiguous() {
        let mut db = Database::new();
        let mut bible = one_verse(
            "Gen",
            vec![span(&[25], &[], &[3]), span(&[25], &[], &[7])],
        );
        run(&mut bible, &mut db, &[Mode::StrongsList2Index]);

        let mut other = one_verse(
            "Gen",
            vec![span(&[25], &[], &[4]), span(&[25], &[], &[8])],
        );
        run(&mut other, &mut db, &[Mode::StrongsList2Index]);
        assert_eq!(db.get("Gen.1.1*G25@L"), Some(&CellValue::Ambiguous));
    }

    #[test]
    fn test_attr_index_source_keys_all_three_targets() {
        let mut node = span(&[25], &["N-NSM"], &[]);
        if let ContentNode::Grammar { annotation, .. } = &mut node {
            annotation.attributes.push(("src".into(), "4".into()));
            annotation.attributes.push(("lemma".into(), "light".into()));
        }
        let mut bible = one_verse("John", vec![node]);
        let mut db = Database::new();
        run(
            &mut bible,
            &mut db,
            &[
                Mode::AttrIndex2Morph,
                Mode::AttrIndex2Strongs,
                Mode::AttrIndex2Attr,
            ],
        );
        // The src attribute keys the same index space as I-source modes,
        // one entry per target dimension suffix.
        assert_eq!(db.resolved("John.1.1@4"), Some("N-NSM"));
        assert_eq!(db.resolved("John.1.1@4@"), Some("G25"));
        assert_eq!(db.resolved("John.1.1@4+"), Some("lemma=light"));
    }

    #[test]
    fn test_attr_index_source_splits_on_whitespace() {
        let mut node = span(&[], &["N-NSM", "V-PAI"], &[]);
        if let ContentNode::Grammar { annotation, .. } = &mut node {
            annotation.attributes.push(("src".into(), "4 7".into()));
        }
        let mut bible = one_verse("John", vec![node]);
        let mut db = Database::new();
        run(&mut bible, &mut db, &[Mode::AttrIndex2Morph]);
        assert_eq!(db.resolved("John.1.1@4"), Some("N-NSM"));
        assert_eq!(db.resolved("John.1.1@7"), Some("V-PAI"));
    }

    #[test]
    fn test_attribute_mode_merges_through_merger() {
        let mut node = span(&[25], &[], &[3]);
        if let ContentNode::Grammar { annotation, .. } = &mut node {
            annotation.attributes.push(("lemma".into(), "φῶς".into()));
            // Reserved keys never land in the database value.
            annotation.attributes.push(("strong:ref".into(), "w1".into()));
        }
        let mut bible = one_verse("John", vec![node]);
        let mut db = Database::new();
        run(&mut bible, &mut db, &[Mode::Strongs2Attr]);
        assert_eq!(db.resolved("John.1.1*G25+"), Some("lemma=φῶς"));
    }
}
