//! Two-phase list correlation for repeated tokens.
//!
//! The database stores one index list per (reference, Strong's token)
//! key, but the consuming document may render occurrences in a
//! different multiplicity or order. A preparatory read-only traversal
//! counts the correlatable occurrences per key (honoring `strong:ref`
//! dedup); during augmentation each occurrence consumes the next list
//! slot only when the list length matches that expected count, the
//! guard against silent misalignment.

use crate::annotation::Annotation;
use crate::annotation::SourceIndex;
use crate::bible::Bible;
use crate::database::Database;
use crate::errors::EngineResult;
use crate::key::{encode_key, parse_index, split_list};
use crate::mode::Mode;
use crate::tokens::source_tokens;
use crate::walker::{run_operation, GrammarOp, SpanContext};
use std::collections::{HashMap, HashSet};

/// Transient correlation state for one augment run.
#[derive(Debug, Default)]
pub struct ListCorrelator {
    /// Correlatable occurrences per encoded `@L` key in this document.
    expected: HashMap<String, usize>,
    /// Slots consumed so far per key.
    consumed: HashMap<String, usize>,
    /// Index already assigned per (refkey, token), reused instead of
    /// consuming a second slot.
    assigned: HashMap<(String, String), SourceIndex>,
}

impl ListCorrelator {
    /// Preparatory phase: count correlatable occurrences over the
    /// whole document.
    pub fn prepare(bible: &mut Bible) -> EngineResult<Self> {
        let mut counter = OccurrenceCounter::default();
        run_operation(bible, &mut counter)?;
        Ok(Self {
            expected: counter.expected,
            consumed: HashMap::new(),
            assigned: HashMap::new(),
        })
    }

    /// Consumption phase: resolve the index for one occurrence of
    /// `token` on a span, or `None` when the database cannot answer
    /// safely (missing or ambiguous list, or a length/expected-count
    /// mismatch).
    pub fn next_index(
        &mut self,
        db: &Database,
        ctx: &SpanContext<'_>,
        token: &str,
        refkey: Option<&str>,
    ) -> Option<SourceIndex> {
        if let Some(refkey) = refkey {
            if let Some(index) = self
                .assigned
                .get(&(refkey.to_string(), token.to_string()))
            {
                return Some(index.clone());
            }
        }

        let key = encode_key(
            ctx.reference,
            Mode::StrongsList2Index.separator(),
            token,
            Mode::StrongsList2Index.suffix(),
        );
        let list = db.resolved(&key)?;
        let slots = split_list(list);
        let expected = self.expected.get(&key).copied().unwrap_or(0);
        if slots.len() != expected {
            return None;
        }
        let position = self.consumed.entry(key).or_insert(0);
        let slot = slots.get(*position)?;
        let index = parse_index(slot)?;
        *position += 1;
        if let Some(refkey) = refkey {
            self.assigned
                .insert((refkey.to_string(), token.to_string()), index.clone());
        }
        Some(index)
    }
}

/// Read-only counting pass behind [`ListCorrelator::prepare`].
#[derive(Debug, Default)]
struct OccurrenceCounter {
    expected: HashMap<String, usize>,
    seen_refkeys: HashSet<(String, String)>,
}

impl GrammarOp for OccurrenceCounter {
    fn span(&mut self, ctx: &SpanContext<'_>, ann: &mut Annotation) -> EngineResult<()> {
        let sources = match source_tokens(Mode::StrongsList2Index, ctx, ann) {
            Some(s) => s,
            None => return Ok(()),
        };
        let refkey = ann.strong_ref_key().map(str::to_string);
        for token in &sources.tokens {
            if let Some(refkey) = &refkey {
                if !self
                    .seen_refkeys
                    .insert((refkey.clone(), token.clone()))
                {
                    continue;
                }
            }
            let key = encode_key(
                ctx.reference,
                Mode::StrongsList2Index.separator(),
                token,
                Mode::StrongsList2Index.suffix(),
            );
            *self.expected.entry(key).or_insert(0) += 1;
        }
        Ok(())
    }
}
