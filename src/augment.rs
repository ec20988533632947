//! The gap-filling pass.
//!
//! For each configured mode, a span is only touched when its target
//! dimension is absent; ambiguous or missing database cells leave the
//! span untouched (never guess). Modes run in the configured order, so
//! a later mode may consume a value produced by an earlier one in the
//! same pass.

use crate::annotation::Annotation;
use crate::attr::{split_out, MergeRules};
use crate::bible::Bible;
use crate::correlate::ListCorrelator;
use crate::database::{CellValue, Database};
use crate::errors::EngineResult;
use crate::key::{encode_key, parse_index, parse_strongs};
use crate::mode::{Mode, TargetDim};
use crate::tokens::source_tokens;
use crate::walker::{run_operation, visit_verse_spans, GrammarOp, SpanContext};
use crate::{analyze::group_tokens, bible::Verse, reference::VerseRef};
use std::collections::HashMap;

/// Fill annotation gaps in one document from a database.
pub fn augment(
    bible: &mut Bible,
    db: &Database,
    modes: &[Mode],
    rules: &MergeRules,
) -> EngineResult<()> {
    let correlator = if modes.contains(&Mode::StrongsList2Index) {
        Some(ListCorrelator::prepare(bible)?)
    } else {
        None
    };
    let mut augmentor = Augmentor {
        db,
        modes: modes.to_vec(),
        rules,
        correlator,
        attr_expected: HashMap::new(),
        attr_consumed: HashMap::new(),
    };
    run_operation(bible, &mut augmentor)
}

/// The augment callback. Owns the transient per-run state: the list
/// correlator and the per-verse attribute share counters.
struct Augmentor<'a> {
    db: &'a Database,
    modes: Vec<Mode>,
    rules: &'a MergeRules,
    correlator: Option<ListCorrelator>,
    /// Per verse: expected share consumers per attribute-mode key.
    attr_expected: HashMap<String, usize>,
    /// Per verse: shares consumed so far per attribute-mode key.
    attr_consumed: HashMap<String, usize>,
}

impl GrammarOp for Augmentor<'_> {
    fn reset(&mut self) {
        self.attr_expected.clear();
        self.attr_consumed.clear();
    }

    fn prepare_verse(&mut self, reference: &VerseRef, verse: &Verse) -> EngineResult<()> {
        let attr_modes: Vec<Mode> = self
            .modes
            .iter()
            .copied()
            .filter(|m| m.target() == TargetDim::Attributes)
            .collect();
        if attr_modes.is_empty() {
            return Ok(());
        }

        // Count, per key, how many spans of this verse will expect a
        // share of the stored attribute sequence.
        let mut counter = 0u32;
        visit_verse_spans(verse, |ann| {
            counter += 1;
            if !ann.lacks_payload_attributes() {
                return;
            }
            let ctx = SpanContext { reference, counter };
            for mode in &attr_modes {
                if let Some(sources) = source_tokens(*mode, &ctx, ann) {
                    for token in &sources.tokens {
                        let key =
                            encode_key(reference, mode.separator(), token, mode.suffix());
                        *self.attr_expected.entry(key).or_insert(0) += 1;
                    }
                }
            }
        });
        Ok(())
    }

    fn span(&mut self, ctx: &SpanContext<'_>, ann: &mut Annotation) -> EngineResult<()> {
        for mode in self.modes.clone() {
            match mode.target() {
                TargetDim::Morph => self.fill_morph(mode, ctx, ann),
                TargetDim::Strongs => self.fill_strongs(mode, ctx, ann),
                TargetDim::Index => self.fill_index(mode, ctx, ann),
                TargetDim::IndexList => self.fill_index_list(ctx, ann),
                TargetDim::Attributes => self.fill_attributes(mode, ctx, ann),
            }
        }
        Ok(())
    }
}

impl Augmentor<'_> {
    /// The stored values for every source token, or `None` as soon as
    /// one of them is missing or ambiguous (all-or-nothing per span).
    fn lookup_all(&self, mode: Mode, ctx: &SpanContext<'_>, tokens: &[String]) -> Option<Vec<String>> {
        tokens
            .iter()
            .map(|token| {
                let key = encode_key(ctx.reference, mode.separator(), token, mode.suffix());
                self.db.resolved(&key).map(str::to_string)
            })
            .collect()
    }

    fn fill_morph(&mut self, mode: Mode, ctx: &SpanContext<'_>, ann: &mut Annotation) {
        if ann.morph.is_some() {
            return;
        }
        let sources = match source_tokens(mode, ctx, ann) {
            Some(s) => s,
            None => return,
        };
        if let Some(values) = self.lookup_all(mode, ctx, &sources.tokens) {
            ann.morph = Some(values);
        }
    }

    fn fill_strongs(&mut self, mode: Mode, ctx: &SpanContext<'_>, ann: &mut Annotation) {
        if ann.strongs.is_some() {
            return;
        }
        let sources = match source_tokens(mode, ctx, ann) {
            Some(s) => s,
            None => return,
        };
        let values = match self.lookup_all(mode, ctx, &sources.tokens) {
            Some(v) => v,
            None => return,
        };
        let parsed: Option<Vec<_>> = values.iter().map(|v| parse_strongs(v)).collect();
        if let Some(strongs) = parsed {
            ann.strongs = Some(strongs);
        }
    }

    fn fill_index(&mut self, mode: Mode, ctx: &SpanContext<'_>, ann: &mut Annotation) {
        if ann.source_index.is_some() {
            return;
        }
        let sources = match source_tokens(mode, ctx, ann) {
            Some(s) => s,
            None => return,
        };
        let values = match self.lookup_all(mode, ctx, &sources.tokens) {
            Some(v) => v,
            None => return,
        };
        let parsed: Option<Vec<_>> = values.iter().map(|v| parse_index(v)).collect();
        if let Some(indices) = parsed {
            ann.source_index = Some(indices);
        }
    }

    fn fill_index_list(&mut self, ctx: &SpanContext<'_>, ann: &mut Annotation) {
        let correlator = match &mut self.correlator {
            Some(c) => c,
            None => return,
        };
        let sources = match source_tokens(Mode::StrongsList2Index, ctx, ann) {
            Some(s) => s,
            None => return,
        };
        // Every occurrence consumes its slot, whether or not the span
        // still needs an index, so later occurrences stay aligned.
        let refkey = ann.strong_ref_key().map(str::to_string);
        let mut resolved = Vec::with_capacity(sources.tokens.len());
        let mut complete = true;
        for token in &sources.tokens {
            match correlator.next_index(self.db, ctx, token, refkey.as_deref()) {
                Some(index) => resolved.push(index),
                None => complete = false,
            }
        }
        if ann.source_index.is_none() && complete && !resolved.is_empty() {
            ann.source_index = Some(resolved);
        }
    }

    fn fill_attributes(&mut self, mode: Mode, ctx: &SpanContext<'_>, ann: &mut Annotation) {
        if !ann.lacks_payload_attributes() {
            return;
        }
        let sources = match source_tokens(mode, ctx, ann) {
            Some(s) => s,
            None => return,
        };
        let groups = group_tokens(&sources.tokens, &sources.positions);

        let mut new_attrs: Vec<(String, String)> = Vec::new();
        let mut complete = true;
        for (token, positions) in &groups {
            let key = encode_key(ctx.reference, mode.separator(), token, mode.suffix());
            let expected = self
                .attr_expected
                .get(&key)
                .copied()
                .unwrap_or(positions.len());
            let base = self.attr_consumed.get(&key).copied().unwrap_or(0);
            // This occurrence group claims its shares no matter what,
            // so the next span still lines up.
            *self.attr_consumed.entry(key.clone()).or_insert(0) += positions.len();

            let stored = match self.db.get(&key) {
                Some(CellValue::Resolved(value)) => value.clone(),
                // Ambiguous or missing: never guess, whole set aborts.
                _ => {
                    complete = false;
                    continue;
                }
            };

            for (attr_key, attr_value) in crate::attr::parse_attr_string(&stored) {
                if expected > 1 {
                    let rules = self.rules.rules_for(&attr_key);
                    if !rules.can_split() {
                        complete = false;
                        break;
                    }
                    let shares = split_out(&attr_value, rules);
                    if shares.len() != expected {
                        complete = false;
                        break;
                    }
                    for j in 0..positions.len() {
                        match shares.get(base + j) {
                            Some(share) => new_attrs.push((attr_key.clone(), share.clone())),
                            None => {
                                complete = false;
                                break;
                            }
                        }
                    }
                } else {
                    new_attrs.push((attr_key, attr_value));
                }
            }
        }

        if complete && !new_attrs.is_empty() {
            ann.attributes.extend(new_attrs);
        }
    }
}
