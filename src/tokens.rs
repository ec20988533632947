//! Extraction of key-source tokens from a span.
//!
//! Each mode's source dimension yields, per span, an ordered token
//! list (what goes into the key) plus the aligned source positions
//! used for the attribute merger's contiguity checks.

use crate::annotation::{Annotation, SourceIndex, SRC_ATTR};
use crate::key;
use crate::mode::{Mode, SourceDim};
use crate::walker::SpanContext;

/// Key tokens of one span for one source dimension, with aligned
/// positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTokens {
    pub tokens: Vec<String>,
    pub positions: Vec<SourceIndex>,
}

/// Extract the source tokens for a mode, or `None` when the dimension
/// is not present on this span (mode inapplicable there).
pub fn source_tokens(
    mode: Mode,
    ctx: &SpanContext<'_>,
    annotation: &Annotation,
) -> Option<SourceTokens> {
    match mode.source() {
        SourceDim::Strongs => {
            let strongs = annotation.strongs.as_ref()?;
            let nt = ctx.reference.book.is_nt();
            let tokens: Vec<String> = strongs.iter().map(|s| s.format(nt)).collect();
            let positions = aligned_positions(annotation, ctx.counter, tokens.len());
            Some(SourceTokens { tokens, positions })
        }
        SourceDim::Index => {
            let positions = index_positions(annotation, ctx.counter);
            let tokens = positions.iter().map(|p| p.to_string()).collect();
            Some(SourceTokens { tokens, positions })
        }
        SourceDim::AttrIndex => {
            let raw = annotation.attribute(SRC_ATTR)?;
            let mut positions = Vec::new();
            for word in raw.split_whitespace() {
                // One malformed token makes the whole dimension unusable.
                positions.push(key::parse_index(word)?);
            }
            if positions.is_empty() {
                return None;
            }
            let tokens = positions.iter().map(|p| p.to_string()).collect();
            Some(SourceTokens { tokens, positions })
        }
    }
}

/// Explicit source indices, or the implicit per-verse counter as a
/// single position.
pub fn index_positions(annotation: &Annotation, counter: u32) -> Vec<SourceIndex> {
    match &annotation.source_index {
        Some(indices) => indices.clone(),
        None => vec![SourceIndex::here(counter)],
    }
}

/// Positions aligned with `len` tokens: the explicit indices when the
/// counts line up, otherwise consecutive counter-based positions.
fn aligned_positions(annotation: &Annotation, counter: u32, len: usize) -> Vec<SourceIndex> {
    match &annotation.source_index {
        Some(indices) if indices.len() == len => indices.clone(),
        _ => (0..len as u32)
            .map(|i| SourceIndex::here(counter + i))
            .collect(),
    }
}
