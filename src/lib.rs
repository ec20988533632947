//! Annotation cross-reference engine.
//!
//! Aligns and transfers grammar annotations (Strong's dictionary
//! links, morphology codes, source-word indices, free-form attributes)
//! between two differently segmented editions of the same text. One
//! edition is *analyzed* into a flat key→value database; the database
//! then *augments* the gaps of another edition, or cross-derives one
//! annotation kind from another.
//!
//! ## Modules
//!
//! - [`reference`], [`annotation`], [`bible`] - the document model
//! - [`walker`] - document-order traversal with per-verse counters
//! - [`key`] - the composite key/value codec
//! - [`mode`] - the ten correlation-mode descriptors
//! - [`database`] - ordered map with ambiguity-degrading merge
//! - [`analyze`] - the database-building pass
//! - [`correlate`] - two-phase list correlation for repeated tokens
//! - [`augment`] - the gap-filling pass
//! - [`attr`] - attribute concatenation and redistribution
//! - [`strongdic`], [`rewrite`], [`dump`] - auxiliary passes
//! - [`errors`] - the engine error taxonomy

pub mod analyze;
pub mod annotation;
pub mod attr;
pub mod augment;
pub mod bible;
pub mod correlate;
pub mod database;
pub mod dump;
pub mod errors;
pub mod key;
pub mod mode;
pub mod reference;
pub mod rewrite;
pub mod strongdic;
pub mod tokens;
pub mod walker;

pub use analyze::{analyze, Analyzer};
pub use annotation::{Annotation, SourceIndex, StrongsNumber, SRC_ATTR, STRONG_REF_ATTR};
pub use attr::{MergeRules, SeparatorRules};
pub use augment::augment;
pub use bible::{grammar_span, Bible, Book, Chapter, ContentNode, Verse};
pub use correlate::ListCorrelator;
pub use database::{CellValue, Database};
pub use dump::{dump, dump_words};
pub use errors::{EngineError, EngineResult};
pub use mode::{default_modes, parse_modes, Mode};
pub use reference::{BookId, VerseRef};
pub use rewrite::{add_attr_prefix, add_source_index, add_text_attr};
pub use strongdic::{analyze_strong_dictionary, DEFAULT_KEY_PATTERN};
pub use walker::{run_operation, GrammarOp, SpanContext};
