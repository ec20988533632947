//! Per-book attribute defaults derived from dictionary markup.
//!
//! A Strong's dictionary document carries one entry per "verse"; the
//! attributes its grammar spans share across a whole book become a
//! per-book default cell. Conflicting values degrade to the ambiguity
//! sentinel through the ordinary scalar merge.

use crate::analyze::payload_attributes;
use crate::annotation::Annotation;
use crate::bible::Bible;
use crate::database::Database;
use crate::errors::EngineResult;
use crate::walker::{run_operation, GrammarOp, SpanContext};

/// Default key pattern; `{book}` is replaced by the OSIS id.
pub const DEFAULT_KEY_PATTERN: &str = "{book}.dic+";

pub fn analyze_strong_dictionary(
    bible: &mut Bible,
    db: &mut Database,
    key_pattern: &str,
) -> EngineResult<()> {
    let mut op = DictionaryAnalyzer {
        db,
        pattern: key_pattern.to_string(),
    };
    run_operation(bible, &mut op)
}

struct DictionaryAnalyzer<'a> {
    db: &'a mut Database,
    pattern: String,
}

impl GrammarOp for DictionaryAnalyzer<'_> {
    fn span(&mut self, ctx: &SpanContext<'_>, ann: &mut Annotation) -> EngineResult<()> {
        let payload = payload_attributes(ann);
        if payload.is_empty() {
            return Ok(());
        }
        // Fold duplicate keys the same way the attribute merger does.
        let mut rendered: Vec<(String, String)> = Vec::new();
        for (k, v) in &payload {
            match rendered.iter_mut().find(|(rk, _)| rk == k) {
                Some((_, rv)) => {
                    rv.push(' ');
                    rv.push_str(v);
                }
                None => rendered.push((k.clone(), v.clone())),
            }
        }
        let value = rendered
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        let key = self.pattern.replace("{book}", ctx.reference.book.osis());
        self.db.merge(&key, &value);
        Ok(())
    }
}
