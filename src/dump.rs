//! Tab-separated annotation dumps.
//!
//! Two diagnostic writers, no database involved:
//!
//! - [`dump`]: one row per parallel-list position of every grammar
//!   span: reference, per-verse counter, 1-based position, Strong's
//!   token, morphology code, index token; blanks where a shorter list
//!   runs out.
//! - [`dump_words`]: one row per grammar span: reference, per-verse
//!   counter, `+`-joined Strong's / morphology / index tokens, and the
//!   span's literal text (nested spans included).
//!
//! `human_strongs` renders prefix-less Strong's numbers with the
//! testament-default prefix; otherwise tokens appear as recorded.

use crate::annotation::{Annotation, StrongsNumber};
use crate::bible::{Bible, ContentNode};
use crate::errors::EngineResult;
use crate::reference::VerseRef;
use crate::walker::{run_operation, GrammarOp, SpanContext};
use std::io::Write;

pub fn dump<W: Write>(bible: &mut Bible, out: &mut W, human_strongs: bool) -> EngineResult<()> {
    let mut op = Dumper { out, human_strongs };
    run_operation(bible, &mut op)
}

fn render_strongs(s: &StrongsNumber, nt: bool, human: bool) -> String {
    if human {
        return s.format(nt);
    }
    let mut out = String::new();
    if let Some(prefix) = s.prefix {
        out.push(prefix);
    }
    out.push_str(&s.number.to_string());
    if let Some(suffix) = s.suffix {
        out.push(suffix);
    }
    out
}

struct Dumper<'a, W: Write> {
    out: &'a mut W,
    human_strongs: bool,
}

impl<W: Write> GrammarOp for Dumper<'_, W> {
    fn span(&mut self, ctx: &SpanContext<'_>, ann: &mut Annotation) -> EngineResult<()> {
        let nt = ctx.reference.book.is_nt();
        let strongs: Vec<String> = ann
            .strongs
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(|s| render_strongs(s, nt, self.human_strongs))
            .collect();
        let morph = ann.morph.as_deref().unwrap_or(&[]);
        let indices: Vec<String> = ann
            .source_index
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(|i| i.to_string())
            .collect();

        let rows = strongs.len().max(morph.len()).max(indices.len());
        for i in 0..rows {
            writeln!(
                self.out,
                "{}\t{}\t{}\t{}\t{}\t{}",
                ctx.reference,
                ctx.counter,
                i + 1,
                strongs.get(i).map(String::as_str).unwrap_or(""),
                morph.get(i).map(String::as_str).unwrap_or(""),
                indices.get(i).map(String::as_str).unwrap_or(""),
            )?;
        }
        Ok(())
    }
}

/// One row per grammar span with its literal text. A direct tree walk
/// because it needs the span's children, which the grammar-op callback
/// deliberately does not see; rows come out in document order (outer
/// spans before nested ones).
pub fn dump_words<W: Write>(bible: &Bible, out: &mut W, human_strongs: bool) -> EngineResult<()> {
    for book in &bible.books {
        let nt = book.id.is_nt();
        for (chapter_idx, chapter) in book.chapters.iter().enumerate() {
            let chapter_number = chapter_idx as u32 + 1;
            for verse in &chapter.verses {
                let reference =
                    VerseRef::new(book.id.clone(), chapter_number, verse.label.clone());
                let mut counter = 0u32;
                for node in &verse.content {
                    write_word_rows(node, &reference, nt, human_strongs, &mut counter, out)?;
                }
            }
        }
    }
    Ok(())
}

fn write_word_rows<W: Write>(
    node: &ContentNode,
    reference: &VerseRef,
    nt: bool,
    human_strongs: bool,
    counter: &mut u32,
    out: &mut W,
) -> EngineResult<()> {
    if let ContentNode::Grammar {
        annotation,
        children,
    } = node
    {
        *counter += 1;
        let strongs = annotation
            .strongs
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(|s| render_strongs(s, nt, human_strongs))
            .collect::<Vec<_>>()
            .join("+");
        let morph = annotation.morph.as_deref().unwrap_or(&[]).join("+");
        let indices = annotation
            .source_index
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("+");
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            reference,
            *counter,
            strongs,
            morph,
            indices,
            node.flat_text(),
        )?;
        for child in children {
            write_word_rows(child, reference, nt, human_strongs, counter, out)?;
        }
    }
    Ok(())
}
