//! Depth-first, document-order traversal over grammar spans.
//!
//! The walker is a deterministic in-order fold. It drives books →
//! chapters → verses → grammar spans and invokes a [`GrammarOp`] once
//! per span, handing it mutable access to the annotation so a pass can
//! thread a replacement onward to downstream consumers. Document order
//! is a correctness invariant, not an optimization: per-verse counters,
//! ellipsis-separator decisions and list consumption all depend on it.

use crate::annotation::Annotation;
use crate::bible::{Bible, ContentNode, Verse};
use crate::errors::EngineResult;
use crate::reference::VerseRef;

/// The traversal position handed to each span callback.
#[derive(Debug)]
pub struct SpanContext<'a> {
    pub reference: &'a VerseRef,
    /// 1-based position of this span within its verse, used as the
    /// implicit source index when the span carries none.
    pub counter: u32,
}

/// A per-span callback threaded through one full traversal.
///
/// `reset` and `prepare_verse` form the preparatory hook: `reset` is
/// called before every verse, then `prepare_verse` may build auxiliary
/// per-verse state (e.g. occurrence counts) that `span` consumes.
pub trait GrammarOp {
    /// Clear per-verse state. Called before every verse.
    fn reset(&mut self) {}

    /// Optional read-only preparatory pass over the verse, before its
    /// spans are visited.
    fn prepare_verse(&mut self, _reference: &VerseRef, _verse: &Verse) -> EngineResult<()> {
        Ok(())
    }

    /// Visit one grammar span in document order. The annotation may be
    /// rewritten in place; downstream consumers see the replacement.
    fn span(&mut self, ctx: &SpanContext<'_>, annotation: &mut Annotation) -> EngineResult<()>;
}

/// Run one operation over the whole document, in document order.
pub fn run_operation(bible: &mut Bible, op: &mut dyn GrammarOp) -> EngineResult<()> {
    for book in &mut bible.books {
        for (chapter_idx, chapter) in book.chapters.iter_mut().enumerate() {
            let chapter_number = chapter_idx as u32 + 1;
            for verse in &mut chapter.verses {
                let reference = VerseRef::new(book.id.clone(), chapter_number, verse.label.clone());
                op.reset();
                op.prepare_verse(&reference, verse)?;
                let mut counter = 0u32;
                for node in &mut verse.content {
                    walk_node(node, &reference, &mut counter, op)?;
                }
            }
        }
    }
    Ok(())
}

fn walk_node(
    node: &mut ContentNode,
    reference: &VerseRef,
    counter: &mut u32,
    op: &mut dyn GrammarOp,
) -> EngineResult<()> {
    if let ContentNode::Grammar {
        annotation,
        children,
    } = node
    {
        *counter += 1;
        let ctx = SpanContext {
            reference,
            counter: *counter,
        };
        op.span(&ctx, annotation)?;
        for child in children {
            walk_node(child, reference, counter, op)?;
        }
    }
    Ok(())
}

/// Visit every grammar span of a verse in document order, read-only.
/// Used by preparatory passes that size up a verse before rewriting it.
pub fn visit_verse_spans<'a>(verse: &'a Verse, mut f: impl FnMut(&'a Annotation)) {
    fn visit<'a>(node: &'a ContentNode, f: &mut impl FnMut(&'a Annotation)) {
        if let ContentNode::Grammar {
            annotation,
            children,
        } = node
        {
            f(annotation);
            for child in children {
                visit(child, f);
            }
        }
    }
    for node in &verse.content {
        visit(node, &mut f);
    }
}
