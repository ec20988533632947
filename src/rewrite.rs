//! Auxiliary span-rewrite passes.
//!
//! These do not touch the database; they prepare a document for a
//! later analyze/augment run or for export.

use crate::annotation::{Annotation, SourceIndex};
use crate::bible::{Bible, ContentNode};
use crate::errors::{EngineError, EngineResult};
use crate::walker::{run_operation, GrammarOp, SpanContext};

/// Assign the per-verse counter as the source index of every span.
///
/// A span that already carries indices is a data error: the pass would
/// silently produce a double numbering.
pub fn add_source_index(bible: &mut Bible) -> EngineResult<()> {
    struct AddSourceIndex;
    impl GrammarOp for AddSourceIndex {
        fn span(&mut self, ctx: &SpanContext<'_>, ann: &mut Annotation) -> EngineResult<()> {
            if ann.source_index.is_some() {
                return Err(EngineError::data(
                    ctx.reference,
                    "span already has a source index",
                ));
            }
            ann.source_index = Some(vec![SourceIndex::here(ctx.counter)]);
            Ok(())
        }
    }
    run_operation(bible, &mut AddSourceIndex)
}

/// Prefix every attribute key on every span.
pub fn add_attr_prefix(bible: &mut Bible, prefix: &str) -> EngineResult<()> {
    struct AddAttrPrefix {
        prefix: String,
    }
    impl GrammarOp for AddAttrPrefix {
        fn span(&mut self, _ctx: &SpanContext<'_>, ann: &mut Annotation) -> EngineResult<()> {
            for (key, _) in &mut ann.attributes {
                key.insert_str(0, &self.prefix);
            }
            Ok(())
        }
    }
    run_operation(
        bible,
        &mut AddAttrPrefix {
            prefix: prefix.to_string(),
        },
    )
}

/// Stash the literal text inside each grammar span as an attribute.
///
/// Implemented as a direct tree walk because it needs the span's
/// children, which the grammar-op callback deliberately does not see.
pub fn add_text_attr(bible: &mut Bible, key: &str) -> EngineResult<()> {
    fn walk(node: &mut ContentNode, key: &str) {
        if let ContentNode::Grammar {
            annotation,
            children,
        } = node
        {
            let mut text = String::new();
            for child in children.iter() {
                text.push_str(&child.flat_text());
            }
            annotation.attributes.push((key.to_string(), text));
            for child in children {
                walk(child, key);
            }
        }
    }
    for book in &mut bible.books {
        for chapter in &mut book.chapters {
            for verse in &mut chapter.verses {
                for node in &mut verse.content {
                    walk(node, key);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bible::{grammar_span, Book, Chapter, Verse};
    use crate::reference::BookId;

    fn doc(nodes: Vec<ContentNode>) -> Bible {
        let mut bible = Bible::new("t");
        let mut b = Book::new(BookId::new("Gen"));
        let mut c = Chapter::default();
        let mut v = Verse::new("1");
        v.content = nodes;
        c.verses.push(v);
        b.chapters.push(c);
        bible.books.push(b);
        bible
    }

    fn annotation(bible: &Bible, n: usize) -> &Annotation {
        match &bible.books[0].chapters[0].verses[0].content[n] {
            ContentNode::Grammar { annotation, .. } => annotation,
            other => panic!("expected grammar span, got {:?}", other),
        }
    }

    #[test]
    fn test_add_source_index_assigns_counter() {
        let mut bible = doc(vec![
            grammar_span(Annotation::default(), "a"),
            grammar_span(Annotation::default(), "b"),
        ]);
        add_source_index(&mut bible).unwrap();
        assert_eq!(
            annotation(&bible, 0).source_index,
            Some(vec![SourceIndex::here(1)])
        );
        assert_eq!(
            annotation(&bible, 1).source_index,
            Some(vec![SourceIndex::here(2)])
        );
    }

    #[test]
    fn test_add_source_index_rejects_existing_indices() {
        let mut bible = doc(vec![grammar_span(
            Annotation {
                source_index: Some(vec![SourceIndex::here(9)]),
                ..Annotation::default()
            },
            "a",
        )]);
        let err = add_source_index(&mut bible).unwrap_err();
        assert!(err.to_string().contains("Gen.1.1"), "{}", err);
    }

    #[test]
    fn test_add_attr_prefix() {
        let mut bible = doc(vec![grammar_span(
            Annotation {
                attributes: vec![("lemma".into(), "x".into())],
                ..Annotation::default()
            },
            "a",
        )]);
        add_attr_prefix(&mut bible, "osis:").unwrap();
        assert_eq!(
            annotation(&bible, 0).attributes,
            vec![("osis:lemma".to_string(), "x".to_string())]
        );
    }

    #[test]
    fn test_add_text_attr_collects_nested_text() {
        let mut bible = doc(vec![ContentNode::Grammar {
            annotation: Annotation::default(),
            children: vec![
                ContentNode::Text("in ".into()),
                grammar_span(Annotation::default(), "principio"),
            ],
        }]);
        add_text_attr(&mut bible, "x-text").unwrap();
        assert_eq!(
            annotation(&bible, 0).attributes,
            vec![("x-text".to_string(), "in principio".to_string())]
        );
    }
}
