//! Minimal document tree the engine traverses.
//!
//! The engine only depends on two capabilities: visiting grammar spans
//! in document order and replacing their annotations in place. Books,
//! chapters and verses are plain ordered vectors; chapter numbers are
//! implicit (1-based position).

use crate::annotation::Annotation;
use crate::reference::BookId;
use serde::{Deserialize, Serialize};

/// A whole document: ordered books.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bible {
    pub name: String,
    pub books: Vec<Book>,
}

impl Bible {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            books: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub chapters: Vec<Chapter>,
}

impl Book {
    pub fn new(id: BookId) -> Self {
        Self {
            id,
            chapters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub verses: Vec<Verse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    /// Verse label; a string so sub-verse labels like `6a` survive.
    pub label: String,
    pub content: Vec<ContentNode>,
}

impl Verse {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: Vec::new(),
        }
    }
}

/// One node of verse content. Grammar spans may nest; traversal visits
/// outer spans before inner ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentNode {
    Text(String),
    Grammar {
        annotation: Annotation,
        children: Vec<ContentNode>,
    },
}

impl ContentNode {
    /// Concatenated literal text below this node.
    pub fn flat_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            ContentNode::Text(text) => out.push_str(text),
            ContentNode::Grammar { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }
}

/// Convenience constructor for a grammar span wrapping plain text.
pub fn grammar_span(annotation: Annotation, text: impl Into<String>) -> ContentNode {
    ContentNode::Grammar {
        annotation,
        children: vec![ContentNode::Text(text.into())],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_text_recurses_through_nested_spans() {
        let node = ContentNode::Grammar {
            annotation: Annotation::default(),
            children: vec![
                ContentNode::Text("in ".into()),
                ContentNode::Grammar {
                    annotation: Annotation::default(),
                    children: vec![ContentNode::Text("principio".into())],
                },
            ],
        };
        assert_eq!(node.flat_text(), "in principio");
    }
}
