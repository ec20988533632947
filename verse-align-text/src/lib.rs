//! Tagged-text import/export for annotated documents.
//!
//! A deliberately small line-oriented format that round-trips exactly
//! what the engine traverses: books, chapters, verses and nested
//! grammar spans.
//!
//! ```text
//! ! <document name>
//! = <osis book id>          starts a book (and its first chapter)
//! -                         starts the next chapter
//! <label>|<content>         one verse per line
//! ```
//!
//! Verse content is plain text with grammar spans written as
//! `{<strongs>;<morph>;<indices>;<attributes>|<children>}`. The four
//! header fields are space-joined token lists (attributes as `k=v`
//! pairs); any of them may be empty. A backslash escapes the next
//! character wherever one of ``{ } | ; = \`` or a space would otherwise
//! be structural.

mod parser;
mod writer;

pub use parser::parse;
pub use writer::write;

use std::fs;
use std::path::Path;
use thiserror::Error;
use verse_align::Bible;

/// Errors for the tagged-text format.
#[derive(Debug, Error)]
pub enum TextFormatError {
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("io error on {path}: {message}")]
    Io { path: String, message: String },
}

/// Load a document from a tagged-text file.
pub fn read_file(path: &Path) -> Result<Bible, TextFormatError> {
    let text = fs::read_to_string(path).map_err(|e| TextFormatError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse(&text)
}

/// Write a document to a tagged-text file.
pub fn write_file(bible: &Bible, path: &Path) -> Result<(), TextFormatError> {
    fs::write(path, write(bible)).map_err(|e| TextFormatError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
