//! Parsing of the tagged-text format.

use crate::TextFormatError;
use verse_align::key::{parse_index, parse_strongs};
use verse_align::{Annotation, Bible, Book, BookId, Chapter, ContentNode, Verse};

fn err(line: usize, message: impl Into<String>) -> TextFormatError {
    TextFormatError::Parse {
        line,
        message: message.into(),
    }
}

/// Parse a whole document.
pub fn parse(text: &str) -> Result<Bible, TextFormatError> {
    let mut bible = Bible::new("");
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }
        if let Some(name) = raw.strip_prefix('!') {
            bible.name = name.trim().to_string();
        } else if let Some(book) = raw.strip_prefix('=') {
            let mut book = Book::new(BookId::new(book.trim()));
            book.chapters.push(Chapter::default());
            bible.books.push(book);
        } else if raw == "-" {
            bible.books
                .last_mut()
                .ok_or_else(|| err(line, "chapter break before any book"))?
                .chapters
                .push(Chapter::default());
        } else {
            let book = bible
                .books
                .last_mut()
                .ok_or_else(|| err(line, "verse before any book"))?;
            let sep = raw
                .find('|')
                .ok_or_else(|| err(line, "verse line without label separator"))?;
            let mut verse = Verse::new(&raw[..sep]);
            verse.content = parse_content(&raw[sep + 1..], line)?;
            // A book header always opens its first chapter.
            book.chapters
                .last_mut()
                .ok_or_else(|| err(line, "verse before any chapter"))?
                .verses
                .push(verse);
        }
    }
    Ok(bible)
}

/// One partially built grammar span during content parsing.
struct Frame {
    annotation: Annotation,
    children: Vec<ContentNode>,
}

fn parse_content(content: &str, line: usize) -> Result<Vec<ContentNode>, TextFormatError> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Vec<ContentNode> = Vec::new();
    let mut text = String::new();
    let mut chars = content.chars();

    let flush = |text: &mut String, stack: &mut Vec<Frame>, root: &mut Vec<ContentNode>| {
        if !text.is_empty() {
            let node = ContentNode::Text(std::mem::take(text));
            match stack.last_mut() {
                Some(frame) => frame.children.push(node),
                None => root.push(node),
            }
        }
    };

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| err(line, "trailing backslash"))?;
                text.push(escaped);
            }
            '{' => {
                flush(&mut text, &mut stack, &mut root);
                // Collect the raw header up to the unescaped `|`,
                // escapes intact.
                let mut header = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => {
                            header.push('\\');
                            header.push(
                                chars
                                    .next()
                                    .ok_or_else(|| err(line, "trailing backslash"))?,
                            );
                        }
                        Some('|') => break,
                        Some(c) => header.push(c),
                        None => return Err(err(line, "unterminated span header")),
                    }
                }
                stack.push(Frame {
                    annotation: parse_header(&header, line)?,
                    children: Vec::new(),
                });
            }
            '}' => {
                flush(&mut text, &mut stack, &mut root);
                let frame = stack
                    .pop()
                    .ok_or_else(|| err(line, "unmatched closing brace"))?;
                let node = ContentNode::Grammar {
                    annotation: frame.annotation,
                    children: frame.children,
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root.push(node),
                }
            }
            '|' => return Err(err(line, "unexpected '|' outside a span header")),
            other => text.push(other),
        }
    }
    if !stack.is_empty() {
        return Err(err(line, "unclosed grammar span"));
    }
    flush(&mut text, &mut stack, &mut root);
    Ok(root)
}

/// Split on an unescaped separator, escapes intact in the parts.
fn split_unescaped(raw: &str, separator: char) -> Vec<String> {
    let mut parts = vec![String::new()];
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            let part = parts.last_mut().unwrap();
            part.push('\\');
            if let Some(next) = chars.next() {
                part.push(next);
            }
        } else if ch == separator {
            parts.push(String::new());
        } else {
            parts.last_mut().unwrap().push(ch);
        }
    }
    parts
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn tokens(field: &str) -> Vec<String> {
    split_unescaped(field, ' ')
        .into_iter()
        .filter(|t| !t.is_empty())
        .collect()
}

fn parse_header(raw: &str, line: usize) -> Result<Annotation, TextFormatError> {
    let fields = split_unescaped(raw, ';');
    if fields.len() > 4 {
        return Err(err(line, "span header has more than four fields"));
    }
    let field = |i: usize| fields.get(i).map(String::as_str).unwrap_or("");

    let mut annotation = Annotation::default();

    let strongs_tokens = tokens(field(0));
    if !strongs_tokens.is_empty() {
        let mut strongs = Vec::with_capacity(strongs_tokens.len());
        for token in &strongs_tokens {
            let token = unescape(token);
            strongs.push(
                parse_strongs(&token)
                    .ok_or_else(|| err(line, format!("bad Strong's token '{}'", token)))?,
            );
        }
        annotation.strongs = Some(strongs);
    }

    let morph_tokens = tokens(field(1));
    if !morph_tokens.is_empty() {
        annotation.morph = Some(morph_tokens.iter().map(|t| unescape(t)).collect());
    }

    let index_tokens = tokens(field(2));
    if !index_tokens.is_empty() {
        let mut indices = Vec::with_capacity(index_tokens.len());
        for token in &index_tokens {
            let token = unescape(token);
            indices.push(
                parse_index(&token)
                    .ok_or_else(|| err(line, format!("bad index token '{}'", token)))?,
            );
        }
        annotation.source_index = Some(indices);
    }

    for pair in tokens(field(3)) {
        let halves = split_unescaped(&pair, '=');
        if halves.len() < 2 {
            return Err(err(line, format!("attribute without '=': '{}'", pair)));
        }
        let key = unescape(&halves[0]);
        let value = unescape(&halves[1..].join("="));
        annotation.attributes.push((key, value));
    }

    Ok(annotation)
}
