//! Serialization back to the tagged-text format.

use std::fmt::Write as _;

use verse_align::{Annotation, Bible, ContentNode};

fn escape_text(raw: &str, out: &mut String) {
    for ch in raw.chars() {
        if matches!(ch, '{' | '}' | '|' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
}

fn escape_token(raw: &str, out: &mut String) {
    for ch in raw.chars() {
        if matches!(ch, '{' | '}' | '|' | '\\' | ';' | '=' | ' ') {
            out.push('\\');
        }
        out.push(ch);
    }
}

fn write_field<I: IntoIterator<Item = String>>(items: I, out: &mut String) {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        escape_token(&item, out);
    }
}

fn write_header(annotation: &Annotation, nt: bool, out: &mut String) {
    write_field(
        annotation
            .strongs
            .iter()
            .flatten()
            .map(|s| s.format(nt)),
        out,
    );
    out.push(';');
    write_field(annotation.morph.iter().flatten().cloned(), out);
    out.push(';');
    write_field(
        annotation
            .source_index
            .iter()
            .flatten()
            .map(|i| i.to_string()),
        out,
    );
    out.push(';');
    for (i, (key, value)) in annotation.attributes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        escape_token(key, out);
        out.push('=');
        escape_token(value, out);
    }
}

fn write_nodes(nodes: &[ContentNode], nt: bool, out: &mut String) {
    for node in nodes {
        match node {
            ContentNode::Text(text) => escape_text(text, out),
            ContentNode::Grammar {
                annotation,
                children,
            } => {
                out.push('{');
                write_header(annotation, nt, out);
                out.push('|');
                write_nodes(children, nt, out);
                out.push('}');
            }
        }
    }
}

/// Render a whole document.
pub fn write(bible: &Bible) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "! {}", bible.name);
    for book in &bible.books {
        let _ = writeln!(out, "= {}", book.id.osis());
        for (c, chapter) in book.chapters.iter().enumerate() {
            if c > 0 {
                out.push_str("-\n");
            }
            for verse in &chapter.verses {
                out.push_str(&verse.label);
                out.push('|');
                write_nodes(&verse.content, book.id.is_nt(), &mut out);
                out.push('\n');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use super::*;
    use verse_align::{grammar_span, Book, BookId, Chapter, SourceIndex, Verse};

    fn one_verse_bible(content: Vec<ContentNode>) -> Bible {
        let mut verse = Verse::new("1");
        verse.content = content;
        let mut chapter = Chapter::default();
        chapter.verses.push(verse);
        let mut book = Book::new(BookId::new("Gen"));
        book.chapters.push(chapter);
        let mut bible = Bible::new("Test");
        bible.books.push(book);
        bible
    }

    #[test]
    fn test_round_trip_plain_text() {
        let bible = one_verse_bible(vec![ContentNode::Text("In the beginning".into())]);
        let text = write(&bible);
        assert_eq!(text, "! Test\n= Gen\n1|In the beginning\n");
        assert_eq!(parse(&text).unwrap(), bible);
    }

    #[test]
    fn test_round_trip_annotated_span() {
        let mut annotation = Annotation::default();
        annotation.strongs = Some(vec![verse_align::key::parse_strongs("H7225").unwrap()]);
        annotation.morph = Some(vec!["HNcfsa".into()]);
        annotation.source_index = Some(vec![SourceIndex::here(2)]);
        annotation.attributes.push(("lemma".into(), "רֵאשִׁית".into()));
        let bible = one_verse_bible(vec![
            ContentNode::Text("In ".into()),
            grammar_span(annotation, "the beginning"),
        ]);
        let text = write(&bible);
        assert!(text.contains("{H7225;HNcfsa;2;lemma=רֵאשִׁית|the beginning}"));
        assert_eq!(parse(&text).unwrap(), bible);
    }

    #[test]
    fn test_round_trip_nested_spans() {
        let mut outer = Annotation::default();
        outer.morph = Some(vec!["V".into()]);
        let mut inner = Annotation::default();
        inner.morph = Some(vec!["N".into()]);
        let bible = one_verse_bible(vec![ContentNode::Grammar {
            annotation: outer,
            children: vec![
                ContentNode::Text("a ".into()),
                grammar_span(inner, "b"),
            ],
        }]);
        assert_eq!(parse(&write(&bible)).unwrap(), bible);
    }

    #[test]
    fn test_round_trip_escaped_characters() {
        let mut annotation = Annotation::default();
        annotation
            .attributes
            .push(("note".into(), "a=b; {c}".into()));
        let bible = one_verse_bible(vec![
            grammar_span(annotation, "x"),
            ContentNode::Text(" plain {braces} | bar \\ slash".into()),
        ]);
        assert_eq!(parse(&write(&bible)).unwrap(), bible);
    }

    #[test]
    fn test_round_trip_chapters() {
        let mut book = Book::new(BookId::new("Matt"));
        let mut c1 = Chapter::default();
        c1.verses.push(Verse::new("1"));
        c1.verses.last_mut().unwrap().content = vec![ContentNode::Text("one".into())];
        let mut c2 = Chapter::default();
        c2.verses.push(Verse::new("1"));
        c2.verses.last_mut().unwrap().content = vec![ContentNode::Text("two".into())];
        book.chapters.push(c1);
        book.chapters.push(c2);
        let mut bible = Bible::new("Test");
        bible.books.push(book);
        let text = write(&bible);
        assert_eq!(text, "! Test\n= Matt\n1|one\n-\n1|two\n");
        assert_eq!(parse(&text).unwrap(), bible);
    }

    #[test]
    fn test_render_snapshot() {
        let mut annotation = Annotation::default();
        annotation.strongs = Some(vec![
            verse_align::key::parse_strongs("H430").unwrap(),
            verse_align::key::parse_strongs("H1254a").unwrap(),
        ]);
        annotation.source_index = Some(vec![SourceIndex::here(1), SourceIndex::here(2)]);
        let bible = one_verse_bible(vec![
            grammar_span(annotation, "God created"),
            ContentNode::Text(" the heavens".into()),
        ]);
        insta::assert_snapshot!(write(&bible), @r###"
        ! Test
        = Gen
        1|{H430 H1254a;;1 2;|God created} the heavens
        "###);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let text = "! Test\n= Gen\n1|{H7225;;|unclosed\n";
        match parse(text) {
            Err(crate::TextFormatError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_verse_before_book() {
        assert!(parse("! Test\n1|text\n").is_err());
    }
}
