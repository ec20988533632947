//! Command implementations: load, run the engine, export.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{bail, Context, Result};
use verse_align::{Bible, Database, MergeRules, Mode, DEFAULT_KEY_PATTERN};

fn load_document(path: &Path) -> Result<Bible> {
    verse_align_text::read_file(path)
        .with_context(|| format!("reading document {}", path.display()))
}

fn load_database(path: &Path) -> Result<Database> {
    if path.exists() {
        Database::load(path).with_context(|| format!("loading database {}", path.display()))
    } else {
        Ok(Database::new())
    }
}

fn load_modes(codes: Option<&str>) -> Result<Vec<Mode>> {
    match codes {
        Some(codes) => verse_align::parse_modes(codes).context("parsing --modes"),
        None => Ok(verse_align::default_modes()),
    }
}

fn load_rules(path: Option<&Path>) -> Result<MergeRules> {
    match path {
        Some(path) => {
            MergeRules::load(path).with_context(|| format!("loading rules {}", path.display()))
        }
        None => Ok(MergeRules::default()),
    }
}

/// Resolve an export format name and write the document out.
fn export_document(bible: &mut Bible, format: &str, output: &Path) -> Result<()> {
    match format {
        "text" => verse_align_text::write_file(bible, output)
            .with_context(|| format!("writing document {}", output.display()))?,
        "dump" | "dump-human" => {
            let file = File::create(output)
                .with_context(|| format!("creating {}", output.display()))?;
            let mut out = BufWriter::new(file);
            verse_align::dump(bible, &mut out, format == "dump-human")
                .with_context(|| format!("writing dump {}", output.display()))?;
        }
        "dumpwords" | "dumpwords-human" => {
            let file = File::create(output)
                .with_context(|| format!("creating {}", output.display()))?;
            let mut out = BufWriter::new(file);
            verse_align::dump_words(bible, &mut out, format == "dumpwords-human")
                .with_context(|| format!("writing dump {}", output.display()))?;
        }
        other => bail!("unknown export format '{}'", other),
    }
    Ok(())
}

pub fn dump(input: &Path, csvfile: &Path, human_strongs: bool) -> Result<()> {
    let mut bible = load_document(input)?;
    let file =
        File::create(csvfile).with_context(|| format!("creating {}", csvfile.display()))?;
    let mut out = BufWriter::new(file);
    verse_align::dump(&mut bible, &mut out, human_strongs)
        .with_context(|| format!("writing dump {}", csvfile.display()))?;
    Ok(())
}

pub fn dump_words(input: &Path, csvfile: &Path, human_strongs: bool) -> Result<()> {
    let bible = load_document(input)?;
    let file =
        File::create(csvfile).with_context(|| format!("creating {}", csvfile.display()))?;
    let mut out = BufWriter::new(file);
    verse_align::dump_words(&bible, &mut out, human_strongs)
        .with_context(|| format!("writing dump {}", csvfile.display()))?;
    Ok(())
}

pub fn analyze(
    input: &Path,
    dbfile: &Path,
    modes: Option<&str>,
    rules: Option<&Path>,
) -> Result<()> {
    let mut bible = load_document(input)?;
    let mut db = load_database(dbfile)?;
    let modes = load_modes(modes)?;
    let rules = load_rules(rules)?;
    verse_align::analyze(&mut bible, &mut db, &modes, &rules)
        .with_context(|| format!("analyzing {}", input.display()))?;
    db.store(dbfile)
        .with_context(|| format!("storing database {}", dbfile.display()))?;
    Ok(())
}

pub fn analyze_strong_dic(input: &Path, dbfile: &Path, key_pattern: Option<&str>) -> Result<()> {
    let mut bible = load_document(input)?;
    let mut db = load_database(dbfile)?;
    let pattern = key_pattern.unwrap_or(DEFAULT_KEY_PATTERN);
    verse_align::analyze_strong_dictionary(&mut bible, &mut db, pattern)
        .with_context(|| format!("analyzing dictionary {}", input.display()))?;
    db.store(dbfile)
        .with_context(|| format!("storing database {}", dbfile.display()))?;
    Ok(())
}

pub fn augment(
    input: &Path,
    dbfile: &Path,
    modes: Option<&str>,
    rules: Option<&Path>,
    format: &str,
    output: &Path,
) -> Result<()> {
    let mut bible = load_document(input)?;
    let db =
        Database::load(dbfile).with_context(|| format!("loading database {}", dbfile.display()))?;
    let modes = load_modes(modes)?;
    let rules = load_rules(rules)?;
    verse_align::augment(&mut bible, &db, &modes, &rules)
        .with_context(|| format!("augmenting {}", input.display()))?;
    export_document(&mut bible, format, output)
}

pub fn add_source_index(input: &Path, format: &str, output: &Path) -> Result<()> {
    let mut bible = load_document(input)?;
    verse_align::add_source_index(&mut bible)
        .with_context(|| format!("numbering spans in {}", input.display()))?;
    export_document(&mut bible, format, output)
}

pub fn add_text_attr(input: &Path, key: &str, format: &str, output: &Path) -> Result<()> {
    let mut bible = load_document(input)?;
    verse_align::add_text_attr(&mut bible, key)
        .with_context(|| format!("collecting span text in {}", input.display()))?;
    export_document(&mut bible, format, output)
}

pub fn add_attr_prefix(input: &Path, prefix: &str, format: &str, output: &Path) -> Result<()> {
    let mut bible = load_document(input)?;
    verse_align::add_attr_prefix(&mut bible, prefix)
        .with_context(|| format!("prefixing attributes in {}", input.display()))?;
    export_document(&mut bible, format, output)
}

pub fn export(input: &Path, format: &str, output: &Path) -> Result<()> {
    let mut bible = load_document(input)?;
    export_document(&mut bible, format, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_analyze_then_augment_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        let target = dir.path().join("target.txt");
        let dbfile = dir.path().join("align.db");
        let output = dir.path().join("out.txt");

        fs::write(&source, "! Source\n= Gen\n1|{H7225;HNcfsa;;|In the beginning}\n").unwrap();
        fs::write(&target, "! Target\n= Gen\n1|{H7225;;;|Au commencement}\n").unwrap();

        analyze(&source, &dbfile, None, None).unwrap();
        let db_text = fs::read_to_string(&dbfile).unwrap();
        assert!(db_text.contains("Gen.1.1*H7225=HNcfsa"));

        augment(&target, &dbfile, None, None, "text", &output).unwrap();
        let out_text = fs::read_to_string(&output).unwrap();
        assert!(out_text.contains("{H7225;HNcfsa;;|Au commencement}"));
    }

    #[test]
    fn test_analyze_extends_existing_database() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("doc.txt");
        let dbfile = dir.path().join("align.db");

        fs::write(&doc, "! A\n= Gen\n1|{H7225;HNcfsa;;|beginning}\n").unwrap();
        analyze(&doc, &dbfile, None, None).unwrap();

        fs::write(&doc, "! B\n= Exod\n1|{H8034;HNcmpc;;|names}\n").unwrap();
        analyze(&doc, &dbfile, None, None).unwrap();

        let db_text = fs::read_to_string(&dbfile).unwrap();
        assert!(db_text.contains("Gen.1.1*H7225=HNcfsa"));
        assert!(db_text.contains("Exod.1.1*H8034=HNcmpc"));
    }

    #[test]
    fn test_dump_writes_rows() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("doc.txt");
        let csv = dir.path().join("out.tsv");

        fs::write(&doc, "! A\n= Matt\n1|{G976;N-NSF;;|book}\n").unwrap();
        dump(&doc, &csv, false).unwrap();
        let rows = fs::read_to_string(&csv).unwrap();
        assert!(rows.contains("Matt.1.1\t1\t1\tG976\tN-NSF\t"));
    }

    #[test]
    fn test_dump_words_writes_span_text() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("doc.txt");
        let csv = dir.path().join("out.tsv");

        fs::write(&doc, "! A\n= Matt\n1|{G976 G1078;N-NSF N-GSF;;|book of origin}\n").unwrap();
        dump_words(&doc, &csv, false).unwrap();
        let rows = fs::read_to_string(&csv).unwrap();
        assert_eq!(rows, "Matt.1.1\t1\tG976+G1078\tN-NSF+N-GSF\t\tbook of origin\n");
    }

    #[test]
    fn test_unknown_export_format_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("doc.txt");
        fs::write(&doc, "! A\n= Gen\n1|text\n").unwrap();
        let out = dir.path().join("out");
        assert!(export(&doc, "xml", &out).is_err());
    }
}
