use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Align and transfer grammar annotations between editions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump every grammar span as tab-separated rows
    Dump {
        /// Input document (tagged text)
        input: PathBuf,

        /// Output file for the rows
        csvfile: PathBuf,

        /// Render prefix-less Strong's numbers with the testament-default prefix
        #[arg(long)]
        human_strongs: bool,
    },

    /// Dump one tab-separated row per grammar span, with its text
    #[command(name = "dumpwords")]
    DumpWords {
        /// Input document (tagged text)
        input: PathBuf,

        /// Output file for the rows
        csvfile: PathBuf,

        /// Render prefix-less Strong's numbers with the testament-default prefix
        #[arg(long)]
        human_strongs: bool,
    },

    /// Collect annotation pairs from a document into a database
    Analyze {
        /// Input document (tagged text)
        input: PathBuf,

        /// Database file to create or extend
        dbfile: PathBuf,

        /// Comma-separated mode codes (S, I, SI, SLI, IS, SA, IA, AI, AIS, AIA)
        #[arg(long)]
        modes: Option<String>,

        /// TOML file with attribute merge rules
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Collect per-book dictionary attributes into a database
    #[command(name = "analyzestrongdic")]
    AnalyzeStrongDic {
        /// Strong's dictionary document (tagged text)
        input: PathBuf,

        /// Database file to create or extend
        dbfile: PathBuf,

        /// Key pattern; `{book}` is replaced by the OSIS id
        key_pattern: Option<String>,
    },

    /// Fill in missing annotations from a database, then export
    Augment {
        /// Input document (tagged text)
        input: PathBuf,

        /// Database file to read
        dbfile: PathBuf,

        /// Downstream export format (text, dump, dump-human, dumpwords, dumpwords-human)
        format: String,

        /// Output file
        output: PathBuf,

        /// Comma-separated mode codes (S, I, SI, SLI, IS, SA, IA, AI, AIS, AIA)
        #[arg(long)]
        modes: Option<String>,

        /// TOML file with attribute merge rules
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Number every grammar span with the per-verse counter, then export
    #[command(name = "addsourceindex")]
    AddSourceIndex {
        /// Input document (tagged text)
        input: PathBuf,

        /// Downstream export format (text, dump, dump-human, dumpwords, dumpwords-human)
        format: String,

        /// Output file
        output: PathBuf,
    },

    /// Stash each span's literal text as an attribute, then export
    #[command(name = "addtextattr")]
    AddTextAttr {
        /// Input document (tagged text)
        input: PathBuf,

        /// Attribute key to store the text under
        key: String,

        /// Downstream export format (text, dump, dump-human, dumpwords, dumpwords-human)
        format: String,

        /// Output file
        output: PathBuf,
    },

    /// Prefix every attribute key on every span, then export
    #[command(name = "addattrprefix")]
    AddAttrPrefix {
        /// Input document (tagged text)
        input: PathBuf,

        /// Prefix to prepend to each attribute key
        prefix: String,

        /// Downstream export format (text, dump, dump-human, dumpwords, dumpwords-human)
        format: String,

        /// Output file
        output: PathBuf,
    },

    /// Re-export a document without changes
    Export {
        /// Input document (tagged text)
        input: PathBuf,

        /// Downstream export format (text, dump, dump-human, dumpwords, dumpwords-human)
        format: String,

        /// Output file
        output: PathBuf,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Dump {
            input,
            csvfile,
            human_strongs,
        } => {
            commands::dump(&input, &csvfile, human_strongs)?;
        }
        Commands::DumpWords {
            input,
            csvfile,
            human_strongs,
        } => {
            commands::dump_words(&input, &csvfile, human_strongs)?;
        }
        Commands::Analyze {
            input,
            dbfile,
            modes,
            rules,
        } => {
            commands::analyze(&input, &dbfile, modes.as_deref(), rules.as_deref())?;
        }
        Commands::AnalyzeStrongDic {
            input,
            dbfile,
            key_pattern,
        } => {
            commands::analyze_strong_dic(&input, &dbfile, key_pattern.as_deref())?;
        }
        Commands::Augment {
            input,
            dbfile,
            format,
            output,
            modes,
            rules,
        } => {
            commands::augment(
                &input,
                &dbfile,
                modes.as_deref(),
                rules.as_deref(),
                &format,
                &output,
            )?;
        }
        Commands::AddSourceIndex {
            input,
            format,
            output,
        } => {
            commands::add_source_index(&input, &format, &output)?;
        }
        Commands::AddTextAttr {
            input,
            key,
            format,
            output,
        } => {
            commands::add_text_attr(&input, &key, &format, &output)?;
        }
        Commands::AddAttrPrefix {
            input,
            prefix,
            format,
            output,
        } => {
            commands::add_attr_prefix(&input, &prefix, &format, &output)?;
        }
        Commands::Export {
            input,
            format,
            output,
        } => {
            commands::export(&input, &format, &output)?;
        }
    }

    Ok(())
}
