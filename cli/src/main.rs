use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use jsonschema_inliner_core::{inline, DocumentStore, InlineOptions};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "jsonschema-inliner")]
#[command(about = "Inline JSON Schema $refs into a standalone schema")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Inline every reachable $ref in a JSON Schema
    Convert {
        /// Input JSON Schema file (reads stdin if omitted)
        input: Option<PathBuf>,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON Pointer within the input document to treat as the schema root
        #[arg(long)]
        entry_pointer: Option<String>,

        /// Drop consolidated $defs entries no output $ref points at
        #[arg(long, default_value_t = false)]
        remove_unused_defs: bool,

        /// Upper bound on total analyzer + rewriter node visits
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing — logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            input,
            output,
            entry_pointer,
            remove_unused_defs,
            max_cycles,
            format,
        } => {
            let document = read_schema(input.as_deref())?;

            let (store, root) = match entry_pointer {
                Some(pointer) => DocumentStore::with_entry_point(document, &pointer)
                    .context("Failed to extract entry point")?,
                None => {
                    let store = DocumentStore::new(document.clone())
                        .context("Failed to build document store")?;
                    (store, document)
                }
            };

            let mut options = InlineOptions::default();
            options.remove_unused_defs = remove_unused_defs;
            if let Some(limit) = max_cycles {
                options.max_cycles = limit;
            }

            let result = inline(root, &store, &options)
                .map_err(|e| anyhow::Error::from(e).context("Inlining failed"))?;

            write_json(&result, output.as_ref(), format)?;
        }
    }

    Ok(())
}

/// Read and parse a JSON Schema from a file path, or stdin if `input` is `None`.
fn read_schema(input: Option<&Path>) -> Result<Value> {
    match input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse schema from: {}", path.display()))
        }
        None => serde_json::from_reader(io::stdin().lock())
            .context("Failed to parse schema from stdin"),
    }
}

fn write_json<T: serde::Serialize>(
    val: &T,
    path: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    writeln!(writer).context("Failed to write trailing newline")?;

    Ok(())
}
