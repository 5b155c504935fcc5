//! Command-line tool for hardware configuration files.
//!
//! Subcommands:
//! - `info`: Print table sizes
//! - `verify`: Check that every stored id resolves
//! - `select`: Write the sub-configuration for a detector selection
//! - `convert`: Re-encode a file, optionally compressing it

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hwconfig::{ConfigStore, Criterion, DumpOptions, Selection};
use tracing::info;

/// Parse a `FIELD=VALUE` argument.
fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected FIELD=VALUE, got '{}'", s))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("Missing field name in '{}'", s));
    }
    Ok((field.to_string(), value.to_string()))
}

/// Hardware configuration tool
#[derive(Parser, Debug)]
#[command(name = "hwconfig")]
#[command(about = "Inspect, verify and subset telescope hardware configurations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Copy)]
struct OutputArgs {
    /// Replace the output file if it exists
    #[arg(long)]
    overwrite: bool,

    /// Gzip the output
    #[arg(long)]
    compress: bool,
}

impl From<OutputArgs> for DumpOptions {
    fn from(args: OutputArgs) -> Self {
        DumpOptions {
            overwrite: args.overwrite,
            compress: args.compress,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the number of records in each table
    Info {
        /// Configuration file (plain or gzipped TOML)
        path: PathBuf,
    },

    /// Check that every referenced id resolves
    Verify {
        /// Configuration file (plain or gzipped TOML)
        path: PathBuf,
    },

    /// Select detectors and write the matching sub-configuration
    Select {
        /// Input configuration file
        input: PathBuf,

        /// Output configuration file
        output: PathBuf,

        /// Keep detectors on this telescope (repeatable)
        #[arg(long = "telescope")]
        telescopes: Vec<String>,

        /// Keep detectors in this tube (repeatable)
        #[arg(long = "tube")]
        tubes: Vec<String>,

        /// Match a detector attribute against a pattern, e.g. `pixel=02.` (repeatable)
        #[arg(long = "match", value_parser = parse_assignment)]
        patterns: Vec<(String, String)>,

        /// Match a detector attribute against a list of values, e.g. `wafer=25,26` (repeatable)
        #[arg(long = "match-list", value_parser = parse_assignment)]
        lists: Vec<(String, String)>,

        #[command(flatten)]
        output_args: OutputArgs,
    },

    /// Re-encode a configuration file
    Convert {
        /// Input configuration file
        input: PathBuf,

        /// Output configuration file
        output: PathBuf,

        #[command(flatten)]
        output_args: OutputArgs,
    },
}

fn open(path: &Path) -> Result<ConfigStore> {
    ConfigStore::open(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn build_selection(
    telescopes: Vec<String>,
    tubes: Vec<String>,
    patterns: Vec<(String, String)>,
    lists: Vec<(String, String)>,
) -> Selection {
    let mut selection = Selection::new();
    if !telescopes.is_empty() {
        selection = selection.telescopes(telescopes);
    }
    if !tubes.is_empty() {
        selection = selection.tubes(tubes);
    }
    for (field, pattern) in patterns {
        selection = selection.matching(field, Criterion::pattern(pattern));
    }
    for (field, values) in lists {
        let values = values.split(',').map(str::trim).filter(|v| !v.is_empty());
        selection = selection.matching(field, Criterion::values(values));
    }
    selection
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Info { path } => {
            let store = open(&path)?;
            let counts = store.counts();
            println!("{}", path.display());
            println!("  telescopes: {}", counts.telescopes);
            println!("  tubes:      {}", counts.tubes);
            println!("  wafers:     {}", counts.wafers);
            println!("  detectors:  {}", counts.detectors);
            println!("  bands:      {}", counts.bands);
            println!("  cards:      {}", counts.cards);
            println!("  crates:     {}", counts.crates);
            Ok(())
        }
        Command::Verify { path } => {
            let store = open(&path)?;
            store
                .verify()
                .with_context(|| format!("{} has a broken reference", path.display()))?;
            println!("{}: OK ({})", path.display(), store.counts());
            Ok(())
        }
        Command::Select {
            input,
            output,
            telescopes,
            tubes,
            patterns,
            lists,
            output_args,
        } => {
            let store = open(&input)?;
            let selection = build_selection(telescopes, tubes, patterns, lists);
            info!("Selecting with {:?}", selection);
            let subset = store.select(&selection)?;
            subset
                .dump(&output, output_args.into())
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("{}: {}", output.display(), subset.counts());
            Ok(())
        }
        Command::Convert {
            input,
            output,
            output_args,
        } => {
            let store = open(&input)?;
            store
                .dump(&output, output_args.into())
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("{} -> {}", input.display(), output.display());
            Ok(())
        }
    }
}
