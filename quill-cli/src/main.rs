//! Quill — mirror a remote page database to local files and push it to a CMS.
//!
//! # Usage
//!
//! ```text
//! quill sync [--days N] [--database ID] [--format markdown|html] [--out DIR] [--dry-run]
//! quill publish [--database ID] [--collection ID] [--dry-run]
//! ```
//!
//! Credentials come from the environment: `QUILL_NOTION_TOKEN` and
//! `QUILL_NOTION_DATABASE` for sync, plus `QUILL_CMS_TOKEN` and
//! `QUILL_CMS_COLLECTION` for publish.

mod commands;
mod config;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{publish::PublishArgs, sync::SyncArgs};
use quill_sync::OutputFormat;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "quill",
    version,
    about = "Mirror a remote page database to markdown or HTML, and publish to a CMS",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mirror recently edited pages into a local directory.
    Sync(SyncArgs),

    /// Upsert sync-flagged pages into the CMS collection.
    Publish(PublishArgs),
}

// ---------------------------------------------------------------------------
// Shared OutputFormat argument — parsed from CLI strings, converts to the
// sync engine's type
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse `OutputFormat` from CLI args.
#[derive(Debug, Clone)]
pub struct FormatArg(pub OutputFormat);

impl FromStr for FormatArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self(OutputFormat::Markdown)),
            "html" => Ok(Self(OutputFormat::Html)),
            other => Err(format!("unknown format '{other}'; expected: markdown, html")),
        }
    }
}

impl fmt::Display for FormatArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            OutputFormat::Markdown => "markdown".fmt(f),
            OutputFormat::Html => "html".fmt(f),
        }
    }
}

impl From<FormatArg> for OutputFormat {
    fn from(f: FormatArg) -> Self {
        f.0
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Publish(args) => args.run(),
    }
}
