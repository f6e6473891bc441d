//! Command-line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Headless Inkboard: replay a saved board and export it.
#[derive(Debug, Parser)]
#[command(name = "inkboard", version, about)]
pub struct CliArgs {
    /// Board configuration (JSON). Defaults apply when omitted.
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the persisted stroke log.
    #[arg(long, global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Font used for text and emoji elements.
    #[arg(long, global = true)]
    pub font: Option<PathBuf>,

    /// Seed for spray and smudge, for reproducible output.
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay the stroke log and write PNG, JPEG or SVG (by extension).
    Export {
        /// Output file.
        output: PathBuf,
    },
    /// Report the SVG size against the minting limits.
    SvgInfo {
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Delete the persisted stroke log.
    Clear,
    /// List keyboard shortcuts.
    Shortcuts,
}
