//! CLI module for Clipdeck
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// Clipdeck clip assembly editor
///
/// Builds and edits multi-track clip assemblies stored in JSON session files,
/// and segments transcripts into subtitle cues.
#[derive(Parser, Debug)]
#[command(name = "clipdeck")]
#[command(about = "Clipdeck - clip assembly editing from the command line")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./clipdeck.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log line format (pretty or json)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Seconds moved per nudge step
    #[arg(long, global = true)]
    pub nudge_step: Option<f64>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a session from a list of clip ranges
    Assemble(args::AssembleArgs),
    /// Show the clips and tracks of a session
    Inspect(args::InspectArgs),
    /// Show which item plays at an assembly time
    Resolve(args::ResolveArgs),
    /// Split an item or a clip in two
    Split(args::SplitArgs),
    /// Shift an item or a clip by nudge steps
    Nudge(args::NudgeArgs),
    /// Remove a clip and close the gap it leaves
    RippleDelete(args::RippleDeleteArgs),
    /// Segment a transcript into subtitle cues
    Cues(args::CuesArgs),
}
