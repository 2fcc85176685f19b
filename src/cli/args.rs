//! Command-line argument definitions

use std::path::PathBuf;

use clap::{ArgGroup, Args};

/// Arguments for the assemble command
#[derive(Args, Debug)]
pub struct AssembleArgs {
    /// JSON file with an array of {title?, start, end} clip ranges
    #[arg(short, long)]
    pub clips: PathBuf,

    /// Source media duration (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub duration: String,

    /// Session file to write
    #[arg(short, long)]
    pub out: PathBuf,

    /// Overwrite an existing session file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Session file
    #[arg(short, long)]
    pub session: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the resolve command
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Session file
    #[arg(short, long)]
    pub session: PathBuf,

    /// Assembly time (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub at: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the split command
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["item", "clip"])))]
pub struct SplitArgs {
    /// Session file
    #[arg(short, long)]
    pub session: PathBuf,

    /// Assembly item to split at an assembly time
    #[arg(long)]
    pub item: Option<String>,

    /// Clip to split at a source time
    #[arg(long)]
    pub clip: Option<String>,

    /// Split point (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub at: String,
}

/// Arguments for the nudge command
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["item", "clip"])))]
pub struct NudgeArgs {
    /// Session file
    #[arg(short, long)]
    pub session: PathBuf,

    /// Assembly item to move
    #[arg(long)]
    pub item: Option<String>,

    /// Clip to move
    #[arg(long)]
    pub clip: Option<String>,

    /// Number of nudge steps; negative moves earlier
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub steps: f64,
}

/// Arguments for the ripple-delete command
#[derive(Args, Debug)]
pub struct RippleDeleteArgs {
    /// Session file
    #[arg(short, long)]
    pub session: PathBuf,

    /// Clip to remove
    #[arg(long)]
    pub clip: String,
}

/// Arguments for the cues command
#[derive(Args, Debug)]
pub struct CuesArgs {
    /// Transcript JSON: an array of {id?, text, start, end} words
    #[arg(short, long)]
    pub words: PathBuf,

    /// Session whose subtitle profile to use
    #[arg(short, long)]
    pub session: Option<PathBuf>,

    /// Only show the cue on screen at this source time
    #[arg(short, long)]
    pub at: Option<String>,

    /// Caption box width relative to the reference box
    #[arg(long, default_value_t = 1.0)]
    pub box_width: f64,

    /// Caption box height relative to the reference box
    #[arg(long, default_value_t = 1.0)]
    pub box_height: f64,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
