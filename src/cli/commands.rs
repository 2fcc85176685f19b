//! Command implementations

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::container::AppContainer;
use crate::app::EditorSession;
use crate::cli::args::*;
use crate::cli::Commands;
use crate::domain::config::EngineConfig;
use crate::domain::errors::DomainError;
use crate::domain::model::{ClipAssemblyState, TimeSpec};
use crate::resolver::Coverage;
use crate::subtitles::{self, CueLayout};

/// Clip range as written in an `assemble` input file.
#[derive(Debug, Deserialize)]
struct ClipSpec {
    title: Option<String>,
    start: f64,
    end: f64,
}

/// Dispatch one parsed command
pub async fn run(command: Commands, container: &dyn AppContainer, config: &EngineConfig) -> Result<()> {
    match command {
        Commands::Assemble(args) => assemble(args, container, config).await,
        Commands::Inspect(args) => inspect(args, container, config).await,
        Commands::Resolve(args) => resolve(args, container, config).await,
        Commands::Split(args) => split(args, container, config).await,
        Commands::Nudge(args) => nudge(args, container, config).await,
        Commands::RippleDelete(args) => ripple_delete(args, container, config).await,
        Commands::Cues(args) => cues(args, container, config).await,
    }
}

fn parse_time(label: &str, value: &str) -> Result<f64> {
    let time = TimeSpec::parse(value).map_err(|e| anyhow::anyhow!("Invalid {} '{}': {}", label, value, e))?;
    Ok(time.as_seconds())
}

async fn open_session(container: &dyn AppContainer, config: &EngineConfig, path: &Path) -> Result<EditorSession> {
    container
        .session_interactor()
        .open(path, config, None, Vec::new())
        .await
        .with_context(|| format!("Failed to open session {}", path.display()))
}

async fn save_session(container: &dyn AppContainer, path: &Path, editor: &EditorSession) -> Result<()> {
    container
        .session_interactor()
        .save(path, editor)
        .await
        .with_context(|| format!("Failed to save session {}", path.display()))
}

/// Execute the assemble command
pub async fn assemble(args: AssembleArgs, container: &dyn AppContainer, config: &EngineConfig) -> Result<()> {
    let duration = parse_time("duration", &args.duration)?;
    if duration <= 0.0 {
        return Err(DomainError::BadArgs("Duration must be positive".to_string()).into());
    }
    let interactor = container.session_interactor();
    if !args.force && interactor.exists(&args.out).await {
        return Err(anyhow::anyhow!(
            "Session file already exists: {} (use --force to overwrite)",
            args.out.display()
        ));
    }

    let content = tokio::fs::read_to_string(&args.clips)
        .await
        .with_context(|| format!("Failed to read clip list {}", args.clips.display()))?;
    let specs: Vec<ClipSpec> = serde_json::from_str(&content).context("Clip list must be a JSON array of ranges")?;

    let mut editor = EditorSession::new(config, duration);
    for (index, spec) in specs.iter().enumerate() {
        if editor.add_clip(spec.title.as_deref(), spec.start, spec.end).is_none() {
            return Err(DomainError::InvalidTimeRange(format!(
                "clip {} ({} - {}) does not fit a {}s source",
                index, spec.start, spec.end, duration
            ))
            .into());
        }
    }
    editor.auto_assemble();
    save_session(container, &args.out, &editor).await?;

    info!(clips = editor.clips().len(), "Assembly created");
    println!(
        "Assembled {} clips into {} ({:.3}s)",
        editor.clips().len(),
        args.out.display(),
        crate::assembly::assembly_span(editor.assembly())
    );
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InspectReport<'a> {
    media_duration: f64,
    clips: &'a [crate::domain::model::ClipSegment],
    active_clip_id: Option<&'a str>,
    assembly: &'a ClipAssemblyState,
    span: f64,
}

/// Execute the inspect command
pub async fn inspect(args: InspectArgs, container: &dyn AppContainer, config: &EngineConfig) -> Result<()> {
    let editor = open_session(container, config, &args.session).await?;

    if args.json {
        let report = InspectReport {
            media_duration: editor.media_duration(),
            clips: editor.clips(),
            active_clip_id: editor.active_clip_id(),
            assembly: editor.assembly(),
            span: crate::assembly::assembly_span(editor.assembly()),
        };
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize session report")?;
        println!("{}", json);
    } else {
        display_session(&editor);
    }
    Ok(())
}

fn display_session(editor: &EditorSession) {
    println!("Media duration: {}", TimeSpec::from_seconds(editor.media_duration()));
    println!("Clips ({}):", editor.clips().len());
    for clip in editor.clips() {
        let marker = if editor.active_clip_id() == Some(clip.id.as_str()) { "*" } else { " " };
        println!(
            " {} {}  {}  {} - {}",
            marker,
            clip.id,
            clip.title,
            TimeSpec::from_seconds(clip.start),
            TimeSpec::from_seconds(clip.end)
        );
    }

    let assembly = editor.assembly();
    println!("Tracks ({}), zoom {:.2}:", assembly.tracks.len(), assembly.zoom);
    for track in &assembly.tracks {
        let mut flags = Vec::new();
        if track.muted {
            flags.push("muted");
        }
        if track.locked {
            flags.push("locked");
        }
        if track.hidden {
            flags.push("hidden");
        }
        println!("  [{}] {} ({}) {}", track.kind, track.name, track.id, flags.join(" "));
        for item in &track.items {
            println!(
                "    {}  {}  {:.3} - {:.3}  source {:.3} - {:.3}  {}",
                item.id,
                item.label,
                item.timeline_start,
                item.timeline_end,
                item.source_in,
                item.source_out,
                item.source.type_name()
            );
        }
    }
}

/// Execute the resolve command
pub async fn resolve(args: ResolveArgs, container: &dyn AppContainer, config: &EngineConfig) -> Result<()> {
    let time = parse_time("time", &args.at)?;
    let editor = open_session(container, config, &args.session).await?;

    let Some(target) = editor.playback_at(time) else {
        if args.json {
            println!("null");
        } else {
            println!("Nothing plays at or after {}", TimeSpec::from_seconds(time));
        }
        return Ok(());
    };

    if args.json {
        let json = serde_json::json!({
            "trackId": target.track_id,
            "itemId": target.item_id,
            "source": target.source,
            "sourceTime": target.source_time,
            "covering": target.coverage == Coverage::Covering,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        let state = match target.coverage {
            Coverage::Covering => "playing",
            Coverage::Upcoming => "next",
        };
        println!(
            "{} {} on {} at source {:.3}s",
            state, target.item_id, target.track_id, target.source_time
        );
    }
    Ok(())
}

/// Execute the split command
pub async fn split(args: SplitArgs, container: &dyn AppContainer, config: &EngineConfig) -> Result<()> {
    let time = parse_time("split point", &args.at)?;
    let mut editor = open_session(container, config, &args.session).await?;

    let created = match (&args.item, &args.clip) {
        (Some(item_id), _) => {
            if editor.assembly().item(item_id).is_none() {
                return Err(DomainError::ItemNotFound(item_id.clone()).into());
            }
            editor.split_item(item_id, time)
        }
        (None, Some(clip_id)) => {
            if editor.snapshot().clip(clip_id).is_none() {
                return Err(DomainError::ClipNotFound(clip_id.clone()).into());
            }
            editor.split_clip(clip_id, time)
        }
        (None, None) => return Err(DomainError::BadArgs("Nothing to split".to_string()).into()),
    };
    let Some(new_id) = created else {
        return Err(DomainError::EditRejected(format!(
            "cannot split at {}: too close to an edge, outside the range, or on a locked track",
            TimeSpec::from_seconds(time)
        ))
        .into());
    };

    save_session(container, &args.session, &editor).await?;
    println!("Split created {}", new_id);
    Ok(())
}

/// Execute the nudge command
pub async fn nudge(args: NudgeArgs, container: &dyn AppContainer, config: &EngineConfig) -> Result<()> {
    let mut editor = open_session(container, config, &args.session).await?;

    let (moved, target) = match (&args.item, &args.clip) {
        (Some(item_id), _) => {
            if editor.assembly().item(item_id).is_none() {
                return Err(DomainError::ItemNotFound(item_id.clone()).into());
            }
            (editor.nudge_item(item_id, args.steps), item_id)
        }
        (None, Some(clip_id)) => {
            if editor.snapshot().clip(clip_id).is_none() {
                return Err(DomainError::ClipNotFound(clip_id.clone()).into());
            }
            (editor.nudge_clip(clip_id, args.steps), clip_id)
        }
        (None, None) => return Err(DomainError::BadArgs("Nothing to nudge".to_string()).into()),
    };

    if moved {
        save_session(container, &args.session, &editor).await?;
        println!("Nudged {} by {} step(s)", target, args.steps);
    } else {
        println!("{} did not move", target);
    }
    Ok(())
}

/// Execute the ripple-delete command
pub async fn ripple_delete(args: RippleDeleteArgs, container: &dyn AppContainer, config: &EngineConfig) -> Result<()> {
    let mut editor = open_session(container, config, &args.session).await?;
    if !editor.ripple_delete_clip(&args.clip) {
        return Err(DomainError::ClipNotFound(args.clip).into());
    }
    save_session(container, &args.session, &editor).await?;
    println!("Removed {}; {} clips remain", args.clip, editor.clips().len());
    Ok(())
}

/// Execute the cues command
pub async fn cues(args: CuesArgs, container: &dyn AppContainer, config: &EngineConfig) -> Result<()> {
    let interactor = container.session_interactor();
    let words = interactor
        .load_transcript(&args.words)
        .await
        .with_context(|| format!("Failed to read transcript {}", args.words.display()))?;

    let profile = match &args.session {
        Some(path) => open_session(container, config, path).await?.subtitle_profile().clone(),
        None => config.subtitles.clone(),
    };
    let layout = CueLayout {
        box_width: args.box_width,
        box_height: args.box_height,
    };
    let cues = subtitles::build_cues(&words, &profile, Some(layout));
    info!(words = words.len(), cues = cues.len(), "Cues built");

    match &args.at {
        Some(at) => {
            let time = parse_time("time", at)?;
            let shown = subtitles::render_at(&cues, time);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else if let Some(cue) = shown {
                for line in &cue.lines {
                    let text: Vec<String> = line
                        .iter()
                        .map(|word| match (word.active, word.emphasized) {
                            (true, _) => format!("[{}]", word.text),
                            (false, true) => format!("*{}*", word.text),
                            (false, false) => word.text.clone(),
                        })
                        .collect();
                    println!("{}", text.join(" "));
                }
            }
        }
        None if args.json => println!("{}", serde_json::to_string_pretty(&cues)?),
        None => {
            for cue in &cues {
                println!(
                    "{} --> {}",
                    TimeSpec::from_seconds(cue.start).format_hms(),
                    TimeSpec::from_seconds(cue.end).format_hms()
                );
                println!("{}", cue.text());
                println!();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_accepts_all_formats() {
        assert_eq!(parse_time("t", "90").unwrap(), 90.0);
        assert_eq!(parse_time("t", "01:30").unwrap(), 90.0);
        assert_eq!(parse_time("t", "00:01:30.500").unwrap(), 90.5);
        assert!(parse_time("t", "-3").is_err());
    }
}
