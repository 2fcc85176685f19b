// Domain models - Core types and data structures

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// Shortest clip that can be cut from the source, in seconds.
pub const MIN_CLIP_DURATION: f64 = 0.35;
/// Shortest item that can live on an assembly track, in seconds.
pub const MIN_ITEM_DURATION: f64 = 0.2;
pub const MIN_ZOOM: f64 = 0.03;
pub const MAX_ZOOM: f64 = 6.0;
pub const DEFAULT_ZOOM: f64 = 1.0;
/// Horizontal scale of the timeline at zoom 1.0.
pub const BASE_PIXELS_PER_SECOND: f64 = 80.0;
pub const DEFAULT_EXTERNAL_MEDIA_DURATION: f64 = 5.0;
pub const DEFAULT_NUDGE_STEP: f64 = 0.1;
pub const MAX_ITEM_VOLUME: f64 = 2.0;

/// Export settings attached to a clip. Owned by the export collaborator and
/// carried around untouched.
pub type ExportDraft = serde_json::Value;

/// Generate a fresh identifier with a readable prefix (`clip-…`, `item-…`).
pub fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// Time specification with precision - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Parse time string in various formats
    ///
    /// Accepts plain seconds (`12.5`), `MM:SS.ms` and `HH:MM:SS.ms`.
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();

        if let Ok(seconds) = trimmed.parse::<f64>() {
            if !seconds.is_finite() {
                return Err(DomainError::BadArgs("Time must be a finite number".to_string()));
            }
            if seconds < 0.0 {
                return Err(DomainError::BadArgs("Time cannot be negative".to_string()));
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let (hours, minutes, seconds_part) = match parts.as_slice() {
            [m, s] => (0, Self::parse_unit(m, "minutes")?, *s),
            [h, m, s] => {
                let minutes = Self::parse_unit(m, "minutes")?;
                if minutes >= 60 {
                    return Err(DomainError::BadArgs("Minutes must be less than 60".to_string()));
                }
                (Self::parse_unit(h, "hours")?, minutes, *s)
            }
            _ => {
                return Err(DomainError::BadArgs(
                    "Invalid time format. Supported formats: seconds (e.g., 123.45), MM:SS.ms (e.g., 2:30.5), HH:MM:SS.ms (e.g., 1:02:30.5)".to_string(),
                ))
            }
        };

        let seconds = seconds_part
            .parse::<f64>()
            .map_err(|_| DomainError::BadArgs("Invalid seconds format".to_string()))?;
        if !(0.0..60.0).contains(&seconds) {
            return Err(DomainError::BadArgs("Seconds must be less than 60".to_string()));
        }

        Ok(Self::from_seconds(
            hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
        ))
    }

    fn parse_unit(part: &str, name: &str) -> Result<u32, DomainError> {
        part.parse::<u32>()
            .map_err(|_| DomainError::BadArgs(format!("Invalid {} format", name)))
    }

    /// Format as HH:MM:SS.ms (hours omitted when zero)
    pub fn format_hms(&self) -> String {
        let total_ms = (self.seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let seconds = (total_ms % 60_000) / 1000;
        let milliseconds = total_ms % 1000;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
        } else {
            format!("{:02}:{:02}.{:03}", minutes, seconds, milliseconds)
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// Which end of a range an edit acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Start,
    End,
}

/// A named range cut from the source recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipSegment {
    pub id: String,
    pub title: String,
    pub start: f64,
    pub end: f64,
    pub project_id: String,
}

impl ClipSegment {
    pub fn new(id: impl Into<String>, title: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start,
            end,
            project_id: String::new(),
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Kind of an assembly track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

impl TrackKind {
    pub fn label(&self) -> &'static str {
        match self {
            TrackKind::Video => "Video",
            TrackKind::Audio => "Audio",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What an assembly item plays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sourceType", rename_all = "kebab-case")]
pub enum ItemSource {
    /// A clip from the clip store
    Clip {
        #[serde(rename = "sourceClipId")]
        clip_id: String,
    },
    /// Raw video media not backed by a clip
    VideoFile {
        #[serde(rename = "sourcePath")]
        path: String,
    },
    /// Raw audio media
    AudioFile {
        #[serde(rename = "sourcePath")]
        path: String,
    },
}

impl ItemSource {
    pub fn clip_id(&self) -> Option<&str> {
        match self {
            ItemSource::Clip { clip_id } => Some(clip_id),
            ItemSource::VideoFile { .. } | ItemSource::AudioFile { .. } => None,
        }
    }

    /// Whether the source carries a picture.
    pub fn is_visual(&self) -> bool {
        match self {
            ItemSource::Clip { .. } | ItemSource::VideoFile { .. } => true,
            ItemSource::AudioFile { .. } => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ItemSource::Clip { .. } => "clip",
            ItemSource::VideoFile { .. } => "video-file",
            ItemSource::AudioFile { .. } => "audio-file",
        }
    }
}

/// One placement of a clip or external media on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyItem {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub source: ItemSource,
    pub timeline_start: f64,
    pub timeline_end: f64,
    pub source_in: f64,
    pub source_out: f64,
    pub volume: f64,
    pub opacity: f64,
    pub muted: bool,
}

impl AssemblyItem {
    pub fn new(
        label: impl Into<String>,
        source: ItemSource,
        timeline_start: f64,
        source_in: f64,
        source_out: f64,
    ) -> Self {
        Self {
            id: new_id("item"),
            label: label.into(),
            source,
            timeline_start,
            timeline_end: timeline_start + (source_out - source_in),
            source_in,
            source_out,
            volume: 1.0,
            opacity: 1.0,
            muted: false,
        }
    }

    pub fn duration(&self) -> f64 {
        self.timeline_end - self.timeline_start
    }

    pub fn source_duration(&self) -> f64 {
        self.source_out - self.source_in
    }

    /// Seconds of source consumed per second of timeline.
    pub fn source_ratio(&self) -> f64 {
        let duration = self.duration();
        if duration > 0.0 {
            self.source_duration() / duration
        } else {
            1.0
        }
    }

    pub fn covers(&self, time: f64) -> bool {
        self.timeline_start <= time && time < self.timeline_end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyTrack {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TrackKind,
    pub muted: bool,
    pub locked: bool,
    pub hidden: bool,
    pub items: Vec<AssemblyItem>,
}

impl AssemblyTrack {
    pub fn new(kind: TrackKind, name: impl Into<String>) -> Self {
        Self {
            id: new_id("track"),
            name: name.into(),
            kind,
            muted: false,
            locked: false,
            hidden: false,
            items: Vec::new(),
        }
    }

    /// Timeline position right after the last item.
    pub fn end(&self) -> f64 {
        self.items
            .iter()
            .map(|item| item.timeline_end)
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipAssemblyState {
    pub tracks: Vec<AssemblyTrack>,
    pub active_track_id: Option<String>,
    pub active_item_id: Option<String>,
    pub zoom: f64,
    pub subtitle_overlays_enabled: bool,
}

impl Default for ClipAssemblyState {
    fn default() -> Self {
        let video = AssemblyTrack::new(TrackKind::Video, "Video 1");
        let audio = AssemblyTrack::new(TrackKind::Audio, "Audio 1");
        Self {
            active_track_id: Some(video.id.clone()),
            active_item_id: None,
            tracks: vec![video, audio],
            zoom: DEFAULT_ZOOM,
            subtitle_overlays_enabled: true,
        }
    }
}

impl ClipAssemblyState {
    pub fn track(&self, track_id: &str) -> Option<&AssemblyTrack> {
        self.tracks.iter().find(|track| track.id == track_id)
    }

    pub fn track_mut(&mut self, track_id: &str) -> Option<&mut AssemblyTrack> {
        self.tracks.iter_mut().find(|track| track.id == track_id)
    }

    pub fn track_index(&self, track_id: &str) -> Option<usize> {
        self.tracks.iter().position(|track| track.id == track_id)
    }

    /// Locate an item as `(track index, item index)`.
    pub fn locate_item(&self, item_id: &str) -> Option<(usize, usize)> {
        self.tracks.iter().enumerate().find_map(|(track_index, track)| {
            track
                .items
                .iter()
                .position(|item| item.id == item_id)
                .map(|item_index| (track_index, item_index))
        })
    }

    pub fn item(&self, item_id: &str) -> Option<&AssemblyItem> {
        self.locate_item(item_id)
            .map(|(t, i)| &self.tracks[t].items[i])
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut AssemblyItem> {
        let (t, i) = self.locate_item(item_id)?;
        Some(&mut self.tracks[t].items[i])
    }

    /// Track that currently holds the item.
    pub fn track_of_item(&self, item_id: &str) -> Option<&AssemblyTrack> {
        self.locate_item(item_id).map(|(t, _)| &self.tracks[t])
    }

    pub fn count_of_kind(&self, kind: TrackKind) -> usize {
        self.tracks.iter().filter(|track| track.kind == kind).count()
    }

    pub fn items(&self) -> impl Iterator<Item = &AssemblyItem> {
        self.tracks.iter().flat_map(|track| track.items.iter())
    }

    /// Next unused "Video N" / "Audio N" name.
    pub fn next_track_name(&self, kind: TrackKind) -> String {
        format!("{} {}", kind.label(), self.count_of_kind(kind) + 1)
    }
}

/// The complete unit of undo/redo.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSnapshot {
    pub clips: Vec<ClipSegment>,
    pub active_clip_id: Option<String>,
    pub clip_drafts: BTreeMap<String, ExportDraft>,
    pub assembly: ClipAssemblyState,
}

impl TimelineSnapshot {
    pub fn with_clips(clips: Vec<ClipSegment>) -> Self {
        let active_clip_id = clips.first().map(|clip| clip.id.clone());
        Self {
            clips,
            active_clip_id,
            ..Self::default()
        }
    }

    pub fn clip(&self, clip_id: &str) -> Option<&ClipSegment> {
        self.clips.iter().find(|clip| clip.id == clip_id)
    }
}
