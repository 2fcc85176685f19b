//! Assembly model: tracks of items placed on an assembly timeline.
//!
//! Operations return the new [`ClipAssemblyState`] (plus a generated id where
//! the caller needs to focus something), or `None` when the assembly rules
//! reject the edit.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::model::*;
use crate::domain::rules::{RangeRules, TrackCompatibility};

/// Raw media dropped onto the assembly without a backing clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalMedia {
    pub path: String,
    pub kind: TrackKind,
    #[serde(default)]
    pub label: Option<String>,
    /// Playable length of the media; falls back to the configured default.
    #[serde(default)]
    pub duration: Option<f64>,
}

impl ExternalMedia {
    fn source(&self) -> ItemSource {
        match self.kind {
            TrackKind::Video => ItemSource::VideoFile {
                path: self.path.clone(),
            },
            TrackKind::Audio => ItemSource::AudioFile {
                path: self.path.clone(),
            },
        }
    }

    fn display_label(&self) -> String {
        self.label
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                std::path::Path::new(&self.path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| self.path.clone())
            })
    }
}

/// Lay clips back-to-back on a fresh video track, sorted by `(start, end, id)`.
pub fn build_assembly_from_clips(clips: &[ClipSegment]) -> ClipAssemblyState {
    let mut sorted: Vec<&ClipSegment> = clips.iter().collect();
    sorted.sort_by(|a, b| {
        a.start
            .total_cmp(&b.start)
            .then(a.end.total_cmp(&b.end))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut video = AssemblyTrack::new(TrackKind::Video, "Video 1");
    let mut cursor = 0.0;
    for clip in sorted {
        let item = AssemblyItem::new(
            clip.title.clone(),
            ItemSource::Clip {
                clip_id: clip.id.clone(),
            },
            cursor,
            clip.start,
            clip.end,
        );
        cursor = item.timeline_end;
        video.items.push(item);
    }
    let audio = AssemblyTrack::new(TrackKind::Audio, "Audio 1");

    debug!(items = video.items.len(), span = cursor, "Built assembly from clips");
    ClipAssemblyState {
        active_track_id: Some(video.id.clone()),
        active_item_id: video.items.first().map(|i| i.id.clone()),
        tracks: vec![video, audio],
        ..ClipAssemblyState::default()
    }
}

/// Replace the whole assembly with an auto-built one, keeping view settings.
pub fn auto_assemble(snapshot: &TimelineSnapshot) -> TimelineSnapshot {
    let mut next = snapshot.clone();
    let mut assembly = build_assembly_from_clips(&snapshot.clips);
    assembly.zoom = snapshot.assembly.zoom;
    assembly.subtitle_overlays_enabled = snapshot.assembly.subtitle_overlays_enabled;
    next.assembly = assembly;
    next
}

/// Latest `timeline_end` over all items.
pub fn assembly_span(state: &ClipAssemblyState) -> f64 {
    state.tracks.iter().map(AssemblyTrack::end).fold(0.0, f64::max)
}

/// Pick the track a new item lands on: the requested track, else the active
/// track, else the first compatible unlocked track.
fn placement_track(state: &ClipAssemblyState, source: &ItemSource, requested: Option<&str>) -> Option<usize> {
    let placeable = |id: &str| {
        state
            .track_index(id)
            .filter(|&index| TrackCompatibility::can_place(&state.tracks[index], source))
    };
    requested
        .and_then(placeable)
        .or_else(|| state.active_track_id.as_deref().and_then(placeable))
        .or_else(|| {
            state
                .tracks
                .iter()
                .position(|track| TrackCompatibility::can_place(track, source))
        })
}

fn append_item(
    state: &ClipAssemblyState,
    item: AssemblyItem,
    requested: Option<&str>,
) -> Option<(ClipAssemblyState, String)> {
    let index = placement_track(state, &item.source, requested)?;
    let mut next = state.clone();
    let track = &mut next.tracks[index];
    let start = track.end();
    let mut item = item;
    let length = item.duration();
    item.timeline_start = start;
    item.timeline_end = start + length;
    let id = item.id.clone();
    track.items.push(item);
    next.active_track_id = Some(track.id.clone());
    next.active_item_id = Some(id.clone());
    Some((next, id))
}

/// Append a clip to the end of a track. Returns the new item id.
pub fn append_clip_to_track(
    state: &ClipAssemblyState,
    clip: &ClipSegment,
    track_id: Option<&str>,
) -> Option<(ClipAssemblyState, String)> {
    if clip.end - clip.start < MIN_ITEM_DURATION {
        return None;
    }
    let item = AssemblyItem::new(
        clip.title.clone(),
        ItemSource::Clip {
            clip_id: clip.id.clone(),
        },
        0.0,
        clip.start,
        clip.end,
    );
    append_item(state, item, track_id)
}

/// Append raw media to the end of a compatible track. Returns the new item id.
pub fn append_external_media_to_track(
    state: &ClipAssemblyState,
    media: &ExternalMedia,
    track_id: Option<&str>,
    default_duration: f64,
) -> Option<(ClipAssemblyState, String)> {
    let duration = media
        .duration
        .filter(|d| d.is_finite() && *d >= MIN_ITEM_DURATION)
        .unwrap_or(default_duration)
        .max(MIN_ITEM_DURATION);
    let item = AssemblyItem::new(media.display_label(), media.source(), 0.0, 0.0, duration);
    append_item(state, item, track_id)
}

/// Remove a single item. Items on locked tracks stay put.
pub fn remove_item(state: &ClipAssemblyState, item_id: &str) -> Option<ClipAssemblyState> {
    let (track_index, item_index) = state.locate_item(item_id)?;
    if state.tracks[track_index].locked {
        return None;
    }
    let mut next = state.clone();
    next.tracks[track_index].items.remove(item_index);
    if next.active_item_id.as_deref() == Some(item_id) {
        next.active_item_id = None;
    }
    Some(next)
}

/// Remove every placement of a clip across all tracks. Returns how many items
/// went away. Clip deletion propagates into locked tracks as well, since an
/// item cannot outlive the clip it plays.
pub(crate) fn strip_clip_items(state: &mut ClipAssemblyState, clip_id: &str) -> usize {
    let mut removed = 0;
    for track in &mut state.tracks {
        let before = track.items.len();
        track.items.retain(|item| item.source.clip_id() != Some(clip_id));
        removed += before - track.items.len();
    }
    if let Some(active) = state.active_item_id.as_deref() {
        if state.item(active).is_none() {
            state.active_item_id = None;
        }
    }
    removed
}

pub fn remove_items_for_clip(state: &ClipAssemblyState, clip_id: &str) -> Option<ClipAssemblyState> {
    let mut next = state.clone();
    (strip_clip_items(&mut next, clip_id) > 0).then_some(next)
}

/// Add an empty track. Video tracks go on top of the existing video tracks so
/// they take precedence; audio tracks go at the bottom.
pub fn add_track(state: &ClipAssemblyState, kind: TrackKind) -> (ClipAssemblyState, String) {
    let mut next = state.clone();
    let track = AssemblyTrack::new(kind, state.next_track_name(kind));
    let id = track.id.clone();
    let position = match kind {
        TrackKind::Video => next
            .tracks
            .iter()
            .position(|t| t.kind == TrackKind::Video)
            .unwrap_or(0),
        TrackKind::Audio => next.tracks.len(),
    };
    next.tracks.insert(position, track);
    next.active_track_id = Some(id.clone());
    (next, id)
}

/// Remove a track and its items. The last track of a kind cannot be removed.
pub fn remove_track(state: &ClipAssemblyState, track_id: &str) -> Option<ClipAssemblyState> {
    let index = state.track_index(track_id)?;
    let kind = state.tracks[index].kind;
    if state.count_of_kind(kind) <= 1 {
        return None;
    }
    let mut next = state.clone();
    let removed = next.tracks.remove(index);

    if let Some(active) = next.active_item_id.as_deref() {
        if removed.items.iter().any(|item| item.id == active) {
            next.active_item_id = None;
        }
    }
    if next.active_track_id.as_deref() == Some(track_id) {
        next.active_track_id = next
            .tracks
            .iter()
            .find(|t| t.kind == kind)
            .or_else(|| next.tracks.first())
            .map(|t| t.id.clone());
    }
    Some(next)
}

pub fn rename_track(state: &ClipAssemblyState, track_id: &str, name: &str) -> Option<ClipAssemblyState> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let mut next = state.clone();
    let track = next.track_mut(track_id)?;
    if track.name == name {
        return None;
    }
    track.name = name.to_string();
    Some(next)
}

fn toggle_track_flag(
    state: &ClipAssemblyState,
    track_id: &str,
    flag: impl FnOnce(&mut AssemblyTrack) -> &mut bool,
) -> Option<ClipAssemblyState> {
    let mut next = state.clone();
    let value = flag(next.track_mut(track_id)?);
    *value = !*value;
    Some(next)
}

pub fn toggle_track_mute(state: &ClipAssemblyState, track_id: &str) -> Option<ClipAssemblyState> {
    toggle_track_flag(state, track_id, |t| &mut t.muted)
}

pub fn toggle_track_lock(state: &ClipAssemblyState, track_id: &str) -> Option<ClipAssemblyState> {
    toggle_track_flag(state, track_id, |t| &mut t.locked)
}

pub fn toggle_track_hidden(state: &ClipAssemblyState, track_id: &str) -> Option<ClipAssemblyState> {
    toggle_track_flag(state, track_id, |t| &mut t.hidden)
}

pub fn set_item_volume(state: &ClipAssemblyState, item_id: &str, volume: f64) -> Option<ClipAssemblyState> {
    let mut next = state.clone();
    let item = next.item_mut(item_id)?;
    item.volume = RangeRules::clamp_volume(volume);
    Some(next)
}

pub fn set_item_opacity(state: &ClipAssemblyState, item_id: &str, opacity: f64) -> Option<ClipAssemblyState> {
    let mut next = state.clone();
    let item = next.item_mut(item_id)?;
    item.opacity = RangeRules::clamp_opacity(opacity);
    Some(next)
}

pub fn toggle_item_mute(state: &ClipAssemblyState, item_id: &str) -> Option<ClipAssemblyState> {
    let mut next = state.clone();
    let item = next.item_mut(item_id)?;
    item.muted = !item.muted;
    Some(next)
}

pub fn toggle_subtitle_overlays(state: &ClipAssemblyState) -> ClipAssemblyState {
    let mut next = state.clone();
    next.subtitle_overlays_enabled = !next.subtitle_overlays_enabled;
    next
}

/// Focus a track and/or item. Selecting an item also selects its track.
pub fn select(
    state: &ClipAssemblyState,
    track_id: Option<&str>,
    item_id: Option<&str>,
) -> Option<ClipAssemblyState> {
    let track_id = match item_id {
        Some(id) => Some(state.track_of_item(id)?.id.as_str()),
        None => match track_id {
            Some(id) => Some(state.track(id)?.id.as_str()),
            None => state.active_track_id.as_deref(),
        },
    };
    if state.active_track_id.as_deref() == track_id && state.active_item_id.as_deref() == item_id {
        return None;
    }
    let mut next = state.clone();
    next.active_track_id = track_id.map(str::to_string);
    next.active_item_id = item_id.map(str::to_string);
    Some(next)
}
