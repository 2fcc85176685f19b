//! Versioned session export and tolerant hydration.
//!
//! [`export_session_state`] turns the present snapshot plus the surrounding
//! editor settings into a [`SessionState`]. [`hydrate_session_state`] is its
//! inverse for arbitrary JSON: every field is read and repaired on its own, so
//! a damaged field falls back to a safe default without losing the rest.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::assembly::build_assembly_from_clips;
use crate::domain::model::*;
use crate::domain::rules::{RangeRules, TrackCompatibility};
use crate::subtitles::SubtitleRenderProfile;

pub const SESSION_VERSION: u32 = 1;

/// Inclusive range of transcript word indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRange {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub version: u32,
    /// Length of the source recording the clips were cut from.
    pub media_duration: f64,
    pub clips: Vec<ClipSegment>,
    pub active_clip_id: Option<String>,
    pub assembly: ClipAssemblyState,
    pub clip_drafts: BTreeMap<String, ExportDraft>,
    pub subtitle_profile: SubtitleRenderProfile,
    pub transcript_selection: Option<WordRange>,
    pub exported_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            clips: self.clips.clone(),
            active_clip_id: self.active_clip_id.clone(),
            clip_drafts: self.clip_drafts.clone(),
            assembly: self.assembly.clone(),
        }
    }
}

pub fn export_session_state(
    snapshot: &TimelineSnapshot,
    media_duration: f64,
    subtitle_profile: &SubtitleRenderProfile,
    transcript_selection: Option<WordRange>,
) -> SessionState {
    SessionState {
        version: SESSION_VERSION,
        media_duration,
        clips: snapshot.clips.clone(),
        active_clip_id: snapshot.active_clip_id.clone(),
        assembly: snapshot.assembly.clone(),
        clip_drafts: snapshot.clip_drafts.clone(),
        subtitle_profile: subtitle_profile.clone(),
        transcript_selection,
        exported_at: Some(Utc::now()),
    }
}

/// Rebuild a session from untrusted JSON.
///
/// Clip ranges are fitted into `[0, duration]` and the transcript selection
/// into `[0, word_count)`. A non-positive `duration` falls back to the
/// duration stored in the session; when that is missing too, clips are only
/// kept non-negative.
pub fn hydrate_session_state(value: &Value, duration: f64, word_count: usize) -> SessionState {
    let empty = Map::new();
    let root = value.as_object().unwrap_or_else(|| {
        warn!("Session is not a JSON object, starting empty");
        &empty
    });

    let version = root
        .get("version")
        .and_then(Value::as_u64)
        .unwrap_or(u64::from(SESSION_VERSION));
    if version != u64::from(SESSION_VERSION) {
        warn!(version, "Unknown session version, reading fields leniently");
    }

    let stored_duration = number(root, "mediaDuration").filter(|d| *d > 0.0);
    let media_duration = if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        stored_duration.unwrap_or(0.0)
    };
    let bound = if media_duration > 0.0 {
        media_duration
    } else {
        f64::INFINITY
    };

    let clips = hydrate_clips(root.get("clips"), bound);
    let clip_ids: BTreeSet<&str> = clips.iter().map(|clip| clip.id.as_str()).collect();

    let active_clip_id = text(root, "activeClipId")
        .filter(|id| clip_ids.contains(id.as_str()))
        .or_else(|| clips.first().map(|clip| clip.id.clone()));

    let clip_drafts = match root.get("clipDrafts") {
        Some(Value::Object(drafts)) => drafts
            .iter()
            .filter(|(id, _)| clip_ids.contains(id.as_str()))
            .map(|(id, draft)| (id.clone(), draft.clone()))
            .collect(),
        Some(Value::Null) | None => BTreeMap::new(),
        Some(_) => {
            warn!(field = "clipDrafts", "Expected an object, dropping drafts");
            BTreeMap::new()
        }
    };

    let assembly = match root.get("assembly") {
        Some(Value::Object(assembly)) => hydrate_assembly(assembly, &clip_ids, bound),
        _ => {
            warn!(field = "assembly", "Missing assembly, rebuilding from clips");
            build_assembly_from_clips(&clips)
        }
    };

    let subtitle_profile = hydrate_profile(root.get("subtitleProfile"));
    let transcript_selection = hydrate_selection(root.get("transcriptSelection"), word_count);
    let exported_at = text(root, "exportedAt").and_then(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .ok()
    });

    SessionState {
        version: SESSION_VERSION,
        media_duration,
        clips,
        active_clip_id,
        assembly,
        clip_drafts,
        subtitle_profile,
        transcript_selection,
        exported_at,
    }
}

fn number(object: &Map<String, Value>, key: &str) -> Option<f64> {
    object
        .get(key)
        .and_then(Value::as_f64)
        .filter(|value| value.is_finite())
}

fn text(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn flag(object: &Map<String, Value>, key: &str, default: bool) -> bool {
    object.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn array<'a>(value: Option<&'a Value>, field: &str) -> &'a [Value] {
    match value {
        Some(Value::Array(values)) => values,
        Some(Value::Null) | None => &[],
        Some(_) => {
            warn!(field, "Expected an array, treating as empty");
            &[]
        }
    }
}

fn hydrate_clips(value: Option<&Value>, bound: f64) -> Vec<ClipSegment> {
    let mut seen = BTreeSet::new();
    let mut clips = Vec::new();
    for (index, raw) in array(value, "clips").iter().enumerate() {
        let Some(object) = raw.as_object() else {
            warn!(index, "Dropping clip that is not an object");
            continue;
        };
        let (Some(start), Some(end)) = (number(object, "start"), number(object, "end")) else {
            warn!(index, "Dropping clip without a numeric range");
            continue;
        };
        let Some((start, end)) = RangeRules::fit_clip_range(start, end, bound) else {
            warn!(index, "Dropping clip that does not fit the media");
            continue;
        };
        let id = text(object, "id")
            .filter(|id| !seen.contains(id))
            .unwrap_or_else(|| new_id("clip"));
        seen.insert(id.clone());
        let title = text(object, "title").unwrap_or_else(|| format!("Clip {}", clips.len() + 1));
        let mut clip = ClipSegment::new(id, title, start, end);
        if let Some(project_id) = text(object, "projectId") {
            clip = clip.with_project(project_id);
        }
        clips.push(clip);
    }
    clips.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.end.total_cmp(&b.end)));
    clips
}

fn hydrate_assembly(object: &Map<String, Value>, clip_ids: &BTreeSet<&str>, bound: f64) -> ClipAssemblyState {
    let mut state = ClipAssemblyState {
        tracks: Vec::new(),
        active_track_id: None,
        active_item_id: None,
        zoom: RangeRules::clamp_zoom(number(object, "zoom").unwrap_or(DEFAULT_ZOOM), DEFAULT_ZOOM),
        subtitle_overlays_enabled: flag(object, "subtitleOverlaysEnabled", true),
    };

    let mut track_ids = BTreeSet::new();
    let mut item_ids = BTreeSet::new();
    for (index, raw) in array(object.get("tracks"), "assembly.tracks").iter().enumerate() {
        let Some(track) = raw.as_object() else {
            warn!(index, "Dropping track that is not an object");
            continue;
        };
        let kind = match track.get("type").and_then(Value::as_str) {
            Some("audio") => TrackKind::Audio,
            Some("video") => TrackKind::Video,
            other => {
                warn!(index, kind = ?other, "Unknown track type, using video");
                TrackKind::Video
            }
        };
        let name = text(track, "name").unwrap_or_else(|| state.next_track_name(kind));
        let mut hydrated = AssemblyTrack::new(kind, name);
        if let Some(id) = text(track, "id").filter(|id| !track_ids.contains(id)) {
            hydrated.id = id;
        }
        track_ids.insert(hydrated.id.clone());
        hydrated.muted = flag(track, "muted", false);
        hydrated.locked = flag(track, "locked", false);
        hydrated.hidden = flag(track, "hidden", false);

        for (item_index, raw_item) in array(track.get("items"), "assembly.tracks.items").iter().enumerate() {
            let Some(item) = raw_item.as_object().and_then(|item| hydrate_item(item, kind, clip_ids, bound)) else {
                warn!(track = index, item = item_index, "Dropping unusable assembly item");
                continue;
            };
            if !TrackCompatibility::accepts(kind, &item.source) {
                warn!(track = index, item = item_index, "Dropping item placed on an incompatible track");
                continue;
            }
            let mut item = item;
            if item_ids.contains(&item.id) {
                item.id = new_id("item");
            }
            item_ids.insert(item.id.clone());
            hydrated.items.push(item);
        }
        state.tracks.push(hydrated);
    }

    for kind in [TrackKind::Video, TrackKind::Audio] {
        if state.count_of_kind(kind) == 0 {
            warn!(%kind, "Session had no track of this kind, adding one");
            let track = AssemblyTrack::new(kind, state.next_track_name(kind));
            match kind {
                TrackKind::Video => state.tracks.insert(0, track),
                TrackKind::Audio => state.tracks.push(track),
            }
        }
    }

    state.active_track_id = text(object, "activeTrackId")
        .filter(|id| state.track(id).is_some())
        .or_else(|| {
            state
                .tracks
                .iter()
                .find(|track| track.kind == TrackKind::Video)
                .map(|track| track.id.clone())
        });
    state.active_item_id = text(object, "activeItemId").filter(|id| state.item(id).is_some());
    state
}

fn hydrate_item(
    object: &Map<String, Value>,
    kind: TrackKind,
    clip_ids: &BTreeSet<&str>,
    bound: f64,
) -> Option<AssemblyItem> {
    let clip_id = text(object, "sourceClipId");
    let path = text(object, "sourcePath").unwrap_or_default();
    let source = match object.get("sourceType").and_then(Value::as_str) {
        Some("clip") => ItemSource::Clip { clip_id: clip_id? },
        Some("video-file") => ItemSource::VideoFile { path },
        Some("audio-file") => ItemSource::AudioFile { path },
        _ => match (clip_id, kind) {
            (Some(clip_id), _) => ItemSource::Clip { clip_id },
            (None, TrackKind::Video) => ItemSource::VideoFile { path },
            (None, TrackKind::Audio) => ItemSource::AudioFile { path },
        },
    };
    if let Some(clip_id) = source.clip_id() {
        if !clip_ids.contains(clip_id) {
            return None;
        }
    }

    let timeline_start = number(object, "timelineStart")?.max(0.0);
    let timeline_end = number(object, "timelineEnd")
        .unwrap_or(timeline_start)
        .max(timeline_start + MIN_ITEM_DURATION);
    let length = timeline_end - timeline_start;
    let source_in = number(object, "sourceIn").unwrap_or(0.0).max(0.0);
    let source_out = number(object, "sourceOut")
        .filter(|out| *out > source_in)
        .unwrap_or(source_in + length);
    let (source_in, source_out) = fit_source_range(source_in, source_out, bound)?;

    let label = text(object, "label").unwrap_or_else(|| source.type_name().to_string());
    let mut item = AssemblyItem::new(label, source, timeline_start, source_in, source_out);
    if let Some(id) = text(object, "id") {
        item.id = id;
    }
    item.timeline_end = timeline_end;
    item.volume = RangeRules::clamp_volume(number(object, "volume").unwrap_or(1.0));
    item.opacity = RangeRules::clamp_opacity(number(object, "opacity").unwrap_or(1.0));
    item.muted = flag(object, "muted", false);
    Some(item)
}

/// Shift a source range back inside `[0, bound]`, keeping its length when it
/// fits and cutting it at the bound when it does not.
fn fit_source_range(source_in: f64, source_out: f64, bound: f64) -> Option<(f64, f64)> {
    let overhang = (source_out - bound).max(0.0);
    let source_in = (source_in - overhang).max(0.0);
    let source_out = source_out - overhang;
    (source_out > source_in).then_some((source_in, source_out))
}

fn hydrate_profile(value: Option<&Value>) -> SubtitleRenderProfile {
    let Some(value) = value.filter(|value| !value.is_null()) else {
        return SubtitleRenderProfile::default();
    };
    let mut profile = match serde_json::from_value::<SubtitleRenderProfile>(value.clone()) {
        Ok(profile) => profile,
        Err(error) => {
            warn!(field = "subtitleProfile", %error, "Unreadable subtitle profile, using defaults");
            return SubtitleRenderProfile::default();
        }
    };
    let defaults = SubtitleRenderProfile::default();
    if profile.max_words_per_line == 0 {
        profile.max_words_per_line = defaults.max_words_per_line;
    }
    if profile.max_chars_per_line == 0 {
        profile.max_chars_per_line = defaults.max_chars_per_line;
    }
    if profile.max_lines == 0 {
        profile.max_lines = defaults.max_lines;
    }
    if !profile.font_size.is_finite() || profile.font_size <= 0.0 {
        profile.font_size = defaults.font_size;
    }
    profile
}

fn hydrate_selection(value: Option<&Value>, word_count: usize) -> Option<WordRange> {
    let object = value?.as_object()?;
    if word_count == 0 {
        return None;
    }
    let last = word_count - 1;
    let index = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_f64)
            .filter(|value| value.is_finite())
            .map(|value| (value.max(0.0) as usize).min(last))
    };
    let start = index("start")?;
    let end = index("end").unwrap_or(start);
    Some(WordRange {
        start: start.min(end),
        end: start.max(end),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::assembly;

    fn sample_snapshot() -> TimelineSnapshot {
        let mut snapshot = TimelineSnapshot::with_clips(vec![
            ClipSegment::new("a", "Intro", 0.0, 5.0),
            ClipSegment::new("b", "Body", 5.0, 9.0),
        ]);
        snapshot.assembly = assembly::build_assembly_from_clips(&snapshot.clips);
        snapshot.clip_drafts.insert("a".to_string(), json!({"caption": "hi"}));
        snapshot
    }

    #[test]
    fn test_export_then_hydrate_is_identity() {
        let snapshot = sample_snapshot();
        let profile = SubtitleRenderProfile::default();
        let exported = export_session_state(&snapshot, 60.0, &profile, Some(WordRange { start: 1, end: 3 }));
        let value = serde_json::to_value(&exported).unwrap();
        assert_eq!(value["version"], json!(1));
        assert_eq!(value["assembly"]["tracks"][0]["items"][0]["sourceType"], json!("clip"));

        let hydrated = hydrate_session_state(&value, 60.0, 10);
        assert_eq!(hydrated.snapshot(), snapshot);
        assert_eq!(hydrated.transcript_selection, Some(WordRange { start: 1, end: 3 }));
        assert_eq!(hydrated.exported_at, exported.exported_at);
    }

    #[test]
    fn test_garbage_root_yields_empty_session() {
        let hydrated = hydrate_session_state(&json!("nope"), 30.0, 0);
        assert!(hydrated.clips.is_empty());
        assert_eq!(hydrated.assembly.count_of_kind(TrackKind::Video), 1);
        assert_eq!(hydrated.assembly.count_of_kind(TrackKind::Audio), 1);
    }

    #[test]
    fn test_clips_are_clamped_to_duration() {
        let value = json!({
            "clips": [
                {"id": "a", "title": "A", "start": 8.0, "end": 50.0},
                {"id": "b", "start": "bad", "end": 3.0},
                {"id": "a", "start": 1.0, "end": 2.0},
                7
            ],
            "activeClipId": "missing"
        });
        let hydrated = hydrate_session_state(&value, 10.0, 0);
        assert_eq!(hydrated.clips.len(), 2);
        assert_eq!(hydrated.clips[0].start, 1.0);
        assert_ne!(hydrated.clips[0].id, "a");
        assert_eq!(hydrated.clips[1].id, "a");
        assert_eq!(hydrated.clips[1].end, 10.0);
        assert_eq!(hydrated.active_clip_id.as_deref(), Some(hydrated.clips[0].id.as_str()));
    }

    #[test]
    fn test_assembly_repairs_are_independent() {
        let value = json!({
            "clips": [{"id": "a", "title": "A", "start": 0.0, "end": 4.0}],
            "clipDrafts": {"a": {"x": 1}, "gone": {"x": 2}},
            "assembly": {
                "zoom": 99,
                "tracks": [
                    {"id": "v", "type": "hologram", "items": [
                        {"id": "i1", "sourceType": "clip", "sourceClipId": "a",
                         "timelineStart": 0, "timelineEnd": 0.05, "sourceIn": 0, "sourceOut": 4,
                         "volume": 7, "opacity": -1},
                        {"id": "i2", "sourceType": "clip", "sourceClipId": "gone",
                         "timelineStart": 4, "timelineEnd": 8},
                        {"id": "i3", "sourceType": "audio-file", "sourcePath": "a.wav",
                         "timelineStart": 4, "timelineEnd": 8}
                    ]}
                ],
                "activeItemId": "i2"
            },
            "subtitleProfile": {"maxWordsPerLine": 0, "uppercase": true},
            "transcriptSelection": {"start": 40, "end": 2}
        });
        let hydrated = hydrate_session_state(&value, 20.0, 10);
        let state = &hydrated.assembly;

        assert_eq!(state.zoom, MAX_ZOOM);
        assert_eq!(state.tracks[0].kind, TrackKind::Video);
        assert_eq!(state.tracks[0].items.len(), 1);
        let item = &state.tracks[0].items[0];
        assert!((item.duration() - MIN_ITEM_DURATION).abs() < 1e-9);
        assert_eq!(item.volume, MAX_ITEM_VOLUME);
        assert_eq!(item.opacity, 0.0);
        assert_eq!(state.count_of_kind(TrackKind::Audio), 1);
        assert_eq!(state.active_track_id.as_deref(), Some("v"));
        assert_eq!(state.active_item_id, None);

        assert_eq!(hydrated.clip_drafts.len(), 1);
        assert!(hydrated.subtitle_profile.uppercase);
        assert_eq!(hydrated.subtitle_profile.max_words_per_line, 5);
        assert_eq!(hydrated.transcript_selection, Some(WordRange { start: 2, end: 9 }));
    }

    #[test]
    fn test_item_source_range_fits_duration() {
        let value = json!({
            "mediaDuration": 20,
            "clips": [{"id": "a", "title": "A", "start": 0.0, "end": 4.0}],
            "assembly": {"tracks": [
                {"id": "v", "type": "video", "items": [
                    {"id": "far", "sourceType": "clip", "sourceClipId": "a",
                     "timelineStart": 0, "timelineEnd": 4, "sourceIn": 300, "sourceOut": 900},
                    {"id": "edge", "sourceType": "video-file", "sourcePath": "b.mp4",
                     "timelineStart": 4, "timelineEnd": 7, "sourceIn": 18, "sourceOut": 21}
                ]}
            ]}
        });
        let hydrated = hydrate_session_state(&value, 0.0, 0);
        let far = hydrated.assembly.item("far").unwrap();
        assert_eq!((far.source_in, far.source_out), (0.0, 20.0));
        let edge = hydrated.assembly.item("edge").unwrap();
        assert_eq!((edge.source_in, edge.source_out), (17.0, 20.0));
    }

    #[test]
    fn test_missing_assembly_is_rebuilt_from_clips() {
        let value = json!({
            "clips": [
                {"id": "a", "title": "A", "start": 0.0, "end": 5.0},
                {"id": "b", "title": "B", "start": 5.0, "end": 9.0}
            ]
        });
        let hydrated = hydrate_session_state(&value, 0.0, 0);
        let items = &hydrated.assembly.tracks[0].items;
        assert_eq!(items.len(), 2);
        assert_eq!((items[1].timeline_start, items[1].timeline_end), (5.0, 9.0));
    }

    #[test]
    fn test_untyped_items_fall_back_by_track() {
        let value = json!({
            "assembly": {"tracks": [
                {"type": "audio", "items": [{"sourcePath": "x.wav", "timelineStart": 1, "timelineEnd": 3}]}
            ]}
        });
        let hydrated = hydrate_session_state(&value, 0.0, 0);
        let audio = hydrated
            .assembly
            .tracks
            .iter()
            .find(|t| t.kind == TrackKind::Audio)
            .unwrap();
        assert_eq!(
            audio.items[0].source,
            ItemSource::AudioFile {
                path: "x.wav".to_string()
            }
        );
        assert_eq!(hydrated.assembly.tracks[0].kind, TrackKind::Video);
    }
}
