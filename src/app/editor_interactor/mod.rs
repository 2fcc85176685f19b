// Editor interactor - The command and read surface of one editing session

use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info};

use crate::assembly::{self, ExternalMedia};
use crate::clips;
use crate::domain::config::EngineConfig;
use crate::domain::model::*;
use crate::edit::gesture::{GestureController, GestureOutcome, PointerId, PointerPosition, TrackLayout};
use crate::edit::zoom::{self, ZoomAnchor, ZoomController};
use crate::edit::{self as edits, timeline_extent};
use crate::history::TimelineHistory;
use crate::resolver::{self, Coverage};
use crate::session::{export_session_state, hydrate_session_state, SessionState, WordRange};
use crate::subtitles::{self, CueLayout, RenderedCue, SubtitleCue, SubtitleRenderProfile, TranscriptWord};

/// What playback should show at an assembly time.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackTarget {
    pub track_id: String,
    pub item_id: String,
    pub source: ItemSource,
    pub source_time: f64,
    pub coverage: Coverage,
}

/// One editing session: the undo history plus the inputs handed in by the
/// surrounding application (media duration, playback clock, transcript).
///
/// Every command returns whether it changed anything; rejected commands leave
/// the state and the history untouched.
#[derive(Debug)]
pub struct EditorSession {
    history: TimelineHistory,
    media_duration: f64,
    current_time: f64,
    words: Vec<TranscriptWord>,
    subtitle_profile: SubtitleRenderProfile,
    transcript_selection: Option<WordRange>,
    gestures: GestureController,
    zoom: ZoomController,
    nudge_step: f64,
    default_external_duration: f64,
}

impl EditorSession {
    pub fn new(config: &EngineConfig, media_duration: f64) -> Self {
        Self {
            history: TimelineHistory::with_limit(TimelineSnapshot::default(), config.history_limit),
            media_duration: sanitize_duration(media_duration),
            current_time: 0.0,
            words: Vec::new(),
            subtitle_profile: config.subtitles.clone(),
            transcript_selection: None,
            gestures: GestureController::new(),
            zoom: ZoomController::new(config.zoom_debounce()),
            nudge_step: config.nudge_step,
            default_external_duration: config.default_external_duration,
        }
    }

    // ----- reads -----

    pub fn snapshot(&self) -> &TimelineSnapshot {
        self.history.present()
    }

    pub fn clips(&self) -> &[ClipSegment] {
        &self.history.present().clips
    }

    pub fn active_clip_id(&self) -> Option<&str> {
        self.history.present().active_clip_id.as_deref()
    }

    pub fn assembly(&self) -> &ClipAssemblyState {
        &self.history.present().assembly
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn revision(&self) -> u64 {
        self.history.revision()
    }

    /// Media length in seconds, 0 while unknown.
    pub fn media_duration(&self) -> f64 {
        self.media_duration
    }

    /// Upper bound for clip source ranges. An unknown duration bounds nothing,
    /// matching how a stored session is hydrated.
    fn source_bound(&self) -> f64 {
        if self.media_duration > 0.0 {
            self.media_duration
        } else {
            f64::INFINITY
        }
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn words(&self) -> &[TranscriptWord] {
        &self.words
    }

    pub fn subtitle_profile(&self) -> &SubtitleRenderProfile {
        &self.subtitle_profile
    }

    pub fn transcript_selection(&self) -> Option<WordRange> {
        self.transcript_selection
    }

    /// Extent items can be moved within.
    pub fn timeline_extent(&self) -> f64 {
        timeline_extent(self.assembly(), self.media_duration)
    }

    pub fn subtitle_cues(&self, layout: Option<CueLayout>) -> Vec<SubtitleCue> {
        subtitles::build_cues(&self.words, &self.subtitle_profile, layout)
    }

    /// Caption for the current playback time, or `None` when overlays are
    /// switched off or nothing is being said.
    pub fn subtitle_preview(&self, layout: Option<CueLayout>) -> Option<RenderedCue> {
        if !self.assembly().subtitle_overlays_enabled {
            return None;
        }
        subtitles::render_at(&self.subtitle_cues(layout), self.current_time)
    }

    /// Resolve the item and source position playing at assembly time `time`.
    pub fn playback_at(&self, time: f64) -> Option<PlaybackTarget> {
        let resolved = resolver::resolve_at(self.assembly(), time)?;
        let source_time = match resolved.coverage {
            Coverage::Covering => resolver::map_assembly_to_source(resolved.item, time, self.clips()),
            Coverage::Upcoming => resolved.item.source_in,
        };
        Some(PlaybackTarget {
            track_id: resolved.track.id.clone(),
            item_id: resolved.item.id.clone(),
            source: resolved.item.source.clone(),
            source_time,
            coverage: resolved.coverage,
        })
    }

    // ----- inputs -----

    pub fn set_current_time(&mut self, time: f64) {
        if time.is_finite() {
            self.current_time = time.max(0.0);
        }
    }

    pub fn set_media_duration(&mut self, duration: f64) {
        self.media_duration = sanitize_duration(duration);
    }

    pub fn set_words(&mut self, words: Vec<TranscriptWord>) {
        self.words = words;
        self.transcript_selection = self
            .transcript_selection
            .and_then(|range| clamp_selection(range, self.words.len()));
    }

    pub fn set_subtitle_profile(&mut self, profile: SubtitleRenderProfile) {
        self.subtitle_profile = profile;
    }

    pub fn set_transcript_selection(&mut self, selection: Option<WordRange>) -> bool {
        let selection = selection.and_then(|range| clamp_selection(range, self.words.len()));
        if selection == self.transcript_selection {
            return false;
        }
        self.transcript_selection = selection;
        true
    }

    // ----- history -----

    pub fn undo(&mut self) -> bool {
        self.zoom.flush(&mut self.history);
        let undone = self.history.undo();
        if undone {
            info!(revision = self.history.revision(), "Undo");
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        self.zoom.flush(&mut self.history);
        let redone = self.history.redo();
        if redone {
            info!(revision = self.history.revision(), "Redo");
        }
        redone
    }

    fn commit<F>(&mut self, action: &str, edit: F) -> bool
    where
        F: FnOnce(&TimelineSnapshot) -> Option<TimelineSnapshot>,
    {
        self.zoom.flush(&mut self.history);
        match edit(self.history.present()) {
            Some(next) => {
                self.history.record(|_| next);
                info!(action, revision = self.history.revision(), "Edit applied");
                true
            }
            None => {
                debug!(action, "Edit rejected or unchanged");
                false
            }
        }
    }

    fn commit_with_id<F>(&mut self, action: &str, edit: F) -> Option<String>
    where
        F: FnOnce(&TimelineSnapshot) -> Option<(TimelineSnapshot, String)>,
    {
        let mut created = None;
        self.commit(action, |snapshot| {
            let (next, id) = edit(snapshot)?;
            created = Some(id);
            Some(next)
        });
        created
    }

    fn commit_assembly<F>(&mut self, action: &str, edit: F) -> bool
    where
        F: FnOnce(&ClipAssemblyState) -> Option<ClipAssemblyState>,
    {
        self.commit(action, |snapshot| {
            let assembly = edit(&snapshot.assembly)?;
            Some(TimelineSnapshot {
                assembly,
                ..snapshot.clone()
            })
        })
    }

    fn commit_assembly_with_id<F>(&mut self, action: &str, edit: F) -> Option<String>
    where
        F: FnOnce(&ClipAssemblyState) -> Option<(ClipAssemblyState, String)>,
    {
        self.commit_with_id(action, |snapshot| {
            let (assembly, id) = edit(&snapshot.assembly)?;
            Some((
                TimelineSnapshot {
                    assembly,
                    ..snapshot.clone()
                },
                id,
            ))
        })
    }

    // ----- clips -----

    pub fn add_clip(&mut self, title: Option<&str>, start: f64, end: f64) -> Option<String> {
        let duration = self.source_bound();
        self.commit_with_id("add_clip", |s| clips::add_clip(s, title, start, end, duration))
    }

    pub fn rename_clip(&mut self, clip_id: &str, title: &str) -> bool {
        self.commit("rename_clip", |s| clips::rename_clip(s, clip_id, title))
    }

    pub fn trim_clip(&mut self, clip_id: &str, edge: Edge, time: f64) -> bool {
        let duration = self.source_bound();
        self.commit("trim_clip", |s| clips::trim_clip(s, clip_id, edge, time, duration))
    }

    /// Split a clip at the current playback time.
    pub fn split_clip_at_playhead(&mut self, clip_id: &str) -> Option<String> {
        self.split_clip(clip_id, self.current_time)
    }

    pub fn split_clip(&mut self, clip_id: &str, time: f64) -> Option<String> {
        self.commit_with_id("split_clip", |s| clips::split_clip(s, clip_id, time))
    }

    /// Move a clip by `steps` nudge steps.
    pub fn nudge_clip(&mut self, clip_id: &str, steps: f64) -> bool {
        let delta = steps * self.nudge_step;
        let duration = self.source_bound();
        self.commit("nudge_clip", |s| clips::nudge_clip(s, clip_id, delta, duration))
    }

    pub fn remove_clip(&mut self, clip_id: &str) -> bool {
        self.commit("remove_clip", |s| clips::remove_clip(s, clip_id))
    }

    pub fn ripple_delete_clip(&mut self, clip_id: &str) -> bool {
        self.commit("ripple_delete_clip", |s| clips::ripple_delete_clip(s, clip_id))
    }

    /// Selecting a clip is not an undoable step.
    pub fn set_active_clip(&mut self, clip_id: Option<&str>) -> bool {
        let Some(next) = clips::set_active_clip(self.history.present(), clip_id) else {
            return false;
        };
        self.history.update(|_| next, false);
        true
    }

    pub fn set_clip_draft(&mut self, clip_id: &str, draft: ExportDraft) -> bool {
        self.commit("set_clip_draft", |s| clips::set_clip_draft(s, clip_id, draft))
    }

    // ----- assembly -----

    /// Rebuild the assembly from the clip list, replacing every track.
    pub fn auto_assemble(&mut self) -> bool {
        self.commit("auto_assemble", |s| {
            let next = assembly::auto_assemble(s);
            (next != *s).then_some(next)
        })
    }

    pub fn append_clip(&mut self, clip_id: &str, track_id: Option<&str>) -> Option<String> {
        self.commit_with_id("append_clip", |s| {
            let clip = s.clip(clip_id)?;
            let (assembly, id) = assembly::append_clip_to_track(&s.assembly, clip, track_id)?;
            Some((
                TimelineSnapshot {
                    assembly,
                    ..s.clone()
                },
                id,
            ))
        })
    }

    pub fn append_external_media(&mut self, media: &ExternalMedia, track_id: Option<&str>) -> Option<String> {
        let default_duration = self.default_external_duration;
        self.commit_assembly_with_id("append_external_media", |a| {
            assembly::append_external_media_to_track(a, media, track_id, default_duration)
        })
    }

    pub fn remove_item(&mut self, item_id: &str) -> bool {
        self.commit_assembly("remove_item", |a| assembly::remove_item(a, item_id))
    }

    pub fn add_track(&mut self, kind: TrackKind) -> Option<String> {
        self.commit_assembly_with_id("add_track", |a| Some(assembly::add_track(a, kind)))
    }

    pub fn remove_track(&mut self, track_id: &str) -> bool {
        self.commit_assembly("remove_track", |a| assembly::remove_track(a, track_id))
    }

    pub fn rename_track(&mut self, track_id: &str, name: &str) -> bool {
        self.commit_assembly("rename_track", |a| assembly::rename_track(a, track_id, name))
    }

    pub fn toggle_track_mute(&mut self, track_id: &str) -> bool {
        self.commit_assembly("toggle_track_mute", |a| assembly::toggle_track_mute(a, track_id))
    }

    pub fn toggle_track_lock(&mut self, track_id: &str) -> bool {
        self.commit_assembly("toggle_track_lock", |a| assembly::toggle_track_lock(a, track_id))
    }

    pub fn toggle_track_hidden(&mut self, track_id: &str) -> bool {
        self.commit_assembly("toggle_track_hidden", |a| assembly::toggle_track_hidden(a, track_id))
    }

    pub fn set_item_volume(&mut self, item_id: &str, volume: f64) -> bool {
        self.commit_assembly("set_item_volume", |a| assembly::set_item_volume(a, item_id, volume))
    }

    pub fn set_item_opacity(&mut self, item_id: &str, opacity: f64) -> bool {
        self.commit_assembly("set_item_opacity", |a| assembly::set_item_opacity(a, item_id, opacity))
    }

    pub fn toggle_item_mute(&mut self, item_id: &str) -> bool {
        self.commit_assembly("toggle_item_mute", |a| assembly::toggle_item_mute(a, item_id))
    }

    pub fn toggle_subtitle_overlays(&mut self) -> bool {
        self.commit_assembly("toggle_subtitle_overlays", |a| Some(assembly::toggle_subtitle_overlays(a)))
    }

    /// Focus a track and/or item without adding an undo step.
    pub fn select(&mut self, track_id: Option<&str>, item_id: Option<&str>) -> bool {
        let Some(selected) = assembly::select(self.assembly(), track_id, item_id) else {
            return false;
        };
        self.history.update(
            |mut snapshot| {
                snapshot.assembly = selected;
                snapshot
            },
            false,
        );
        true
    }

    // ----- item edits -----

    pub fn move_item(&mut self, item_id: &str, start: f64, track_id: Option<&str>) -> bool {
        let total = self.timeline_extent();
        self.commit_assembly("move_item", |a| edits::move_item(a, item_id, start, track_id, total))
    }

    pub fn resize_item(&mut self, item_id: &str, edge: Edge, time: f64) -> bool {
        self.commit_assembly("resize_item", |a| {
            let origin = edits::EditOrigin::of(a.item(item_id)?);
            edits::resize_item(a, item_id, edge, time, &origin)
        })
    }

    pub fn trim_item_to_playhead(&mut self, item_id: &str, edge: Edge) -> bool {
        let playhead = self.current_time;
        self.commit_assembly("trim_item_to_playhead", |a| {
            edits::trim_item_to_playhead(a, item_id, edge, playhead)
        })
    }

    pub fn split_item(&mut self, item_id: &str, time: f64) -> Option<String> {
        self.commit_assembly_with_id("split_item", |a| edits::split_item(a, item_id, time))
    }

    pub fn split_item_at_playhead(&mut self, item_id: &str) -> Option<String> {
        self.split_item(item_id, self.current_time)
    }

    /// Move an item by `steps` nudge steps on its own track.
    pub fn nudge_item(&mut self, item_id: &str, steps: f64) -> bool {
        let delta = steps * self.nudge_step;
        let total = self.timeline_extent();
        self.commit_assembly("nudge_item", |a| edits::nudge_item(a, item_id, delta, total))
    }

    // ----- pointer gestures -----

    pub fn pointer_down_move(&mut self, pointer: PointerId, item_id: &str, at: PointerPosition) -> bool {
        let total = self.timeline_extent();
        self.gestures.begin_move(&self.history, pointer, item_id, at, total)
    }

    pub fn pointer_down_resize(&mut self, pointer: PointerId, item_id: &str, edge: Edge, at: PointerPosition) -> bool {
        self.gestures.begin_resize(&self.history, pointer, item_id, edge, at)
    }

    /// Returns true when the caller should schedule an animation frame.
    pub fn pointer_move(&mut self, pointer: PointerId, at: PointerPosition) -> bool {
        self.gestures.pointer_move(pointer, at)
    }

    /// Run once per animation frame.
    pub fn flush_frame(&mut self, layout: &TrackLayout) -> usize {
        self.gestures.flush_frame(&mut self.history, layout)
    }

    pub fn pointer_up(&mut self, pointer: PointerId, layout: &TrackLayout) -> GestureOutcome {
        self.zoom.flush(&mut self.history);
        let outcome = self.gestures.pointer_up(&mut self.history, pointer, layout);
        if !matches!(outcome, GestureOutcome::Ignored) {
            info!(pointer, ?outcome, revision = self.history.revision(), "Gesture finished");
        }
        outcome
    }

    pub fn pointer_cancel(&mut self, pointer: PointerId) -> bool {
        self.gestures.pointer_cancel(&mut self.history, pointer)
    }

    // ----- zoom -----

    /// Set the zoom directly. A recorded change first settles any wheel burst.
    pub fn set_zoom(&mut self, next: f64, record_history: bool) -> bool {
        if record_history {
            return self.commit_assembly("set_zoom", |a| zoom::set_zoom(a, next));
        }
        let before = self.assembly().zoom;
        self.zoom.set_zoom_live(&mut self.history, next, Instant::now()) != before
    }

    pub fn wheel_zoom(&mut self, delta_y: f64, pointer_x: f64, scroll_left: f64, now: Instant) -> ZoomAnchor {
        self.zoom.wheel(&mut self.history, delta_y, pointer_x, scroll_left, now)
    }

    /// Commit a finished wheel burst. Call from the idle timer.
    pub fn poll_zoom(&mut self, now: Instant) -> bool {
        self.zoom.poll(&mut self.history, now)
    }

    pub fn zoom_deadline(&self) -> Option<Instant> {
        self.zoom.deadline()
    }

    pub fn cancel_zoom(&mut self) -> bool {
        self.zoom.cancel(&mut self.history)
    }

    // ----- persistence -----

    pub fn export_session_state(&self) -> SessionState {
        export_session_state(
            self.history.present(),
            self.media_duration,
            &self.subtitle_profile,
            self.transcript_selection,
        )
    }

    /// Install a stored session. History starts over; loading is not undoable.
    pub fn hydrate_session_state(&mut self, value: &Value) {
        let state = hydrate_session_state(value, self.media_duration, self.words.len());
        self.media_duration = state.media_duration;
        self.subtitle_profile = state.subtitle_profile.clone();
        self.transcript_selection = state.transcript_selection;
        self.gestures = GestureController::new();
        self.zoom.cancel(&mut self.history);
        self.history.replace_snapshot(state.snapshot());
        info!(
            clips = state.clips.len(),
            tracks = state.assembly.tracks.len(),
            "Session hydrated"
        );
    }
}

fn sanitize_duration(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        0.0
    }
}

fn clamp_selection(range: WordRange, word_count: usize) -> Option<WordRange> {
    if word_count == 0 {
        return None;
    }
    let last = word_count - 1;
    let (start, end) = (range.start.min(last), range.end.min(last));
    Some(WordRange {
        start: start.min(end),
        end: start.max(end),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> EditorSession {
        let mut editor = EditorSession::new(&EngineConfig::default(), 60.0);
        editor.add_clip(Some("One"), 0.0, 5.0).unwrap();
        editor.add_clip(Some("Two"), 5.0, 9.0).unwrap();
        editor.auto_assemble();
        editor
    }

    #[test]
    fn test_commands_are_undoable() {
        let mut editor = session();
        assert_eq!(editor.revision(), 3);
        let item = editor.assembly().tracks[0].items[0].id.clone();

        assert!(editor.nudge_item(&item, 10.0));
        assert_eq!(editor.assembly().item(&item).unwrap().timeline_start, 1.0);
        assert!(editor.undo());
        assert_eq!(editor.assembly().item(&item).unwrap().timeline_start, 0.0);
        assert!(editor.redo());
        assert_eq!(editor.assembly().item(&item).unwrap().timeline_start, 1.0);
    }

    #[test]
    fn test_rejected_command_leaves_history_alone() {
        let mut editor = session();
        let revision = editor.revision();
        assert!(!editor.remove_clip("missing"));
        assert!(editor.split_item("missing", 1.0).is_none());
        assert_eq!(editor.revision(), revision);
    }

    #[test]
    fn test_unknown_duration_leaves_clips_unbounded() {
        let mut editor = EditorSession::new(&EngineConfig::default(), 0.0);
        assert_eq!(editor.media_duration(), 0.0);
        let clip = editor.add_clip(None, 1.0, 3.0).unwrap();
        assert!(editor.trim_clip(&clip, Edge::End, 90.0));
        assert_eq!(editor.clips()[0].end, 90.0);
        assert!(editor.nudge_clip(&clip, 100.0));
        assert!(editor.clips()[0].start > 1.0);

        editor.set_media_duration(f64::NAN);
        assert!(editor.add_clip(None, 200.0, 201.0).is_some());
    }

    #[test]
    fn test_selection_is_not_undoable() {
        let mut editor = session();
        let revision = editor.revision();
        let clip = editor.clips()[0].id.clone();
        assert!(editor.set_active_clip(Some(&clip)));
        assert_eq!(editor.active_clip_id(), Some(clip.as_str()));
        assert_eq!(editor.revision(), revision);

        let item = editor.assembly().tracks[0].items[1].id.clone();
        assert!(editor.select(None, Some(&item)));
        assert_eq!(editor.revision(), revision);
    }

    #[test]
    fn test_playback_and_split_at_playhead() {
        let mut editor = session();
        let target = editor.playback_at(6.0).unwrap();
        assert_eq!(target.coverage, Coverage::Covering);
        assert!((target.source_time - 6.0).abs() < 1e-9);

        editor.set_current_time(7.0);
        let right = editor.split_item_at_playhead(&target.item_id).unwrap();
        let right_item = editor.assembly().item(&right).unwrap();
        assert_eq!(right_item.timeline_start, 7.0);
        assert_eq!(editor.assembly().active_item_id.as_deref(), Some(right.as_str()));
    }

    #[test]
    fn test_subtitle_preview_follows_overlay_toggle() {
        let mut editor = session();
        editor.set_words(vec![
            TranscriptWord::new("w0", "hello", 1.0, 1.4),
            TranscriptWord::new("w1", "world", 1.5, 1.9),
        ]);
        editor.set_current_time(1.6);
        let preview = editor.subtitle_preview(None).unwrap();
        assert!(preview.lines[0][1].active);

        editor.toggle_subtitle_overlays();
        assert!(editor.subtitle_preview(None).is_none());
    }

    #[test]
    fn test_export_and_hydrate_resets_history() {
        let mut editor = session();
        let exported = serde_json::to_value(editor.export_session_state()).unwrap();

        let mut restored = EditorSession::new(&EngineConfig::default(), 0.0);
        restored.hydrate_session_state(&exported);
        assert_eq!(restored.snapshot(), editor.snapshot());
        assert_eq!(restored.media_duration(), 60.0);
        assert!(!restored.can_undo());
    }

    #[test]
    fn test_transcript_selection_is_clamped() {
        let mut editor = session();
        assert!(!editor.set_transcript_selection(Some(WordRange { start: 0, end: 3 })));
        editor.set_words(vec![TranscriptWord::new("w0", "a", 0.0, 0.1), TranscriptWord::new("w1", "b", 0.1, 0.2)]);
        assert!(editor.set_transcript_selection(Some(WordRange { start: 5, end: 0 })));
        assert_eq!(editor.transcript_selection(), Some(WordRange { start: 0, end: 1 }));
    }
}
