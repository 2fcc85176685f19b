//! Pointer gestures over assembly items.
//!
//! Each gesture is captured under the pointer id that started it, so two
//! overlapping gestures never see each other's events. While a pointer is
//! down, movement is only *recorded*; the caller applies it once per animation
//! frame through [`GestureController::flush_frame`], which pushes a live
//! (non-recorded) update into the history. Releasing the pointer commits the
//! whole gesture as a single recorded step; cancelling puts the item back
//! exactly where it was.

use std::collections::BTreeMap;

use tracing::debug;

use crate::assembly;
use crate::domain::model::*;
use crate::domain::rules::TrackCompatibility;
use crate::edit::{move_item, resize_item, EditOrigin};
use crate::history::TimelineHistory;

pub type PointerId = u64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Vertical extent of one track row in the timeline view.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRow {
    pub track_id: String,
    pub top: f64,
    pub bottom: f64,
}

/// Track rows as currently laid out on screen, top to bottom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackLayout {
    pub rows: Vec<TrackRow>,
}

impl TrackLayout {
    /// Stack rows of equal height in track order, starting at `top`.
    pub fn uniform(state: &ClipAssemblyState, top: f64, row_height: f64) -> Self {
        let rows = state
            .tracks
            .iter()
            .enumerate()
            .map(|(index, track)| TrackRow {
                track_id: track.id.clone(),
                top: top + index as f64 * row_height,
                bottom: top + (index + 1) as f64 * row_height,
            })
            .collect();
        Self { rows }
    }

    pub fn row_at(&self, y: f64) -> Option<&TrackRow> {
        self.rows.iter().find(|row| row.top <= y && y < row.bottom)
    }

    /// Top edge of the highest video row.
    fn top_video_edge(&self, state: &ClipAssemblyState) -> Option<f64> {
        self.rows
            .iter()
            .filter(|row| {
                state
                    .track(&row.track_id)
                    .is_some_and(|track| track.kind == TrackKind::Video)
            })
            .map(|row| row.top)
            .reduce(f64::min)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Move,
    Resize(Edge),
}

/// What a move gesture currently points at.
#[derive(Debug, Clone, PartialEq)]
pub struct MovePreview {
    pub start: f64,
    pub target_track_id: String,
    /// Pointer is above the topmost video track: releasing creates a new
    /// video track there.
    pub create_track_above: bool,
}

/// Result of releasing a pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// The item changed and one recorded step was committed.
    Committed { item_id: String },
    /// A new video track was created and the item moved onto it.
    CommittedOnNewTrack { item_id: String, track_id: String },
    /// The pointer went down and up without changing anything.
    Selected { item_id: String },
    /// No gesture is captured under this pointer.
    Ignored,
}

#[derive(Debug, Clone)]
struct Gesture {
    kind: GestureKind,
    item_id: String,
    origin_item: AssemblyItem,
    origin_track_id: String,
    origin_index: usize,
    origin: EditOrigin,
    anchor: PointerPosition,
    pixels_per_second: f64,
    total_duration: f64,
    pending: Option<PointerPosition>,
    preview: Option<MovePreview>,
}

impl Gesture {
    fn time_delta(&self, at: PointerPosition) -> f64 {
        (at.x - self.anchor.x) / self.pixels_per_second
    }
}

/// Tracks in-flight pointer gestures and turns them into history updates.
#[derive(Debug, Default)]
pub struct GestureController {
    gestures: BTreeMap<PointerId, Gesture>,
    frame_requested: bool,
}

impl GestureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, pointer: PointerId) -> bool {
        self.gestures.contains_key(&pointer)
    }

    pub fn active_count(&self) -> usize {
        self.gestures.len()
    }

    pub fn preview(&self, pointer: PointerId) -> Option<&MovePreview> {
        self.gestures.get(&pointer)?.preview.as_ref()
    }

    /// Start dragging an item body. Items on locked tracks cannot be grabbed.
    pub fn begin_move(
        &mut self,
        history: &TimelineHistory,
        pointer: PointerId,
        item_id: &str,
        at: PointerPosition,
        total_duration: f64,
    ) -> bool {
        self.begin(history, pointer, GestureKind::Move, item_id, at, total_duration)
    }

    /// Start dragging one of an item's edge handles.
    pub fn begin_resize(
        &mut self,
        history: &TimelineHistory,
        pointer: PointerId,
        item_id: &str,
        edge: Edge,
        at: PointerPosition,
    ) -> bool {
        self.begin(history, pointer, GestureKind::Resize(edge), item_id, at, f64::INFINITY)
    }

    fn begin(
        &mut self,
        history: &TimelineHistory,
        pointer: PointerId,
        kind: GestureKind,
        item_id: &str,
        at: PointerPosition,
        total_duration: f64,
    ) -> bool {
        if self.gestures.contains_key(&pointer) {
            return false;
        }
        let state = &history.present().assembly;
        let Some((track_index, item_index)) = state.locate_item(item_id) else {
            return false;
        };
        let track = &state.tracks[track_index];
        if track.locked {
            return false;
        }
        let item = &track.items[item_index];
        let gesture = Gesture {
            kind,
            item_id: item_id.to_string(),
            origin_item: item.clone(),
            origin_track_id: track.id.clone(),
            origin_index: item_index,
            origin: EditOrigin::of(item),
            anchor: at,
            pixels_per_second: BASE_PIXELS_PER_SECOND * state.zoom,
            total_duration,
            pending: None,
            preview: None,
        };
        debug!(pointer, item_id, ?kind, "Gesture started");
        self.gestures.insert(pointer, gesture);
        true
    }

    /// Remember the latest position for `pointer`. Returns true when the
    /// caller should request an animation frame.
    pub fn pointer_move(&mut self, pointer: PointerId, at: PointerPosition) -> bool {
        let Some(gesture) = self.gestures.get_mut(&pointer) else {
            return false;
        };
        gesture.pending = Some(at);
        let request = !self.frame_requested;
        self.frame_requested = true;
        request
    }

    /// Apply pending movement: at most one live update per gesture, however
    /// many pointer events arrived since the previous frame. Returns how many
    /// gestures were updated.
    pub fn flush_frame(&mut self, history: &mut TimelineHistory, layout: &TrackLayout) -> usize {
        self.frame_requested = false;
        let mut applied = 0;
        for gesture in self.gestures.values_mut() {
            if let Some(at) = gesture.pending.take() {
                if apply_live(gesture, history, layout, at) {
                    applied += 1;
                }
            }
        }
        applied
    }

    /// Finish the gesture captured under `pointer`.
    pub fn pointer_up(
        &mut self,
        history: &mut TimelineHistory,
        pointer: PointerId,
        layout: &TrackLayout,
    ) -> GestureOutcome {
        let Some(mut gesture) = self.gestures.remove(&pointer) else {
            return GestureOutcome::Ignored;
        };
        if let Some(at) = gesture.pending.take() {
            apply_live(&mut gesture, history, layout, at);
        }

        let mut committed = history.present().clone();
        let create_track = gesture
            .preview
            .as_ref()
            .is_some_and(|preview| preview.create_track_above);
        let mut new_track = None;
        if create_track {
            let (with_track, track_id) = assembly::add_track(&committed.assembly, TrackKind::Video);
            let start = committed
                .assembly
                .item(&gesture.item_id)
                .map(|item| item.timeline_start)
                .unwrap_or(gesture.origin.timeline_start);
            if let Some(moved) = move_item(
                &with_track,
                &gesture.item_id,
                start,
                Some(&track_id),
                gesture.total_duration,
            ) {
                committed.assembly = moved;
                new_track = Some(track_id);
            }
        }

        let changed = new_track.is_some()
            || match committed.assembly.locate_item(&gesture.item_id) {
                Some((track_index, item_index)) => {
                    let track = &committed.assembly.tracks[track_index];
                    track.id != gesture.origin_track_id
                        || EditOrigin::of(&track.items[item_index]) != gesture.origin
                }
                None => false,
            };

        history.update(|snapshot| revert_item(snapshot, &gesture), false);

        if !changed {
            let track_id = gesture.origin_track_id.clone();
            let item_id = gesture.item_id.clone();
            history.update(
                |mut snapshot| {
                    if let Some(selected) = assembly::select(&snapshot.assembly, Some(&track_id), Some(&item_id)) {
                        snapshot.assembly = selected;
                    }
                    snapshot
                },
                false,
            );
            debug!(pointer, item_id = %gesture.item_id, "Gesture ended as selection");
            return GestureOutcome::Selected {
                item_id: gesture.item_id,
            };
        }

        if let Some(track) = committed.assembly.track_of_item(&gesture.item_id) {
            committed.assembly.active_track_id = Some(track.id.clone());
        }
        committed.assembly.active_item_id = Some(gesture.item_id.clone());
        history.record(|_| committed);
        debug!(pointer, item_id = %gesture.item_id, revision = history.revision(), "Gesture committed");

        match new_track {
            Some(track_id) => GestureOutcome::CommittedOnNewTrack {
                item_id: gesture.item_id,
                track_id,
            },
            None => GestureOutcome::Committed {
                item_id: gesture.item_id,
            },
        }
    }

    /// Abandon the gesture under `pointer` and put its item back exactly as it
    /// was when the pointer went down. Nothing is recorded.
    pub fn pointer_cancel(&mut self, history: &mut TimelineHistory, pointer: PointerId) -> bool {
        let Some(gesture) = self.gestures.remove(&pointer) else {
            return false;
        };
        history.update(|snapshot| revert_item(snapshot, &gesture), false);
        debug!(pointer, item_id = %gesture.item_id, "Gesture cancelled");
        true
    }
}

/// Push one live update for `gesture` at pointer position `at`.
fn apply_live(gesture: &mut Gesture, history: &mut TimelineHistory, layout: &TrackLayout, at: PointerPosition) -> bool {
    let delta = gesture.time_delta(at);
    let state = &history.present().assembly;

    let next = match gesture.kind {
        GestureKind::Move => {
            let preview = move_preview(gesture, state, layout, at, delta);
            let next = move_item(
                state,
                &gesture.item_id,
                preview.start,
                Some(&preview.target_track_id),
                gesture.total_duration,
            );
            gesture.preview = Some(preview);
            next
        }
        GestureKind::Resize(edge) => {
            let time = match edge {
                Edge::Start => gesture.origin.timeline_start + delta,
                Edge::End => gesture.origin.timeline_end + delta,
            };
            resize_item(state, &gesture.item_id, edge, time, &gesture.origin)
        }
    };

    match next {
        Some(assembly) => {
            history.update(
                |mut snapshot| {
                    snapshot.assembly = assembly;
                    snapshot
                },
                false,
            );
            true
        }
        None => false,
    }
}

/// Work out where a move gesture is pointing: the start time and the track
/// under the pointer, falling back to the original track when the row under
/// the pointer cannot take the item.
fn move_preview(
    gesture: &Gesture,
    state: &ClipAssemblyState,
    layout: &TrackLayout,
    at: PointerPosition,
    delta: f64,
) -> MovePreview {
    let source = &gesture.origin_item.source;
    let target_track_id = layout
        .row_at(at.y)
        .and_then(|row| state.track(&row.track_id))
        .filter(|track| TrackCompatibility::can_place(track, source))
        .map(|track| track.id.clone())
        .unwrap_or_else(|| gesture.origin_track_id.clone());

    let create_track_above = source.is_visual()
        && layout
            .top_video_edge(state)
            .is_some_and(|top| at.y < top);

    MovePreview {
        start: gesture.origin.timeline_start + delta,
        target_track_id,
        create_track_above,
    }
}

/// Put the gesture's item back on its original track, at its original index,
/// with its original geometry. Everything else in the snapshot is untouched.
fn revert_item(mut snapshot: TimelineSnapshot, gesture: &Gesture) -> TimelineSnapshot {
    let state = &mut snapshot.assembly;
    if let Some((track_index, item_index)) = state.locate_item(&gesture.item_id) {
        state.tracks[track_index].items.remove(item_index);
    }
    if let Some(track) = state.track_mut(&gesture.origin_track_id) {
        let index = gesture.origin_index.min(track.items.len());
        track.items.insert(index, gesture.origin_item.clone());
    }
    snapshot
}
