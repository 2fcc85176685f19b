//! Item-level edit operations on the assembly.
//!
//! The functions here are pure: they take the current assembly and return the
//! edited one, or `None` when the edit is rejected (locked track, range too
//! short, nothing changed). Pointer gestures live in [`gesture`], wheel zoom in
//! [`zoom`].

pub mod gesture;
pub mod zoom;

use crate::assembly::assembly_span;
use crate::domain::model::*;
use crate::domain::rules::{RangeRules, TrackCompatibility};

/// Item geometry captured when a drag starts. Resizes are computed against it
/// so the source-per-timeline ratio does not drift while dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditOrigin {
    pub timeline_start: f64,
    pub timeline_end: f64,
    pub source_in: f64,
    pub source_out: f64,
}

impl EditOrigin {
    pub fn of(item: &AssemblyItem) -> Self {
        Self {
            timeline_start: item.timeline_start,
            timeline_end: item.timeline_end,
            source_in: item.source_in,
            source_out: item.source_out,
        }
    }

    pub fn length(&self) -> f64 {
        self.timeline_end - self.timeline_start
    }

    /// Source seconds per timeline second.
    pub fn ratio(&self) -> f64 {
        let length = self.length();
        let source = self.source_out - self.source_in;
        if length > 0.0 && source > 0.0 {
            source / length
        } else {
            1.0
        }
    }
}

/// Extent items may be moved within: the longer of the assembly itself and the
/// source media.
pub fn timeline_extent(state: &ClipAssemblyState, media_duration: f64) -> f64 {
    let media = if media_duration.is_finite() { media_duration } else { 0.0 };
    assembly_span(state).max(media)
}

/// Move an item to `new_start`, optionally onto another track.
///
/// The item keeps its length and is clamped to `[0, total_duration - length]`.
/// A target track that is locked or cannot hold the item's source is ignored
/// and the item stays on its own track. Items on locked tracks do not move.
pub fn move_item(
    state: &ClipAssemblyState,
    item_id: &str,
    new_start: f64,
    target_track_id: Option<&str>,
    total_duration: f64,
) -> Option<ClipAssemblyState> {
    let (track_index, item_index) = state.locate_item(item_id)?;
    let track = &state.tracks[track_index];
    if track.locked {
        return None;
    }
    let item = &track.items[item_index];
    let length = item.duration();
    let start = RangeRules::clamp_start(new_start, length, total_duration.max(length));

    let destination = target_track_id
        .and_then(|id| state.track_index(id))
        .filter(|&index| index != track_index)
        .filter(|&index| TrackCompatibility::can_place(&state.tracks[index], &item.source));

    if destination.is_none() && start == item.timeline_start {
        return None;
    }

    let mut next = state.clone();
    let mut moved = next.tracks[track_index].items.remove(item_index);
    moved.timeline_start = start;
    moved.timeline_end = start + length;
    match destination {
        Some(index) => next.tracks[index].items.push(moved),
        None => next.tracks[track_index].items.insert(item_index, moved),
    }
    Some(next)
}

/// Drag one edge of an item to `new_time`.
///
/// The dragged edge is clamped so the item keeps `MIN_ITEM_DURATION` and its
/// source never starts before 0. The matching source bound moves by the same
/// amount scaled by the drag-start ratio, so trimming the timeline trims the
/// corresponding stretch of source.
pub fn resize_item(
    state: &ClipAssemblyState,
    item_id: &str,
    edge: Edge,
    new_time: f64,
    origin: &EditOrigin,
) -> Option<ClipAssemblyState> {
    if !new_time.is_finite() {
        return None;
    }
    let (track_index, item_index) = state.locate_item(item_id)?;
    if state.tracks[track_index].locked {
        return None;
    }
    let ratio = origin.ratio();

    let mut next = state.clone();
    let item = &mut next.tracks[track_index].items[item_index];
    let before = (item.timeline_start, item.timeline_end, item.source_in, item.source_out);

    match edge {
        Edge::Start => {
            let upper = origin.timeline_end - MIN_ITEM_DURATION;
            let lower = (origin.timeline_start - origin.source_in.max(0.0) / ratio).max(0.0);
            let start = new_time.clamp(lower.min(upper), upper);
            item.timeline_start = start;
            item.timeline_end = origin.timeline_end;
            item.source_in = (origin.source_in + (start - origin.timeline_start) * ratio).max(0.0);
            item.source_out = origin.source_out;
        }
        Edge::End => {
            let end = new_time.max(origin.timeline_start + MIN_ITEM_DURATION);
            item.timeline_start = origin.timeline_start;
            item.timeline_end = end;
            item.source_in = origin.source_in;
            item.source_out = origin.source_out + (end - origin.timeline_end) * ratio;
        }
    }

    if item.source_out <= item.source_in {
        return None;
    }
    let after = (item.timeline_start, item.timeline_end, item.source_in, item.source_out);
    (after != before).then_some(next)
}

/// Set an item edge to the playhead, with the same clamping as a resize.
pub fn trim_item_to_playhead(
    state: &ClipAssemblyState,
    item_id: &str,
    edge: Edge,
    playhead: f64,
) -> Option<ClipAssemblyState> {
    let origin = EditOrigin::of(state.item(item_id)?);
    resize_item(state, item_id, edge, playhead, &origin)
}

/// Cut an item in two at `time`. Both halves keep at least
/// `MIN_ITEM_DURATION`; the source window is divided proportionally. The
/// right half becomes the active item and its id is returned.
pub fn split_item(state: &ClipAssemblyState, item_id: &str, time: f64) -> Option<(ClipAssemblyState, String)> {
    let (track_index, item_index) = state.locate_item(item_id)?;
    let track = &state.tracks[track_index];
    if track.locked {
        return None;
    }
    let original = &track.items[item_index];
    if !(time - original.timeline_start >= MIN_ITEM_DURATION && original.timeline_end - time >= MIN_ITEM_DURATION) {
        return None;
    }
    let source_cut = original.source_in + (time - original.timeline_start) * original.source_ratio();

    let mut left = original.clone();
    left.label = format!("{} · 1", original.label);
    left.timeline_end = time;
    left.source_out = source_cut;

    let mut right = original.clone();
    right.id = new_id("item");
    right.label = format!("{} · 2", original.label);
    right.timeline_start = time;
    right.source_in = source_cut;
    let right_id = right.id.clone();

    let mut next = state.clone();
    let items = &mut next.tracks[track_index].items;
    items[item_index] = left;
    items.insert(item_index + 1, right);
    next.active_track_id = Some(track.id.clone());
    next.active_item_id = Some(right_id.clone());
    Some((next, right_id))
}

/// Shift an item by `delta` seconds on its own track.
pub fn nudge_item(
    state: &ClipAssemblyState,
    item_id: &str,
    delta: f64,
    total_duration: f64,
) -> Option<ClipAssemblyState> {
    if !delta.is_finite() {
        return None;
    }
    let start = state.item(item_id)?.timeline_start;
    move_item(state, item_id, start + delta, None, total_duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{add_track, build_assembly_from_clips};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn single_item_state() -> (ClipAssemblyState, String) {
        let mut state = ClipAssemblyState::default();
        let mut item = AssemblyItem::new(
            "Take",
            ItemSource::Clip {
                clip_id: "c".to_string(),
            },
            2.0,
            20.0,
            28.0,
        );
        item.id = "take".to_string();
        state.tracks[0].items.push(item);
        (state, "take".to_string())
    }

    fn assert_item_invariants(item: &AssemblyItem) {
        assert!(item.duration() >= MIN_ITEM_DURATION - 1e-9);
        assert!(item.source_out > item.source_in);
    }

    #[test]
    fn test_split_divides_timeline_and_source() {
        let (state, id) = single_item_state();
        let (next, right_id) = split_item(&state, &id, 6.0).unwrap();
        let left = next.item(&id).unwrap();
        let right = next.item(&right_id).unwrap();

        assert_eq!((left.timeline_start, left.timeline_end), (2.0, 6.0));
        assert_eq!((left.source_in, left.source_out), (20.0, 24.0));
        assert_eq!((right.timeline_start, right.timeline_end), (6.0, 10.0));
        assert_eq!((right.source_in, right.source_out), (24.0, 28.0));
        assert_eq!(left.label, "Take · 1");
        assert_eq!(right.label, "Take · 2");
        assert_eq!(next.active_item_id.as_deref(), Some(right_id.as_str()));
    }

    #[test]
    fn test_split_respects_minimum_on_both_halves() {
        let (state, id) = single_item_state();
        assert!(split_item(&state, &id, 2.1).is_none());
        assert!(split_item(&state, &id, 9.9).is_none());
        assert!(split_item(&state, &id, 12.0).is_none());
    }

    #[test]
    fn test_split_with_stretched_source_is_proportional() {
        let (mut state, id) = single_item_state();
        state.item_mut(&id).unwrap().timeline_end = 6.0;
        let (next, right_id) = split_item(&state, &id, 3.0).unwrap();
        let left = next.item(&id).unwrap();
        let right = next.item(&right_id).unwrap();
        assert_eq!(left.source_out, right.source_in);
        assert!(approx(left.source_out, 22.0));
        assert_eq!(right.source_out, 28.0);
    }

    #[test]
    fn test_resize_start_trims_matching_source() {
        let (state, id) = single_item_state();
        let origin = EditOrigin::of(state.item(&id).unwrap());
        let next = resize_item(&state, &id, Edge::Start, 4.0, &origin).unwrap();
        let item = next.item(&id).unwrap();
        assert_eq!((item.timeline_start, item.timeline_end), (4.0, 10.0));
        assert_eq!((item.source_in, item.source_out), (22.0, 28.0));
    }

    #[test]
    fn test_resize_clamps_to_minimum_duration() {
        let (state, id) = single_item_state();
        let origin = EditOrigin::of(state.item(&id).unwrap());

        let next = resize_item(&state, &id, Edge::Start, 50.0, &origin).unwrap();
        let item = next.item(&id).unwrap();
        assert!(approx(item.duration(), MIN_ITEM_DURATION));
        assert_item_invariants(item);

        let next = resize_item(&state, &id, Edge::End, -5.0, &origin).unwrap();
        let item = next.item(&id).unwrap();
        assert!(approx(item.duration(), MIN_ITEM_DURATION));
        assert!(approx(item.source_out, 20.0 + MIN_ITEM_DURATION));
        assert_item_invariants(item);
    }

    #[test]
    fn test_resize_start_stops_at_zero() {
        let (state, id) = single_item_state();
        let origin = EditOrigin::of(state.item(&id).unwrap());
        let next = resize_item(&state, &id, Edge::Start, -10.0, &origin).unwrap();
        let item = next.item(&id).unwrap();
        assert_eq!(item.timeline_start, 0.0);
        assert_eq!(item.source_in, 18.0);
    }

    #[test]
    fn test_resize_start_stops_at_source_zero() {
        let (mut state, id) = single_item_state();
        {
            let item = state.item_mut(&id).unwrap();
            item.source_in = 1.0;
            item.source_out = 9.0;
        }
        let origin = EditOrigin::of(state.item(&id).unwrap());
        let next = resize_item(&state, &id, Edge::Start, 0.0, &origin).unwrap();
        let item = next.item(&id).unwrap();
        assert_eq!(item.timeline_start, 1.0);
        assert_eq!(item.source_in, 0.0);
    }

    #[test]
    fn test_trim_to_playhead() {
        let (state, id) = single_item_state();
        let next = trim_item_to_playhead(&state, &id, Edge::End, 7.5).unwrap();
        let item = next.item(&id).unwrap();
        assert_eq!((item.timeline_end, item.source_out), (7.5, 25.5));
        assert!(trim_item_to_playhead(&next, &id, Edge::End, 7.5).is_none());
    }

    #[test]
    fn test_move_clamps_into_timeline() {
        let (state, id) = single_item_state();
        let next = move_item(&state, &id, -3.0, None, 20.0).unwrap();
        assert_eq!(next.item(&id).unwrap().timeline_start, 0.0);

        let next = move_item(&state, &id, 19.0, None, 20.0).unwrap();
        let item = next.item(&id).unwrap();
        assert_eq!((item.timeline_start, item.timeline_end), (12.0, 20.0));
    }

    #[test]
    fn test_move_onto_incompatible_or_locked_track_stays_put() {
        let (state, id) = single_item_state();
        let audio = state.tracks[1].id.clone();
        let original_track = state.tracks[0].id.clone();

        let next = move_item(&state, &id, 4.0, Some(&audio), 30.0).unwrap();
        assert_eq!(next.track_of_item(&id).unwrap().id, original_track);

        let (mut state, other_video) = add_track(&state, TrackKind::Video);
        state.track_mut(&other_video).unwrap().locked = true;
        let next = move_item(&state, &id, 4.0, Some(&other_video), 30.0).unwrap();
        assert_eq!(next.track_of_item(&id).unwrap().id, original_track);
    }

    #[test]
    fn test_move_to_compatible_track() {
        let (state, id) = single_item_state();
        let (state, other_video) = add_track(&state, TrackKind::Video);
        let next = move_item(&state, &id, 2.0, Some(&other_video), 30.0).unwrap();
        assert_eq!(next.track_of_item(&id).unwrap().id, other_video);
    }

    #[test]
    fn test_locked_track_rejects_item_edits() {
        let (mut state, id) = single_item_state();
        state.tracks[0].locked = true;
        let origin = EditOrigin::of(state.item(&id).unwrap());
        assert!(move_item(&state, &id, 5.0, None, 30.0).is_none());
        assert!(resize_item(&state, &id, Edge::End, 9.0, &origin).is_none());
        assert!(split_item(&state, &id, 6.0).is_none());
        assert!(nudge_item(&state, &id, 0.1, 30.0).is_none());
    }

    #[test]
    fn test_nudge_is_bounded() {
        let (state, id) = single_item_state();
        let next = nudge_item(&state, &id, 0.5, 30.0).unwrap();
        assert_eq!(next.item(&id).unwrap().timeline_start, 2.5);

        let next = nudge_item(&state, &id, -10.0, 30.0).unwrap();
        assert_eq!(next.item(&id).unwrap().timeline_start, 0.0);
        assert!(nudge_item(&next, &id, -0.1, 30.0).is_none());
    }

    #[test]
    fn test_timeline_extent_covers_media_and_assembly() {
        let clips = vec![ClipSegment::new("a", "A", 0.0, 5.0)];
        let state = build_assembly_from_clips(&clips);
        assert_eq!(timeline_extent(&state, 60.0), 60.0);
        assert_eq!(timeline_extent(&state, 1.0), 5.0);
        assert_eq!(timeline_extent(&state, f64::NAN), 5.0);
    }
}
