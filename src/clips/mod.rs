//! Clip store: named source ranges and the edits that act on them.
//!
//! Every function takes the current snapshot and returns a new one, or `None`
//! when the edit does not apply (unknown id, range too short, nothing moved).
//! Callers hand the result to [`crate::history::TimelineHistory::record`].

use tracing::debug;

use crate::assembly;
use crate::domain::model::*;
use crate::domain::rules::RangeRules;

/// Mark a new clip on the source. Returns the snapshot and the new clip id.
pub fn add_clip(
    snapshot: &TimelineSnapshot,
    title: Option<&str>,
    start: f64,
    end: f64,
    source_duration: f64,
) -> Option<(TimelineSnapshot, String)> {
    let (start, end) = RangeRules::fit_clip_range(start, end, source_duration)?;
    let mut next = snapshot.clone();
    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Clip {}", next.clips.len() + 1));
    let clip = ClipSegment::new(new_id("clip"), title, start, end);
    let id = clip.id.clone();

    let position = next
        .clips
        .iter()
        .position(|c| (c.start, c.end) > (start, end))
        .unwrap_or(next.clips.len());
    next.clips.insert(position, clip);
    next.active_clip_id = Some(id.clone());
    Some((next, id))
}

pub fn rename_clip(snapshot: &TimelineSnapshot, clip_id: &str, title: &str) -> Option<TimelineSnapshot> {
    let title = title.trim();
    if title.is_empty() {
        return None;
    }
    let mut next = snapshot.clone();
    let clip = next.clips.iter_mut().find(|c| c.id == clip_id)?;
    if clip.title == title {
        return None;
    }
    clip.title = title.to_string();
    Some(next)
}

/// Move one edge of a clip to `time`, keeping `MIN_CLIP_DURATION` and the
/// source bounds.
pub fn trim_clip(
    snapshot: &TimelineSnapshot,
    clip_id: &str,
    edge: Edge,
    time: f64,
    source_duration: f64,
) -> Option<TimelineSnapshot> {
    if !time.is_finite() {
        return None;
    }
    let mut next = snapshot.clone();
    let clip = next.clips.iter_mut().find(|c| c.id == clip_id)?;
    match edge {
        Edge::Start => {
            let upper = clip.end - MIN_CLIP_DURATION;
            let start = time.clamp(0.0, upper.max(0.0));
            if start == clip.start {
                return None;
            }
            clip.start = start;
        }
        Edge::End => {
            let lower = clip.start + MIN_CLIP_DURATION;
            let end = time.clamp(lower, source_duration.max(lower));
            if end == clip.end {
                return None;
            }
            clip.end = end;
        }
    }
    Some(next)
}

/// Cut a clip in two at `time`. The right half becomes the active clip and its
/// id is returned. Both halves inherit the clip's export draft.
pub fn split_clip(
    snapshot: &TimelineSnapshot,
    clip_id: &str,
    time: f64,
) -> Option<(TimelineSnapshot, String)> {
    let index = snapshot.clips.iter().position(|c| c.id == clip_id)?;
    let original = &snapshot.clips[index];
    if !(time - original.start >= MIN_CLIP_DURATION && original.end - time >= MIN_CLIP_DURATION) {
        return None;
    }

    let mut next = snapshot.clone();
    let mut right = original.clone();
    right.id = new_id("clip");
    right.title = format!("{} · 2", original.title);
    right.start = time;

    let left = &mut next.clips[index];
    left.title = format!("{} · 1", original.title);
    left.end = time;

    if let Some(draft) = next.clip_drafts.get(clip_id).cloned() {
        next.clip_drafts.insert(right.id.clone(), draft);
    }
    let right_id = right.id.clone();
    next.clips.insert(index + 1, right);
    next.active_clip_id = Some(right_id.clone());
    Some((next, right_id))
}

/// Shift a clip by `delta` seconds without changing its length.
pub fn nudge_clip(
    snapshot: &TimelineSnapshot,
    clip_id: &str,
    delta: f64,
    source_duration: f64,
) -> Option<TimelineSnapshot> {
    if !delta.is_finite() || delta == 0.0 {
        return None;
    }
    let mut next = snapshot.clone();
    let clip = next.clips.iter_mut().find(|c| c.id == clip_id)?;
    let length = clip.duration();
    let start = RangeRules::clamp_start(clip.start + delta, length, source_duration);
    if start == clip.start {
        return None;
    }
    clip.start = start;
    clip.end = start + length;
    Some(next)
}

/// Remove a clip together with every assembly item that places it.
pub fn remove_clip(snapshot: &TimelineSnapshot, clip_id: &str) -> Option<TimelineSnapshot> {
    let index = snapshot.clips.iter().position(|c| c.id == clip_id)?;
    let mut next = snapshot.clone();
    next.clips.remove(index);
    detach_clip(&mut next, clip_id, index);
    Some(next)
}

/// Remove a clip and close the gap it leaves: every clip starting at or after
/// the removed clip's end moves earlier by the removed duration, never below 0.
pub fn ripple_delete_clip(snapshot: &TimelineSnapshot, clip_id: &str) -> Option<TimelineSnapshot> {
    let index = snapshot.clips.iter().position(|c| c.id == clip_id)?;
    let mut next = snapshot.clone();
    let removed = next.clips.remove(index);
    let shift = removed.duration();

    for clip in next.clips.iter_mut().filter(|c| c.start >= removed.end) {
        let length = clip.duration();
        clip.start = (clip.start - shift).max(0.0);
        clip.end = clip.start + length;
    }
    detach_clip(&mut next, clip_id, index);
    debug!(clip_id, shift, "Ripple delete");
    Some(next)
}

pub fn set_active_clip(snapshot: &TimelineSnapshot, clip_id: Option<&str>) -> Option<TimelineSnapshot> {
    if let Some(id) = clip_id {
        snapshot.clip(id)?;
    }
    if snapshot.active_clip_id.as_deref() == clip_id {
        return None;
    }
    let mut next = snapshot.clone();
    next.active_clip_id = clip_id.map(str::to_string);
    Some(next)
}

/// Attach an export draft to a clip. Drafts for unknown clips are rejected.
pub fn set_clip_draft(
    snapshot: &TimelineSnapshot,
    clip_id: &str,
    draft: ExportDraft,
) -> Option<TimelineSnapshot> {
    snapshot.clip(clip_id)?;
    let mut next = snapshot.clone();
    next.clip_drafts.insert(clip_id.to_string(), draft);
    Some(next)
}

/// Drop everything that refers to a removed clip and move the clip selection
/// to its neighbour.
fn detach_clip(snapshot: &mut TimelineSnapshot, clip_id: &str, index: usize) {
    snapshot.clip_drafts.remove(clip_id);
    let removed_items = assembly::strip_clip_items(&mut snapshot.assembly, clip_id);
    if removed_items > 0 {
        debug!(clip_id, removed_items, "Removed placements of deleted clip");
    }
    if snapshot.active_clip_id.as_deref() == Some(clip_id) {
        snapshot.active_clip_id = snapshot
            .clips
            .get(index)
            .or_else(|| snapshot.clips.last())
            .map(|c| c.id.clone());
    }
}
