//! Assembly time ↔ source time mapping and playback resolution.

use crate::domain::model::*;

/// How an item relates to the queried assembly time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// The item plays at the queried time.
    Covering,
    /// Nothing plays at the queried time; this is the next item to start.
    Upcoming,
}

/// The item that playback should show at an assembly time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved<'a> {
    pub track_index: usize,
    pub track: &'a AssemblyTrack,
    pub item: &'a AssemblyItem,
    pub coverage: Coverage,
}

/// Resolve the active item at `time` over all visible tracks.
///
/// Lower track indices take precedence; ties go to the earliest
/// `timeline_start`. When no item covers `time`, the next item starting at or
/// after it is returned as [`Coverage::Upcoming`].
pub fn resolve_at(state: &ClipAssemblyState, time: f64) -> Option<Resolved<'_>> {
    resolve_filtered(state, time, |_| true)
}

/// Same as [`resolve_at`] restricted to one track kind.
pub fn resolve_at_kind(state: &ClipAssemblyState, time: f64, kind: TrackKind) -> Option<Resolved<'_>> {
    resolve_filtered(state, time, |track| track.kind == kind)
}

fn resolve_filtered<'a>(
    state: &'a ClipAssemblyState,
    time: f64,
    accept: impl Fn(&AssemblyTrack) -> bool,
) -> Option<Resolved<'a>> {
    if !time.is_finite() {
        return None;
    }
    let candidates: Vec<(usize, &AssemblyTrack, &AssemblyItem)> = state
        .tracks
        .iter()
        .enumerate()
        .filter(|(_, track)| !track.hidden && accept(*track))
        .flat_map(|(index, track)| track.items.iter().map(move |item| (index, track, item)))
        .collect();

    let covering = candidates
        .iter()
        .copied()
        .filter(|(_, _, item)| item.covers(time))
        .min_by(|a, b| {
            a.0.cmp(&b.0)
                .then(a.2.timeline_start.total_cmp(&b.2.timeline_start))
        })
        .map(|entry| (entry, Coverage::Covering));

    let resolved = covering.or_else(|| {
        candidates
            .iter()
            .copied()
            .filter(|(_, _, item)| item.timeline_start >= time)
            .min_by(|a, b| {
                a.2.timeline_start
                    .total_cmp(&b.2.timeline_start)
                    .then(a.0.cmp(&b.0))
            })
            .map(|entry| (entry, Coverage::Upcoming))
    })?;

    let ((track_index, track, item), coverage) = resolved;
    Some(Resolved {
        track_index,
        track,
        item,
        coverage,
    })
}

/// Source window an item may read from: its own window, narrowed to the
/// clip's range for clip-backed items when the two overlap.
fn source_bounds(item: &AssemblyItem, clips: &[ClipSegment]) -> (f64, f64) {
    let own = (item.source_in, item.source_out);
    let Some(clip_id) = item.source.clip_id() else {
        return own;
    };
    match clips.iter().find(|clip| clip.id == clip_id) {
        Some(clip) => {
            let lo = own.0.max(clip.start);
            let hi = own.1.min(clip.end);
            if lo < hi {
                (lo, hi)
            } else {
                own
            }
        }
        None => own,
    }
}

/// Map an assembly time inside `item` to the source time it plays.
pub fn map_assembly_to_source(item: &AssemblyItem, time: f64, clips: &[ClipSegment]) -> f64 {
    let duration = item.duration();
    let progress = if duration > 0.0 {
        (time - item.timeline_start) / duration
    } else {
        0.0
    };
    let source = item.source_in + progress * item.source_duration();
    let (lo, hi) = source_bounds(item, clips);
    source.clamp(lo, hi)
}

/// Map a source playback position back onto the assembly timeline.
pub fn map_source_to_assembly(item: &AssemblyItem, source_time: f64) -> f64 {
    let source_duration = item.source_duration();
    let progress = if source_duration > 0.0 {
        (source_time - item.source_in) / source_duration
    } else {
        0.0
    };
    let time = item.timeline_start + progress * item.duration();
    time.clamp(item.timeline_start, item.timeline_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn layered_state() -> ClipAssemblyState {
        let clips = vec![
            ClipSegment::new("a", "A", 0.0, 5.0),
            ClipSegment::new("b", "B", 5.0, 9.0),
        ];
        let state = assembly::build_assembly_from_clips(&clips);
        let (mut state, overlay_track) = assembly::add_track(&state, TrackKind::Video);
        let mut overlay = AssemblyItem::new(
            "Overlay",
            ItemSource::VideoFile {
                path: "logo.mov".to_string(),
            },
            3.0,
            0.0,
            3.0,
        );
        overlay.id = "overlay".to_string();
        state.track_mut(&overlay_track).unwrap().items.push(overlay);
        state
    }

    #[test]
    fn test_lowest_track_index_wins() {
        let state = layered_state();
        let resolved = resolve_at(&state, 4.0).unwrap();
        assert_eq!(resolved.item.id, "overlay");
        assert_eq!(resolved.track_index, 0);
        assert_eq!(resolved.coverage, Coverage::Covering);

        let resolved = resolve_at(&state, 6.5).unwrap();
        assert_eq!(resolved.item.source.clip_id(), Some("b"));
    }

    #[test]
    fn test_hidden_tracks_are_skipped() {
        let mut state = layered_state();
        state.tracks[0].hidden = true;
        let resolved = resolve_at(&state, 4.0).unwrap();
        assert_eq!(resolved.item.source.clip_id(), Some("a"));
    }

    #[test]
    fn test_gap_resolves_to_next_item() {
        let mut state = layered_state();
        state.tracks[1].items[1].timeline_start = 12.0;
        state.tracks[1].items[1].timeline_end = 16.0;
        let resolved = resolve_at(&state, 9.5).unwrap();
        assert_eq!(resolved.coverage, Coverage::Upcoming);
        assert_eq!(resolved.item.timeline_start, 12.0);

        assert!(resolve_at(&state, 20.0).is_none());
    }

    #[test]
    fn test_resolve_by_kind() {
        let state = layered_state();
        assert!(resolve_at_kind(&state, 1.0, TrackKind::Audio).is_none());
        assert!(resolve_at_kind(&state, 1.0, TrackKind::Video).is_some());
    }

    #[test]
    fn test_mapping_round_trip() {
        let mut item = AssemblyItem::new(
            "Slow",
            ItemSource::VideoFile {
                path: "x.mp4".to_string(),
            },
            2.0,
            20.0,
            28.0,
        );
        item.timeline_end = 6.0;

        let source = map_assembly_to_source(&item, 4.0, &[]);
        assert!(approx(source, 24.0));
        assert!(approx(map_source_to_assembly(&item, source), 4.0));
        assert_eq!(map_assembly_to_source(&item, 100.0, &[]), 28.0);
        assert_eq!(map_source_to_assembly(&item, 0.0), 2.0);
    }

    #[test]
    fn test_mapping_clamps_to_clip_bounds() {
        let clips = vec![ClipSegment::new("a", "A", 10.0, 14.0)];
        let mut item = AssemblyItem::new(
            "A",
            ItemSource::Clip {
                clip_id: "a".to_string(),
            },
            0.0,
            8.0,
            16.0,
        );
        item.timeline_end = 8.0;
        assert_eq!(map_assembly_to_source(&item, 0.0, &clips), 10.0);
        assert_eq!(map_assembly_to_source(&item, 7.9, &clips), 14.0);
        assert!(approx(map_assembly_to_source(&item, 4.0, &clips), 12.0));
    }
}
