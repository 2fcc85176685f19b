// Domain rules - Placement policy and range clamping

use crate::domain::model::*;

/// Which sources a track kind accepts.
pub struct TrackCompatibility;

impl TrackCompatibility {
    pub fn accepts(kind: TrackKind, source: &ItemSource) -> bool {
        match (kind, source) {
            (TrackKind::Video, ItemSource::Clip { .. }) => true,
            (TrackKind::Video, ItemSource::VideoFile { .. }) => true,
            (TrackKind::Video, ItemSource::AudioFile { .. }) => false,
            (TrackKind::Audio, ItemSource::AudioFile { .. }) => true,
            (TrackKind::Audio, ItemSource::Clip { .. }) => false,
            (TrackKind::Audio, ItemSource::VideoFile { .. }) => false,
        }
    }

    /// Track kind a source naturally lands on.
    pub fn home_kind(source: &ItemSource) -> TrackKind {
        match source {
            ItemSource::Clip { .. } | ItemSource::VideoFile { .. } => TrackKind::Video,
            ItemSource::AudioFile { .. } => TrackKind::Audio,
        }
    }

    /// A track can receive an item when it is unlocked and kind-compatible.
    pub fn can_place(track: &AssemblyTrack, source: &ItemSource) -> bool {
        !track.locked && Self::accepts(track.kind, source)
    }
}

/// Range clamping shared by clip and item edits.
pub struct RangeRules;

impl RangeRules {
    /// Clamp a zoom factor; non-finite input keeps `current`.
    pub fn clamp_zoom(next: f64, current: f64) -> f64 {
        if next.is_finite() {
            next.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            current.clamp(MIN_ZOOM, MAX_ZOOM)
        }
    }

    pub fn clamp_volume(volume: f64) -> f64 {
        if volume.is_finite() {
            volume.clamp(0.0, MAX_ITEM_VOLUME)
        } else {
            1.0
        }
    }

    pub fn clamp_opacity(opacity: f64) -> f64 {
        if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Keep a moved item of `length` inside `[0, total_duration - length]`.
    pub fn clamp_start(start: f64, length: f64, total_duration: f64) -> f64 {
        let upper = (total_duration - length).max(0.0);
        if start.is_finite() {
            start.clamp(0.0, upper)
        } else {
            0.0
        }
    }

    /// Fit a clip range into `[0, source_duration]` with at least
    /// `MIN_CLIP_DURATION` of length. Returns `None` when the source itself is
    /// too short to hold a clip.
    pub fn fit_clip_range(start: f64, end: f64, source_duration: f64) -> Option<(f64, f64)> {
        if !start.is_finite() || !end.is_finite() || source_duration < MIN_CLIP_DURATION {
            return None;
        }
        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
        let mut start = lo.clamp(0.0, source_duration);
        let mut end = hi.clamp(0.0, source_duration);
        if end - start < MIN_CLIP_DURATION {
            end = (start + MIN_CLIP_DURATION).min(source_duration);
            start = end - MIN_CLIP_DURATION;
        }
        Some((start, end))
    }
}
