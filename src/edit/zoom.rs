//! Timeline zoom with pointer anchoring and debounced history commits.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::domain::model::*;
use crate::domain::rules::RangeRules;
use crate::history::TimelineHistory;

/// Default idle window before a wheel burst is committed.
pub const DEFAULT_ZOOM_DEBOUNCE: Duration = Duration::from_millis(250);

const WHEEL_SENSITIVITY: f64 = 0.0015;

/// Set the zoom, clamped to `[MIN_ZOOM, MAX_ZOOM]`. Returns `None` when the
/// clamped value equals the current one.
pub fn set_zoom(state: &ClipAssemblyState, next: f64) -> Option<ClipAssemblyState> {
    let zoom = RangeRules::clamp_zoom(next, state.zoom);
    if zoom == state.zoom {
        return None;
    }
    let mut updated = state.clone();
    updated.zoom = zoom;
    Some(updated)
}

/// Multiplicative zoom factor for one wheel event. Scrolling up zooms in.
pub fn wheel_zoom_factor(delta_y: f64) -> f64 {
    if delta_y.is_finite() {
        (-delta_y * WHEEL_SENSITIVITY).exp()
    } else {
        1.0
    }
}

/// Scroll offset that keeps the time under `pointer_x` fixed on screen when
/// the zoom changes from `old_zoom` to `new_zoom`. `pointer_x` is relative to
/// the left edge of the viewport.
pub fn anchor_scroll(pointer_x: f64, scroll_left: f64, old_zoom: f64, new_zoom: f64) -> f64 {
    let old_pps = BASE_PIXELS_PER_SECOND * old_zoom;
    let new_pps = BASE_PIXELS_PER_SECOND * new_zoom;
    if old_pps <= 0.0 || !old_pps.is_finite() || !new_pps.is_finite() {
        return scroll_left.max(0.0);
    }
    let anchored_time = (scroll_left + pointer_x) / old_pps;
    (anchored_time * new_pps - pointer_x).max(0.0)
}

/// Result of one wheel event: the zoom now shown and where to scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomAnchor {
    pub zoom: f64,
    pub scroll_left: f64,
}

#[derive(Debug, Clone, Copy)]
struct PendingZoom {
    origin_zoom: f64,
    deadline: Instant,
}

/// Applies wheel zoom live and commits a burst as one undoable step once the
/// wheel has been idle for the debounce window.
#[derive(Debug, Clone)]
pub struct ZoomController {
    debounce: Duration,
    pending: Option<PendingZoom>,
}

impl Default for ZoomController {
    fn default() -> Self {
        Self::new(DEFAULT_ZOOM_DEBOUNCE)
    }
}

impl ZoomController {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending burst becomes due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|pending| pending.deadline)
    }

    /// Handle one wheel event at `pointer_x`.
    pub fn wheel(
        &mut self,
        history: &mut TimelineHistory,
        delta_y: f64,
        pointer_x: f64,
        scroll_left: f64,
        now: Instant,
    ) -> ZoomAnchor {
        let current = history.present().assembly.zoom;
        let zoom = self.set_zoom_live(history, current * wheel_zoom_factor(delta_y), now);
        ZoomAnchor {
            zoom,
            scroll_left: anchor_scroll(pointer_x, scroll_left, current, zoom),
        }
    }

    /// Apply `next` without recording and push the commit deadline out.
    /// Returns the zoom actually applied.
    pub fn set_zoom_live(&mut self, history: &mut TimelineHistory, next: f64, now: Instant) -> f64 {
        let current = history.present().assembly.zoom;
        let Some(zoomed) = set_zoom(&history.present().assembly, next) else {
            return current;
        };
        let zoom = zoomed.zoom;
        let origin_zoom = self.pending.map_or(current, |pending| pending.origin_zoom);
        self.pending = Some(PendingZoom {
            origin_zoom,
            deadline: now + self.debounce,
        });
        history.update(
            |mut snapshot| {
                snapshot.assembly = zoomed;
                snapshot
            },
            false,
        );
        zoom
    }

    /// Commit the pending burst if its idle window has elapsed at `now`.
    pub fn poll(&mut self, history: &mut TimelineHistory, now: Instant) -> bool {
        match self.pending {
            Some(pending) if now >= pending.deadline => self.flush(history),
            _ => false,
        }
    }

    /// Commit the pending burst immediately. The recorded step undoes back to
    /// the zoom before the burst started.
    pub fn flush(&mut self, history: &mut TimelineHistory) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        let target = history.present().assembly.zoom;
        if target == pending.origin_zoom {
            return false;
        }
        history.update(
            |mut snapshot| {
                snapshot.assembly.zoom = pending.origin_zoom;
                snapshot
            },
            false,
        );
        history.record(|mut snapshot| {
            snapshot.assembly.zoom = target;
            snapshot
        });
        debug!(from = pending.origin_zoom, to = target, "Zoom committed");
        true
    }

    /// Drop the pending burst and restore the zoom from before it.
    pub fn cancel(&mut self, history: &mut TimelineHistory) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        history.update(
            |mut snapshot| {
                snapshot.assembly.zoom = pending.origin_zoom;
                snapshot
            },
            false,
        );
        true
    }
}
