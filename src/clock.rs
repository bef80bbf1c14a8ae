//! Animation clock: the time ↔ phase mapping.
//!
//! The clock is anchored rather than integrated. It stores the phase reached at the
//! last control operation (`anchor_phase`) and the timestamp of that operation
//! (`anchor_time`):
//!
//! ```text
//! phase(now) = clamp(anchor_phase + (now - anchor_time) * speed / duration, 0, 1)
//! ```
//!
//! This is the `referenceStartTime` formulation solved for the phase. The reference
//! start is `anchor_time - anchor_phase * duration / speed`, available from
//! [`AnimationClock::reference_start`]. Re-anchoring at the current phase on every
//! pause, resume, seek, or speed change keeps phase exactly continuous across the
//! operation. Nothing accumulates per frame, so there is no drift.

use log::warn;

/// Wall-clock to phase conversion for one playback session.
///
/// Timestamps are milliseconds on any monotonic host clock.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClock {
    anchor_phase: f64,
    anchor_time: f64,
    paused_at: Option<f64>,
    speed: f64,
    duration: f64,
}

impl AnimationClock {
    /// A clock frozen at phase 0. Call [`restart`](Self::restart) to set it running.
    ///
    /// A zero, negative, or non-finite `duration_ms` makes the clock degenerate:
    /// the phase stays pinned at 0.
    pub fn new(duration_ms: f64) -> Self {
        Self {
            anchor_phase: 0.0,
            anchor_time: 0.0,
            paused_at: Some(0.0),
            speed: 1.0,
            duration: duration_ms,
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Timestamp the clock was paused at, if paused.
    pub fn paused_at(&self) -> Option<f64> {
        self.paused_at
    }

    /// True when the duration cannot produce a meaningful phase.
    pub fn is_degenerate(&self) -> bool {
        !(self.duration.is_finite() && self.duration > 0.0)
    }

    /// The instant phase 0 would have been (or will be) reached at the current speed.
    pub fn reference_start(&self) -> f64 {
        if self.is_degenerate() {
            return self.anchor_time;
        }
        self.anchor_time - self.anchor_phase * self.duration / self.speed
    }

    /// Phase at `now`, in [0, 1].
    pub fn phase_at(&self, now: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        let t = self.paused_at.unwrap_or(now);
        let elapsed = (t - self.anchor_time).max(0.0);
        let phase = self.anchor_phase + elapsed * self.speed / self.duration;
        if phase.is_nan() {
            0.0
        } else {
            phase.clamp(0.0, 1.0)
        }
    }

    /// Run from phase 0 starting at `now`.
    pub fn restart(&mut self, now: f64) {
        self.anchor_phase = 0.0;
        self.anchor_time = now;
        self.paused_at = None;
    }

    /// Freeze the phase at its value at `now`. No-op when already paused.
    pub fn pause(&mut self, now: f64) {
        if self.paused_at.is_some() {
            return;
        }
        self.anchor_phase = self.phase_at(now);
        self.anchor_time = now;
        self.paused_at = Some(now);
    }

    /// Continue from the frozen phase. No-op when running.
    pub fn resume(&mut self, now: f64) {
        if self.paused_at.take().is_some() {
            self.anchor_time = now;
        }
    }

    /// Jump to `phase` (clamped to [0, 1]) at `now`, keeping the paused/running state.
    pub fn seek(&mut self, phase: f64, now: f64) {
        if phase.is_nan() {
            warn!("[Clock] Ignoring NaN seek target");
            return;
        }
        self.anchor_phase = if self.is_degenerate() { 0.0 } else { phase.clamp(0.0, 1.0) };
        self.anchor_time = now;
        if self.paused_at.is_some() {
            self.paused_at = Some(now);
        }
    }

    /// Change the speed multiplier without moving the phase.
    ///
    /// Returns `false` (and leaves the clock untouched) for non-finite or
    /// non-positive speeds.
    pub fn set_speed(&mut self, speed: f64, now: f64) -> bool {
        if !(speed.is_finite() && speed > 0.0) {
            warn!("[Clock] Ignoring invalid speed {}", speed);
            return false;
        }
        let t = self.paused_at.unwrap_or(now);
        self.anchor_phase = self.phase_at(t);
        self.anchor_time = t;
        self.speed = speed;
        true
    }
}
