//! External playback store.
//!
//! The host UI (a scrubber, a play button, a speed picker) owns a small shared state
//! object. The player writes `progress` into it and reads the other fields back via
//! [`RoutePlayer::sync_from_store`](crate::RoutePlayer::sync_from_store).

use log::trace;

/// Shared playback state as seen by the host UI.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaybackState {
    /// Phase in [0, 1]
    pub progress: f64,
    pub is_playing: bool,
    pub speed: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            progress: 0.0,
            is_playing: false,
            speed: 1.0,
        }
    }
}

/// Host capability receiving progress updates.
pub trait PlaybackStore {
    fn set_progress(&mut self, progress: f64);
}

/// Rate limiter for progress writes.
///
/// Frames arrive at display rate; the store usually drives UI re-renders, so writes
/// are held to one per `interval_ms`. The endpoints 0 and 1 and forced writes
/// (seeks, pauses) always pass.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    interval_ms: f64,
    last_write: Option<f64>,
    last_value: Option<f64>,
}

impl ProgressThrottle {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms: interval_ms.max(0.0),
            last_write: None,
            last_value: None,
        }
    }

    pub fn last_value(&self) -> Option<f64> {
        self.last_value
    }

    /// Returns true when `progress` should be written now, and records it.
    pub fn should_write(&mut self, progress: f64, now: f64, force: bool) -> bool {
        if self.last_value == Some(progress) {
            return false;
        }

        let endpoint = progress <= 0.0 || progress >= 1.0;
        let due = match self.last_write {
            Some(last) => now - last >= self.interval_ms,
            None => true,
        };
        if !(force || endpoint || due) {
            trace!("[Store] Throttled progress {:.4}", progress);
            return false;
        }

        self.last_write = Some(now);
        self.last_value = Some(progress);
        true
    }
}
