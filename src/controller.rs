//! # Phase Controller
//!
//! Playback state machine over an [`AnimationClock`], driving one frame callback per
//! display refresh through a [`Scheduler`].
//!
//! ```text
//!            start                      phase reaches 1
//!   Idle ───────────▶ Playing ─────────────────────────▶ Completed
//!                    ▲     │ pause                          │ restart timer
//!             resume │     ▼                                │ (back to phase 0)
//!                    Paused ◀──── pause / seek ─────────────┤
//!                                                            ▼
//!                                                         Playing
//! ```
//!
//! Every operation is total: calling it in a state where it does not apply returns
//! `None` and changes nothing. Leaving `Playing` always cancels the pending frame,
//! and entering `Playing` always cancels a pending restart timer, so two frame
//! loops can never run at once.

use log::{debug, info, warn};

use crate::clock::AnimationClock;
use crate::scheduler::{Scheduler, TaskHandle, TaskSlot};

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Never started.
    Idle,
    Playing,
    Paused,
    /// Reached phase 1; waiting for the automatic restart.
    Completed,
}

/// What the caller should do in response to an operation or callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerEvent {
    /// Playback began from phase 0.
    Started,
    /// Present a frame. `snap` is set on the first frame after a discontinuity
    /// (start, resume, seek, restart) so the camera can jump instead of easing.
    Frame { phase: f64, snap: bool },
    /// Playback is suspended at `phase`.
    Paused { phase: f64 },
    /// Playback continues from `phase`.
    Resumed { phase: f64 },
    /// The phase jumped to `phase`. Check [`PhaseController::state`] to tell a live
    /// seek from one made while paused.
    Seeked { phase: f64 },
    /// The speed multiplier changed; the phase did not.
    SpeedChanged { speed: f64, phase: f64 },
    /// Phase 1 reached. A restart is scheduled.
    Finished,
    /// The restart fired; playback is back at phase 0.
    Restarted,
}

/// Owns the clock, the state machine, and the pending frame/timer handles.
#[derive(Debug)]
pub struct PhaseController<S: Scheduler> {
    clock: AnimationClock,
    state: ControllerState,
    scheduler: S,
    frame: TaskSlot,
    restart_timer: TaskSlot,
    restart_delay_ms: f64,
    snap_pending: bool,
}

impl<S: Scheduler> PhaseController<S> {
    pub fn new(scheduler: S, duration_ms: f64, restart_delay_ms: f64) -> Self {
        Self {
            clock: AnimationClock::new(duration_ms),
            state: ControllerState::Idle,
            scheduler,
            frame: TaskSlot::new(),
            restart_timer: TaskSlot::new(),
            restart_delay_ms,
            snap_pending: false,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == ControllerState::Playing
    }

    pub fn speed(&self) -> f64 {
        self.clock.speed()
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    /// Current phase; 0.0 before the first start.
    pub fn phase(&self, now: f64) -> f64 {
        self.clock.phase_at(now)
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Idle → Playing.
    ///
    /// A clock with a degenerate duration cannot animate, so the controller stays
    /// Idle.
    pub fn start(&mut self, now: f64) -> Option<ControllerEvent> {
        if self.state != ControllerState::Idle {
            debug!("[Controller] start ignored in {:?}", self.state);
            return None;
        }
        if self.clock.is_degenerate() {
            warn!(
                "[Controller] Duration {}ms cannot be animated; staying idle",
                self.clock.duration()
            );
            return None;
        }

        self.clock.restart(now);
        self.enter_playing();
        info!(
            "[Controller] Started: {:.0}ms at {}x",
            self.clock.duration(),
            self.clock.speed()
        );
        Some(ControllerEvent::Started)
    }

    /// Playing or Completed → Paused.
    pub fn pause(&mut self, now: f64) -> Option<ControllerEvent> {
        match self.state {
            ControllerState::Playing => self.frame.cancel(&mut self.scheduler),
            ControllerState::Completed => self.restart_timer.cancel(&mut self.scheduler),
            _ => {
                debug!("[Controller] pause ignored in {:?}", self.state);
                return None;
            }
        }

        self.clock.pause(now);
        self.state = ControllerState::Paused;
        let phase = self.clock.phase_at(now);
        debug!("[Controller] Paused at phase {:.4}", phase);
        Some(ControllerEvent::Paused { phase })
    }

    /// Paused → Playing, continuing from the frozen phase.
    pub fn resume(&mut self, now: f64) -> Option<ControllerEvent> {
        if self.state != ControllerState::Paused {
            debug!("[Controller] resume ignored in {:?}", self.state);
            return None;
        }

        if let Some(paused_at) = self.clock.paused_at() {
            debug!("[Controller] Resuming after {:.0}ms paused", now - paused_at);
        }
        self.clock.resume(now);
        self.enter_playing();
        Some(ControllerEvent::Resumed { phase: self.clock.phase_at(now) })
    }

    /// Jump to `target` (clamped to [0, 1]).
    ///
    /// Playing: the frame loop continues from the new phase. Paused: the phase
    /// changes but nothing runs. Completed: the restart is cancelled and playback
    /// becomes Paused at the target. Idle: no-op.
    pub fn seek(&mut self, target: f64, now: f64) -> Option<ControllerEvent> {
        if target.is_nan() {
            warn!("[Controller] Ignoring NaN seek target");
            return None;
        }

        match self.state {
            ControllerState::Idle => {
                debug!("[Controller] seek ignored before start");
                return None;
            }
            ControllerState::Playing => {
                self.clock.seek(target, now);
                // Re-arm so the next frame is computed from the new phase.
                self.request_frame();
                self.snap_pending = true;
            }
            ControllerState::Paused => self.clock.seek(target, now),
            ControllerState::Completed => {
                self.restart_timer.cancel(&mut self.scheduler);
                self.clock.seek(target, now);
                self.state = ControllerState::Paused;
            }
        }

        let phase = self.clock.phase_at(now);
        debug!("[Controller] Seeked to {:.4} ({:?})", phase, self.state);
        Some(ControllerEvent::Seeked { phase })
    }

    /// Change the speed multiplier, keeping the current phase.
    ///
    /// Non-finite and non-positive speeds are ignored.
    pub fn set_speed(&mut self, speed: f64, now: f64) -> Option<ControllerEvent> {
        if speed == self.clock.speed() {
            return None;
        }
        if !self.clock.set_speed(speed, now) {
            return None;
        }
        if self.state == ControllerState::Playing {
            self.request_frame();
        }

        let phase = self.clock.phase_at(now);
        debug!("[Controller] Speed {}x at phase {:.4}", speed, phase);
        Some(ControllerEvent::SpeedChanged { speed, phase })
    }

    /// Host callback for a frame requested through the scheduler.
    pub fn on_frame(&mut self, handle: TaskHandle, now: f64) -> Option<ControllerEvent> {
        if !self.frame.fire(handle) || self.state != ControllerState::Playing {
            return None;
        }

        let phase = self.clock.phase_at(now);
        if phase >= 1.0 {
            self.clock.pause(now);
            self.state = ControllerState::Completed;
            let timer = self.scheduler.set_timeout(self.restart_delay_ms);
            self.restart_timer.arm(&mut self.scheduler, timer);
            info!(
                "[Controller] Completed; restarting in {:.0}ms",
                self.restart_delay_ms
            );
            return Some(ControllerEvent::Finished);
        }

        self.request_frame();
        let snap = std::mem::take(&mut self.snap_pending);
        Some(ControllerEvent::Frame { phase, snap })
    }

    /// Host callback for the restart timer.
    pub fn on_timeout(&mut self, handle: TaskHandle, now: f64) -> Option<ControllerEvent> {
        if !self.restart_timer.fire(handle) || self.state != ControllerState::Completed {
            return None;
        }

        self.clock.restart(now);
        self.enter_playing();
        info!("[Controller] Restarted");
        Some(ControllerEvent::Restarted)
    }

    /// Cancel every pending callback. The controller stays in its current state.
    pub fn dispose(&mut self) {
        self.frame.cancel(&mut self.scheduler);
        self.restart_timer.cancel(&mut self.scheduler);
    }

    fn enter_playing(&mut self) {
        self.restart_timer.cancel(&mut self.scheduler);
        self.state = ControllerState::Playing;
        self.snap_pending = true;
        self.request_frame();
    }

    fn request_frame(&mut self) {
        let handle = self.scheduler.request_frame();
        self.frame.arm(&mut self.scheduler, handle);
    }
}
