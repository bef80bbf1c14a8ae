//! Frame and timer scheduling seam.
//!
//! The crate never owns a thread or an event loop. The host implements
//! [`Scheduler`] on top of whatever it has (a display-refresh callback, a game
//! loop, an async runtime) and calls the player back with the [`TaskHandle`] it
//! handed out. A callback whose handle is no longer pending is ignored, which is
//! what makes cancellation safe even when the host cannot retract an already
//! queued callback.

use std::collections::VecDeque;

/// Identity of one scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

impl TaskHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Host capability for one-shot callbacks.
pub trait Scheduler {
    /// Schedule a callback on the next display refresh.
    fn request_frame(&mut self) -> TaskHandle;

    /// Schedule a callback after `delay_ms` milliseconds.
    fn set_timeout(&mut self, delay_ms: f64) -> TaskHandle;

    /// Cancel a scheduled callback. Unknown or already fired handles are ignored.
    fn cancel(&mut self, handle: TaskHandle);
}

/// At most one pending callback of a given kind.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskSlot {
    pending: Option<TaskHandle>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn handle(&self) -> Option<TaskHandle> {
        self.pending
    }

    /// Track `handle`, cancelling whatever was pending before.
    pub fn arm<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S, handle: TaskHandle) {
        self.cancel(scheduler);
        self.pending = Some(handle);
    }

    /// Cancel the pending callback, if any. Safe to call repeatedly.
    pub fn cancel<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel(handle);
        }
    }

    /// Consume a fired callback. Returns `false` for stale or foreign handles.
    pub fn fire(&mut self, handle: TaskHandle) -> bool {
        if self.pending == Some(handle) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

// =============================================================================
// Manual Scheduler
// =============================================================================

/// A scheduler driven explicitly by the caller.
///
/// Useful for headless hosts (offline frame export, simulations) and for tests:
/// the caller decides when a frame happens and what time it is.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    now: f64,
    frames: VecDeque<TaskHandle>,
    timers: Vec<(TaskHandle, f64)>,
    cancelled: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time as seen by timers, in milliseconds.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Move the scheduler clock forward. Going backwards is ignored.
    pub fn advance_to(&mut self, now: f64) {
        self.now = self.now.max(now);
    }

    /// Drain the frame requests made so far.
    pub fn take_frames(&mut self) -> Vec<TaskHandle> {
        self.frames.drain(..).collect()
    }

    /// Drain timers whose deadline is at or before the current time.
    pub fn take_due_timers(&mut self) -> Vec<TaskHandle> {
        let now = self.now;
        let (due, pending): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|(_, deadline)| *deadline <= now);
        self.timers = pending;
        due.into_iter().map(|(handle, _)| handle).collect()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Number of cancellations that removed a pending callback.
    pub fn cancelled(&self) -> usize {
        self.cancelled
    }

    fn next_handle(&mut self) -> TaskHandle {
        self.next_id += 1;
        TaskHandle::new(self.next_id)
    }
}

impl Scheduler for ManualScheduler {
    fn request_frame(&mut self) -> TaskHandle {
        let handle = self.next_handle();
        self.frames.push_back(handle);
        handle
    }

    fn set_timeout(&mut self, delay_ms: f64) -> TaskHandle {
        let handle = self.next_handle();
        self.timers.push((handle, self.now + delay_ms.max(0.0)));
        handle
    }

    fn cancel(&mut self, handle: TaskHandle) {
        let before = self.frames.len() + self.timers.len();
        self.frames.retain(|h| *h != handle);
        self.timers.retain(|(h, _)| *h != handle);
        if self.frames.len() + self.timers.len() < before {
            self.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_cancel_is_idempotent() {
        let mut scheduler = ManualScheduler::new();
        let mut slot = TaskSlot::new();
        let handle = scheduler.request_frame();
        slot.arm(&mut scheduler, handle);

        slot.cancel(&mut scheduler);
        slot.cancel(&mut scheduler);
        assert!(!slot.is_pending());
        assert_eq!(scheduler.pending_frames(), 0);
        assert_eq!(scheduler.cancelled(), 1);
    }

    #[test]
    fn test_slot_rejects_stale_handles() {
        let mut scheduler = ManualScheduler::new();
        let mut slot = TaskSlot::new();
        let first = scheduler.request_frame();
        slot.arm(&mut scheduler, first);
        let second = scheduler.request_frame();
        slot.arm(&mut scheduler, second);

        // Re-arming cancelled the first request
        assert_eq!(scheduler.take_frames(), vec![second]);
        assert!(!slot.fire(first));
        assert!(slot.fire(second));
        assert!(!slot.fire(second));
    }

    #[test]
    fn test_manual_timers_fire_when_due() {
        let mut scheduler = ManualScheduler::new();
        scheduler.advance_to(1_000.0);
        let handle = scheduler.set_timeout(500.0);

        scheduler.advance_to(1_499.0);
        assert!(scheduler.take_due_timers().is_empty());

        scheduler.advance_to(1_500.0);
        assert_eq!(scheduler.take_due_timers(), vec![handle]);
        assert_eq!(scheduler.pending_timers(), 0);
    }

    #[test]
    fn test_manual_clock_does_not_go_backwards() {
        let mut scheduler = ManualScheduler::new();
        scheduler.advance_to(200.0);
        scheduler.advance_to(100.0);
        assert_eq!(scheduler.now(), 200.0);
    }
}
