use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

/// Playback rate multiplier bounds.
pub const MIN_PLAYBACK_RATE: f64 = 0.1;
pub const MAX_PLAYBACK_RATE: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    pub fn toggled(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }
}

/// Live playback state. Not persisted.
///
/// `is_playing` and `is_paused` are never both true; `stopped` is both false.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub is_paused: bool,
    /// Milliseconds, always within `[0, active sequence duration]`.
    pub current_time: f64,
    pub playback_rate: f64,
    pub direction: Direction,
}

impl PlaybackState {
    pub fn stopped() -> Self {
        Self {
            is_playing: false,
            is_paused: false,
            current_time: 0.0,
            playback_rate: 1.0,
            direction: Direction::Forward,
        }
    }

    pub fn clamp_rate(rate: f64) -> f64 {
        rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::stopped()
    }
}

/// Source of wall-clock milliseconds for tick deltas.
///
/// Frame delivery is not periodic; the engine always measures the actual
/// elapsed time between ticks instead of assuming a fixed step.
pub trait Clock {
    fn now_ms(&mut self) -> f64;
}

/// Monotonic clock over [`Instant`].
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&mut self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Test clock driven by hand. Clones share the same time source, so a copy
/// kept outside the engine can advance the one the engine reads.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: f64) {
        self.now.set(self.now.get() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&mut self) -> f64 {
        self.now.get()
    }
}

/// Opaque handle for one requested frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickHandle(pub u64);

/// The host's frame-scheduling primitive, behind a seam so non-browser
/// targets can plug in a timer and tests can drive frames by hand.
pub trait FrameScheduler {
    /// Ask for exactly one future tick. The host is expected to call the
    /// engine's `tick()` once per granted request.
    fn request_tick(&mut self) -> TickHandle;
    fn cancel_tick(&mut self, handle: TickHandle);
}

#[derive(Default)]
struct ManualSchedulerInner {
    next_handle: u64,
    pending: Option<TickHandle>,
}

/// Scheduler fake that records the single outstanding request. Clones share
/// state, so tests can observe what the engine scheduled.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Rc<RefCell<ManualSchedulerInner>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        self.inner.borrow().pending.is_some()
    }

    /// Consume the outstanding request, as a host would before running a tick.
    pub fn take_pending(&self) -> Option<TickHandle> {
        self.inner.borrow_mut().pending.take()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_tick(&mut self) -> TickHandle {
        let mut inner = self.inner.borrow_mut();
        inner.next_handle += 1;
        let handle = TickHandle(inner.next_handle);
        inner.pending = Some(handle);
        handle
    }

    fn cancel_tick(&mut self, handle: TickHandle) {
        let mut inner = self.inner.borrow_mut();
        if inner.pending == Some(handle) {
            inner.pending = None;
        }
    }
}
