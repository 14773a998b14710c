//! E-paper refresh scheduling
//!
//! Flushes to a monochrome panel only mark the frame dirty. The scheduler
//! turns that flag into physical refreshes, at most one per
//! `min_interval_ms`, and optionally sends the controller to sleep in
//! between.
//!
//! ```text
//! Idle ──dirty──► PendingRefresh ──interval elapsed──► Refreshing ──┬──► Sleeping
//!  ▲                    ▲                                           │
//!  │                    └──────────────refresh failed───────────────┤
//!  └────────────────────────────────────────────────────────────────┘
//! ```

use crate::panel::FullFrameRefresh;
use crate::traits::BusError;

/// Default minimum time between two physical refreshes
pub const DEFAULT_MIN_INTERVAL_MS: u32 = 3000;

/// Refresh bookkeeping shared with the flush coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RefreshWindow {
    /// Time of the last refresh attempt, 0 at boot
    pub last_refresh_ms: u32,
    /// Frame changed since the last successful refresh
    pub pending_dirty: bool,
}

impl Default for RefreshWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshWindow {
    pub const fn new() -> Self {
        Self {
            last_refresh_ms: 0,
            pending_dirty: false,
        }
    }
}

/// Scheduler states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RefreshState {
    /// Panel awake, frame clean
    Idle,
    /// Frame dirty, waiting for the interval to elapse
    PendingRefresh,
    /// Physical refresh running
    Refreshing,
    /// Controller in deep sleep, frame clean
    Sleeping,
}

/// A completed physical refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RefreshEvent {
    /// Frame shown, panel left awake
    Refreshed { at_ms: u32 },
    /// Frame shown, panel sent to sleep
    RefreshedAsleep { at_ms: u32 },
}

/// Rate-limited full-frame refresh driver
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    state: RefreshState,
    min_interval_ms: u32,
    sleep_when_idle: bool,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL_MS, false)
    }
}

impl RefreshScheduler {
    pub fn new(min_interval_ms: u32, sleep_when_idle: bool) -> Self {
        Self {
            state: RefreshState::Idle,
            min_interval_ms,
            sleep_when_idle,
        }
    }

    /// Advance the scheduler
    ///
    /// Runs at most one physical refresh. A failed refresh leaves the frame
    /// dirty and still counts as an attempt for the interval check.
    pub fn tick(
        &mut self,
        window: &mut RefreshWindow,
        now_ms: u32,
        panel: &mut dyn FullFrameRefresh,
    ) -> Result<Option<RefreshEvent>, BusError> {
        if window.pending_dirty && matches!(self.state, RefreshState::Idle | RefreshState::Sleeping)
        {
            self.state = RefreshState::PendingRefresh;
        }

        if self.state != RefreshState::PendingRefresh
            || now_ms.wrapping_sub(window.last_refresh_ms) < self.min_interval_ms
        {
            return Ok(None);
        }

        self.state = RefreshState::Refreshing;
        if let Err(err) = Self::show(panel) {
            window.last_refresh_ms = now_ms;
            self.state = RefreshState::PendingRefresh;
            return Err(err);
        }
        window.pending_dirty = false;
        window.last_refresh_ms = now_ms;

        if self.sleep_when_idle && !window.pending_dirty {
            if let Err(err) = panel.sleep() {
                self.state = RefreshState::Idle;
                return Err(err);
            }
            self.state = RefreshState::Sleeping;
            Ok(Some(RefreshEvent::RefreshedAsleep { at_ms: now_ms }))
        } else {
            self.state = RefreshState::Idle;
            Ok(Some(RefreshEvent::Refreshed { at_ms: now_ms }))
        }
    }

    fn show(panel: &mut dyn FullFrameRefresh) -> Result<(), BusError> {
        if panel.is_asleep() {
            panel.wake()?;
        }
        panel.refresh()
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    pub fn min_interval_ms(&self) -> u32 {
        self.min_interval_ms
    }
}
