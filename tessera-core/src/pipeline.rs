//! Pipeline composition
//!
//! Bundles the buffer pool, flush coordinator and (for e-paper) the
//! refresh scheduler behind the small surface a renderer needs.

use crate::buffer::{BufferId, BufferMode, BufferPool, PoolError};
use crate::flush::{FlushCoordinator, FlushError, FlushReport};
use crate::geometry::{Area, PanelSize};
use crate::panel::{PanelKind, PanelTransfer};
use crate::pixel::ColorFormat;
use crate::refresh::{RefreshEvent, RefreshScheduler, RefreshWindow};
use crate::traits::{BusError, FlushReady};

/// Mutable display state owned by the display task
pub struct DisplayState<'a> {
    pub pool: BufferPool<'a>,
    pub refresh: RefreshWindow,
}

impl<'a> DisplayState<'a> {
    pub fn new(pool: BufferPool<'a>) -> Self {
        Self {
            pool,
            refresh: RefreshWindow::new(),
        }
    }
}

/// What the renderer learns about the display at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Registration {
    pub size: PanelSize,
    pub format: ColorFormat,
    pub buffer_rows: u16,
    pub mode: BufferMode,
}

pub struct Pipeline<'a, P: PanelTransfer> {
    state: DisplayState<'a>,
    coordinator: FlushCoordinator<P>,
    scheduler: Option<RefreshScheduler>,
}

impl<'a, P: PanelTransfer> Pipeline<'a, P> {
    /// Compose a pipeline; the scheduler is only kept for e-paper panels
    pub fn new(pool: BufferPool<'a>, panel: P, scheduler: RefreshScheduler) -> Self {
        let scheduler = (panel.kind() == PanelKind::Mono).then_some(scheduler);
        Self {
            state: DisplayState::new(pool),
            coordinator: FlushCoordinator::new(panel),
            scheduler,
        }
    }

    pub fn registration(&self) -> Registration {
        Registration {
            size: self.coordinator.panel().size(),
            format: self.state.pool.format(),
            buffer_rows: self.state.pool.rows(),
            mode: self.state.pool.mode(),
        }
    }

    /// Get a buffer to draw the next band into
    pub fn acquire(&mut self) -> Result<BufferId, PoolError> {
        self.state.pool.acquire_writable()
    }

    pub fn pixels_mut(&mut self, id: BufferId) -> Result<&mut [u8], PoolError> {
        self.state.pool.pixels_mut(id)
    }

    /// Flush a drawn band covering `area`
    pub fn flush(
        &mut self,
        area: Area,
        id: BufferId,
        ready: &mut impl FlushReady,
    ) -> Result<FlushReport, FlushError> {
        self.coordinator.flush(&mut self.state, area, id, ready)
    }

    /// Completion signal for an asynchronous transfer
    pub fn transfer_complete(
        &mut self,
        ready: &mut impl FlushReady,
    ) -> Result<Option<BufferId>, PoolError> {
        self.coordinator.transfer_complete(&mut self.state, ready)
    }

    /// Run the refresh scheduler, if this panel has one
    pub fn tick(&mut self, now_ms: u32) -> Result<Option<RefreshEvent>, BusError> {
        let Some(scheduler) = self.scheduler.as_mut() else {
            return Ok(None);
        };
        match self.coordinator.panel_mut().full_frame() {
            Some(panel) => scheduler.tick(&mut self.state.refresh, now_ms, panel),
            None => Ok(None),
        }
    }

    pub fn state(&self) -> &DisplayState<'a> {
        &self.state
    }

    pub fn coordinator(&self) -> &FlushCoordinator<P> {
        &self.coordinator
    }

    pub fn scheduler(&self) -> Option<&RefreshScheduler> {
        self.scheduler.as_ref()
    }

    pub fn panel_mut(&mut self) -> &mut P {
        self.coordinator.panel_mut()
    }
}
