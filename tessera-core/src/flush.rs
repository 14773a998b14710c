//! Flush coordination
//!
//! Every renderer flush walks the same path:
//!
//! ```text
//! Received ──► Validated ──► Dispatched ──► Completed
//! ```
//!
//! The coordinator validates the area, hands the band to the panel and
//! settles buffer ownership. Whatever happens, the renderer gets exactly
//! one `flush_ready` per flush so it never stalls waiting for a buffer.

use crate::buffer::{BufferId, BufferState, PoolError};
use crate::geometry::{Area, DirtyRect, RegionError};
use crate::panel::{PanelTransfer, TransferError, TransferOutcome};
use crate::pipeline::DisplayState;
use crate::traits::FlushReady;

/// Position of the current flush in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushPhase {
    /// Area and buffer accepted from the renderer
    Received,
    /// Area converted to a rectangle inside the panel and the buffer
    Validated,
    /// Pixels handed to the panel
    Dispatched,
    /// Buffer returned and renderer notified
    Completed,
}

/// Errors from a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushError {
    /// Area rejected; nothing was drawn
    InvalidRegion(RegionError),
    /// Panel failed; the band was lost
    Transfer(TransferError),
    /// Buffer ownership violated
    Pool(PoolError),
    /// A previous transfer has not completed yet
    Busy,
}

impl From<PoolError> for FlushError {
    fn from(err: PoolError) -> Self {
        FlushError::Pool(err)
    }
}

/// Result of a successful flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlushReport {
    pub rect: DirtyRect,
    pub outcome: TransferOutcome,
}

/// Running flush counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlushStats {
    /// Flushes that reached the panel
    pub completed: u32,
    /// Flushes dropped for an invalid area
    pub dropped: u32,
    /// Flushes lost to a panel error
    pub failed: u32,
}

/// Routes renderer flushes to a panel
pub struct FlushCoordinator<P: PanelTransfer> {
    panel: P,
    phase: FlushPhase,
    in_flight: Option<BufferId>,
    stats: FlushStats,
}

impl<P: PanelTransfer> FlushCoordinator<P> {
    pub fn new(panel: P) -> Self {
        Self {
            panel,
            phase: FlushPhase::Completed,
            in_flight: None,
            stats: FlushStats::default(),
        }
    }

    /// Flush one band
    ///
    /// `buffer` must be the buffer the renderer is currently writing.
    /// Except for [`FlushError::Pool`] and [`FlushError::Busy`], the buffer
    /// has been given back and `ready` notified by the time this returns.
    pub fn flush(
        &mut self,
        state: &mut DisplayState<'_>,
        area: Area,
        buffer: BufferId,
        ready: &mut impl FlushReady,
    ) -> Result<FlushReport, FlushError> {
        if self.in_flight.is_some() {
            return Err(FlushError::Busy);
        }
        if state.pool.state(buffer)? != BufferState::Writing {
            return Err(FlushError::Pool(PoolError::InvalidTransition));
        }
        self.phase = FlushPhase::Received;

        let rect = match self.validate(state, area) {
            Ok(rect) => rect,
            Err(err) => {
                state.pool.retire(buffer)?;
                self.stats.dropped += 1;
                self.complete(buffer, ready);
                return Err(FlushError::InvalidRegion(err));
            }
        };
        self.phase = FlushPhase::Validated;

        let format = state.pool.format();
        let result = self
            .panel
            .transfer(rect, format, state.pool.pixels(buffer)?);
        self.phase = FlushPhase::Dispatched;

        let outcome = match result {
            Ok(TransferOutcome::InFlight) => {
                state.pool.submit(buffer)?;
                self.in_flight = Some(buffer);
                TransferOutcome::InFlight
            }
            Ok(outcome) => {
                state.pool.retire(buffer)?;
                if outcome == TransferOutcome::Accumulated {
                    state.refresh.pending_dirty = true;
                }
                self.stats.completed += 1;
                self.complete(buffer, ready);
                outcome
            }
            Err(err) => {
                state.pool.retire(buffer)?;
                self.stats.failed += 1;
                self.complete(buffer, ready);
                return Err(FlushError::Transfer(err));
            }
        };

        Ok(FlushReport { rect, outcome })
    }

    /// Finish an asynchronous transfer
    ///
    /// Called from the completion signal of an `InFlight` transfer. Returns
    /// the released buffer, or `None` if nothing was in flight.
    pub fn transfer_complete(
        &mut self,
        state: &mut DisplayState<'_>,
        ready: &mut impl FlushReady,
    ) -> Result<Option<BufferId>, PoolError> {
        let Some(buffer) = self.in_flight else {
            return Ok(None);
        };
        state.pool.release(buffer)?;
        self.in_flight = None;
        self.stats.completed += 1;
        self.complete(buffer, ready);
        Ok(Some(buffer))
    }

    fn validate(&self, state: &DisplayState<'_>, area: Area) -> Result<DirtyRect, RegionError> {
        let rect = DirtyRect::within(area, self.panel.size())?;
        if rect.area() > state.pool.capacity_pixels() {
            return Err(RegionError::ExceedsBuffer);
        }
        Ok(rect)
    }

    fn complete(&mut self, buffer: BufferId, ready: &mut impl FlushReady) {
        self.phase = FlushPhase::Completed;
        ready.flush_ready(buffer);
    }

    pub fn phase(&self) -> FlushPhase {
        self.phase
    }

    pub fn in_flight(&self) -> Option<BufferId> {
        self.in_flight
    }

    pub fn stats(&self) -> FlushStats {
        self.stats
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferPool;
    use crate::geometry::PanelSize;
    use crate::panel::PanelKind;
    use crate::pixel::ColorFormat;
    use crate::refresh::RefreshWindow;
    use crate::traits::BusError;
    use proptest::prelude::*;

    const SIZE: PanelSize = PanelSize::new(32, 24);
    // 32 px * 4 rows * 2 bytes
    const BAND: usize = 32 * 4 * 2;

    struct MockPanel {
        outcome: Result<TransferOutcome, TransferError>,
        transfers: Vec<DirtyRect>,
    }

    impl MockPanel {
        fn new(outcome: Result<TransferOutcome, TransferError>) -> Self {
            Self {
                outcome,
                transfers: Vec::new(),
            }
        }
    }

    impl PanelTransfer for MockPanel {
        fn size(&self) -> PanelSize {
            SIZE
        }

        fn kind(&self) -> PanelKind {
            PanelKind::Raster
        }

        fn transfer(
            &mut self,
            rect: DirtyRect,
            _format: ColorFormat,
            _pixels: &[u8],
        ) -> Result<TransferOutcome, TransferError> {
            self.transfers.push(rect);
            self.outcome
        }
    }

    #[derive(Default)]
    struct Ready {
        acks: Vec<BufferId>,
    }

    impl FlushReady for Ready {
        fn flush_ready(&mut self, buffer: BufferId) {
            self.acks.push(buffer);
        }
    }

    fn state(bytes: &mut [u8]) -> DisplayState<'_> {
        DisplayState {
            pool: BufferPool::new([bytes], SIZE, ColorFormat::Rgb565, 6).unwrap(),
            refresh: RefreshWindow::new(),
        }
    }

    #[test]
    fn test_written_flush_completes_once() {
        let mut bytes = [0u8; BAND];
        let mut state = state(&mut bytes);
        let mut coordinator = FlushCoordinator::new(MockPanel::new(Ok(TransferOutcome::Written)));
        let mut ready = Ready::default();

        let id = state.pool.acquire_writable().unwrap();
        let report = coordinator
            .flush(&mut state, Area::new(0, 0, 31, 3), id, &mut ready)
            .unwrap();

        assert_eq!(report.outcome, TransferOutcome::Written);
        assert_eq!(ready.acks, vec![id]);
        assert_eq!(state.pool.state(id), Ok(BufferState::Free));
        assert_eq!(coordinator.phase(), FlushPhase::Completed);
        assert_eq!(coordinator.stats().completed, 1);
        assert!(!state.refresh.pending_dirty);
    }

    #[test]
    fn test_accumulated_flush_marks_dirty() {
        let mut bytes = [0u8; BAND];
        let mut state = state(&mut bytes);
        let mut coordinator =
            FlushCoordinator::new(MockPanel::new(Ok(TransferOutcome::Accumulated)));
        let mut ready = Ready::default();

        let id = state.pool.acquire_writable().unwrap();
        coordinator
            .flush(&mut state, Area::new(1, 1, 2, 2), id, &mut ready)
            .unwrap();

        assert!(state.refresh.pending_dirty);
        assert_eq!(ready.acks.len(), 1);
    }

    #[test]
    fn test_invalid_area_is_dropped_but_acknowledged() {
        let mut bytes = [0u8; BAND];
        let mut state = state(&mut bytes);
        let mut coordinator = FlushCoordinator::new(MockPanel::new(Ok(TransferOutcome::Written)));
        let mut ready = Ready::default();

        let id = state.pool.acquire_writable().unwrap();
        let result = coordinator.flush(&mut state, Area::new(0, 0, 32, 0), id, &mut ready);

        assert_eq!(
            result,
            Err(FlushError::InvalidRegion(RegionError::OutOfBounds))
        );
        assert_eq!(ready.acks, vec![id]);
        assert_eq!(state.pool.state(id), Ok(BufferState::Free));
        assert!(coordinator.panel().transfers.is_empty());
        assert_eq!(coordinator.stats().dropped, 1);
    }

    #[test]
    fn test_area_larger_than_buffer_is_dropped() {
        let mut bytes = [0u8; BAND];
        let mut state = state(&mut bytes);
        let mut coordinator = FlushCoordinator::new(MockPanel::new(Ok(TransferOutcome::Written)));
        let mut ready = Ready::default();

        let id = state.pool.acquire_writable().unwrap();
        let result = coordinator.flush(&mut state, Area::new(0, 0, 31, 4), id, &mut ready);

        assert_eq!(
            result,
            Err(FlushError::InvalidRegion(RegionError::ExceedsBuffer))
        );
        assert_eq!(ready.acks.len(), 1);
    }

    #[test]
    fn test_bus_failure_recycles_buffer() {
        let mut bytes = [0u8; BAND];
        let mut state = state(&mut bytes);
        let mut coordinator = FlushCoordinator::new(MockPanel::new(Err(TransferError::Bus(
            BusError::Communication,
        ))));
        let mut ready = Ready::default();

        let id = state.pool.acquire_writable().unwrap();
        let result = coordinator.flush(&mut state, Area::new(0, 0, 0, 0), id, &mut ready);

        assert_eq!(
            result,
            Err(FlushError::Transfer(TransferError::Bus(
                BusError::Communication
            )))
        );
        assert_eq!(ready.acks, vec![id]);
        assert_eq!(state.pool.state(id), Ok(BufferState::Free));
        assert_eq!(coordinator.stats().failed, 1);
    }

    #[test]
    fn test_in_flight_waits_for_completion() {
        let mut bytes = [0u8; BAND];
        let mut state = state(&mut bytes);
        let mut coordinator = FlushCoordinator::new(MockPanel::new(Ok(TransferOutcome::InFlight)));
        let mut ready = Ready::default();

        let id = state.pool.acquire_writable().unwrap();
        coordinator
            .flush(&mut state, Area::new(0, 0, 3, 3), id, &mut ready)
            .unwrap();

        assert!(ready.acks.is_empty());
        assert_eq!(state.pool.state(id), Ok(BufferState::InFlight));
        assert_eq!(coordinator.phase(), FlushPhase::Dispatched);
        assert_eq!(state.pool.acquire_writable(), Err(PoolError::Exhausted));

        assert_eq!(
            coordinator.transfer_complete(&mut state, &mut ready),
            Ok(Some(id))
        );
        assert_eq!(ready.acks, vec![id]);
        assert_eq!(state.pool.state(id), Ok(BufferState::Free));
        assert_eq!(coordinator.phase(), FlushPhase::Completed);
        assert_eq!(coordinator.transfer_complete(&mut state, &mut ready), Ok(None));
    }

    #[test]
    fn test_flush_of_unacquired_buffer_is_rejected() {
        let mut bytes = [0u8; BAND];
        let mut state = state(&mut bytes);
        let mut coordinator = FlushCoordinator::new(MockPanel::new(Ok(TransferOutcome::Written)));
        let mut ready = Ready::default();

        let id = state.pool.acquire_writable().unwrap();
        state.pool.retire(id).unwrap();

        assert_eq!(
            coordinator.flush(&mut state, Area::new(0, 0, 0, 0), id, &mut ready),
            Err(FlushError::Pool(PoolError::InvalidTransition))
        );
        assert!(ready.acks.is_empty());
    }

    proptest! {
        #[test]
        fn every_flush_is_acknowledged_once(
            areas in prop::collection::vec((-4i32..40, -4i32..30, -4i32..40, -4i32..30), 1..32)
        ) {
            let mut bytes = [0u8; BAND];
            let mut state = state(&mut bytes);
            let mut coordinator =
                FlushCoordinator::new(MockPanel::new(Ok(TransferOutcome::Accumulated)));
            let mut ready = Ready::default();

            for (i, (x1, y1, x2, y2)) in areas.iter().enumerate() {
                let id = state.pool.acquire_writable().unwrap();
                let _ = coordinator.flush(&mut state, Area::new(*x1, *y1, *x2, *y2), id, &mut ready);

                prop_assert_eq!(ready.acks.len(), i + 1);
                prop_assert_eq!(state.pool.state(id), Ok(BufferState::Free));
                prop_assert_eq!(coordinator.phase(), FlushPhase::Completed);
            }

            let stats = coordinator.stats();
            prop_assert_eq!((stats.completed + stats.dropped) as usize, areas.len());
            prop_assert_eq!(stats.completed as usize, coordinator.panel().transfers.len());
        }
    }
}
