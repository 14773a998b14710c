//! Scanline buffer pool
//!
//! The renderer draws into one or two band buffers, each holding a fixed
//! number of full-width rows. Every buffer moves through
//!
//! ```text
//! Free ──acquire──► Writing ──submit──► InFlight ──release──► Free
//!                      └───────────retire──────────────────────┘
//! ```
//!
//! and the pool rejects every other transition. With a single buffer the
//! renderer must wait for each flush to finish; with two it can draw the
//! next band while the previous one is still on the bus.

use heapless::Vec;

use crate::geometry::PanelSize;
use crate::pixel::ColorFormat;

/// Maximum number of band buffers
pub const MAX_BUFFERS: usize = 2;

/// Errors from the buffer pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PoolError {
    /// No buffer slices were supplied
    NoBuffers,
    /// More than [`MAX_BUFFERS`] slices were supplied
    TooManyBuffers,
    /// A slice cannot hold one band of pixels
    Capacity,
    /// A buffer is already being written
    WriterActive,
    /// Every buffer is in flight
    Exhausted,
    /// The requested state change is not allowed
    InvalidTransition,
    /// Pixels were requested mutably from a buffer that is not being written
    NotWritable,
    /// The id does not belong to this pool
    UnknownBuffer,
}

/// Buffering strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferMode {
    Single,
    Double,
}

/// Ownership state of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferState {
    /// Available to the renderer
    Free,
    /// Renderer is drawing into it
    Writing,
    /// Handed to the panel, waiting for the transfer to finish
    InFlight,
}

/// Handle to a buffer in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferId(u8);

impl BufferId {
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

struct Slot<'a> {
    bytes: &'a mut [u8],
    state: BufferState,
}

/// Fixed set of band buffers borrowed from static storage
pub struct BufferPool<'a> {
    slots: Vec<Slot<'a>, MAX_BUFFERS>,
    format: ColorFormat,
    width: u16,
    rows: u16,
    next: usize,
}

impl<'a> BufferPool<'a> {
    /// Build a pool over one or two caller-provided slices
    ///
    /// Each buffer holds `height / divisor` rows (at least one). A divisor
    /// of zero is treated as one.
    pub fn new<I>(
        buffers: I,
        size: PanelSize,
        format: ColorFormat,
        divisor: u16,
    ) -> Result<Self, PoolError>
    where
        I: IntoIterator<Item = &'a mut [u8]>,
    {
        let rows = (size.height / divisor.max(1)).max(1);
        let needed = usize::from(size.width) * usize::from(rows) * format.bytes_per_pixel();

        let mut slots = Vec::new();
        for bytes in buffers {
            if bytes.len() < needed {
                return Err(PoolError::Capacity);
            }
            slots
                .push(Slot {
                    bytes,
                    state: BufferState::Free,
                })
                .map_err(|_| PoolError::TooManyBuffers)?;
        }
        if slots.is_empty() {
            return Err(PoolError::NoBuffers);
        }

        Ok(Self {
            slots,
            format,
            width: size.width,
            rows,
            next: 0,
        })
    }

    /// Mark the next free buffer as being written
    pub fn acquire_writable(&mut self) -> Result<BufferId, PoolError> {
        if self
            .slots
            .iter()
            .any(|slot| slot.state == BufferState::Writing)
        {
            return Err(PoolError::WriterActive);
        }

        let count = self.slots.len();
        for offset in 0..count {
            let index = (self.next + offset) % count;
            if self.slots[index].state == BufferState::Free {
                self.slots[index].state = BufferState::Writing;
                self.next = (index + 1) % count;
                return Ok(BufferId(index as u8));
            }
        }

        Err(PoolError::Exhausted)
    }

    /// Hand a written buffer to the panel (`Writing -> InFlight`)
    pub fn submit(&mut self, id: BufferId) -> Result<(), PoolError> {
        self.transition(id, BufferState::Writing, BufferState::InFlight)
    }

    /// Return a transferred buffer to the renderer (`InFlight -> Free`)
    pub fn release(&mut self, id: BufferId) -> Result<(), PoolError> {
        self.transition(id, BufferState::InFlight, BufferState::Free)
    }

    /// Submit and release in one step, for transfers that finish synchronously
    pub fn retire(&mut self, id: BufferId) -> Result<(), PoolError> {
        self.submit(id)?;
        self.release(id)
    }

    fn transition(
        &mut self,
        id: BufferId,
        from: BufferState,
        to: BufferState,
    ) -> Result<(), PoolError> {
        let slot = self
            .slots
            .get_mut(id.index())
            .ok_or(PoolError::UnknownBuffer)?;
        if slot.state != from {
            return Err(PoolError::InvalidTransition);
        }
        slot.state = to;
        Ok(())
    }

    /// Current state of a buffer
    pub fn state(&self, id: BufferId) -> Result<BufferState, PoolError> {
        self.slots
            .get(id.index())
            .map(|slot| slot.state)
            .ok_or(PoolError::UnknownBuffer)
    }

    /// Band contents, limited to one band's worth of bytes
    pub fn pixels(&self, id: BufferId) -> Result<&[u8], PoolError> {
        let len = self.capacity_bytes();
        self.slots
            .get(id.index())
            .map(|slot| &slot.bytes[..len])
            .ok_or(PoolError::UnknownBuffer)
    }

    /// Writable band contents, only while the buffer is `Writing`
    pub fn pixels_mut(&mut self, id: BufferId) -> Result<&mut [u8], PoolError> {
        let len = self.capacity_bytes();
        let slot = self
            .slots
            .get_mut(id.index())
            .ok_or(PoolError::UnknownBuffer)?;
        if slot.state != BufferState::Writing {
            return Err(PoolError::NotWritable);
        }
        Ok(&mut slot.bytes[..len])
    }

    /// Rows per band
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Pixels per band
    pub fn capacity_pixels(&self) -> usize {
        usize::from(self.width) * usize::from(self.rows)
    }

    fn capacity_bytes(&self) -> usize {
        self.capacity_pixels() * self.format.bytes_per_pixel()
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }

    pub fn mode(&self) -> BufferMode {
        if self.slots.len() > 1 {
            BufferMode::Double
        } else {
            BufferMode::Single
        }
    }

    /// Number of buffers currently `Free`
    pub fn free_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state == BufferState::Free)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SIZE: PanelSize = PanelSize::new(320, 240);
    // 320 px * 40 rows * 2 bytes
    const BAND: usize = 320 * 40 * 2;

    #[test]
    fn test_rows_from_divisor() {
        let mut a = [0u8; BAND];
        let pool = BufferPool::new([&mut a[..]], SIZE, ColorFormat::Rgb565, 6).unwrap();
        assert_eq!(pool.rows(), 40);
        assert_eq!(pool.capacity_pixels(), 320 * 40);
        assert_eq!(pool.mode(), BufferMode::Single);
    }

    #[test]
    fn test_rows_at_least_one() {
        let mut a = [0u8; 320 * 2];
        let pool = BufferPool::new([&mut a[..]], SIZE, ColorFormat::Rgb565, 1000).unwrap();
        assert_eq!(pool.rows(), 1);
    }

    #[test]
    fn test_capacity_error() {
        let mut a = [0u8; BAND - 1];
        assert_eq!(
            BufferPool::new([&mut a[..]], SIZE, ColorFormat::Rgb565, 6).err(),
            Some(PoolError::Capacity)
        );
    }

    #[test]
    fn test_no_buffers_error() {
        let none: [&mut [u8]; 0] = [];
        assert_eq!(
            BufferPool::new(none, SIZE, ColorFormat::Rgb565, 6).err(),
            Some(PoolError::NoBuffers)
        );
    }

    #[test]
    fn test_too_many_buffers_error() {
        let mut a = [0u8; BAND];
        let mut b = [0u8; BAND];
        let mut c = [0u8; BAND];
        assert_eq!(
            BufferPool::new(
                [&mut a[..], &mut b[..], &mut c[..]],
                SIZE,
                ColorFormat::Rgb565,
                6
            )
            .err(),
            Some(PoolError::TooManyBuffers)
        );
    }

    #[test]
    fn test_double_acquire_without_submit_is_rejected() {
        let mut a = [0u8; BAND];
        let mut b = [0u8; BAND];
        let mut pool =
            BufferPool::new([&mut a[..], &mut b[..]], SIZE, ColorFormat::Rgb565, 6).unwrap();

        pool.acquire_writable().unwrap();
        assert_eq!(pool.acquire_writable(), Err(PoolError::WriterActive));
    }

    #[test]
    fn test_single_buffer_exhausted_while_in_flight() {
        let mut a = [0u8; BAND];
        let mut pool = BufferPool::new([&mut a[..]], SIZE, ColorFormat::Rgb565, 6).unwrap();

        let id = pool.acquire_writable().unwrap();
        pool.submit(id).unwrap();
        assert_eq!(pool.acquire_writable(), Err(PoolError::Exhausted));

        pool.release(id).unwrap();
        assert_eq!(pool.acquire_writable(), Ok(id));
    }

    #[test]
    fn test_double_buffers_alternate() {
        let mut a = [0u8; BAND];
        let mut b = [0u8; BAND];
        let mut pool =
            BufferPool::new([&mut a[..], &mut b[..]], SIZE, ColorFormat::Rgb565, 6).unwrap();
        assert_eq!(pool.mode(), BufferMode::Double);

        let first = pool.acquire_writable().unwrap();
        pool.submit(first).unwrap();
        let second = pool.acquire_writable().unwrap();
        assert_ne!(first, second);

        pool.retire(second).unwrap();
        pool.release(first).unwrap();
        let third = pool.acquire_writable().unwrap();
        assert_eq!(third, first);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut a = [0u8; BAND];
        let mut pool = BufferPool::new([&mut a[..]], SIZE, ColorFormat::Rgb565, 6).unwrap();
        let id = BufferId(0);

        // Free -> InFlight
        assert_eq!(pool.submit(id), Err(PoolError::InvalidTransition));
        // Free -> Free via release
        assert_eq!(pool.release(id), Err(PoolError::InvalidTransition));

        pool.acquire_writable().unwrap();
        // Writing -> Free via release
        assert_eq!(pool.release(id), Err(PoolError::InvalidTransition));
        assert_eq!(pool.state(id), Ok(BufferState::Writing));
    }

    #[test]
    fn test_pixels_mut_only_while_writing() {
        let mut a = [0u8; BAND];
        let mut pool = BufferPool::new([&mut a[..]], SIZE, ColorFormat::Rgb565, 6).unwrap();
        assert_eq!(pool.pixels_mut(BufferId(0)).err(), Some(PoolError::NotWritable));

        let id = pool.acquire_writable().unwrap();
        pool.pixels_mut(id).unwrap()[0] = 0xAB;
        pool.retire(id).unwrap();

        assert_eq!(pool.pixels(id).unwrap()[0], 0xAB);
        assert_eq!(pool.pixels(id).unwrap().len(), BAND);
    }

    #[test]
    fn test_unknown_buffer() {
        let mut a = [0u8; BAND];
        let mut pool = BufferPool::new([&mut a[..]], SIZE, ColorFormat::Rgb565, 6).unwrap();
        assert_eq!(pool.submit(BufferId(1)), Err(PoolError::UnknownBuffer));
        assert_eq!(pool.state(BufferId(1)), Err(PoolError::UnknownBuffer));
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Acquire,
        Submit(u8),
        Release(u8),
        Retire(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Acquire),
            (0u8..2).prop_map(Op::Submit),
            (0u8..2).prop_map(Op::Release),
            (0u8..2).prop_map(Op::Retire),
        ]
    }

    proptest! {
        #[test]
        fn only_legal_transitions_happen(ops in prop::collection::vec(op(), 0..64)) {
            let mut a = [0u8; BAND];
            let mut b = [0u8; BAND];
            let mut pool =
                BufferPool::new([&mut a[..], &mut b[..]], SIZE, ColorFormat::Rgb565, 6).unwrap();

            for op in ops {
                let before = [pool.state(BufferId(0)).unwrap(), pool.state(BufferId(1)).unwrap()];
                let result = match op {
                    Op::Acquire => pool.acquire_writable().map(|_| ()),
                    Op::Submit(i) => pool.submit(BufferId(i)),
                    Op::Release(i) => pool.release(BufferId(i)),
                    Op::Retire(i) => pool.retire(BufferId(i)),
                };
                let after = [pool.state(BufferId(0)).unwrap(), pool.state(BufferId(1)).unwrap()];

                for i in 0..2 {
                    let legal = before[i] == after[i] || matches!(
                        (before[i], after[i]),
                        (BufferState::Free, BufferState::Writing)
                            | (BufferState::Writing, BufferState::InFlight)
                            | (BufferState::InFlight, BufferState::Free)
                            | (BufferState::Writing, BufferState::Free)
                    );
                    prop_assert!(legal, "{:?} -> {:?}", before[i], after[i]);
                }
                if result.is_err() {
                    prop_assert_eq!(before, after);
                }

                let writers = after.iter().filter(|s| **s == BufferState::Writing).count();
                prop_assert!(writers <= 1);
            }
        }
    }
}
