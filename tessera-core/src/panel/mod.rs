//! Panel transfer variants
//!
//! A panel receives validated dirty rectangles together with the band of
//! pixels that covers them. What it does with them depends on the
//! technology:
//!
//! - [`RasterPanel`] pushes the pixels straight to a TFT controller's RAM
//! - [`MonoPanel`] folds them into an off-screen 1-bit frame that is sent
//!   to the e-paper controller later, in one slow full refresh
//!
//! The flush coordinator only sees the [`PanelTransfer`] trait.

pub mod mono;
pub mod raster;

pub use mono::{frame_len, FrameAccumulator, MonoPanel};
pub use raster::RasterPanel;

use crate::geometry::{DirtyRect, PanelSize};
use crate::pixel::ColorFormat;
use crate::traits::BusError;

/// Panel technology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PanelKind {
    /// Color TFT with random-access frame memory
    Raster,
    /// Monochrome e-paper updated one full frame at a time
    Mono,
}

/// What a panel did with a transferred rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferOutcome {
    /// Pixels were written to the panel before returning
    Written,
    /// Pixels were copied into the off-screen frame
    Accumulated,
    /// Transfer started; completion is signalled separately
    InFlight,
}

/// Errors from a panel transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    /// Fewer pixel bytes than the rectangle covers
    ShortBuffer,
    /// Underlying bus failed
    Bus(BusError),
}

impl From<BusError> for TransferError {
    fn from(err: BusError) -> Self {
        TransferError::Bus(err)
    }
}

/// Panels that show content only after an explicit full-frame update
pub trait FullFrameRefresh {
    /// Send the accumulated frame and run a physical refresh
    fn refresh(&mut self) -> Result<(), BusError>;

    /// Put the controller into its low-power state
    fn sleep(&mut self) -> Result<(), BusError>;

    /// Bring the controller back from sleep
    fn wake(&mut self) -> Result<(), BusError>;

    /// Whether the controller is in its low-power state
    fn is_asleep(&self) -> bool;
}

/// Destination of flushed pixel bands
pub trait PanelTransfer {
    fn size(&self) -> PanelSize;

    fn kind(&self) -> PanelKind;

    /// Move the pixels of `rect` to the panel
    ///
    /// `pixels` holds `rect.area()` pixels in row-major order, packed
    /// without stride.
    fn transfer(
        &mut self,
        rect: DirtyRect,
        format: ColorFormat,
        pixels: &[u8],
    ) -> Result<TransferOutcome, TransferError>;

    /// Full-frame refresh capability, for panels that need one
    fn full_frame(&mut self) -> Option<&mut dyn FullFrameRefresh> {
        None
    }
}

/// Check that `pixels` covers `rect` and return the byte count it needs
pub(crate) fn required_bytes(
    rect: &DirtyRect,
    format: ColorFormat,
    pixels: &[u8],
) -> Result<usize, TransferError> {
    let needed = rect.area() * format.bytes_per_pixel();
    if pixels.len() < needed {
        return Err(TransferError::ShortBuffer);
    }
    Ok(needed)
}
