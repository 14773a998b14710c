//! Panel bus traits

use crate::geometry::DirtyRect;

/// Errors reported by a panel or touch bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// SPI transfer failed
    Communication,
    /// Control pin (DC, reset, chip select) could not be driven or read
    Pin,
    /// Device stayed busy longer than allowed
    Timeout,
}

/// Command/data bus of a color TFT controller
///
/// Implementations own the chip-specific command set. Pixel bytes arrive
/// already in the panel's wire order.
pub trait RasterBus {
    /// Set the address window that subsequent pixel writes fill
    fn set_window(&mut self, rect: DirtyRect) -> Result<(), BusError>;

    /// Stream pixel bytes into the current window
    ///
    /// May be called several times per window; the controller keeps
    /// advancing its write pointer.
    fn write_pixels(&mut self, bytes: &[u8]) -> Result<(), BusError>;
}

/// Full-frame monochrome e-paper controller
pub trait EpaperDevice {
    /// Reset and run the power-up sequence
    ///
    /// Also used to wake the controller from deep sleep.
    fn init(&mut self) -> Result<(), BusError>;

    /// Upload a full 1-bit frame and run a physical refresh
    ///
    /// `frame` is MSB-first, one bit per pixel, bit set = white.
    /// Blocks until the controller reports idle.
    fn display(&mut self, frame: &[u8]) -> Result<(), BusError>;

    /// Enter deep sleep
    fn sleep(&mut self) -> Result<(), BusError>;
}
