//! Touch sensor trait

use super::bus::BusError;
use crate::touch::RawPoint;

/// Resistive or capacitive touch controller
///
/// Implementations return uncalibrated readings in the controller's own
/// coordinate space (typically 12-bit ADC counts).
pub trait TouchSensor {
    /// Sample the controller once
    ///
    /// Returns `Ok(None)` when nothing touches the panel.
    fn poll(&mut self) -> Result<Option<RawPoint>, BusError>;
}
