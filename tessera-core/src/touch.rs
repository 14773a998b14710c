//! Touch acquisition and self-widening calibration
//!
//! Resistive touch controllers report raw ADC counts whose usable range
//! differs from panel to panel. Rather than running a calibration screen,
//! the calibrator starts from a conservative envelope and widens it every
//! time a reading falls outside, so the mapping converges on the real
//! range while the device is used.

use crate::geometry::PanelSize;
use crate::traits::{BusError, TouchSensor};

/// Uncalibrated touch reading in controller units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawPoint {
    pub x: u16,
    pub y: u16,
}

/// Touch position in panel pixels, `1..=width` by `1..=height`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LogicalPoint {
    pub x: u16,
    pub y: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PointerState {
    Pressed,
    Released,
}

/// Pointer sample delivered to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PointerEvent {
    pub x: u16,
    pub y: u16,
    pub state: PointerState,
}

impl PointerEvent {
    pub fn is_pressed(&self) -> bool {
        self.state == PointerState::Pressed
    }
}

/// Observed raw range of each axis
///
/// Only ever widens: minimums never increase, maximums never decrease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationEnvelope {
    pub min_x: u16,
    pub max_x: u16,
    pub min_y: u16,
    pub max_y: u16,
}

impl Default for CalibrationEnvelope {
    fn default() -> Self {
        Self::SEED
    }
}

impl CalibrationEnvelope {
    /// Starting envelope for XPT2046-class resistive panels
    pub const SEED: CalibrationEnvelope = CalibrationEnvelope {
        min_x: 200,
        max_x: 3700,
        min_y: 240,
        max_y: 3800,
    };

    /// Stretch the envelope to include `raw`
    pub fn widen(&mut self, raw: RawPoint) {
        self.min_x = self.min_x.min(raw.x);
        self.max_x = self.max_x.max(raw.x);
        self.min_y = self.min_y.min(raw.y);
        self.max_y = self.max_y.max(raw.y);
    }

    /// Whether either axis has collapsed to a single value
    pub fn is_degenerate(&self) -> bool {
        self.min_x >= self.max_x || self.min_y >= self.max_y
    }
}

/// Linear re-scale with integer truncation, `[in_min, in_max] -> [out_min, out_max]`
///
/// A zero-width input range maps to `out_min`.
fn map_range(value: i64, in_min: i64, in_max: i64, out_min: i64, out_max: i64) -> i64 {
    if in_max == in_min {
        return out_min;
    }
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Maps raw readings to panel coordinates, widening as it goes
#[derive(Debug, Clone)]
pub struct TouchCalibrator {
    envelope: CalibrationEnvelope,
    size: PanelSize,
}

impl TouchCalibrator {
    pub fn new(envelope: CalibrationEnvelope, size: PanelSize) -> Self {
        Self { envelope, size }
    }

    /// Widen the envelope with `raw`, then map it onto the panel
    pub fn calibrate_and_map(&mut self, raw: RawPoint) -> LogicalPoint {
        self.envelope.widen(raw);
        let env = &self.envelope;
        LogicalPoint {
            x: Self::axis(raw.x, env.min_x, env.max_x, self.size.width),
            y: Self::axis(raw.y, env.min_y, env.max_y, self.size.height),
        }
    }

    fn axis(raw: u16, min: u16, max: u16, dimension: u16) -> u16 {
        let upper = i64::from(dimension.max(1));
        let mapped = map_range(
            i64::from(raw),
            i64::from(min),
            i64::from(max),
            1,
            upper,
        );
        mapped.clamp(1, upper) as u16
    }

    pub fn envelope(&self) -> CalibrationEnvelope {
        self.envelope
    }
}

/// Pointer input device built on a touch sensor
pub struct TouchInput<S: TouchSensor> {
    sensor: S,
    calibrator: TouchCalibrator,
    last: LogicalPoint,
    last_error: Option<BusError>,
}

impl<S: TouchSensor> TouchInput<S> {
    pub fn new(sensor: S, calibrator: TouchCalibrator) -> Self {
        Self {
            sensor,
            calibrator,
            last: LogicalPoint::default(),
            last_error: None,
        }
    }

    /// Sample the sensor once
    ///
    /// Without contact the event is `Released` at the last pressed position.
    /// Sensor errors are reported the same way and kept for
    /// [`last_error`](Self::last_error).
    pub fn read(&mut self) -> PointerEvent {
        let state = match self.sensor.poll() {
            Ok(Some(raw)) => {
                self.last_error = None;
                self.last = self.calibrator.calibrate_and_map(raw);
                PointerState::Pressed
            }
            Ok(None) => {
                self.last_error = None;
                PointerState::Released
            }
            Err(err) => {
                self.last_error = Some(err);
                PointerState::Released
            }
        };

        PointerEvent {
            x: self.last.x,
            y: self.last.y,
            state,
        }
    }

    /// Error from the most recent sample, if it failed
    pub fn last_error(&self) -> Option<BusError> {
        self.last_error
    }

    pub fn calibrator(&self) -> &TouchCalibrator {
        &self.calibrator
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }
}
