//! Configuration type definitions

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::PanelSize;
use crate::panel::PanelKind;
use crate::pixel::{ColorFormat, Threshold};
use crate::refresh::DEFAULT_MIN_INTERVAL_MS;
use crate::touch::CalibrationEnvelope;

/// Maximum display name length
pub const MAX_NAME_LEN: usize = 24;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Unknown or malformed `[section]` header
    InvalidSection,
    /// Key not valid in its section
    UnknownKey,
    /// Value has the wrong type or does not fit
    InvalidValue,
    /// Width or height is zero
    ZeroSize,
    /// Buffer divisor is zero
    ZeroDivisor,
    /// Loop tick is zero
    ZeroTick,
    /// A calibration axis has `min >= max`
    DegenerateCalibration,
}

/// Panel description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PanelConfig {
    pub kind: PanelKind,
    pub width: u16,
    pub height: u16,
    /// Band height is `height / buffer_divisor` rows
    pub buffer_divisor: u16,
    /// Use two band buffers instead of one
    pub double_buffer: bool,
    /// Luminance below this is black
    pub threshold: u8,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            kind: PanelKind::Raster,
            width: 320,
            height: 240,
            buffer_divisor: 6,
            double_buffer: false,
            threshold: Threshold::DEFAULT.0,
        }
    }
}

impl PanelConfig {
    pub fn size(&self) -> PanelSize {
        PanelSize::new(self.width, self.height)
    }

    pub fn threshold(&self) -> Threshold {
        Threshold(self.threshold)
    }

    /// Pixel format the renderer draws in for this panel kind
    pub fn format(&self) -> ColorFormat {
        match self.kind {
            PanelKind::Raster => ColorFormat::Rgb565,
            PanelKind::Mono => ColorFormat::L8,
        }
    }
}

/// E-paper refresh policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RefreshConfig {
    /// Minimum time between physical refreshes
    pub min_interval_ms: u32,
    /// Deep-sleep the controller after each refresh
    pub sleep_when_idle: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
            sleep_when_idle: false,
        }
    }
}

/// Touch input and calibration seeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TouchConfig {
    pub enabled: bool,
    pub min_x: u16,
    pub max_x: u16,
    pub min_y: u16,
    pub max_y: u16,
}

impl Default for TouchConfig {
    fn default() -> Self {
        let seed = CalibrationEnvelope::SEED;
        Self {
            enabled: true,
            min_x: seed.min_x,
            max_x: seed.max_x,
            min_y: seed.min_y,
            max_y: seed.max_y,
        }
    }
}

impl TouchConfig {
    pub fn envelope(&self) -> CalibrationEnvelope {
        CalibrationEnvelope {
            min_x: self.min_x,
            max_x: self.max_x,
            min_y: self.min_y,
            max_y: self.max_y,
        }
    }
}

/// Display loop timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoopConfig {
    /// Sleep between ticks, also the renderer's time advance
    pub tick_ms: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self { tick_ms: 5 }
    }
}

/// Complete display configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayConfig {
    /// Human-readable display name for logs
    pub name: String<MAX_NAME_LEN>,
    pub panel: PanelConfig,
    pub refresh: RefreshConfig,
    pub touch: TouchConfig,
    #[cfg_attr(feature = "serde", serde(rename = "loop"))]
    pub loop_: LoopConfig,
}

impl DisplayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.panel.width == 0 || self.panel.height == 0 {
            return Err(ConfigError::ZeroSize);
        }
        if self.panel.buffer_divisor == 0 {
            return Err(ConfigError::ZeroDivisor);
        }
        if self.loop_.tick_ms == 0 {
            return Err(ConfigError::ZeroTick);
        }
        if self.touch.enabled && self.touch.envelope().is_degenerate() {
            return Err(ConfigError::DegenerateCalibration);
        }
        Ok(())
    }
}
