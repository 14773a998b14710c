//! XPT2046 resistive touch controller
//!
//! Each conversion is a control byte followed by a 16-bit read holding a
//! 12-bit sample. A touch is accepted when the pressure estimate from the
//! Z1/Z2 plates clears a threshold; X and Y are then sampled three times
//! and the two closest samples averaged.

use embedded_hal::digital::InputPin;
use embedded_hal::spi::{Operation, SpiDevice};

use tessera_core::touch::RawPoint;
use tessera_core::traits::{BusError, TouchSensor};

/// Control bytes (differential reference, 12-bit, PENIRQ disabled while sampling)
mod cmd {
    pub const X: u8 = 0x91;
    pub const Y: u8 = 0xD1;
    pub const Z1: u8 = 0xB1;
    pub const Z2: u8 = 0xC1;
    /// Last conversion; powers down and re-enables PENIRQ
    pub const Y_POWER_DOWN: u8 = 0xD0;
}

const ADC_MAX: u16 = 4095;

/// Minimum pressure estimate for a touch
pub const DEFAULT_PRESSURE_THRESHOLD: u16 = 400;

/// Mapping from controller axes to panel axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TouchRotation {
    Portrait,
    Landscape,
    PortraitFlipped,
    LandscapeFlipped,
}

impl TouchRotation {
    fn apply(&self, x: u16, y: u16) -> RawPoint {
        match self {
            TouchRotation::Portrait => RawPoint {
                x: ADC_MAX - y,
                y: x,
            },
            TouchRotation::Landscape => RawPoint { x, y },
            TouchRotation::PortraitFlipped => RawPoint {
                x: y,
                y: ADC_MAX - x,
            },
            TouchRotation::LandscapeFlipped => RawPoint {
                x: ADC_MAX - x,
                y: ADC_MAX - y,
            },
        }
    }
}

/// XPT2046 driver
///
/// `IRQ` is the active-low PENIRQ line; it is checked first so an idle
/// panel costs no SPI traffic.
pub struct Xpt2046<SPI, IRQ> {
    spi: SPI,
    irq: IRQ,
    rotation: TouchRotation,
    pressure_threshold: u16,
}

impl<SPI, IRQ> Xpt2046<SPI, IRQ>
where
    SPI: SpiDevice,
    IRQ: InputPin,
{
    pub fn new(spi: SPI, irq: IRQ, rotation: TouchRotation) -> Self {
        Self {
            spi,
            irq,
            rotation,
            pressure_threshold: DEFAULT_PRESSURE_THRESHOLD,
        }
    }

    pub fn set_pressure_threshold(&mut self, threshold: u16) {
        self.pressure_threshold = threshold;
    }

    fn convert(&mut self, command: u8) -> Result<u16, BusError> {
        let mut rx = [0u8; 2];
        self.spi
            .transaction(&mut [Operation::Write(&[command]), Operation::Read(&mut rx)])
            .map_err(|_| BusError::Communication)?;
        Ok((u16::from_be_bytes(rx) >> 3) & ADC_MAX)
    }

    /// Pressure estimate, higher is firmer
    fn pressure(&mut self) -> Result<u16, BusError> {
        let z1 = self.convert(cmd::Z1)?;
        let z2 = self.convert(cmd::Z2)?;
        Ok((z1 + ADC_MAX).saturating_sub(z2))
    }

    fn sample(&mut self) -> Result<RawPoint, BusError> {
        // First X conversion after the Z plates settle is noisy
        self.convert(cmd::X)?;

        let mut xs = [0u16; 3];
        let mut ys = [0u16; 3];
        for i in 0..3 {
            xs[i] = self.convert(cmd::X)?;
            ys[i] = if i == 2 {
                self.convert(cmd::Y_POWER_DOWN)?
            } else {
                self.convert(cmd::Y)?
            };
        }

        Ok(self
            .rotation
            .apply(best_two_average(xs), best_two_average(ys)))
    }
}

/// Average of the two closest samples
fn best_two_average([a, b, c]: [u16; 3]) -> u16 {
    let ab = a.abs_diff(b);
    let ac = a.abs_diff(c);
    let bc = b.abs_diff(c);

    if ab <= ac && ab <= bc {
        (a + b) / 2
    } else if ac <= ab && ac <= bc {
        (a + c) / 2
    } else {
        (b + c) / 2
    }
}

impl<SPI, IRQ> TouchSensor for Xpt2046<SPI, IRQ>
where
    SPI: SpiDevice,
    IRQ: InputPin,
{
    fn poll(&mut self) -> Result<Option<RawPoint>, BusError> {
        if self.irq.is_high().map_err(|_| BusError::Pin)? {
            return Ok(None);
        }
        if self.pressure()? < self.pressure_threshold {
            return Ok(None);
        }
        self.sample().map(Some)
    }
}
