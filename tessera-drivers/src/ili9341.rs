//! ILI9341 240x320 color TFT over 4-wire SPI
//!
//! Runs in 16-bit RGB565 mode. Pixel data is expected in the panel's
//! big-endian order; [`RasterPanel`](tessera_core::panel::RasterPanel)
//! does that conversion.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use tessera_core::geometry::{DirtyRect, PanelSize};
use tessera_core::traits::{BusError, RasterBus};

/// ILI9341 commands
mod cmd {
    pub const SWRESET: u8 = 0x01;
    pub const SLPOUT: u8 = 0x11;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const RASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const MADCTL: u8 = 0x36;
    pub const COLMOD: u8 = 0x3A;
}

/// MADCTL bits
const MADCTL_MY: u8 = 0x80;
const MADCTL_MX: u8 = 0x40;
const MADCTL_MV: u8 = 0x20;
const MADCTL_BGR: u8 = 0x08;

/// 16 bits per pixel for both RGB and MCU interfaces
const COLMOD_RGB565: u8 = 0x55;

/// Native panel dimensions (portrait)
const NATIVE_WIDTH: u16 = 240;
const NATIVE_HEIGHT: u16 = 320;

/// Scan direction of the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    Portrait,
    Landscape,
    PortraitFlipped,
    LandscapeFlipped,
}

impl Orientation {
    fn madctl(&self) -> u8 {
        match self {
            Orientation::Portrait => MADCTL_MX | MADCTL_BGR,
            Orientation::Landscape => MADCTL_MV | MADCTL_BGR,
            Orientation::PortraitFlipped => MADCTL_MY | MADCTL_BGR,
            Orientation::LandscapeFlipped => MADCTL_MY | MADCTL_MX | MADCTL_MV | MADCTL_BGR,
        }
    }

    /// Logical size after rotation
    pub fn size(&self) -> PanelSize {
        match self {
            Orientation::Portrait | Orientation::PortraitFlipped => {
                PanelSize::new(NATIVE_WIDTH, NATIVE_HEIGHT)
            }
            Orientation::Landscape | Orientation::LandscapeFlipped => {
                PanelSize::new(NATIVE_HEIGHT, NATIVE_WIDTH)
            }
        }
    }
}

/// ILI9341 driver
///
/// `SPI` is an exclusive device with chip select handled by the bus
/// wrapper. DC selects command (low) or data (high).
pub struct Ili9341<SPI, DC, RST> {
    spi: SPI,
    dc: DC,
    rst: RST,
    orientation: Orientation,
}

impl<SPI, DC, RST> Ili9341<SPI, DC, RST>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
{
    pub fn new(spi: SPI, dc: DC, rst: RST, orientation: Orientation) -> Self {
        Self {
            spi,
            dc,
            rst,
            orientation,
        }
    }

    /// Hardware reset followed by the power-up sequence
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), BusError> {
        self.rst.set_high().map_err(|_| BusError::Pin)?;
        delay.delay_ms(5);
        self.rst.set_low().map_err(|_| BusError::Pin)?;
        delay.delay_ms(20);
        self.rst.set_high().map_err(|_| BusError::Pin)?;
        delay.delay_ms(150);

        self.command(cmd::SWRESET, &[])?;
        delay.delay_ms(150);
        self.command(cmd::SLPOUT, &[])?;
        delay.delay_ms(120);
        self.command(cmd::COLMOD, &[COLMOD_RGB565])?;
        self.command(cmd::MADCTL, &[self.orientation.madctl()])?;
        self.command(cmd::DISPON, &[])?;
        delay.delay_ms(20);
        Ok(())
    }

    pub fn set_orientation(&mut self, orientation: Orientation) -> Result<(), BusError> {
        self.orientation = orientation;
        self.command(cmd::MADCTL, &[orientation.madctl()])
    }

    pub fn size(&self) -> PanelSize {
        self.orientation.size()
    }

    fn command(&mut self, command: u8, params: &[u8]) -> Result<(), BusError> {
        self.dc.set_low().map_err(|_| BusError::Pin)?;
        self.spi
            .write(&[command])
            .map_err(|_| BusError::Communication)?;
        if !params.is_empty() {
            self.data(params)?;
        }
        Ok(())
    }

    fn data(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        self.dc.set_high().map_err(|_| BusError::Pin)?;
        self.spi.write(bytes).map_err(|_| BusError::Communication)
    }
}

impl<SPI, DC, RST> RasterBus for Ili9341<SPI, DC, RST>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
{
    fn set_window(&mut self, rect: DirtyRect) -> Result<(), BusError> {
        let [x1h, x1l] = rect.x1().to_be_bytes();
        let [x2h, x2l] = rect.x2().to_be_bytes();
        let [y1h, y1l] = rect.y1().to_be_bytes();
        let [y2h, y2l] = rect.y2().to_be_bytes();

        self.command(cmd::CASET, &[x1h, x1l, x2h, x2l])?;
        self.command(cmd::RASET, &[y1h, y1l, y2h, y2l])?;
        self.command(cmd::RAMWR, &[])
    }

    fn write_pixels(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        self.data(bytes)
    }
}
