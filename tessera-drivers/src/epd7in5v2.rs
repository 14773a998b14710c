//! Waveshare 7.5" V2 e-paper (800x480, black/white)
//!
//! The controller keeps two frame planes. A full update writes the previous
//! frame to the "old" plane (0x10), the new frame inverted to the "new"
//! plane (0x13), and triggers a refresh that takes several seconds.
//! BUSY is low while the controller works.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;

use tessera_core::geometry::PanelSize;
use tessera_core::panel::frame_len;
use tessera_core::traits::{BusError, EpaperDevice};

mod cmd {
    pub const PANEL_SETTING: u8 = 0x00;
    pub const POWER_SETTING: u8 = 0x01;
    pub const POWER_OFF: u8 = 0x02;
    pub const POWER_ON: u8 = 0x04;
    pub const BOOSTER_SOFT_START: u8 = 0x06;
    pub const DEEP_SLEEP: u8 = 0x07;
    pub const DATA_START_OLD: u8 = 0x10;
    pub const DISPLAY_REFRESH: u8 = 0x12;
    pub const DATA_START_NEW: u8 = 0x13;
    pub const DUAL_SPI: u8 = 0x15;
    pub const VCOM_DATA_INTERVAL: u8 = 0x50;
    pub const TCON_SETTING: u8 = 0x60;
    pub const RESOLUTION: u8 = 0x61;
    pub const GET_STATUS: u8 = 0x71;
}

const DEEP_SLEEP_CHECK: u8 = 0xA5;

pub const WIDTH: u16 = 800;
pub const HEIGHT: u16 = 480;
pub const SIZE: PanelSize = PanelSize::new(WIDTH, HEIGHT);

/// Longest a busy phase may take before giving up
const BUSY_TIMEOUT_MS: u32 = 20_000;
const BUSY_POLL_MS: u32 = 10;

/// Bytes inverted per SPI write of the new plane
const CHUNK: usize = 64;

/// Waveshare 7.5" V2 driver
pub struct Epd7in5V2<SPI, DC, RST, BUSY, D> {
    spi: SPI,
    dc: DC,
    rst: RST,
    busy: BUSY,
    delay: D,
}

impl<SPI, DC, RST, BUSY, D> Epd7in5V2<SPI, DC, RST, BUSY, D>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
    D: DelayNs,
{
    pub fn new(spi: SPI, dc: DC, rst: RST, busy: BUSY, delay: D) -> Self {
        Self {
            spi,
            dc,
            rst,
            busy,
            delay,
        }
    }

    fn reset(&mut self) -> Result<(), BusError> {
        self.rst.set_high().map_err(|_| BusError::Pin)?;
        self.delay.delay_ms(20);
        self.rst.set_low().map_err(|_| BusError::Pin)?;
        self.delay.delay_ms(2);
        self.rst.set_high().map_err(|_| BusError::Pin)?;
        self.delay.delay_ms(20);
        Ok(())
    }

    /// Poll until BUSY goes high, querying status so the line updates
    fn wait_until_idle(&mut self) -> Result<(), BusError> {
        let mut waited = 0;
        loop {
            self.command(cmd::GET_STATUS, &[])?;
            if self.busy.is_high().map_err(|_| BusError::Pin)? {
                return Ok(());
            }
            if waited >= BUSY_TIMEOUT_MS {
                return Err(BusError::Timeout);
            }
            self.delay.delay_ms(BUSY_POLL_MS);
            waited += BUSY_POLL_MS;
        }
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

impl<SPI, DC, RST, BUSY, D> EpaperDevice for Epd7in5V2<SPI, DC, RST, BUSY, D>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
    D: DelayNs,
{
    fn init(&mut self) -> Result<(), BusError> {
        self.reset()?;

        self.command(cmd::BOOSTER_SOFT_START, &[0x17, 0x17, 0x28, 0x17])?;
        // VGH=20V, VGL=-20V, VDH=15V, VDL=-15V
        self.command(cmd::POWER_SETTING, &[0x07, 0x07, 0x3F, 0x3F])?;
        self.command(cmd::POWER_ON, &[])?;
        self.delay.delay_ms(100);
        self.wait_until_idle()?;

        // KW mode, scan up, shift right
        self.command(cmd::PANEL_SETTING, &[0x1F])?;
        let [wh, wl] = WIDTH.to_be_bytes();
        let [hh, hl] = HEIGHT.to_be_bytes();
        self.command(cmd::RESOLUTION, &[wh, wl, hh, hl])?;
        self.command(cmd::DUAL_SPI, &[0x00])?;
        self.command(cmd::VCOM_DATA_INTERVAL, &[0x10, 0x07])?;
        self.command(cmd::TCON_SETTING, &[0x22])
    }

    fn display(&mut self, frame: &[u8]) -> Result<(), BusError> {
        let len = frame_len(SIZE);
        let frame = frame.get(..len).ok_or(BusError::Communication)?;

        self.command(cmd::DATA_START_OLD, frame)?;

        self.command(cmd::DATA_START_NEW, &[])?;
        let mut inverted = [0u8; CHUNK];
        for chunk in frame.chunks(CHUNK) {
            for (dst, src) in inverted.iter_mut().zip(chunk) {
                *dst = !src;
            }
            self.data(&inverted[..chunk.len()])?;
        }

        self.command(cmd::DISPLAY_REFRESH, &[])?;
        self.delay.delay_ms(100);
        self.wait_until_idle()
    }

    fn sleep(&mut self) -> Result<(), BusError> {
        self.command(cmd::POWER_OFF, &[])?;
        self.wait_until_idle()?;
        self.command(cmd::DEEP_SLEEP, &[DEEP_SLEEP_CHECK])
    }
}
