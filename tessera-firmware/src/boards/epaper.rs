//! Waveshare 7.5" V2 e-paper (Pico-ePaper-7.5 pinout, no touch)
//!
//! | Signal | Pin    |
//! |--------|--------|
//! | DC     | GPIO8  |
//! | CS     | GPIO9  |
//! | CLK    | GPIO10 |
//! | DIN    | GPIO11 |
//! | RST    | GPIO12 |
//! | BUSY   | GPIO13 |

use defmt::*;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::SPI1;
use embassy_rp::spi::{self, Blocking, Spi};
use embassy_rp::Peripherals;
use embassy_time::Delay;
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use static_cell::ConstStaticCell;

use tessera_core::config::DisplayConfig;
use tessera_core::panel::{frame_len, MonoPanel, PanelKind};
use tessera_core::touch::RawPoint;
use tessera_core::traits::{BusError, TouchSensor};
use tessera_drivers::epd7in5v2::{self, Epd7in5V2};

use super::BoardError;

const EPD_HZ: u32 = 4_000_000;

// Band buffer size chosen by the build script for this board
include!(concat!(env!("OUT_DIR"), "/band.rs"));

const FRAME_LEN: usize = frame_len(epd7in5v2::SIZE);

static FRAME: ConstStaticCell<[u8; FRAME_LEN]> = ConstStaticCell::new([0; FRAME_LEN]);

type EpdSpi = ExclusiveDevice<Spi<'static, SPI1, Blocking>, Output<'static>, NoDelay>;

pub type Panel = MonoPanel<
    'static,
    Epd7in5V2<EpdSpi, Output<'static>, Output<'static>, Input<'static>, Delay>,
>;
pub type Touch = NoTouch;

/// Sensor for a board without a touch panel; never reports contact
pub struct NoTouch;

impl TouchSensor for NoTouch {
    fn poll(&mut self) -> Result<Option<RawPoint>, BusError> {
        Ok(None)
    }
}

pub struct Board {
    pub panel: Panel,
    pub touch: Option<Touch>,
}

impl Board {
    pub fn setup(p: Peripherals, config: &DisplayConfig) -> Result<Self, BoardError> {
        if config.panel.kind != PanelKind::Mono {
            return Err(BoardError::KindMismatch);
        }
        if config.panel.size() != epd7in5v2::SIZE {
            return Err(BoardError::SizeMismatch);
        }
        if config.touch.enabled {
            warn!("Touch enabled in config but this board has none");
        }

        let mut epd_config = spi::Config::default();
        epd_config.frequency = EPD_HZ;
        let bus = Spi::new_blocking_txonly(p.SPI1, p.PIN_10, p.PIN_11, epd_config);
        let cs = Output::new(p.PIN_9, Level::High);
        let spi = ExclusiveDevice::new_no_delay(bus, cs).map_err(|_| BoardError::Pin)?;
        let dc = Output::new(p.PIN_8, Level::Low);
        let rst = Output::new(p.PIN_12, Level::High);
        let busy = Input::new(p.PIN_13, Pull::None);

        let epd = Epd7in5V2::new(spi, dc, rst, busy, Delay);
        let mut panel = MonoPanel::new(
            epd,
            FRAME.take(),
            epd7in5v2::SIZE,
            config.panel.threshold(),
        )
        .map_err(BoardError::Transfer)?;

        info!("Clearing e-paper...");
        panel.start().map_err(BoardError::Bus)?;
        info!("E-paper ready, 800x480");

        Ok(Self { panel, touch: None })
    }
}
