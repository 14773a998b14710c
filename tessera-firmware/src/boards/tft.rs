//! 2.8" ILI9341 TFT with XPT2046 resistive touch
//!
//! Panel and touch controller sit on separate SPI buses.
//!
//! | Signal      | Pin    |
//! |-------------|--------|
//! | TFT SCK     | GPIO18 |
//! | TFT MOSI    | GPIO19 |
//! | TFT MISO    | GPIO16 |
//! | TFT CS      | GPIO17 |
//! | TFT DC      | GPIO20 |
//! | TFT RST     | GPIO21 |
//! | Backlight   | GPIO22 |
//! | Touch SCK   | GPIO10 |
//! | Touch MOSI  | GPIO11 |
//! | Touch MISO  | GPIO12 |
//! | Touch CS    | GPIO13 |
//! | Touch IRQ   | GPIO14 |

use defmt::*;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::{SPI0, SPI1};
use embassy_rp::spi::{self, Blocking, Spi};
use embassy_rp::Peripherals;
use embassy_time::Delay;
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use static_cell::StaticCell;

use tessera_core::config::DisplayConfig;
use tessera_core::panel::{PanelKind, RasterPanel};
use tessera_drivers::{Ili9341, Orientation, TouchRotation, Xpt2046};

use super::BoardError;

const ORIENTATION: Orientation = Orientation::Landscape;
const TOUCH_ROTATION: TouchRotation = TouchRotation::Landscape;

const TFT_HZ: u32 = 40_000_000;
const TOUCH_HZ: u32 = 2_000_000;

// Band buffer size chosen by the build script for this board
include!(concat!(env!("OUT_DIR"), "/band.rs"));

type TftSpi = ExclusiveDevice<Spi<'static, SPI0, Blocking>, Output<'static>, NoDelay>;
type TouchSpi = ExclusiveDevice<Spi<'static, SPI1, Blocking>, Output<'static>, NoDelay>;

pub type Panel = RasterPanel<Ili9341<TftSpi, Output<'static>, Output<'static>>>;
pub type Touch = Xpt2046<TouchSpi, Input<'static>>;

/// Holds the backlight pin on for the life of the firmware
static BACKLIGHT: StaticCell<Output<'static>> = StaticCell::new();

pub struct Board {
    pub panel: Panel,
    pub touch: Option<Touch>,
}

impl Board {
    pub fn setup(p: Peripherals, config: &DisplayConfig) -> Result<Self, BoardError> {
        if config.panel.kind != PanelKind::Raster {
            return Err(BoardError::KindMismatch);
        }
        let size = ORIENTATION.size();
        if config.panel.size() != size {
            return Err(BoardError::SizeMismatch);
        }

        let mut tft_config = spi::Config::default();
        tft_config.frequency = TFT_HZ;
        let bus = Spi::new_blocking(p.SPI0, p.PIN_18, p.PIN_19, p.PIN_16, tft_config);
        let cs = Output::new(p.PIN_17, Level::High);
        let spi = ExclusiveDevice::new_no_delay(bus, cs).map_err(|_| BoardError::Pin)?;
        let dc = Output::new(p.PIN_20, Level::Low);
        let rst = Output::new(p.PIN_21, Level::High);
        let mut backlight = Output::new(p.PIN_22, Level::Low);

        let mut tft = Ili9341::new(spi, dc, rst, ORIENTATION);
        tft.init(&mut Delay).map_err(BoardError::Bus)?;
        backlight.set_high();
        BACKLIGHT.init(backlight);
        info!("ILI9341 ready, {}x{}", size.width, size.height);

        let touch = if config.touch.enabled {
            let mut touch_config = spi::Config::default();
            touch_config.frequency = TOUCH_HZ;
            let bus = Spi::new_blocking(p.SPI1, p.PIN_10, p.PIN_11, p.PIN_12, touch_config);
            let cs = Output::new(p.PIN_13, Level::High);
            let spi = ExclusiveDevice::new_no_delay(bus, cs).map_err(|_| BoardError::Pin)?;
            let irq = Input::new(p.PIN_14, Pull::Up);
            info!("XPT2046 touch enabled");
            Some(Xpt2046::new(spi, irq, TOUCH_ROTATION))
        } else {
            None
        };

        Ok(Self {
            panel: RasterPanel::new(tft, size, config.panel.threshold()),
            touch,
        })
    }
}
