//! Tessera - display pipeline firmware
//!
//! Drives a color TFT or a monochrome e-paper panel from a retained-mode
//! renderer, with resistive touch on boards that have it. The panel and pin
//! map come from the selected board feature; everything else from the
//! embedded display configuration.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use static_cell::ConstStaticCell;
use {defmt_rtt as _, panic_probe as _};

use tessera_core::buffer::{BufferPool, PoolError};
use tessera_core::config::{parse_config, DisplayConfig};
use tessera_core::panel::PanelTransfer;
use tessera_core::pipeline::Pipeline;
use tessera_core::refresh::RefreshScheduler;
use tessera_core::touch::{TouchCalibrator, TouchInput};

mod boards;
mod tasks;
mod ui;

/// Display configuration validated by the build script
const EMBEDDED_CONFIG: &str = include_str!(concat!(env!("OUT_DIR"), "/display.toml"));

/// Band buffers; the second is only used with `double_buffer = true`
static BANDS: ConstStaticCell<[[u8; boards::BAND_BYTES]; 2]> =
    ConstStaticCell::new([[0; boards::BAND_BYTES]; 2]);

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Tessera firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid display configuration: {}", e);
            halt();
        }
    };
    info!(
        "Config '{}': {} panel {}x{}, divisor {}, double buffer {}",
        config.name.as_str(),
        config.panel.kind,
        config.panel.width,
        config.panel.height,
        config.panel.buffer_divisor,
        config.panel.double_buffer
    );

    let board = match boards::Board::setup(p, &config) {
        Ok(board) => board,
        Err(e) => {
            error!("Board setup failed: {}", e);
            halt();
        }
    };

    let size = board.panel.size();
    let pool = match build_pool(&config) {
        Ok(pool) => pool,
        Err(e) => {
            error!("Buffer pool setup failed: {}", e);
            halt();
        }
    };

    let scheduler = RefreshScheduler::new(
        config.refresh.min_interval_ms,
        config.refresh.sleep_when_idle,
    );
    let pipeline = Pipeline::new(pool, board.panel, scheduler);
    let registration = pipeline.registration();
    info!(
        "Pipeline ready: {} rows per band, {}",
        registration.buffer_rows, registration.format
    );

    let touch = board.touch.map(|sensor| {
        TouchInput::new(
            sensor,
            TouchCalibrator::new(config.touch.envelope(), size),
        )
    });

    let renderer = ui::DemoRenderer::new(registration);

    spawner
        .spawn(tasks::display_task(
            pipeline,
            touch,
            renderer,
            config.loop_.tick_ms,
        ))
        .unwrap();
}

fn build_pool(config: &DisplayConfig) -> Result<BufferPool<'static>, PoolError> {
    let [first, second] = BANDS.take();
    let first: &'static mut [u8] = first;
    let second: &'static mut [u8] = second;

    let size = config.panel.size();
    let format = config.panel.format();
    let divisor = config.panel.buffer_divisor;

    if config.panel.double_buffer {
        BufferPool::new([first, second], size, format, divisor)
    } else {
        BufferPool::new([first], size, format, divisor)
    }
}

/// Stop after an unrecoverable error, leaving the log readable
pub fn halt() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}
