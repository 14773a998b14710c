//! Retained-mode demo renderer
//!
//! Tracks one dirty area, grown by touches and the once-a-second uptime
//! label. On render the area is cut into bands that fit a pool buffer; each
//! band gets the whole scene drawn clipped to it and is flushed.

use defmt::*;
use embedded_graphics::prelude::Point;

use tessera_core::buffer::{BufferId, PoolError};
use tessera_core::flush::FlushError;
use tessera_core::geometry::Area;
use tessera_core::panel::PanelTransfer;
use tessera_core::pipeline::{Pipeline, Registration};
use tessera_core::touch::PointerEvent;
use tessera_core::traits::{FlushReady, Renderer};

use super::band::BandTarget;
use super::screens::{self, area_of, Layout, Scene, ScreenId};

pub struct DemoRenderer {
    registration: Registration,
    layout: Layout,
    screen: ScreenId,
    uptime_ms: u32,
    shown_s: u32,
    taps: u32,
    last_touch: Option<(u16, u16)>,
    pressed: bool,
    dirty: Option<Area>,
    acked: u32,
}

impl DemoRenderer {
    pub fn new(registration: Registration) -> Self {
        let layout = Layout::new(registration.size);
        Self {
            registration,
            layout,
            screen: ScreenId::Main,
            uptime_ms: 0,
            shown_s: 0,
            taps: 0,
            last_touch: None,
            pressed: false,
            dirty: Some(area_of(layout.full())),
            acked: 0,
        }
    }

    fn invalidate(&mut self, area: Area) {
        self.dirty = Some(match self.dirty {
            Some(dirty) => dirty.union(&area),
            None => area,
        });
    }

    fn scene(&self) -> Scene {
        Scene {
            screen: self.screen,
            uptime_s: self.shown_s,
            taps: self.taps,
            last_touch: self.last_touch,
        }
    }

    /// Press handling, switched on the current screen
    fn on_press(&mut self, x: u16, y: u16) {
        let point = Point::new(i32::from(x), i32::from(y));
        if let Some(target) = self.layout.hit_tab(point) {
            if target != self.screen {
                debug!("Screen {} -> {}", self.screen, target);
                self.screen = target;
                self.invalidate(area_of(self.layout.full()));
            }
            return;
        }

        match self.screen {
            ScreenId::Main => {}
            ScreenId::Screen1 => {
                self.taps = self.taps.wrapping_add(1);
                self.invalidate(area_of(self.layout.detail()));
            }
            ScreenId::Screen2 => {
                self.last_touch = Some((x, y));
                self.invalidate(area_of(self.layout.detail()));
            }
        }
    }

    /// Rows of `width` pixels that fit one pool buffer
    fn band_rows(&self, width: usize) -> i32 {
        let capacity =
            usize::from(self.registration.size.width) * usize::from(self.registration.buffer_rows);
        (capacity / width.max(1)).max(1) as i32
    }
}

impl FlushReady for DemoRenderer {
    fn flush_ready(&mut self, _buffer: BufferId) {
        self.acked = self.acked.wrapping_add(1);
    }
}

impl Renderer for DemoRenderer {
    fn pointer(&mut self, event: PointerEvent) {
        // Logical coordinates start at 1
        if event.is_pressed() && !self.pressed {
            self.on_press(event.x.saturating_sub(1), event.y.saturating_sub(1));
        }
        self.pressed = event.is_pressed();
    }

    fn tick_inc(&mut self, delta_ms: u32) {
        self.uptime_ms = self.uptime_ms.wrapping_add(delta_ms);
        let seconds = self.uptime_ms / 1000;
        if seconds != self.shown_s {
            self.shown_s = seconds;
            self.invalidate(area_of(self.layout.uptime()));
        }
    }

    fn render<P: PanelTransfer>(&mut self, pipeline: &mut Pipeline<'_, P>) -> Result<(), PoolError> {
        let Some(dirty) = self.dirty.take() else {
            return Ok(());
        };

        let rows = self.band_rows((dirty.x2 - dirty.x1 + 1) as usize);
        let scene = self.scene();

        let mut y = dirty.y1;
        while y <= dirty.y2 {
            let band = Area::new(dirty.x1, y, dirty.x2, (y + rows - 1).min(dirty.y2));

            let id = pipeline.acquire()?;
            let pixels = pipeline.pixels_mut(id)?;
            let mut target = BandTarget::new(
                pixels,
                band,
                self.registration.format,
                self.registration.size,
            );
            if let Err(never) = screens::draw(&mut target, &self.layout, &scene) {
                match never {}
            }

            match pipeline.flush(band, id, self) {
                Ok(report) => trace!("Flushed {} ({})", band.y1, report.outcome),
                Err(FlushError::Pool(e)) => return Err(e),
                Err(e) => warn!("Flush of rows {}..={} failed: {}", band.y1, band.y2, e),
            }

            y = band.y2 + 1;
        }

        trace!("{} bands acknowledged", self.acked);
        Ok(())
    }
}
