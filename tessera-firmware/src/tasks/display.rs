//! Display tick loop
//!
//! Per tick, in order: sample touch, hand the pointer to the renderer,
//! advance its clock, render and flush, run the e-paper refresh scheduler,
//! then sleep for the tick period.

use defmt::*;
use embassy_time::{Instant, Timer};

use tessera_core::pipeline::Pipeline;
use tessera_core::refresh::RefreshEvent;
use tessera_core::touch::{PointerEvent, PointerState, TouchInput};
use tessera_core::traits::Renderer;

use crate::boards::{Panel, Touch};
use crate::halt;
use crate::ui::DemoRenderer;

#[embassy_executor::task]
pub async fn display_task(
    mut pipeline: Pipeline<'static, Panel>,
    mut touch: Option<TouchInput<Touch>>,
    mut renderer: DemoRenderer,
    tick_ms: u32,
) {
    info!("Display task started, {} ms tick", tick_ms);

    let start = Instant::now();
    let idle = PointerEvent {
        x: 0,
        y: 0,
        state: PointerState::Released,
    };

    loop {
        let event = match touch.as_mut() {
            Some(input) => {
                let event = input.read();
                if let Some(e) = input.last_error() {
                    warn!("Touch read failed: {}", e);
                }
                event
            }
            None => idle,
        };
        if event.is_pressed() {
            debug!("Touch at {},{}", event.x, event.y);
        }

        renderer.pointer(event);
        renderer.tick_inc(tick_ms);
        if let Err(e) = renderer.render(&mut pipeline) {
            error!("Buffer pool misuse: {}", e);
            halt();
        }

        // Wrapping millisecond clock, as the scheduler expects
        let now = start.elapsed().as_millis() as u32;
        match pipeline.tick(now) {
            Ok(Some(RefreshEvent::Refreshed { at_ms })) => info!("Panel refreshed at {} ms", at_ms),
            Ok(Some(RefreshEvent::RefreshedAsleep { at_ms })) => {
                info!("Panel refreshed at {} ms, now asleep", at_ms)
            }
            Ok(None) => {}
            Err(e) => warn!("Panel refresh failed: {}", e),
        }

        Timer::after_millis(u64::from(tick_ms)).await;
    }
}
