//! Widget renderer boundary

use crate::buffer::{BufferId, PoolError};
use crate::panel::PanelTransfer;
use crate::pipeline::Pipeline;
use crate::touch::PointerEvent;

/// Callback the renderer exposes to learn that a buffer may be reused
pub trait FlushReady {
    fn flush_ready(&mut self, buffer: BufferId);
}

/// Retained-mode widget renderer driven by the display loop
///
/// Calls are synchronous and happen in a fixed order each tick:
/// `pointer`, `tick_inc`, `render`.
pub trait Renderer {
    /// Deliver the pointer state sampled this tick
    fn pointer(&mut self, event: PointerEvent);

    /// Advance the renderer's clock
    fn tick_inc(&mut self, delta_ms: u32);

    /// Redraw what changed and flush it through the pipeline
    ///
    /// Only buffer pool failures are returned; they indicate a broken
    /// acquire/flush pairing and are fatal.
    fn render<P: PanelTransfer>(&mut self, pipeline: &mut Pipeline<'_, P>) -> Result<(), PoolError>;
}
