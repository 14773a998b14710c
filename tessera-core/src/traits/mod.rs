//! Hardware and renderer boundary traits
//!
//! These traits define the interface between the board-agnostic pipeline
//! and the concrete bus drivers, touch controllers and the widget renderer.

pub mod bus;
pub mod renderer;
pub mod touch;

pub use bus::{BusError, EpaperDevice, RasterBus};
pub use renderer::{FlushReady, Renderer};
pub use touch::TouchSensor;
