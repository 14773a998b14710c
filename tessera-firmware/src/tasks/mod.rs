//! Embassy async tasks
//!
//! A single task owns the display, touch and renderer state.

pub mod display;

pub use display::display_task;
