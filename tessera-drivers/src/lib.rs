//! Hardware driver implementations
//!
//! Concrete implementations of the bus and sensor traits defined in
//! tessera-core, written against `embedded-hal` 1.0 blocking traits:
//!
//! - ILI9341 color TFT ([`RasterBus`](tessera_core::traits::RasterBus))
//! - Waveshare 7.5" V2 e-paper ([`EpaperDevice`](tessera_core::traits::EpaperDevice))
//! - XPT2046 resistive touch ([`TouchSensor`](tessera_core::traits::TouchSensor))

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod epd7in5v2;
pub mod ili9341;
pub mod xpt2046;

#[cfg(test)]
mod mock;

pub use epd7in5v2::Epd7in5V2;
pub use ili9341::{Ili9341, Orientation};
pub use xpt2046::{TouchRotation, Xpt2046};
