//! Board-agnostic core of the display pipeline
//!
//! This crate contains everything between a retained-mode widget renderer
//! and the panel hardware that does not depend on a specific chip:
//!
//! - Geometry validation for renderer dirty areas
//! - Pixel formats and luminance binarization
//! - Scanline buffer pool (single or double buffered)
//! - Panel transfer variants (raster TFT, monochrome full-frame e-paper)
//! - Flush coordination and the e-paper refresh scheduler
//! - Touch calibration and pointer event generation
//! - Configuration types and the embedded config parser
//!
//! # Data flow
//!
//! ```text
//! touch ──► PointerEvent ──► renderer ──► (Area, BufferId) ──► FlushCoordinator
//!                                                                   │
//!                                     RefreshScheduler ◄── MonoPanel┤RasterPanel ──► bus
//!                                            │
//!                                            ▼
//!                                     full-frame e-paper refresh
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod flush;
pub mod geometry;
pub mod panel;
pub mod pipeline;
pub mod pixel;
pub mod refresh;
pub mod touch;
pub mod traits;

pub use buffer::{BufferId, BufferMode, BufferPool, BufferState, PoolError};
pub use flush::{FlushCoordinator, FlushError, FlushPhase, FlushReport, FlushStats};
pub use geometry::{Area, DirtyRect, PanelSize, RegionError};
pub use pipeline::{DisplayState, Pipeline, Registration};
pub use panel::{PanelKind, PanelTransfer, TransferError, TransferOutcome};
pub use pixel::{ColorFormat, Threshold};
pub use refresh::{RefreshEvent, RefreshScheduler, RefreshState, RefreshWindow};
pub use touch::{
    CalibrationEnvelope, LogicalPoint, PointerEvent, PointerState, RawPoint, TouchCalibrator,
    TouchInput,
};
