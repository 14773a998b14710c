//! Board wiring
//!
//! Each board module owns its pin map and builds the panel the pipeline
//! drives. The board feature is the only place a panel kind is chosen.

#[cfg(all(feature = "board-tft", feature = "board-epaper"))]
compile_error!("features `board-tft` and `board-epaper` are mutually exclusive");

#[cfg(not(any(feature = "board-tft", feature = "board-epaper")))]
compile_error!("select a board with `board-tft` or `board-epaper`");

#[cfg(feature = "board-tft")]
mod tft;
#[cfg(feature = "board-tft")]
pub use tft::{Board, Panel, Touch, BAND_BYTES};

#[cfg(feature = "board-epaper")]
mod epaper;
#[cfg(feature = "board-epaper")]
pub use epaper::{Board, Panel, Touch, BAND_BYTES};

use tessera_core::panel::TransferError;
use tessera_core::traits::BusError;

/// Board bring-up failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum BoardError {
    /// `[panel] kind` names a panel this board does not have
    KindMismatch,
    /// `[panel]` size differs from the attached panel
    SizeMismatch,
    /// Chip select could not be driven
    Pin,
    Bus(BusError),
    Transfer(TransferError),
}
