//! Color TFT panel fed over a command/data bus

use super::{required_bytes, PanelKind, PanelTransfer, TransferError, TransferOutcome};
use crate::geometry::{DirtyRect, PanelSize};
use crate::pixel::{ColorFormat, Threshold, RGB565_BLACK, RGB565_WHITE};
use crate::traits::RasterBus;

/// Pixels converted per bus write
const CHUNK_PIXELS: usize = 64;

/// Raster panel writing each rectangle synchronously
pub struct RasterPanel<B: RasterBus> {
    bus: B,
    size: PanelSize,
    threshold: Threshold,
}

impl<B: RasterBus> RasterPanel<B> {
    pub fn new(bus: B, size: PanelSize, threshold: Threshold) -> Self {
        Self {
            bus,
            size,
            threshold,
        }
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_inner(self) -> B {
        self.bus
    }

    /// Convert one pixel to big-endian RGB565
    #[inline]
    fn encode(&self, format: ColorFormat, src: &[u8]) -> [u8; 2] {
        match format {
            ColorFormat::Rgb565 => [src[1], src[0]],
            ColorFormat::L8 => {
                let color = if self.threshold.is_black(src[0]) {
                    RGB565_BLACK
                } else {
                    RGB565_WHITE
                };
                color.to_be_bytes()
            }
        }
    }
}

impl<B: RasterBus> PanelTransfer for RasterPanel<B> {
    fn size(&self) -> PanelSize {
        self.size
    }

    fn kind(&self) -> PanelKind {
        PanelKind::Raster
    }

    fn transfer(
        &mut self,
        rect: DirtyRect,
        format: ColorFormat,
        pixels: &[u8],
    ) -> Result<TransferOutcome, TransferError> {
        let needed = required_bytes(&rect, format, pixels)?;
        let bpp = format.bytes_per_pixel();

        self.bus.set_window(rect)?;

        let mut chunk = [0u8; CHUNK_PIXELS * 2];
        for src in pixels[..needed].chunks(CHUNK_PIXELS * bpp) {
            let mut len = 0;
            for px in src.chunks_exact(bpp) {
                chunk[len..len + 2].copy_from_slice(&self.encode(format, px));
                len += 2;
            }
            self.bus.write_pixels(&chunk[..len])?;
        }

        Ok(TransferOutcome::Written)
    }
}
