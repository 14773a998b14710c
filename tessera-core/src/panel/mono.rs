//! Monochrome e-paper panel with an off-screen 1-bit frame
//!
//! E-paper controllers only accept whole frames and a refresh takes
//! seconds, so flushed rectangles are binarized into a persistent frame
//! here and the physical update is left to the refresh scheduler.

use super::{
    required_bytes, FullFrameRefresh, PanelKind, PanelTransfer, TransferError, TransferOutcome,
};
use crate::geometry::{DirtyRect, PanelSize};
use crate::pixel::{ColorFormat, Threshold};
use crate::traits::{BusError, EpaperDevice};

/// Bytes needed for a 1-bit frame of the given size
pub const fn frame_len(size: PanelSize) -> usize {
    (size.width as usize).div_ceil(8) * size.height as usize
}

/// Whole-panel 1-bit image
///
/// Rows are packed MSB first and padded to a whole byte. A set bit is white.
pub struct FrameAccumulator<'a> {
    bytes: &'a mut [u8],
    size: PanelSize,
    stride: usize,
}

impl<'a> FrameAccumulator<'a> {
    /// Wrap `bytes` and paint it white
    pub fn new(bytes: &'a mut [u8], size: PanelSize) -> Result<Self, TransferError> {
        let len = frame_len(size);
        if bytes.len() < len {
            return Err(TransferError::ShortBuffer);
        }
        let mut frame = Self {
            bytes: &mut bytes[..len],
            size,
            stride: usize::from(size.width).div_ceil(8),
        };
        frame.fill(true);
        Ok(frame)
    }

    pub fn fill(&mut self, white: bool) {
        self.bytes.fill(if white { 0xFF } else { 0x00 });
    }

    /// Set one pixel; coordinates outside the frame are ignored
    #[inline]
    pub fn set(&mut self, x: u16, y: u16, white: bool) {
        if x >= self.size.width || y >= self.size.height {
            return;
        }
        let index = usize::from(y) * self.stride + usize::from(x) / 8;
        let mask = 0x80 >> (x % 8);
        if white {
            self.bytes[index] |= mask;
        } else {
            self.bytes[index] &= !mask;
        }
    }

    /// Whether a pixel is white; `None` outside the frame
    pub fn is_white(&self, x: u16, y: u16) -> Option<bool> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let index = usize::from(y) * self.stride + usize::from(x) / 8;
        Some(self.bytes[index] & (0x80 >> (x % 8)) != 0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes
    }

    pub fn size(&self) -> PanelSize {
        self.size
    }
}

/// E-paper panel that accumulates flushes and refreshes on demand
pub struct MonoPanel<'a, D: EpaperDevice> {
    device: D,
    frame: FrameAccumulator<'a>,
    threshold: Threshold,
    asleep: bool,
}

impl<'a, D: EpaperDevice> MonoPanel<'a, D> {
    pub fn new(
        device: D,
        frame: &'a mut [u8],
        size: PanelSize,
        threshold: Threshold,
    ) -> Result<Self, TransferError> {
        Ok(Self {
            device,
            frame: FrameAccumulator::new(frame, size)?,
            threshold,
            asleep: false,
        })
    }

    /// Initialise the controller and clear the panel to white
    pub fn start(&mut self) -> Result<(), BusError> {
        self.device.init()?;
        self.frame.fill(true);
        self.device.display(self.frame.as_bytes())
    }

    pub fn frame(&self) -> &FrameAccumulator<'a> {
        &self.frame
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: EpaperDevice> PanelTransfer for MonoPanel<'_, D> {
    fn size(&self) -> PanelSize {
        self.frame.size()
    }

    fn kind(&self) -> PanelKind {
        PanelKind::Mono
    }

    fn transfer(
        &mut self,
        rect: DirtyRect,
        format: ColorFormat,
        pixels: &[u8],
    ) -> Result<TransferOutcome, TransferError> {
        let needed = required_bytes(&rect, format, pixels)?;
        let bpp = format.bytes_per_pixel();

        for ((x, y), px) in rect.points().zip(pixels[..needed].chunks_exact(bpp)) {
            let white = !self.threshold.is_black(format.luma(px));
            self.frame.set(x, y, white);
        }

        Ok(TransferOutcome::Accumulated)
    }

    fn full_frame(&mut self) -> Option<&mut dyn FullFrameRefresh> {
        Some(self)
    }
}

impl<D: EpaperDevice> FullFrameRefresh for MonoPanel<'_, D> {
    fn refresh(&mut self) -> Result<(), BusError> {
        self.device.display(self.frame.as_bytes())
    }

    fn sleep(&mut self) -> Result<(), BusError> {
        self.device.sleep()?;
        self.asleep = true;
        Ok(())
    }

    fn wake(&mut self) -> Result<(), BusError> {
        self.device.init()?;
        self.asleep = false;
        Ok(())
    }

    fn is_asleep(&self) -> bool {
        self.asleep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Area;
    use proptest::prelude::*;

    #[derive(Default)]
    struct MockEpaper {
        inits: usize,
        displays: usize,
        sleeps: usize,
        last_frame: Vec<u8>,
    }

    impl EpaperDevice for MockEpaper {
        fn init(&mut self) -> Result<(), BusError> {
            self.inits += 1;
            Ok(())
        }

        fn display(&mut self, frame: &[u8]) -> Result<(), BusError> {
            self.displays += 1;
            self.last_frame = frame.to_vec();
            Ok(())
        }

        fn sleep(&mut self) -> Result<(), BusError> {
            self.sleeps += 1;
            Ok(())
        }
    }

    const SIZE: PanelSize = PanelSize::new(16, 4);

    #[test]
    fn test_frame_starts_white() {
        let mut bytes = [0u8; 8];
        let frame = FrameAccumulator::new(&mut bytes, SIZE).unwrap();
        assert!(frame.as_bytes().iter().all(|b| *b == 0xFF));
    }

    #[test]
    fn test_frame_msb_first() {
        let mut bytes = [0u8; 8];
        let mut frame = FrameAccumulator::new(&mut bytes, SIZE).unwrap();
        frame.set(0, 0, false);
        frame.set(9, 1, false);
        assert_eq!(frame.as_bytes()[0], 0x7F);
        assert_eq!(frame.as_bytes()[3], 0xBF);
        assert_eq!(frame.is_white(0, 0), Some(false));
        assert_eq!(frame.is_white(1, 0), Some(true));
        assert_eq!(frame.is_white(16, 0), None);
    }

    #[test]
    fn test_frame_row_padding() {
        let size = PanelSize::new(10, 2);
        assert_eq!(frame_len(size), 4);
        let mut bytes = [0u8; 4];
        let mut frame = FrameAccumulator::new(&mut bytes, size).unwrap();
        frame.set(0, 1, false);
        assert_eq!(frame.as_bytes()[2], 0x7F);
    }

    #[test]
    fn test_frame_too_small() {
        let mut bytes = [0u8; 7];
        assert!(FrameAccumulator::new(&mut bytes, SIZE).is_err());
    }

    #[test]
    fn test_transfer_accumulates_without_touching_device() {
        let mut bytes = [0u8; 8];
        let mut panel =
            MonoPanel::new(MockEpaper::default(), &mut bytes, SIZE, Threshold::default()).unwrap();
        let rect = DirtyRect::within(Area::new(0, 0, 3, 0), SIZE).unwrap();

        let outcome = panel.transfer(rect, ColorFormat::L8, &[0, 199, 200, 255]).unwrap();

        assert_eq!(outcome, TransferOutcome::Accumulated);
        assert_eq!(panel.frame().as_bytes()[0], 0b0011_1111);
        assert_eq!(panel.device_mut().displays, 0);
        assert_eq!(panel.device_mut().inits, 0);
    }

    #[test]
    fn test_rgb565_reduced_to_luma() {
        let mut bytes = [0u8; 8];
        let mut panel =
            MonoPanel::new(MockEpaper::default(), &mut bytes, SIZE, Threshold::default()).unwrap();
        let rect = DirtyRect::within(Area::new(0, 0, 1, 0), SIZE).unwrap();

        // black, white (little-endian)
        panel
            .transfer(rect, ColorFormat::Rgb565, &[0x00, 0x00, 0xFF, 0xFF])
            .unwrap();

        assert_eq!(panel.frame().is_white(0, 0), Some(false));
        assert_eq!(panel.frame().is_white(1, 0), Some(true));
    }

    #[test]
    fn test_start_clears_panel() {
        let mut bytes = [0u8; 8];
        let mut panel =
            MonoPanel::new(MockEpaper::default(), &mut bytes, SIZE, Threshold::default()).unwrap();
        panel.start().unwrap();

        let device = panel.device_mut();
        assert_eq!(device.inits, 1);
        assert_eq!(device.displays, 1);
        assert!(device.last_frame.iter().all(|b| *b == 0xFF));
    }

    #[test]
    fn test_full_frame_cycle() {
        let mut bytes = [0u8; 8];
        let mut panel =
            MonoPanel::new(MockEpaper::default(), &mut bytes, SIZE, Threshold::default()).unwrap();

        let full = panel.full_frame().unwrap();
        full.refresh().unwrap();
        full.sleep().unwrap();
        assert!(panel.is_asleep());

        panel.wake().unwrap();
        assert!(!panel.is_asleep());
        let device = panel.device_mut();
        assert_eq!((device.displays, device.sleeps, device.inits), (1, 1, 1));
    }

    proptest! {
        #[test]
        fn threshold_decides_every_luma(v in 0u8..=255) {
            let mut bytes = [0u8; 8];
            let mut panel =
                MonoPanel::new(MockEpaper::default(), &mut bytes, SIZE, Threshold::default())
                    .unwrap();
            let rect = DirtyRect::within(Area::new(5, 2, 5, 2), SIZE).unwrap();
            panel.transfer(rect, ColorFormat::L8, &[v]).unwrap();
            prop_assert_eq!(panel.frame().is_white(5, 2), Some(v >= 200));
        }
    }
}
