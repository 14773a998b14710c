//! Pixel formats and luminance binarization

/// Pixel layout produced by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorFormat {
    /// 16-bit color, little-endian in the buffer
    Rgb565,
    /// 8-bit luminance
    L8,
}

impl ColorFormat {
    pub const fn bytes_per_pixel(&self) -> usize {
        match self {
            ColorFormat::Rgb565 => 2,
            ColorFormat::L8 => 1,
        }
    }

    /// Luminance of the pixel starting at `bytes[0]`
    ///
    /// Caller guarantees `bytes.len() >= bytes_per_pixel()`.
    #[inline]
    pub fn luma(&self, bytes: &[u8]) -> u8 {
        match self {
            ColorFormat::L8 => bytes[0],
            ColorFormat::Rgb565 => rgb565_luma(u16::from_le_bytes([bytes[0], bytes[1]])),
        }
    }
}

/// Luminance cutoff separating black from white
///
/// Values strictly below the cutoff are black.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Threshold(pub u8);

impl Threshold {
    pub const DEFAULT: Threshold = Threshold(200);

    #[inline]
    pub const fn is_black(&self, luma: u8) -> bool {
        luma < self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

pub const RGB565_BLACK: u16 = 0x0000;
pub const RGB565_WHITE: u16 = 0xFFFF;

/// Approximate Rec. 601 luminance of an RGB565 color, scaled to 0..=255
pub fn rgb565_luma(color: u16) -> u8 {
    // Expand each channel to 8 bits
    let r = u32::from((color >> 11) & 0x1F) * 255 / 31;
    let g = u32::from((color >> 5) & 0x3F) * 255 / 63;
    let b = u32::from(color & 0x1F) * 255 / 31;
    ((r * 77 + g * 150 + b * 29) >> 8) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundary() {
        let threshold = Threshold::default();
        for v in 0..=255u8 {
            assert_eq!(threshold.is_black(v), v < 200, "luma {}", v);
        }
    }

    #[test]
    fn test_rgb565_luma_extremes() {
        assert_eq!(rgb565_luma(RGB565_BLACK), 0);
        assert!(rgb565_luma(RGB565_WHITE) >= 254);
    }

    #[test]
    fn test_luma_reads_little_endian() {
        // 0xF800 (pure red) stored little-endian
        let red = [0x00, 0xF8];
        let luma = ColorFormat::Rgb565.luma(&red);
        assert!(luma > 60 && luma < 90);
        assert_eq!(ColorFormat::L8.luma(&[123]), 123);
    }

    #[test]
    fn test_bytes_per_pixel() {
        assert_eq!(ColorFormat::Rgb565.bytes_per_pixel(), 2);
        assert_eq!(ColorFormat::L8.bytes_per_pixel(), 1);
    }
}
