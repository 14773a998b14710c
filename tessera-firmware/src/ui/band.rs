//! Draw target over one pool buffer
//!
//! Covers a rectangle of the panel. Pixels are packed row by row with the
//! rectangle's width as stride, which is the layout a flush expects.
//! Anything drawn outside the rectangle is discarded, so a full scene can be
//! drawn into every band.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::{IntoStorage, Rgb565};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use tessera_core::geometry::{Area, PanelSize};
use tessera_core::pixel::{rgb565_luma, ColorFormat};

pub struct BandTarget<'a> {
    pixels: &'a mut [u8],
    area: Area,
    format: ColorFormat,
    panel: PanelSize,
}

impl<'a> BandTarget<'a> {
    /// `area` must lie within the panel and fit in `pixels`
    pub fn new(pixels: &'a mut [u8], area: Area, format: ColorFormat, panel: PanelSize) -> Self {
        Self {
            pixels,
            area,
            format,
            panel,
        }
    }

    fn width(&self) -> usize {
        (self.area.x2 - self.area.x1 + 1) as usize
    }

    fn offset(&self, point: Point) -> Option<usize> {
        if !self.area.contains(point.x, point.y) {
            return None;
        }
        let col = (point.x - self.area.x1) as usize;
        let row = (point.y - self.area.y1) as usize;
        Some((row * self.width() + col) * self.format.bytes_per_pixel())
    }

    fn encode(&self, color: Rgb565) -> [u8; 2] {
        match self.format {
            ColorFormat::Rgb565 => color.into_storage().to_le_bytes(),
            ColorFormat::L8 => [rgb565_luma(color.into_storage()), 0],
        }
    }
}

impl OriginDimensions for BandTarget<'_> {
    fn size(&self) -> Size {
        Size::new(u32::from(self.panel.width), u32::from(self.panel.height))
    }
}

impl DrawTarget for BandTarget<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bpp = self.format.bytes_per_pixel();
        for Pixel(point, color) in pixels {
            if let Some(offset) = self.offset(point) {
                let bytes = self.encode(color);
                if let Some(dst) = self.pixels.get_mut(offset..offset + bpp) {
                    dst.copy_from_slice(&bytes[..bpp]);
                }
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let band = Rectangle::with_corners(
            Point::new(self.area.x1, self.area.y1),
            Point::new(self.area.x2, self.area.y2),
        );
        let clipped = area.intersection(&band);
        let Some(bottom_right) = clipped.bottom_right() else {
            return Ok(());
        };

        let bpp = self.format.bytes_per_pixel();
        let bytes = self.encode(color);
        let run = clipped.size.width as usize * bpp;
        for y in clipped.top_left.y..=bottom_right.y {
            let Some(start) = self.offset(Point::new(clipped.top_left.x, y)) else {
                continue;
            };
            if let Some(row) = self.pixels.get_mut(start..start + run) {
                for px in row.chunks_exact_mut(bpp) {
                    px.copy_from_slice(&bytes[..bpp]);
                }
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let bounds = self.bounding_box();
        self.fill_solid(&bounds, color)
    }
}
