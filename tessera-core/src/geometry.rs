//! Panel geometry
//!
//! The renderer reports changed regions as raw signed areas. Those are only
//! turned into [`DirtyRect`]s after checking them against the panel bounds,
//! so everything downstream of the flush coordinator can index pixels
//! without further checks.

/// Panel dimensions in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelSize {
    pub width: u16,
    pub height: u16,
}

impl PanelSize {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Total number of pixels
    pub const fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Reasons a renderer area cannot be flushed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegionError {
    /// x2 < x1 or y2 < y1
    Empty,
    /// Some corner lies outside `[0, width) x [0, height)`
    OutOfBounds,
    /// The area holds more pixels than the submitted buffer
    ExceedsBuffer,
}

/// Unvalidated rectangle as reported by the renderer
///
/// Corners are inclusive, so a single pixel is `(x, y, x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Area {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Area {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Intersection of two areas, or `None` if they do not overlap
    pub fn intersect(&self, other: &Area) -> Option<Area> {
        let area = Area {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };
        (area.x1 <= area.x2 && area.y1 <= area.y2).then_some(area)
    }

    /// Smallest area covering both
    pub fn union(&self, other: &Area) -> Area {
        Area {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Check whether a point lies inside the area
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }
}

/// A validated, non-empty rectangle within the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DirtyRect {
    x1: u16,
    y1: u16,
    x2: u16,
    y2: u16,
}

impl DirtyRect {
    /// Validate a renderer area against the panel bounds
    pub fn within(area: Area, size: PanelSize) -> Result<Self, RegionError> {
        if area.x2 < area.x1 || area.y2 < area.y1 {
            return Err(RegionError::Empty);
        }
        if area.x1 < 0
            || area.y1 < 0
            || area.x2 >= i32::from(size.width)
            || area.y2 >= i32::from(size.height)
        {
            return Err(RegionError::OutOfBounds);
        }

        Ok(Self {
            x1: area.x1 as u16,
            y1: area.y1 as u16,
            x2: area.x2 as u16,
            y2: area.y2 as u16,
        })
    }

    /// The whole panel
    pub const fn full(size: PanelSize) -> Self {
        Self {
            x1: 0,
            y1: 0,
            x2: size.width.saturating_sub(1),
            y2: size.height.saturating_sub(1),
        }
    }

    pub const fn x1(&self) -> u16 {
        self.x1
    }

    pub const fn y1(&self) -> u16 {
        self.y1
    }

    pub const fn x2(&self) -> u16 {
        self.x2
    }

    pub const fn y2(&self) -> u16 {
        self.y2
    }

    pub const fn width(&self) -> u16 {
        self.x2 - self.x1 + 1
    }

    pub const fn height(&self) -> u16 {
        self.y2 - self.y1 + 1
    }

    /// Number of pixels covered
    pub const fn area(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Iterate the pixel coordinates in row-major order
    ///
    /// This matches the layout of the renderer's pixel buffer for the rect.
    pub fn points(&self) -> impl Iterator<Item = (u16, u16)> {
        let (x1, x2) = (self.x1, self.x2);
        (self.y1..=self.y2).flat_map(move |y| (x1..=x2).map(move |x| (x, y)))
    }
}

impl From<DirtyRect> for Area {
    fn from(rect: DirtyRect) -> Self {
        Area::new(
            i32::from(rect.x1),
            i32::from(rect.y1),
            i32::from(rect.x2),
            i32::from(rect.y2),
        )
    }
}
