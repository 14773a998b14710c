//! Demo screens
//!
//! Three screens share one layout: a title bar, an uptime label, a detail
//! line whose content depends on the screen, and a row of navigation tabs.

use core::fmt::{self, Write};

use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, PrimitiveStyleBuilder, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use heapless::String;

use tessera_core::geometry::{Area, PanelSize};

const HEADER_HEIGHT: u32 = 32;
const LINE_HEIGHT: u32 = 28;
const NAV_HEIGHT: u32 = 48;
const MARGIN: i32 = 8;

const HEADER_COLOR: Rgb565 = Rgb565::new(0, 12, 20);

const LINE_CAPACITY: usize = 32;

/// Widest text line a scene can produce
const LONGEST_LINE: &str = "Last touch: 65535,65535";

const _: () = assert!(LONGEST_LINE.len() <= LINE_CAPACITY);

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum ScreenId {
    Main,
    Screen1,
    Screen2,
}

impl ScreenId {
    pub const ALL: [ScreenId; 3] = [ScreenId::Main, ScreenId::Screen1, ScreenId::Screen2];

    pub fn title(self) -> &'static str {
        match self {
            ScreenId::Main => "Main",
            ScreenId::Screen1 => "Screen 1",
            ScreenId::Screen2 => "Screen 2",
        }
    }
}

/// Everything a screen shows
#[derive(Debug, Clone, Copy)]
pub struct Scene {
    pub screen: ScreenId,
    pub uptime_s: u32,
    pub taps: u32,
    pub last_touch: Option<(u16, u16)>,
}

/// Screen regions for a panel size
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    size: Size,
}

impl Layout {
    pub fn new(panel: PanelSize) -> Self {
        Self {
            size: Size::new(u32::from(panel.width), u32::from(panel.height)),
        }
    }

    pub fn full(&self) -> Rectangle {
        Rectangle::new(Point::zero(), self.size)
    }

    fn header(&self) -> Rectangle {
        Rectangle::new(Point::zero(), Size::new(self.size.width, HEADER_HEIGHT))
    }

    pub fn uptime(&self) -> Rectangle {
        Rectangle::new(
            Point::new(0, HEADER_HEIGHT as i32 + MARGIN),
            Size::new(self.size.width, LINE_HEIGHT),
        )
    }

    pub fn detail(&self) -> Rectangle {
        Rectangle::new(
            Point::new(0, (HEADER_HEIGHT + LINE_HEIGHT) as i32 + 2 * MARGIN),
            Size::new(self.size.width, LINE_HEIGHT),
        )
    }

    fn tab(&self, index: usize) -> Rectangle {
        let count = ScreenId::ALL.len() as u32;
        let width = self.size.width / count;
        let top = self.size.height.saturating_sub(NAV_HEIGHT) as i32;
        Rectangle::new(
            Point::new(width as i32 * index as i32, top),
            Size::new(width, NAV_HEIGHT),
        )
        .offset(-4)
    }

    /// Tab under `point`, if any
    pub fn hit_tab(&self, point: Point) -> Option<ScreenId> {
        ScreenId::ALL
            .iter()
            .enumerate()
            .find(|(i, _)| self.tab(*i).contains(point))
            .map(|(_, id)| *id)
    }
}

/// Convert a drawing rectangle to a flush area
pub fn area_of(rect: Rectangle) -> Area {
    let bottom_right = rect.bottom_right().unwrap_or(rect.top_left);
    Area::new(rect.top_left.x, rect.top_left.y, bottom_right.x, bottom_right.y)
}

pub fn draw<D>(target: &mut D, layout: &Layout, scene: &Scene) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let text = MonoTextStyle::new(&FONT_10X20, Rgb565::BLACK);
    let inverse = MonoTextStyle::new(&FONT_10X20, Rgb565::WHITE);

    target.clear(Rgb565::WHITE)?;

    layout
        .header()
        .into_styled(PrimitiveStyle::with_fill(HEADER_COLOR))
        .draw(target)?;
    Text::with_baseline(
        scene.screen.title(),
        Point::new(MARGIN, 6),
        inverse,
        Baseline::Top,
    )
    .draw(target)?;

    let line = format_line(format_args!("Uptime {} s", scene.uptime_s));
    Text::with_baseline(&line, layout.uptime().top_left + Point::new(MARGIN, 4), text, Baseline::Top)
        .draw(target)?;

    let line = match scene.screen {
        ScreenId::Main => format_line(format_args!("Tap a tab to switch")),
        ScreenId::Screen1 => format_line(format_args!("Taps: {}", scene.taps)),
        ScreenId::Screen2 => match scene.last_touch {
            Some((x, y)) => format_line(format_args!("Last touch: {},{}", x, y)),
            None => format_line(format_args!("Last touch: none")),
        },
    };
    Text::with_baseline(&line, layout.detail().top_left + Point::new(MARGIN, 4), text, Baseline::Top)
        .draw(target)?;

    draw_tabs(target, layout, scene.screen)
}

fn format_line(args: fmt::Arguments<'_>) -> String<LINE_CAPACITY> {
    let mut line = String::new();
    let written = line.write_fmt(args);
    debug_assert!(written.is_ok(), "text line longer than {} bytes", LINE_CAPACITY);
    line
}

fn draw_tabs<D>(target: &mut D, layout: &Layout, current: ScreenId) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let centered = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build();

    for (i, id) in ScreenId::ALL.iter().enumerate() {
        let tab = layout.tab(i);
        let active = *id == current;

        let (fill, ink) = if active {
            (Rgb565::BLACK, Rgb565::WHITE)
        } else {
            (Rgb565::WHITE, Rgb565::BLACK)
        };
        let style = PrimitiveStyleBuilder::new()
            .fill_color(fill)
            .stroke_color(Rgb565::BLACK)
            .stroke_width(2)
            .build();

        tab.into_styled(style).draw(target)?;
        Text::with_text_style(
            id.title(),
            tab.center(),
            MonoTextStyle::new(&FONT_10X20, ink),
            centered,
        )
        .draw(target)?;
    }
    Ok(())
}
