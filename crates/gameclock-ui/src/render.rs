//! Layout and drawing of a screen's widget tree.
//!
//! Layout is recomputed on every frame; the trees are a handful of widgets.
//! Drawing goes through any Rgb565 [`DrawTarget`], including [`BandTarget`],
//! which clips to one draw-buffer band of the panel.

use core::convert::Infallible;

use embedded_graphics::{
    mono_font::{ascii::FONT_10X20, MonoFont, MonoTextStyle},
    pixelcolor::{
        raw::{RawData, RawU16},
        Rgb565,
    },
    prelude::*,
    primitives::{PrimitiveStyleBuilder, Rectangle, RoundedRectangle, StrokeAlignment},
    text::{Baseline, Text},
};

use crate::style::{ComputedStyle, Edges, StyleRegistry};
use crate::widget::{Layout, ScreenHandle, SizeSpec, WidgetId, WidgetTree};

/// Font used for every label
pub const FONT: &MonoFont<'static> = &FONT_10X20;

/// Where one widget ended up and what it is drawn with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub id: WidgetId,
    pub rect: Rectangle,
    pub style: ComputedStyle,
}

/// Lay out the tree under `root` inside `area`, parents before children
pub fn layout(
    tree: &WidgetTree,
    styles: &StyleRegistry,
    root: ScreenHandle,
    area: Rectangle,
) -> Vec<Placement> {
    let mut out = Vec::new();
    place(tree, styles, root.id(), area, &mut out);
    out
}

/// Draw the screen under `root` with its top-left corner at `offset`
pub fn draw_screen<D>(
    tree: &WidgetTree,
    styles: &StyleRegistry,
    root: ScreenHandle,
    offset: Point,
    size: Size,
    target: &mut D,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    for placement in layout(tree, styles, root, Rectangle::new(offset, size)) {
        draw_widget(tree, &placement, target)?;
    }
    Ok(())
}

/// Pixel size of `text` in [`FONT`]
pub fn text_size(text: &str) -> Size {
    let chars = text.chars().count() as u32;
    let glyph = FONT.character_size;
    if chars == 0 {
        return Size::new(0, glyph.height);
    }
    Size::new(
        chars * glyph.width + (chars - 1) * FONT.character_spacing,
        glyph.height,
    )
}

fn px(value: i32) -> u32 {
    value.max(0) as u32
}

fn inset(rect: Rectangle, pad: Edges) -> Rectangle {
    Rectangle::new(
        rect.top_left + Point::new(pad.left as i32, pad.top as i32),
        Size::new(
            rect.size.width.saturating_sub(px(pad.horizontal())),
            rect.size.height.saturating_sub(px(pad.vertical())),
        ),
    )
}

fn place(
    tree: &WidgetTree,
    styles: &StyleRegistry,
    id: WidgetId,
    rect: Rectangle,
    out: &mut Vec<Placement>,
) {
    let (Some(widget), Some(style)) = (tree.get(id), tree.resolve_style(id, styles)) else {
        return;
    };
    out.push(Placement { id, rect, style });

    let content = inset(rect, style.pad);
    let mut y = content.top_left.y;
    for &child in widget.children() {
        let Some(child_style) = tree.resolve_style(child, styles) else {
            continue;
        };
        let size = outer_size(tree, styles, child, &child_style, content.size);
        let top_left = match widget.layout() {
            Layout::FlexColumn => {
                let top_left = Point::new(
                    content.top_left.x + child_style.margin.left as i32,
                    y + child_style.margin.top as i32,
                );
                y += child_style.margin.vertical() + size.height as i32 + style.pad_row as i32;
                top_left
            }
            Layout::Center => Point::new(
                content.top_left.x + (content.size.width as i32 - size.width as i32) / 2,
                content.top_left.y + (content.size.height as i32 - size.height as i32) / 2,
            ),
        };
        place(tree, styles, child, Rectangle::new(top_left, size), out);
    }
}

/// Size of `id` given its parent's content box
fn outer_size(
    tree: &WidgetTree,
    styles: &StyleRegistry,
    id: WidgetId,
    style: &ComputedStyle,
    parent_content: Size,
) -> Size {
    let Some(widget) = tree.get(id) else {
        return Size::zero();
    };
    let (width, height) = widget.size();
    let width = match width {
        SizeSpec::Px(n) => n as u32,
        SizeSpec::Pct(pct) => (parent_content.width * pct as u32 / 100)
            .saturating_sub(px(style.margin.horizontal())),
        SizeSpec::Content => content_size(tree, styles, id, style).width,
    };
    let height = match height {
        SizeSpec::Px(n) => n as u32,
        SizeSpec::Pct(pct) => (parent_content.height * pct as u32 / 100)
            .saturating_sub(px(style.margin.vertical())),
        SizeSpec::Content => content_size(tree, styles, id, style).height,
    };
    Size::new(width, height)
}

fn content_size(tree: &WidgetTree, styles: &StyleRegistry, id: WidgetId, style: &ComputedStyle) -> Size {
    let Some(widget) = tree.get(id) else {
        return Size::zero();
    };
    if let Some(text) = widget.text() {
        return text_size(text);
    }

    let (mut width, mut height) = (0u32, 0u32);
    for (i, &child) in widget.children().iter().enumerate() {
        let Some(child_style) = tree.resolve_style(child, styles) else {
            continue;
        };
        let size = outer_size(tree, styles, child, &child_style, Size::zero());
        let outer_w = size.width + px(child_style.margin.horizontal());
        let outer_h = size.height + px(child_style.margin.vertical());
        width = width.max(outer_w);
        match widget.layout() {
            Layout::Center => height = height.max(outer_h),
            Layout::FlexColumn => {
                height += outer_h;
                if i > 0 {
                    height += px(style.pad_row as i32);
                }
            }
        }
    }
    Size::new(
        width + px(style.pad.horizontal()),
        height + px(style.pad.vertical()),
    )
}

fn draw_widget<D>(tree: &WidgetTree, placement: &Placement, target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let Some(widget) = tree.get(placement.id) else {
        return Ok(());
    };
    let style = &placement.style;

    let fill = style.bg_opa.is_visible();
    let border = style.border_width > 0 && style.border_opa.is_visible();
    if fill || border {
        let mut primitive = PrimitiveStyleBuilder::new();
        if fill {
            primitive = primitive.fill_color(Rgb565::from(style.bg_color));
        }
        if border {
            primitive = primitive
                .stroke_color(Rgb565::from(style.border_color))
                .stroke_width(style.border_width as u32)
                .stroke_alignment(StrokeAlignment::Inside);
        }
        let max_radius = placement.rect.size.width.min(placement.rect.size.height) / 2;
        let radius = (style.radius as u32).min(max_radius);
        RoundedRectangle::with_equal_corners(placement.rect, Size::new(radius, radius))
            .into_styled(primitive.build())
            .draw(target)?;
    }

    if let Some(text) = widget.text() {
        let text_style = MonoTextStyle::new(FONT, Rgb565::from(style.text_color));
        Text::with_baseline(text, placement.rect.top_left, text_style, Baseline::Top).draw(target)?;
    }
    Ok(())
}

/// Draw target covering `rows` full-width rows of the panel starting at `top`
///
/// Pixels outside the band are dropped. Stored as native-endian RGB565.
pub struct BandTarget<'a> {
    pixels: &'a mut [u16],
    width: u32,
    top: i32,
    rows: u32,
    screen: Size,
}

impl<'a> BandTarget<'a> {
    pub fn new(pixels: &'a mut [u16], width: u16, top: u16, rows: u16, screen: Size) -> Self {
        Self {
            pixels,
            width: width as u32,
            top: top as i32,
            rows: rows as u32,
            screen,
        }
    }

    fn index(&self, point: Point) -> Option<usize> {
        let row = point.y - self.top;
        if point.x < 0 || point.x as u32 >= self.width || row < 0 || row as u32 >= self.rows {
            return None;
        }
        let index = row as usize * self.width as usize + point.x as usize;
        (index < self.pixels.len()).then_some(index)
    }
}

impl DrawTarget for BandTarget<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(index) = self.index(point) {
                self.pixels[index] = RawU16::from(color).into_inner();
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let raw = RawU16::from(color).into_inner();
        let x0 = area.top_left.x.max(0);
        let x1 = (area.top_left.x + area.size.width as i32).min(self.width as i32);
        let y0 = area.top_left.y.max(self.top);
        let y1 = (area.top_left.y + area.size.height as i32).min(self.top + self.rows as i32);
        for y in y0..y1 {
            for x in x0..x1 {
                if let Some(index) = self.index(Point::new(x, y)) {
                    self.pixels[index] = raw;
                }
            }
        }
        Ok(())
    }
}

impl OriginDimensions for BandTarget<'_> {
    fn size(&self) -> Size {
        self.screen
    }
}
