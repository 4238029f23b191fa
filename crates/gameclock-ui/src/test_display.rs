//! Test display that allows pixel overdraw.
//!
//! `MockDisplay` from embedded-graphics panics when a pixel is drawn twice,
//! which doesn't work for screens that clear backgrounds then draw on top.
//! This framebuffer is both a draw target and a panel flush target, so the
//! rendering port can flush into it as well.

use embedded_graphics::{
    pixelcolor::{
        raw::{RawData, RawU16},
        Rgb565,
    },
    prelude::*,
    primitives::PointsIter,
};

use cyd_panel::{Area, ErrorCode, FlushTarget};

/// Rgb565 framebuffer for render tests
pub struct TestDisplay {
    pixels: Vec<Rgb565>,
    width: u32,
    height: u32,
    swapped_input: bool,
    flushes: usize,
}

impl TestDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![Rgb565::BLACK; (width * height) as usize],
            width,
            height,
            swapped_input: false,
            flushes: 0,
        }
    }

    /// Display matching the CYD panel (240x320)
    pub fn cyd() -> Self {
        Self::new(crate::DISPLAY_WIDTH, crate::DISPLAY_HEIGHT)
    }

    /// Expect flushed pixels with their bytes swapped, as sent over SPI
    pub fn with_swapped_input(mut self) -> Self {
        self.swapped_input = true;
        self
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb565> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Number of pixels of `color`
    pub fn count(&self, color: Rgb565) -> usize {
        self.pixels.iter().filter(|&&p| p == color).count()
    }

    /// Number of flushes received
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn pixels(&self) -> &[Rgb565] {
        &self.pixels
    }
}

impl DrawTarget for TestDisplay {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if coord.x >= 0
                && coord.y >= 0
                && (coord.x as u32) < self.width
                && (coord.y as u32) < self.height
            {
                let idx = (coord.y as u32 * self.width + coord.x as u32) as usize;
                self.pixels[idx] = color;
            }
        }
        Ok(())
    }
}

impl OriginDimensions for TestDisplay {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl FlushTarget for TestDisplay {
    type Error = ErrorCode;

    fn flush(&mut self, area: Area, pixels: &[u16]) -> Result<(), ErrorCode> {
        if area.x1 as u32 > self.width || area.y1 as u32 > self.height || pixels.len() < area.pixels() {
            return Err(ErrorCode::INVALID_ARG);
        }
        let swapped = self.swapped_input;
        let points = area.to_rectangle().points();
        for (point, &raw) in points.zip(pixels) {
            let raw = if swapped { raw.swap_bytes() } else { raw };
            let idx = (point.y as u32 * self.width + point.x as u32) as usize;
            self.pixels[idx] = Rgb565::from(RawU16::new(raw));
        }
        self.flushes += 1;
        Ok(())
    }
}

/// Raw RGB565 value of `color`, as stored in a draw buffer
pub fn raw(color: Rgb565) -> u16 {
    RawU16::from(color).into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    #[test]
    fn test_display_allows_overdraw() {
        let mut display = TestDisplay::new(10, 10);

        Rectangle::new(Point::new(0, 0), Size::new(10, 10))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::WHITE))
            .draw(&mut display)
            .unwrap();
        Rectangle::new(Point::new(2, 2), Size::new(5, 5))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::RED))
            .draw(&mut display)
            .unwrap();

        assert_eq!(display.count(Rgb565::RED), 25);
        assert_eq!(display.count(Rgb565::WHITE), 75);
    }

    #[test]
    fn flush_undoes_byte_swap() {
        let mut display = TestDisplay::new(2, 2).with_swapped_input();
        let area = Area {
            x0: 0,
            y0: 1,
            x1: 2,
            y1: 2,
        };
        let red = raw(Rgb565::RED).swap_bytes();
        display.flush(area, &[red, red]).unwrap();

        assert_eq!(display.pixel(0, 1), Some(Rgb565::RED));
        assert_eq!(display.pixel(1, 1), Some(Rgb565::RED));
        assert_eq!(display.pixel(0, 0), Some(Rgb565::BLACK));
        assert_eq!(display.flushes(), 1);
    }
}
