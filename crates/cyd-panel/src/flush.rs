//! Draw buffer and flush path to the panel

use alloc::vec::Vec;
use core::fmt::Debug;

use embedded_graphics_core::geometry::{Point, Size};
use embedded_graphics_core::primitives::Rectangle;

use crate::error::ErrorCode;

/// Panel area with exclusive end coordinates, as `draw_bitmap` takes them
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Area {
    /// First column
    pub x0: u16,
    /// First row
    pub y0: u16,
    /// One past the last column
    pub x1: u16,
    /// One past the last row
    pub y1: u16,
}

impl Area {
    /// Number of pixels covered
    pub fn pixels(&self) -> usize {
        self.x1.saturating_sub(self.x0) as usize * self.y1.saturating_sub(self.y0) as usize
    }

    /// Same area as an embedded-graphics rectangle
    pub fn to_rectangle(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.x0 as i32, self.y0 as i32),
            Size::new(
                self.x1.saturating_sub(self.x0) as u32,
                self.y1.saturating_sub(self.y0) as u32,
            ),
        )
    }
}

/// Sink that pushes one band of RGB565 pixels to the panel
pub trait FlushTarget {
    /// Error type for flush operations
    type Error: Debug;

    /// Write `pixels` (row-major, `area.pixels()` long) into `area`
    fn flush(&mut self, area: Area, pixels: &[u16]) -> Result<(), Self::Error>;
}

/// Single draw buffer shared by every band of a frame
///
/// Sized `width * rows` RGB565 pixels and allocated once during bring-up.
#[derive(Debug)]
pub struct DrawBuffer {
    pixels: Vec<u16>,
    width: u16,
    rows: u16,
}

impl DrawBuffer {
    /// Allocate a buffer for `rows` full-width rows
    ///
    /// # Errors
    ///
    /// `INVALID_SIZE` for an empty buffer, `NO_MEM` when the heap cannot hold it.
    pub fn allocate(width: u16, rows: u16) -> Result<Self, ErrorCode> {
        let len = width as usize * rows as usize;
        if len == 0 {
            return Err(ErrorCode::INVALID_SIZE);
        }
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| ErrorCode::NO_MEM)?;
        pixels.resize(len, 0);
        Ok(Self {
            pixels,
            width,
            rows,
        })
    }

    /// Buffer width in pixels
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Buffer height in rows
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Length in pixels
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Always false; allocation rejects empty buffers
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Pixel storage
    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    /// Mutable pixel storage
    pub fn pixels_mut(&mut self) -> &mut [u16] {
        &mut self.pixels
    }

    /// Fill with a raw RGB565 value
    pub fn fill(&mut self, raw: u16) {
        self.pixels.fill(raw);
    }

    /// Swap the bytes of the first `len` pixels in place
    pub fn swap_bytes(&mut self, len: usize) {
        let len = len.min(self.pixels.len());
        for px in &mut self.pixels[..len] {
            *px = px.swap_bytes();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_sizes_to_width_times_rows() {
        let buffer = DrawBuffer::allocate(240, 100).unwrap();
        assert_eq!(buffer.len(), 24_000);
        assert_eq!((buffer.width(), buffer.rows()), (240, 100));
    }

    #[test]
    fn allocate_rejects_empty() {
        assert_eq!(
            DrawBuffer::allocate(240, 0).unwrap_err(),
            ErrorCode::INVALID_SIZE
        );
    }

    #[test]
    fn swap_bytes_only_touches_prefix() {
        let mut buffer = DrawBuffer::allocate(4, 1).unwrap();
        buffer.fill(0x12AB);
        buffer.swap_bytes(2);
        assert_eq!(buffer.pixels(), &[0xAB12, 0xAB12, 0x12AB, 0x12AB]);
    }

    #[test]
    fn area_pixels_and_rectangle() {
        let area = Area {
            x0: 0,
            y0: 100,
            x1: 240,
            y1: 200,
        };
        assert_eq!(area.pixels(), 24_000);
        assert_eq!(area.to_rectangle().size, Size::new(240, 100));
    }
}
