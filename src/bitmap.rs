//! Server-side bitmaps.

use crate::error::HwError;
use kite_core::ClipRect;
use parking_lot::Mutex;
use std::sync::Arc;

/// A bitmap shared between its owner and the interface drawing into it.
pub type SharedBitmap = Arc<Mutex<ServerBitmap>>;

const OPAQUE: u32 = 0xff00_0000;

/// Pixel layouts. Both are stored as one `u32` per pixel (`0xAARRGGBB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Alpha is ignored; stored pixels are always opaque.
    Rgb32,
    Rgba32,
}

/// A block of pixels in server memory.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerBitmap {
    width: u32,
    height: u32,
    color_space: ColorSpace,
    bits: Vec<u32>,
}

impl ServerBitmap {
    /// Allocates a cleared bitmap.
    pub fn new(width: u32, height: u32, color_space: ColorSpace) -> Result<ServerBitmap, HwError> {
        if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(HwError::InvalidSize { width, height });
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(HwError::InvalidSize { width, height })?;

        let mut bits = Vec::new();
        bits.try_reserve_exact(len).map_err(|_| HwError::OutOfMemory(len))?;
        bits.resize(len, 0);

        Ok(ServerBitmap {
            width,
            height,
            color_space,
            bits,
        })
    }

    /// Wraps the bitmap for sharing.
    pub fn shared(self) -> SharedBitmap {
        Arc::new(Mutex::new(self))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    pub fn bytes_per_row(&self) -> usize {
        self.width as usize * 4
    }

    pub fn bounds(&self) -> ClipRect {
        ClipRect::with_size(self.width as i32, self.height as i32)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        if !self.bounds().contains(x, y) {
            return None;
        }
        self.bits
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn pixels(&self) -> &[u32] {
        &self.bits
    }

    /// Fills the part of `rect` inside the bitmap.
    pub fn fill_rect(&mut self, rect: ClipRect, pixel: u32) {
        let rect = match rect.intersect(&self.bounds()) {
            Some(rect) => rect,
            None => return,
        };
        let pixel = match self.color_space {
            ColorSpace::Rgb32 => pixel | OPAQUE,
            ColorSpace::Rgba32 => pixel,
        };
        let width = self.width as usize;
        for y in rect.top..rect.bottom {
            let row = y as usize * width;
            self.bits[row + rect.left as usize..row + rect.right as usize].fill(pixel);
        }
    }
}
