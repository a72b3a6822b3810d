//! CPU frame buffers handed to filter backends.

use crate::error::{MontageError, Result};

/// A tightly packed 8-bit RGBA frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Bytes per RGBA8 pixel.
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Create a transparent black frame.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * Self::BYTES_PER_PIXEL],
        }
    }

    /// Wrap existing RGBA8 pixel data.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * Self::BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(MontageError::InvalidParameter(format!(
                "frame data is {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a frame filled with one color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * Self::BYTES_PER_PIXEL)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw pixel bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Read the pixel at (x, y), if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * Self::BYTES_PER_PIXEL;
        let px = &self.data[idx..idx + Self::BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }
}
