//! Pixel surfaces
//!
//! A `Canvas` is a tightly packed BGR(A) byte buffer. It is both the render
//! target and the texture source. Out-of-bounds writes are ignored and
//! out-of-bounds reads return `Color::TRANSPARENT`, so callers never need to
//! clip before touching pixels.

mod tga;

pub use tga::*;

use std::path::Path;
use crate::rasterizer::Color;

/// Bytes per pixel of a canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }

    pub fn from_bytes_per_pixel(bpp: usize) -> Option<Self> {
        match bpp {
            3 => Some(PixelFormat::Rgb),
            4 => Some(PixelFormat::Rgba),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: usize,
    height: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Canvas {
    /// Zero-filled canvas
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            data: vec![0; width * height * format.bytes_per_pixel()],
        }
    }

    /// Wrap raw BGR(A) bytes. Returns `None` if the length doesn't match.
    pub fn from_raw(width: usize, height: usize, format: PixelFormat, data: Vec<u8>) -> Option<Self> {
        if data.len() != width * height * format.bytes_per_pixel() {
            return None;
        }
        Some(Self { width, height, format, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some((y as usize * self.width + x as usize) * self.bytes_per_pixel())
    }

    /// Write a pixel. RGB canvases drop the alpha channel.
    pub fn set(&mut self, x: i32, y: i32, color: Color) {
        let Some(idx) = self.offset(x, y) else {
            return;
        };
        let bpp = self.bytes_per_pixel();
        let bytes = color.to_bgra();
        self.data[idx..idx + bpp].copy_from_slice(&bytes[..bpp]);
    }

    /// Read a pixel. RGB canvases report full opacity.
    pub fn get(&self, x: i32, y: i32) -> Color {
        let Some(idx) = self.offset(x, y) else {
            return Color::TRANSPARENT;
        };
        let alpha = match self.format {
            PixelFormat::Rgb => 255,
            PixelFormat::Rgba => self.data[idx + 3],
        };
        Color::from_bgra([self.data[idx], self.data[idx + 1], self.data[idx + 2], alpha])
    }

    pub fn fill(&mut self, color: Color) {
        let bpp = self.bytes_per_pixel();
        let bytes = color.to_bgra();
        for px in self.data.chunks_exact_mut(bpp) {
            px.copy_from_slice(&bytes[..bpp]);
        }
    }

    /// Reverse scanline order in place
    pub fn flip_vertically(&mut self) {
        let line = self.width * self.bytes_per_pixel();
        if line == 0 {
            return;
        }
        for y in 0..self.height / 2 {
            let bottom = self.height - 1 - y;
            let (head, tail) = self.data.split_at_mut(bottom * line);
            head[y * line..(y + 1) * line].swap_with_slice(&mut tail[..line]);
        }
    }

    /// Decode any format the `image` crate understands.
    /// Row 0 is the top scanline, matching what `read_tga` produces.
    pub fn from_image_file<P: AsRef<Path>>(path: P) -> Result<Self, image::ImageError> {
        let rgba = image::open(path)?.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut canvas = Canvas::new(width as usize, height as usize, PixelFormat::Rgba);
        for (x, y, p) in rgba.enumerate_pixels() {
            canvas.set(x as i32, y as i32, Color::with_alpha(p[0], p[1], p[2], p[3]));
        }
        Ok(canvas)
    }

    /// Encode with the `image` crate; the format follows the file extension.
    /// Row 0 is written as the top scanline.
    pub fn save_image<P: AsRef<Path>>(&self, path: P) -> Result<(), image::ImageError> {
        let mut out = image::RgbaImage::new(self.width as u32, self.height as u32);
        for (x, y, p) in out.enumerate_pixels_mut() {
            let c = self.get(x as i32, y as i32);
            *p = image::Rgba([c.r, c.g, c.b, c.a]);
        }
        out.save(path)
    }
}
