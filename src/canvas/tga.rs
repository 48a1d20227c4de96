//! Uncompressed true-color TGA reading and writing
//!
//! Only image type 2 with 24 or 32 bits per pixel is supported. Files are
//! always written with the top-left origin bit set; on read, bottom-origin
//! files are flipped so that row 0 in memory is always the first stored
//! top scanline.

use std::fs;
use std::path::Path;

use super::{Canvas, PixelFormat};

const HEADER_LEN: usize = 18;
const TRUE_COLOR: u8 = 2;
const TOP_ORIGIN: u8 = 0x20;

/// Error type for TGA reading and writing
#[derive(Debug, thiserror::Error)]
pub enum TgaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported image type {0} (only uncompressed true-color is supported)")]
    UnsupportedImageType(u8),
    #[error("unsupported pixel depth {0} (expected 24 or 32)")]
    UnsupportedDepth(u8),
    #[error("file is truncated")]
    Truncated,
    #[error("{width}x{height} does not fit a TGA header")]
    TooLarge { width: usize, height: usize },
}

/// The fixed 18-byte header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Header {
    id_length: u8,
    color_map_type: u8,
    image_type: u8,
    color_map_origin: u16,
    color_map_length: u16,
    color_map_depth: u8,
    x_origin: u16,
    y_origin: u16,
    width: u16,
    height: u16,
    bits_per_pixel: u8,
    descriptor: u8,
}

impl Header {
    fn parse(b: &[u8]) -> Result<Self, TgaError> {
        if b.len() < HEADER_LEN {
            return Err(TgaError::Truncated);
        }
        let u16_at = |i: usize| u16::from_le_bytes([b[i], b[i + 1]]);
        Ok(Self {
            id_length: b[0],
            color_map_type: b[1],
            image_type: b[2],
            color_map_origin: u16_at(3),
            color_map_length: u16_at(5),
            color_map_depth: b[7],
            x_origin: u16_at(8),
            y_origin: u16_at(10),
            width: u16_at(12),
            height: u16_at(14),
            bits_per_pixel: b[16],
            descriptor: b[17],
        })
    }

    fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut b = [0u8; HEADER_LEN];
        b[0] = self.id_length;
        b[1] = self.color_map_type;
        b[2] = self.image_type;
        b[3..5].copy_from_slice(&self.color_map_origin.to_le_bytes());
        b[5..7].copy_from_slice(&self.color_map_length.to_le_bytes());
        b[7] = self.color_map_depth;
        b[8..10].copy_from_slice(&self.x_origin.to_le_bytes());
        b[10..12].copy_from_slice(&self.y_origin.to_le_bytes());
        b[12..14].copy_from_slice(&self.width.to_le_bytes());
        b[14..16].copy_from_slice(&self.height.to_le_bytes());
        b[16] = self.bits_per_pixel;
        b[17] = self.descriptor;
        b
    }

    /// Bytes of color map data between the image id and the pixels
    fn color_map_bytes(&self) -> usize {
        if self.color_map_type == 0 {
            return 0;
        }
        self.color_map_length as usize * (self.color_map_depth as usize).div_ceil(8)
    }
}

/// Parse a TGA image from memory
pub fn decode_tga(bytes: &[u8]) -> Result<Canvas, TgaError> {
    let header = Header::parse(bytes)?;

    if header.image_type != TRUE_COLOR {
        return Err(TgaError::UnsupportedImageType(header.image_type));
    }
    let format = PixelFormat::from_bytes_per_pixel(header.bits_per_pixel as usize / 8)
        .filter(|_| header.bits_per_pixel % 8 == 0)
        .ok_or(TgaError::UnsupportedDepth(header.bits_per_pixel))?;

    let width = header.width as usize;
    let height = header.height as usize;
    let start = HEADER_LEN + header.id_length as usize + header.color_map_bytes();
    let len = width * height * format.bytes_per_pixel();

    let pixels = bytes.get(start..start + len).ok_or(TgaError::Truncated)?;
    let mut canvas = Canvas::from_raw(width, height, format, pixels.to_vec())
        .ok_or(TgaError::Truncated)?;

    if header.descriptor & TOP_ORIGIN == 0 {
        canvas.flip_vertically();
    }
    Ok(canvas)
}

/// Serialize a canvas as TGA bytes, rows stored in canvas order
pub fn encode_tga(canvas: &Canvas) -> Result<Vec<u8>, TgaError> {
    let too_large = || TgaError::TooLarge {
        width: canvas.width(),
        height: canvas.height(),
    };
    let width = u16::try_from(canvas.width()).map_err(|_| too_large())?;
    let height = u16::try_from(canvas.height()).map_err(|_| too_large())?;

    let (bits_per_pixel, alpha_bits) = match canvas.format() {
        PixelFormat::Rgb => (24, 0),
        PixelFormat::Rgba => (32, 8),
    };
    let header = Header {
        image_type: TRUE_COLOR,
        width,
        height,
        bits_per_pixel,
        descriptor: TOP_ORIGIN | alpha_bits,
        ..Header::default()
    };

    let mut out = Vec::with_capacity(HEADER_LEN + canvas.bytes().len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(canvas.bytes());
    Ok(out)
}

impl Canvas {
    /// Load a TGA file. Nothing is constructed unless the whole file parses.
    pub fn read_tga<P: AsRef<Path>>(path: P) -> Result<Self, TgaError> {
        let bytes = fs::read(path)?;
        decode_tga(&bytes)
    }

    pub fn write_tga<P: AsRef<Path>>(&self, path: P) -> Result<(), TgaError> {
        fs::write(path, encode_tga(self)?)?;
        Ok(())
    }
}
