//! Core types for the rasterizer

use serde::{Deserialize, Serialize};
use super::math::{Vec2, Vec3};

fn opaque() -> u8 {
    255
}

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

impl Color {
    /// What out-of-bounds reads return
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Apply shading (multiply by intensity 0.0-1.0)
    pub fn shade(self, intensity: f32) -> Self {
        let i = intensity.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * i) as u8,
            g: (self.g as f32 * i) as u8,
            b: (self.b as f32 * i) as u8,
            a: self.a,
        }
    }

    /// `self` composited over `dst`: `dst * (1 - alpha) + self * alpha` per channel.
    /// The destination alpha is kept.
    pub fn blend_over(self, dst: Color, alpha: f32) -> Self {
        let a = alpha.clamp(0.0, 1.0);
        let mix = |d: u8, s: u8| -> u8 {
            (d as f32 * (1.0 - a) + s as f32 * a).round().clamp(0.0, 255.0) as u8
        };
        Self {
            r: mix(dst.r, self.r),
            g: mix(dst.g, self.g),
            b: mix(dst.b, self.b),
            a: dst.a,
        }
    }

    /// Byte order used by the image container
    pub fn to_bgra(self) -> [u8; 4] {
        [self.b, self.g, self.r, self.a]
    }

    pub fn from_bgra(bytes: [u8; 4]) -> Self {
        Self { r: bytes[2], g: bytes[1], b: bytes[0], a: bytes[3] }
    }
}

/// Opaque black, the same alpha a scene file gets when it omits `a`
impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

#[cfg(test)]
impl Color {
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };
}

/// A vertex after projection to the screen
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenVertex {
    /// Pixel position; row 0 is the bottom scanline
    pub pos: Vec2,
    /// View-space z: larger is closer to the camera
    pub depth: f32,
}

impl ScreenVertex {
    pub fn new(x: f32, y: f32, depth: f32) -> Self {
        Self { pos: Vec2::new(x, y), depth }
    }
}

/// Shading mode for the textured pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum ShadingMode {
    /// Raw texture color
    #[default]
    None,
    /// One directional light evaluated per face
    Flat { light_dir: Vec3, ambient: f32 },
}

impl ShadingMode {
    /// Light intensity for a world-space face normal
    pub fn intensity(&self, normal: Vec3) -> f32 {
        match *self {
            ShadingMode::None => 1.0,
            ShadingMode::Flat { light_dir, ambient } => {
                let to_light = (Vec3::ZERO - light_dir).normalize();
                let diffuse = normal.normalize().dot(to_light).max(0.0);
                (ambient + (1.0 - ambient) * diffuse).clamp(0.0, 1.0)
            }
        }
    }
}

/// Counters collected by a rasterization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub triangles_drawn: usize,
    /// Degenerate or behind the eye
    pub triangles_skipped: usize,
    pub pixels_written: usize,
    pub pixels_blended: usize,
}

impl RenderStats {
    pub fn merge(&mut self, other: RenderStats) {
        self.triangles_drawn += other.triangles_drawn;
        self.triangles_skipped += other.triangles_skipped;
        self.pixels_written += other.pixels_written;
        self.pixels_blended += other.pixels_blended;
    }
}
