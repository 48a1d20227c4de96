//! CPU software rasterizer
//!
//! Features:
//! - Look-at camera with perspective projection
//! - Barycentric triangle filling with a depth buffer
//! - Nearest-neighbor texture sampling (affine, no perspective correction)
//! - Optional flat shading from one directional light
//! - Alpha-blended translucent overlay with read-only depth test
//! - Bresenham wireframe lines

mod camera;
mod math;
mod overlay;
mod render;
mod types;

pub use camera::*;
pub use math::*;
pub use overlay::*;
pub use render::*;
pub use types::*;

/// Default output dimensions
pub const DEFAULT_WIDTH: usize = 800;
pub const DEFAULT_HEIGHT: usize = 800;
