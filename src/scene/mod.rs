//! Scene driver
//!
//! Glue between files and the rasterizer: loads the texture and mesh,
//! runs the passes in order and hands back a finished image.
//!
//! Pass order: back overlay faces, textured mesh, front overlay faces,
//! wireframe. The result is flipped so row 0 is the top scanline.

mod config;

pub use config::*;

use std::path::{Path, PathBuf};

use indicatif::ProgressBar;

use crate::canvas::{Canvas, PixelFormat, TgaError};
use crate::mesh::Mesh;
use crate::rasterizer::{
    box_quads, draw_overlay, draw_wireframe, render_mesh, Color, FaceFilter, Framebuffer, RenderStats,
};

/// Error type for loading inputs and writing the result
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("Texture error: {0}")]
    Texture(#[from] TgaError),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Model load failed: {} has no vertices or faces", .path.display())]
    EmptyMesh { path: PathBuf },
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Load a texture. `.tga` goes through the built-in reader, anything else
/// through the `image` crate.
pub fn load_texture<P: AsRef<Path>>(path: P) -> Result<Canvas, SceneError> {
    let path = path.as_ref();
    let texture = if has_extension(path, "tga") {
        Canvas::read_tga(path)?
    } else {
        Canvas::from_image_file(path)?
    };
    tracing::info!(
        "Loaded texture {} ({}x{}, {} bpp)",
        path.display(),
        texture.width(),
        texture.height(),
        texture.bytes_per_pixel() * 8
    );
    Ok(texture)
}

/// Load a mesh, treating an unreadable or empty file as an error
pub fn load_mesh<P: AsRef<Path>>(path: P) -> Result<Mesh, SceneError> {
    let path = path.as_ref();
    let mesh = Mesh::load(path);
    if mesh.is_empty() {
        return Err(SceneError::EmptyMesh { path: path.to_path_buf() });
    }
    Ok(mesh)
}

/// Write the image; `.png`, `.jpg` and `.bmp` go through the `image` crate,
/// everything else is written as TGA
pub fn save_output<P: AsRef<Path>>(canvas: &Canvas, path: P) -> Result<(), SceneError> {
    let path = path.as_ref();
    if ["png", "jpg", "jpeg", "bmp"].iter().any(|ext| has_extension(path, ext)) {
        canvas.save_image(path)?;
    } else {
        canvas.write_tga(path)?;
    }
    tracing::info!("Wrote {} ({}x{})", path.display(), canvas.width(), canvas.height());
    Ok(())
}

fn with_opacity(color: Color, opacity: f32) -> Color {
    let a = (color.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
    Color { a, ..color }
}

/// Render one frame. `progress` ticks once per mesh face.
pub fn render(config: &SceneConfig, texture: &Canvas, mesh: &Mesh, progress: &ProgressBar) -> Canvas {
    let mut fb = Framebuffer::new(config.width, config.height, PixelFormat::Rgb);
    fb.clear(config.background);

    let camera = config.camera.build(config.aspect());
    let world = config.model.world_matrix(mesh);
    let mut stats = RenderStats::default();

    let overlay = config
        .overlay
        .zip(mesh.bounds())
        .map(|(ov, bounds)| (ov, box_quads(&bounds.padded(ov.padding), 1.0)));

    if let Some((ov, (points, quads))) = &overlay {
        let mut quads = quads.clone();
        let color = with_opacity(ov.color, ov.back_opacity);
        stats.merge(draw_overlay(&mut fb, points, &mut quads, &camera, &world, color, FaceFilter::BACK));
    }

    stats.merge(render_mesh(&mut fb, mesh, texture, &camera, &world, &config.shading, progress));

    if let Some((ov, (points, quads))) = &overlay {
        let mut quads = quads.clone();
        let color = with_opacity(ov.color, ov.front_opacity);
        stats.merge(draw_overlay(&mut fb, points, &mut quads, &camera, &world, color, FaceFilter::FRONT));
    }

    if let Some(edge) = config.wireframe {
        stats.merge(draw_wireframe(&mut fb, mesh, &camera, &world, edge));
    }

    tracing::info!(
        "Rendered {}x{}: {} triangles drawn, {} skipped, {} pixels written, {} blended",
        config.width,
        config.height,
        stats.triangles_drawn,
        stats.triangles_skipped,
        stats.pixels_written,
        stats.pixels_blended
    );

    let mut canvas = fb.into_canvas();
    canvas.flip_vertically();
    canvas
}
