//! Core rendering functions
//! Barycentric triangle filling with a depth buffer

use indicatif::ProgressBar;

use super::camera::Camera;
use super::math::{barycentric, Barycentric, Mat4, Vec2, Vec3};
use super::types::{Color, RenderStats, ScreenVertex, ShadingMode};
use crate::canvas::{Canvas, PixelFormat};
use crate::mesh::Mesh;

/// Clip-space `w` at or below this is treated as at/behind the eye
const MIN_CLIP_W: f32 = 1e-5;

/// Per-pixel depth store. Larger values are closer to the camera.
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl DepthBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![f32::NEG_INFINITY; width * height],
        }
    }

    pub fn clear(&mut self) {
        self.values.fill(f32::NEG_INFINITY);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    /// Depth at a pixel; out of range reads as infinitely far
    pub fn get(&self, x: i32, y: i32) -> f32 {
        self.index(x, y).map_or(f32::NEG_INFINITY, |i| self.values[i])
    }

    pub fn set(&mut self, x: i32, y: i32, depth: f32) {
        if let Some(i) = self.index(x, y) {
            self.values[i] = depth;
        }
    }
}

/// Framebuffer for software rendering: color surface plus depth buffer.
/// Owned by whoever drives a frame and lent to each pass.
pub struct Framebuffer {
    pub canvas: Canvas,
    pub depth: DepthBuffer,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Self {
        Self {
            canvas: Canvas::new(width, height, format),
            depth: DepthBuffer::new(width, height),
        }
    }

    pub fn width(&self) -> usize {
        self.canvas.width()
    }

    pub fn height(&self) -> usize {
        self.canvas.height()
    }

    pub fn clear(&mut self, color: Color) {
        self.canvas.fill(color);
        self.depth.clear();
    }

    /// Hand the color surface back, dropping the depth buffer
    pub fn into_canvas(self) -> Canvas {
        self.canvas
    }

    /// Depth-tested write. Passing pixels update the depth buffer.
    pub fn set_pixel_with_depth(&mut self, x: i32, y: i32, z: f32, color: Color) -> bool {
        if z > self.depth.get(x, y) {
            self.depth.set(x, y, z);
            self.canvas.set(x, y, color);
            return true;
        }
        false
    }

    /// Depth-tested blend. The depth buffer is only read.
    pub fn blend_pixel_with_depth(&mut self, x: i32, y: i32, z: f32, color: Color, alpha: f32) -> bool {
        if z > self.depth.get(x, y) {
            let dst = self.canvas.get(x, y);
            self.canvas.set(x, y, color.blend_over(dst, alpha));
            return true;
        }
        false
    }

    /// Draw a line from (x0, y0) to (x1, y1) using Bresenham's algorithm.
    /// No depth test; one pixel per step along the dominant axis.
    /// The segment is clipped to the surface first, so endpoints may lie
    /// anywhere in `i32` range.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        // same pixels whichever way round the endpoints are given
        let (a, b) = if (x0, y0) <= (x1, y1) {
            ((x0, y0), (x1, y1))
        } else {
            ((x1, y1), (x0, y0))
        };
        let Some(((mut x0, mut y0), (mut x1, mut y1))) = clip_segment(a, b, self.width(), self.height()) else {
            return;
        };

        let steep = (x0 - x1).abs() < (y0 - y1).abs();
        if steep {
            std::mem::swap(&mut x0, &mut y0);
            std::mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            std::mem::swap(&mut x0, &mut x1);
            std::mem::swap(&mut y0, &mut y1);
        }

        let dx = x1 - x0;
        let derror = (y1 - y0).abs() * 2;
        let ystep = if y1 > y0 { 1 } else { -1 };
        let mut error = 0;
        let mut y = y0;

        // clipped coordinates are on the surface, so they fit in i32
        for x in x0..=x1 {
            if steep {
                self.canvas.set(y as i32, x as i32, color);
            } else {
                self.canvas.set(x as i32, y as i32, color);
            }
            error += derror;
            if error > dx {
                y += ystep;
                error -= dx * 2;
            }
        }
    }
}

/// Liang-Barsky clip of a segment to `[0, width-1] x [0, height-1]`.
/// Returns the visible part with endpoints rounded back to pixels, widened
/// to `i64` so the line stepper can't overflow.
fn clip_segment(
    a: (i32, i32),
    b: (i32, i32),
    width: usize,
    height: usize,
) -> Option<((i64, i64), (i64, i64))> {
    if width == 0 || height == 0 {
        return None;
    }
    let (max_x, max_y) = ((width - 1) as f64, (height - 1) as f64);
    let (x0, y0) = (a.0 as f64, a.1 as f64);
    let (dx, dy) = (b.0 as f64 - x0, b.1 as f64 - y0);

    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [(-dx, x0), (dx, max_x - x0), (-dy, y0), (dy, max_y - y0)] {
        if p == 0.0 {
            // parallel to this edge and outside it
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let point = |t: f64| {
        let x = (x0 + t * dx).round().clamp(0.0, max_x) as i64;
        let y = (y0 + t * dy).round().clamp(0.0, max_y) as i64;
        (x, y)
    };
    Some((point(t0), point(t1)))
}

/// Maps world-space points to screen pixels for one camera and world matrix
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    model_view: Mat4,
    model_view_proj: Mat4,
    width: f32,
    height: f32,
}

impl Projector {
    pub fn new(camera: &Camera, world: &Mat4, width: usize, height: usize) -> Self {
        Self {
            model_view: camera.view() * *world,
            model_view_proj: camera.view_proj() * *world,
            width: width as f32,
            height: height as f32,
        }
    }

    /// Screen position and depth, or `None` when the point is at or
    /// behind the eye and can't be divided by `w`
    pub fn project(&self, p: Vec3) -> Option<ScreenVertex> {
        let clip = self.model_view_proj * p.extend(1.0);
        if clip.w <= MIN_CLIP_W {
            return None;
        }

        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        Some(ScreenVertex::new(
            (ndc_x + 1.0) * self.width / 2.0,
            (ndc_y + 1.0) * self.height / 2.0,
            self.model_view.transform_point(p).z,
        ))
    }
}

/// Integer pixel box around `points`, clamped to the surface
fn bounding_box(points: &[ScreenVertex], width: usize, height: usize) -> Option<(i32, i32, i32, i32)> {
    if width == 0 || height == 0 || points.is_empty() {
        return None;
    }
    let mut min = Vec2::new(f32::INFINITY, f32::INFINITY);
    let mut max = Vec2::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
    for p in points {
        min.x = min.x.min(p.pos.x);
        min.y = min.y.min(p.pos.y);
        max.x = max.x.max(p.pos.x);
        max.y = max.y.max(p.pos.y);
    }

    let max_x = width as i32 - 1;
    let max_y = height as i32 - 1;
    let x0 = (min.x.floor() as i32).clamp(0, max_x);
    let y0 = (min.y.floor() as i32).clamp(0, max_y);
    let x1 = (max.x.floor() as i32).clamp(0, max_x);
    let y1 = (max.y.floor() as i32).clamp(0, max_y);

    // fully off one side
    if max.x < 0.0 || max.y < 0.0 || min.x > max_x as f32 || min.y > max_y as f32 {
        return None;
    }
    Some((x0, y0, x1, y1))
}

/// True if the triangle covers no area on screen
pub fn is_degenerate(tri: &[ScreenVertex; 3]) -> bool {
    barycentric(tri[0].pos, tri[1].pos, tri[2].pos, tri[0].pos).is_none()
}

/// Visit every pixel inside the triangle with its barycentric weights
fn for_each_covered(
    tri: &[ScreenVertex; 3],
    width: usize,
    height: usize,
    mut visit: impl FnMut(i32, i32, Barycentric),
) {
    let Some((x0, y0, x1, y1)) = bounding_box(tri, width, height) else {
        return;
    };

    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = Vec2::new(x as f32, y as f32);
            let Some(bc) = barycentric(tri[0].pos, tri[1].pos, tri[2].pos, p) else {
                return;
            };
            if bc.is_inside() {
                visit(x, y, bc);
            }
        }
    }
}

fn depth_at(tri: &[ScreenVertex; 3], bc: &Barycentric) -> f32 {
    bc.interpolate(tri[0].depth, tri[1].depth, tri[2].depth)
}

/// Sample texture at UV coordinates (nearest texel, v grows upward)
pub fn sample_texture(texture: &Canvas, uv: Vec2) -> Color {
    let tx = (uv.x * (texture.width() as f32 - 1.0)) as i32;
    let ty = ((1.0 - uv.y) * (texture.height() as f32 - 1.0)) as i32;
    texture.get(tx, ty)
}

/// Fill a triangle with a solid color, depth tested and depth written.
/// Returns the number of pixels written.
#[cfg(test)]
pub fn fill_triangle(fb: &mut Framebuffer, tri: &[ScreenVertex; 3], color: Color) -> usize {
    let (w, h) = (fb.width(), fb.height());
    let mut written = 0;
    for_each_covered(tri, w, h, |x, y, bc| {
        if fb.set_pixel_with_depth(x, y, depth_at(tri, &bc), color) {
            written += 1;
        }
    });
    written
}

/// Fill a textured triangle, depth tested and depth written.
/// `intensity` scales the sampled color (1.0 for unlit).
pub fn fill_textured_triangle(
    fb: &mut Framebuffer,
    tri: &[ScreenVertex; 3],
    uvs: &[Vec2; 3],
    texture: &Canvas,
    intensity: f32,
) -> usize {
    let (w, h) = (fb.width(), fb.height());
    let mut written = 0;
    for_each_covered(tri, w, h, |x, y, bc| {
        let z = depth_at(tri, &bc);
        if z > fb.depth.get(x, y) {
            let uv = bc.interpolate2(uvs[0], uvs[1], uvs[2]);
            let color = sample_texture(texture, uv).shade(intensity);
            fb.set_pixel_with_depth(x, y, z, color);
            written += 1;
        }
    });
    written
}

/// Blend the covered pixels of `tri` that pass `keep`
fn blend_covered(
    fb: &mut Framebuffer,
    tri: &[ScreenVertex; 3],
    color: Color,
    alpha: f32,
    keep: impl Fn(i32, i32) -> bool,
) -> usize {
    let (w, h) = (fb.width(), fb.height());
    let mut blended = 0;
    for_each_covered(tri, w, h, |x, y, bc| {
        if keep(x, y) && fb.blend_pixel_with_depth(x, y, depth_at(tri, &bc), color, alpha) {
            blended += 1;
        }
    });
    blended
}

fn covers(tri: &[ScreenVertex; 3], x: i32, y: i32) -> bool {
    barycentric(tri[0].pos, tri[1].pos, tri[2].pos, Vec2::new(x as f32, y as f32))
        .is_some_and(|bc| bc.is_inside())
}

/// Alpha-blend a flat-colored triangle. The depth test reads the buffer
/// but never writes it. Returns the number of pixels blended.
pub fn fill_blended_triangle(fb: &mut Framebuffer, tri: &[ScreenVertex; 3], color: Color, alpha: f32) -> usize {
    blend_covered(fb, tri, color, alpha, |_, _| true)
}

/// Alpha-blend a quad split as `(0,1,2)` and `(0,2,3)`. Pixels on the shared
/// diagonal are blended once, by the first triangle.
pub fn fill_blended_quad(fb: &mut Framebuffer, quad: &[ScreenVertex; 4], color: Color, alpha: f32) -> usize {
    let first = [quad[0], quad[1], quad[2]];
    let second = [quad[0], quad[2], quad[3]];
    fill_blended_triangle(fb, &first, color, alpha)
        + blend_covered(fb, &second, color, alpha, |x, y| !covers(&first, x, y))
}

/// Look up a face's projected corners in `cache`. Out-of-range indices
/// project `Mesh::vertex`, which is the origin.
fn project_corners(
    mesh: &Mesh,
    projector: &Projector,
    cache: &[Option<ScreenVertex>],
    indices: [usize; 3],
) -> Option<[ScreenVertex; 3]> {
    let fetch = |i: usize| match cache.get(i) {
        Some(p) => *p,
        None => projector.project(mesh.vertex(i)),
    };
    Some([fetch(indices[0])?, fetch(indices[1])?, fetch(indices[2])?])
}

/// Render a textured mesh into the framebuffer
pub fn render_mesh(
    fb: &mut Framebuffer,
    mesh: &Mesh,
    texture: &Canvas,
    camera: &Camera,
    world: &Mat4,
    shading: &ShadingMode,
    progress: &ProgressBar,
) -> RenderStats {
    let projector = Projector::new(camera, world, fb.width(), fb.height());
    let projected: Vec<Option<ScreenVertex>> =
        mesh.positions().iter().map(|p| projector.project(*p)).collect();

    let mut stats = RenderStats::default();

    for face in mesh.faces() {
        progress.inc(1);

        let Some(tri) = project_corners(mesh, &projector, &projected, face.vertex_indices()) else {
            stats.triangles_skipped += 1;
            continue;
        };
        if is_degenerate(&tri) {
            stats.triangles_skipped += 1;
            continue;
        }

        let intensity = match shading {
            ShadingMode::None => 1.0,
            _ => {
                let [a, b, c] = face.vertex_indices().map(|i| world.transform_point(mesh.vertex(i)));
                shading.intensity((b - a).cross(c - a))
            }
        };
        let uvs = face.uv_indices().map(|i| mesh.uv(i));

        stats.pixels_written += fill_textured_triangle(fb, &tri, &uvs, texture, intensity);
        stats.triangles_drawn += 1;
    }

    tracing::debug!(
        "Textured pass: {} drawn, {} skipped, {} pixels",
        stats.triangles_drawn,
        stats.triangles_skipped,
        stats.pixels_written
    );
    stats
}

/// Draw every triangle edge of the mesh on top of the framebuffer
pub fn draw_wireframe(fb: &mut Framebuffer, mesh: &Mesh, camera: &Camera, world: &Mat4, color: Color) -> RenderStats {
    let projector = Projector::new(camera, world, fb.width(), fb.height());
    let projected: Vec<Option<ScreenVertex>> =
        mesh.positions().iter().map(|p| projector.project(*p)).collect();

    let mut stats = RenderStats::default();
    for face in mesh.faces() {
        let Some(tri) = project_corners(mesh, &projector, &projected, face.vertex_indices()) else {
            stats.triangles_skipped += 1;
            continue;
        };
        for k in 0..3 {
            let a = tri[k].pos;
            let b = tri[(k + 1) % 3].pos;
            fb.draw_line(a.x.round() as i32, a.y.round() as i32, b.x.round() as i32, b.y.round() as i32, color);
        }
        stats.triangles_drawn += 1;
    }
    stats
}
