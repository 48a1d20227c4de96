//! Translucent quad overlay
//!
//! Decorative quad geometry (e.g. a glass box around the model) is drawn
//! with alpha blending and a read-only depth test. Each quad is classified
//! as front or back facing once per frame; the caller draws back faces
//! before the opaque mesh and front faces after it.

use super::camera::Camera;
use super::math::{Mat4, Vec3};
use super::render::{fill_blended_quad, Framebuffer, Projector};
use super::types::{Color, RenderStats, ScreenVertex};
use crate::mesh::Aabb;

/// A quad face of the overlay geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayQuad {
    /// Indices into the point set, counter-clockwise seen from outside
    pub indices: [usize; 4],
    /// Average world-space z of the corners
    pub depth: f32,
    /// Faces the camera eye
    pub front: bool,
    /// Multiplies the overlay color's alpha
    pub opacity: f32,
}

impl OverlayQuad {
    pub fn new(indices: [usize; 4], opacity: f32) -> Self {
        Self {
            indices,
            depth: 0.0,
            front: false,
            opacity,
        }
    }

    fn corners(&self, points: &[Vec3]) -> [Vec3; 4] {
        self.indices.map(|i| points.get(i).copied().unwrap_or(Vec3::ZERO))
    }

    /// Outward unit normal from the first two edges
    pub fn normal(&self, points: &[Vec3]) -> Vec3 {
        let [p0, p1, p2, _] = self.corners(points);
        (p1 - p0).cross(p2 - p0).normalize()
    }

    pub fn centroid(&self, points: &[Vec3]) -> Vec3 {
        let [a, b, c, d] = self.corners(points);
        (a + b + c + d) * 0.25
    }

    /// Update `front` and `depth` for the given eye position
    pub fn classify(&mut self, points: &[Vec3], eye: Vec3) {
        let centroid = self.centroid(points);
        let to_eye = (eye - centroid).normalize();
        self.front = self.normal(points).dot(to_eye) > 0.0;
        self.depth = centroid.z;
    }
}

/// Which faces a call to `draw_overlay` should draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceFilter {
    pub want_front: bool,
    pub want_back: bool,
}

impl FaceFilter {
    pub const FRONT: FaceFilter = FaceFilter { want_front: true, want_back: false };
    pub const BACK: FaceFilter = FaceFilter { want_front: false, want_back: true };

    pub fn accepts(&self, quad: &OverlayQuad) -> bool {
        if quad.front {
            self.want_front
        } else {
            self.want_back
        }
    }
}

/// Corner points and outward-wound quads of a box
pub fn box_quads(aabb: &Aabb, opacity: f32) -> (Vec<Vec3>, Vec<OverlayQuad>) {
    let (lo, hi) = (aabb.min, aabb.max);
    // corner i has x from bit 0, y from bit 1, z from bit 2
    let points = (0..8)
        .map(|i| {
            Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            )
        })
        .collect();

    let faces = [
        [1, 3, 7, 5], // +x
        [0, 4, 6, 2], // -x
        [2, 6, 7, 3], // +y
        [0, 1, 5, 4], // -y
        [4, 5, 7, 6], // +z
        [0, 2, 3, 1], // -z
    ];
    let quads = faces.iter().map(|f| OverlayQuad::new(*f, opacity)).collect();
    (points, quads)
}

/// Classify every quad against the eye and sort by ascending depth
pub fn classify_quads(quads: &mut [OverlayQuad], points: &[Vec3], eye: Vec3) {
    for quad in quads.iter_mut() {
        quad.classify(points, eye);
    }
    // world z, not view depth: only correct for a camera looking down -z
    quads.sort_by(|a, b| a.depth.total_cmp(&b.depth));
}

/// Blend the accepted quads of `points`/`quads` (model space) into the
/// framebuffer. `quads` is re-classified and re-sorted in place.
pub fn draw_overlay(
    fb: &mut Framebuffer,
    points: &[Vec3],
    quads: &mut [OverlayQuad],
    camera: &Camera,
    world: &Mat4,
    color: Color,
    filter: FaceFilter,
) -> RenderStats {
    let world_points: Vec<Vec3> = points.iter().map(|p| world.transform_point(*p)).collect();
    classify_quads(quads, &world_points, camera.eye);

    // world transform is already applied
    let projector = Projector::new(camera, &Mat4::identity(), fb.width(), fb.height());
    let base_alpha = color.a as f32 / 255.0;
    let mut stats = RenderStats::default();

    for quad in quads.iter().filter(|q| filter.accepts(q)) {
        let projected: Option<Vec<ScreenVertex>> = quad
            .corners(&world_points)
            .iter()
            .map(|p| projector.project(*p))
            .collect();
        let Some(screen) = projected else {
            stats.triangles_skipped += 2;
            continue;
        };

        let screen = [screen[0], screen[1], screen[2], screen[3]];
        stats.pixels_blended += fill_blended_quad(fb, &screen, color, base_alpha * quad.opacity);
        stats.triangles_drawn += 2;
    }

    tracing::debug!(
        "Overlay pass (front={}, back={}): {} triangles, {} pixels blended",
        filter.want_front,
        filter.want_back,
        stats.triangles_drawn,
        stats.pixels_blended
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelFormat;
    use crate::rasterizer::fill_triangle;

    const BOTH: FaceFilter = FaceFilter { want_front: true, want_back: true };

    fn unit_box() -> (Vec<Vec3>, Vec<OverlayQuad>) {
        box_quads(&Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)), 1.0)
    }

    fn front_camera() -> Camera {
        Camera::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::UP, 60.0, 1.0, 0.1, 100.0)
    }

    #[test]
    fn test_box_normals_point_outward() {
        let (points, quads) = unit_box();
        for quad in &quads {
            let n = quad.normal(&points);
            let c = quad.centroid(&points);
            assert!((n.len() - 1.0).abs() < 1e-5);
            // centroid of a unit box face is its outward normal
            assert!((n - c).len() < 1e-5, "normal {:?} centroid {:?}", n, c);
        }
    }

    #[test]
    fn test_classify_front_and_back() {
        let (points, mut quads) = unit_box();
        classify_quads(&mut quads, &points, Vec3::new(0.0, 0.0, 5.0));

        let fronts: Vec<Vec3> = quads.iter().filter(|q| q.front).map(|q| q.normal(&points)).collect();
        assert_eq!(fronts.len(), 1);
        assert!((fronts[0] - Vec3::new(0.0, 0.0, 1.0)).len() < 1e-5);

        // the side faces lean away from an eye on the +z axis
        assert_eq!(quads.iter().filter(|q| !q.front).count(), 5);
    }

    #[test]
    fn test_quads_sorted_by_depth() {
        let (points, mut quads) = unit_box();
        classify_quads(&mut quads, &points, Vec3::new(3.0, 2.0, 5.0));
        assert!(quads.windows(2).all(|w| w[0].depth <= w[1].depth));
        assert_eq!(quads[0].depth, -1.0);
        assert_eq!(quads[5].depth, 1.0);
    }

    #[test]
    fn test_face_filter() {
        let mut quad = OverlayQuad::new([0, 1, 2, 3], 1.0);
        quad.front = true;
        assert!(FaceFilter::FRONT.accepts(&quad));
        assert!(!FaceFilter::BACK.accepts(&quad));
        assert!(BOTH.accepts(&quad));
        quad.front = false;
        assert!(!FaceFilter::FRONT.accepts(&quad));
        assert!(FaceFilter::BACK.accepts(&quad));
    }

    #[test]
    fn test_back_overlay_hidden_by_opaque() {
        let (points, mut quads) = unit_box();
        let camera = front_camera();
        let mut fb = Framebuffer::new(32, 32, PixelFormat::Rgb);

        // opaque wall at z = 0 covering the center
        let projector = Projector::new(&camera, &Mat4::identity(), 32, 32);
        let wall = [
            projector.project(Vec3::new(-0.5, -0.5, 0.0)).unwrap(),
            projector.project(Vec3::new(0.5, -0.5, 0.0)).unwrap(),
            projector.project(Vec3::new(0.0, 0.5, 0.0)).unwrap(),
        ];
        fill_triangle(&mut fb, &wall, Color::RED);

        let stats = draw_overlay(
            &mut fb,
            &points,
            &mut quads,
            &camera,
            &Mat4::identity(),
            Color::with_alpha(0, 0, 255, 255),
            FaceFilter::BACK,
        );
        assert!(stats.pixels_blended > 0);
        // the back wall is behind the opaque triangle
        assert_eq!(fb.canvas.get(16, 16), Color::RED);
        // but visible next to it
        assert_eq!(fb.canvas.get(10, 16), Color::new(0, 0, 255));
    }

    #[test]
    fn test_front_overlay_blends_over_opaque() {
        let (points, mut quads) = unit_box();
        let camera = front_camera();
        let mut fb = Framebuffer::new(32, 32, PixelFormat::Rgb);
        fb.clear(Color::new(0, 0, 0));

        let stats = draw_overlay(
            &mut fb,
            &points,
            &mut quads,
            &camera,
            &Mat4::identity(),
            Color::with_alpha(200, 200, 200, 255),
            FaceFilter::FRONT,
        );
        assert_eq!(stats.triangles_drawn, 2);
        assert_eq!(fb.canvas.get(16, 16), Color::new(200, 200, 200));
        // depth was not written
        assert_eq!(fb.depth.get(16, 16), f32::NEG_INFINITY);
    }

    #[test]
    fn test_opacity_multiplies_alpha() {
        let (points, _) = unit_box();
        let mut quads = vec![OverlayQuad::new([4, 5, 7, 6], 0.5)];
        let mut fb = Framebuffer::new(32, 32, PixelFormat::Rgb);
        draw_overlay(
            &mut fb,
            &points,
            &mut quads,
            &front_camera(),
            &Mat4::identity(),
            Color::with_alpha(200, 100, 0, 255),
            BOTH,
        );
        assert_eq!(fb.canvas.get(16, 16), Color::new(100, 50, 0));
    }
}
