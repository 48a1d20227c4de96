//! Triangle meshes
//!
//! A mesh is built once from a Wavefront OBJ description and is read-only
//! afterwards. Index lookups are lenient: an index past the end of the
//! position or texture-coordinate list yields a zero value instead of
//! failing, so lightly broken files still render.

mod obj;

pub use obj::*;

use crate::rasterizer::{Mat4, Vec2, Vec3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, `None` for an empty slice
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut aabb = Aabb::new(*first, *first);
        for p in rest {
            aabb.expand(*p);
        }
        Some(aabb)
    }

    /// Expand bounds to include a point
    pub fn expand(&mut self, point: Vec3) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    /// Grow every side by `amount`
    pub fn padded(&self, amount: f32) -> Self {
        let pad = Vec3::new(amount, amount, amount);
        Aabb::new(self.min - pad, self.max + pad)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }
}

/// One corner of a face: indices into the position and UV lists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaceCorner {
    pub vertex: usize,
    pub uv: usize,
}

impl FaceCorner {
    pub fn new(vertex: usize, uv: usize) -> Self {
        Self { vertex, uv }
    }
}

/// A triangulated face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub corners: [FaceCorner; 3],
}

impl Triangle {
    pub fn vertex_indices(&self) -> [usize; 3] {
        self.corners.map(|c| c.vertex)
    }

    pub fn uv_indices(&self) -> [usize; 3] {
        self.corners.map(|c| c.uv)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    triangles: Vec<Triangle>,
    /// `vn` records seen while parsing; normals themselves are not kept
    normal_records: usize,
}

impl Mesh {
    pub fn nverts(&self) -> usize {
        self.positions.len()
    }

    pub fn nuvs(&self) -> usize {
        self.uvs.len()
    }

    pub fn nfaces(&self) -> usize {
        self.triangles.len()
    }

    pub fn normal_records(&self) -> usize {
        self.normal_records
    }

    /// True when there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.triangles.is_empty()
    }

    /// Position `i`, or the origin if `i` is out of range
    pub fn vertex(&self, i: usize) -> Vec3 {
        self.positions.get(i).copied().unwrap_or(Vec3::ZERO)
    }

    /// Texture coordinate `i`, or `(0, 0)` if `i` is out of range
    pub fn uv(&self, i: usize) -> Vec2 {
        self.uvs.get(i).copied().unwrap_or_default()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn faces(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.positions)
    }

    /// World matrix that centers the mesh at the origin and scales its
    /// largest extent to 2, i.e. into the `[-1, 1]` cube
    pub fn fit_to_unit(&self) -> Mat4 {
        let Some(bounds) = self.bounds() else {
            return Mat4::identity();
        };
        let ext = bounds.extent();
        let largest = ext.x.max(ext.y).max(ext.z);
        let scale = if largest > 1e-6 { 2.0 / largest } else { 1.0 };

        Mat4::scale(scale) * Mat4::translation(Vec3::ZERO - bounds.center())
    }
}
