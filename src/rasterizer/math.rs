//! Vector and matrix math for the rendering pipeline
//!
//! All types are plain `Copy` values. Matrices are row-major (`m[row][col]`)
//! and multiply column vectors on the right.

use std::ops::{Add, Mul, Sub};
use serde::{Deserialize, Serialize};

/// Length below which `normalize` leaves a vector untouched
pub const NORMALIZE_EPSILON: f32 = 1e-8;

/// Triangles whose doubled screen-space area is below this cover no pixels
pub const DEGENERATE_AREA: f32 = 1e-6;

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const UP: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction; near-zero vectors come back unchanged
    pub fn normalize(self) -> Vec3 {
        let l = self.len();
        if l < NORMALIZE_EPSILON {
            return self;
        }
        Vec3 {
            x: self.x / l,
            y: self.y / l,
            z: self.z / l,
        }
    }

    pub fn scale(self, s: f32) -> Vec3 {
        Vec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Promote to homogeneous coordinates
    pub fn extend(self, w: f32) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, w)
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f32) -> Vec3 {
        self.scale(s)
    }
}

/// 2D Vector (texture coordinates, screen points)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

/// Homogeneous 4D vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Vec4 {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 }
    }
}

impl Vec4 {
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    fn get(self, i: usize) -> f32 {
        match i {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => self.w,
        }
    }
}

impl Add for Vec4 {
    type Output = Vec4;
    fn add(self, o: Vec4) -> Vec4 {
        Vec4::new(self.x + o.x, self.y + o.y, self.z + o.z, self.w + o.w)
    }
}

impl Sub for Vec4 {
    type Output = Vec4;
    fn sub(self, o: Vec4) -> Vec4 {
        Vec4::new(self.x - o.x, self.y - o.y, self.z - o.z, self.w - o.w)
    }
}

impl Mul<f32> for Vec4 {
    type Output = Vec4;
    fn mul(self, s: f32) -> Vec4 {
        Vec4::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }
}

/// 4x4 matrix, row-major
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    pub fn zero() -> Self {
        Self { m: [[0.0; 4]; 4] }
    }

    pub fn identity() -> Self {
        let mut out = Self::zero();
        for i in 0..4 {
            out.m[i][i] = 1.0;
        }
        out
    }

    pub fn translation(t: Vec3) -> Self {
        let mut out = Self::identity();
        out.m[0][3] = t.x;
        out.m[1][3] = t.y;
        out.m[2][3] = t.z;
        out
    }

    /// Uniform scale
    pub fn scale(s: f32) -> Self {
        let mut out = Self::zero();
        out.m[0][0] = s;
        out.m[1][1] = s;
        out.m[2][2] = s;
        out.m[3][3] = 1.0;
        out
    }

    /// Rotation around +Y, counter-clockwise looking down the axis
    pub fn rotation_y(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        let mut out = Self::identity();
        out.m[0][0] = c;
        out.m[0][2] = s;
        out.m[2][0] = -s;
        out.m[2][2] = c;
        out
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        (*self * p.extend(1.0)).xyz()
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = Mat4::zero();
        for row in 0..4 {
            for col in 0..4 {
                for k in 0..4 {
                    out.m[row][col] += self.m[row][k] * rhs.m[k][col];
                }
            }
        }
        out
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    fn mul(self, v: Vec4) -> Vec4 {
        let mut out = [0.0f32; 4];
        for (row, slot) in out.iter_mut().enumerate() {
            *slot = (0..4).map(|k| self.m[row][k] * v.get(k)).sum();
        }
        Vec4::new(out[0], out[1], out[2], out[3])
    }
}

/// Barycentric weights of a point relative to a triangle `(a, b, c)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Barycentric {
    pub w0: f32,
    pub w1: f32,
    pub w2: f32,
}

impl Barycentric {
    /// Edges and vertices count as inside
    pub fn is_inside(&self) -> bool {
        self.w0 >= 0.0 && self.w1 >= 0.0 && self.w2 >= 0.0
    }

    pub fn interpolate(&self, a: f32, b: f32, c: f32) -> f32 {
        a * self.w0 + b * self.w1 + c * self.w2
    }

    pub fn interpolate2(&self, a: Vec2, b: Vec2, c: Vec2) -> Vec2 {
        Vec2::new(
            self.interpolate(a.x, b.x, c.x),
            self.interpolate(a.y, b.y, c.y),
        )
    }
}

/// Barycentric coordinates of `p` in triangle `(a, b, c)`, using x/y only.
/// Returns `None` for triangles with (near) zero area.
pub fn barycentric(a: Vec2, b: Vec2, c: Vec2, p: Vec2) -> Option<Barycentric> {
    let u = Vec3::new(c.x - a.x, b.x - a.x, a.x - p.x)
        .cross(Vec3::new(c.y - a.y, b.y - a.y, a.y - p.y));

    if u.z.abs() < DEGENERATE_AREA {
        return None;
    }

    Some(Barycentric {
        w0: 1.0 - (u.x + u.y) / u.z,
        w1: u.y / u.z,
        w2: u.x / u.z,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_dot() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert!((a.dot(b) - 32.0).abs() < 0.001);
    }

    #[test]
    fn test_vec3_cross() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        let c = a.cross(b);
        assert!((c.z - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_normalize_zero_is_unchanged() {
        let tiny = Vec3::new(1e-10, 0.0, 0.0);
        assert_eq!(tiny.normalize(), tiny);
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
        let n = Vec3::new(3.0, 0.0, 4.0).normalize();
        assert!((n.len() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_identity_diagonal() {
        let id = Mat4::identity();
        for row in 0..4 {
            for col in 0..4 {
                let expected = if row == col { 1.0 } else { 0.0 };
                assert_eq!(id.m[row][col], expected);
            }
        }
    }

    #[test]
    fn test_matrix_compose() {
        let t = Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        let s = Mat4::scale(2.0);
        // scale first, then translate
        let p = (t * s).transform_point(Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(p, Vec3::new(3.0, 4.0, 5.0));
        // w = 0 ignores translation
        let v = (t * Vec3::new(1.0, 0.0, 0.0).extend(0.0)).xyz();
        assert_eq!(v, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_rotation_y_quarter_turn() {
        let r = Mat4::rotation_y(std::f32::consts::FRAC_PI_2);
        let p = r.transform_point(Vec3::new(0.0, 0.0, 1.0));
        assert!((p.x - 1.0).abs() < 1e-6);
        assert!(p.z.abs() < 1e-6);
    }

    #[test]
    fn test_barycentric_inside() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        let c = Vec2::new(5.0, 10.0);
        let bc = barycentric(a, b, c, Vec2::new(5.0, 3.0)).unwrap();
        assert!(bc.is_inside());
        assert!((bc.w0 + bc.w1 + bc.w2 - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_barycentric_outside() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        let c = Vec2::new(5.0, 10.0);
        let bc = barycentric(a, b, c, Vec2::new(-1.0, 5.0)).unwrap();
        assert!(!bc.is_inside());
        assert!(bc.w0 < 0.0 || bc.w1 < 0.0 || bc.w2 < 0.0);
    }

    #[test]
    fn test_barycentric_vertices_map_to_unit_weights() {
        let a = Vec2::new(1.0, 1.0);
        let b = Vec2::new(8.0, 2.0);
        let c = Vec2::new(3.0, 9.0);
        let at_b = barycentric(a, b, c, b).unwrap();
        assert!((at_b.w1 - 1.0).abs() < 1e-5);
        assert!(at_b.w0.abs() < 1e-5 && at_b.w2.abs() < 1e-5);
    }

    #[test]
    fn test_barycentric_degenerate() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(5.0, 5.0);
        let c = Vec2::new(10.0, 10.0);
        assert!(barycentric(a, b, c, Vec2::new(5.0, 5.0)).is_none());
    }
}
