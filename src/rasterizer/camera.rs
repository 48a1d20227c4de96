//! Look-at camera with a symmetric perspective frustum

use super::math::{Mat4, Vec3};

/// Camera state
///
/// Built once per frame. `view()` and `proj()` are derived on demand,
/// so changing a field and calling them again is the rebuild.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn look_at(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_deg: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self { eye, target, up, fov_deg, aspect, near, far }
    }

    /// Orbit camera: the eye sits on a sphere of `radius` around `target`.
    /// `theta` is the azimuth in the XZ plane, `phi` the polar angle from +Y.
    pub fn orbit(
        theta: f32,
        phi: f32,
        radius: f32,
        target: Vec3,
        fov_deg: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let offset = Vec3::new(
            phi.sin() * theta.cos(),
            phi.cos(),
            phi.sin() * theta.sin(),
        );
        Self::look_at(target + offset * radius, target, Vec3::UP, fov_deg, aspect, near, far)
    }

    /// Camera basis: (right, true up, forward)
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward);
        (right, up, forward)
    }

    /// Right-handed look-at matrix. The camera looks down -Z in view space.
    pub fn view(&self) -> Mat4 {
        let (right, up, forward) = self.basis();
        let mut m = Mat4::identity();

        m.m[0] = [right.x, right.y, right.z, -right.dot(self.eye)];
        m.m[1] = [up.x, up.y, up.z, -up.dot(self.eye)];
        m.m[2] = [-forward.x, -forward.y, -forward.z, forward.dot(self.eye)];
        m
    }

    /// Perspective projection; clip-space `w` receives `-z_view`
    pub fn proj(&self) -> Mat4 {
        let f = 1.0 / (self.fov_deg.to_radians() * 0.5).tan();
        let range = self.near - self.far;
        let mut m = Mat4::zero();

        m.m[0][0] = f / self.aspect;
        m.m[1][1] = f;
        m.m[2][2] = (self.far + self.near) / range;
        m.m[2][3] = 2.0 * self.far * self.near / range;
        m.m[3][2] = -1.0;
        m
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn front_camera() -> Camera {
        Camera::look_at(
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::ZERO,
            Vec3::UP,
            60.0,
            1.0,
            0.1,
            100.0,
        )
    }

    #[test]
    fn test_view_moves_eye_to_origin() {
        let cam = front_camera();
        let p = cam.view().transform_point(cam.eye);
        assert!(p.len() < 1e-5);
    }

    #[test]
    fn test_view_target_is_in_front() {
        let cam = front_camera();
        let p = cam.view().transform_point(cam.target);
        assert!(p.x.abs() < 1e-5 && p.y.abs() < 1e-5);
        assert!((p.z + 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let cam = Camera::look_at(
            Vec3::new(2.0, 3.0, -4.0),
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::UP,
            45.0,
            1.5,
            0.1,
            50.0,
        );
        let (r, u, f) = cam.basis();
        assert!(r.dot(u).abs() < 1e-5);
        assert!(r.dot(f).abs() < 1e-5);
        assert!(u.dot(f).abs() < 1e-5);
        assert!((u.len() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_projected_points_land_in_ndc() {
        let cam = front_camera();
        let vp = cam.view_proj();
        let points = [
            Vec3::ZERO,
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(-1.0, 1.0, -2.0),
            Vec3::new(0.0, 0.0, 2.8),
        ];
        for p in points {
            let clip = vp * p.extend(1.0);
            assert!(clip.w > 0.0);
            let (nx, ny, nz) = (clip.x / clip.w, clip.y / clip.w, clip.z / clip.w);
            assert!((-1.0..=1.0).contains(&nx), "x out of range for {:?}", p);
            assert!((-1.0..=1.0).contains(&ny), "y out of range for {:?}", p);
            assert!(nz.is_finite());
        }
    }

    #[test]
    fn test_proj_w_carries_view_depth() {
        let cam = front_camera();
        let clip = cam.proj() * Vec3::new(0.0, 0.0, -7.0).extend(1.0);
        assert!((clip.w - 7.0).abs() < 1e-5);
        assert_eq!(cam.proj().m[3][2], -1.0);
    }

    #[test]
    fn test_orbit_eye_on_sphere() {
        let target = Vec3::new(1.0, 0.0, 0.0);
        let cam = Camera::orbit(1.6, 0.9, 5.0, target, 45.0, 1.0, 0.1, 100.0);
        assert!(((cam.eye - target).len() - 5.0).abs() < 1e-4);
        // theta = phi = 0 sits straight above the target
        let top = Camera::orbit(0.0, 0.0, 2.0, target, 45.0, 1.0, 0.1, 100.0);
        assert!((top.eye - Vec3::new(1.0, 2.0, 0.0)).len() < 1e-6);
    }
}
