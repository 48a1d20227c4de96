//! Scene description loading and saving
//!
//! Uses RON (Rusty Object Notation) for human-readable scene files. Every
//! field has a default, so `()` is a valid scene.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::SceneError;
use crate::mesh::Mesh;
use crate::rasterizer::{Camera, Color, Mat4, ShadingMode, Vec3, DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Where the camera sits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CameraPlacement {
    LookAt { eye: Vec3, target: Vec3, up: Vec3 },
    /// Spherical orbit around `target`, angles in radians
    Orbit { theta: f32, phi: f32, radius: f32, target: Vec3 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub placement: CameraPlacement,
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            placement: CameraPlacement::LookAt {
                eye: Vec3::new(0.0, 0.0, 3.0),
                target: Vec3::ZERO,
                up: Vec3::UP,
            },
            fov_deg: 60.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl CameraConfig {
    pub fn build(&self, aspect: f32) -> Camera {
        match self.placement {
            CameraPlacement::LookAt { eye, target, up } => {
                Camera::look_at(eye, target, up, self.fov_deg, aspect, self.near, self.far)
            }
            CameraPlacement::Orbit { theta, phi, radius, target } => {
                Camera::orbit(theta, phi, radius, target, self.fov_deg, aspect, self.near, self.far)
            }
        }
    }
}

/// World transform of the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub translate: Vec3,
    pub rotate_y_deg: f32,
    pub scale: f32,
    /// Center the mesh and fit it into the [-1, 1] cube first
    pub fit_to_unit: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            translate: Vec3::ZERO,
            rotate_y_deg: 0.0,
            scale: 1.0,
            fit_to_unit: false,
        }
    }
}

impl ModelConfig {
    pub fn world_matrix(&self, mesh: &Mesh) -> Mat4 {
        let fit = if self.fit_to_unit { mesh.fit_to_unit() } else { Mat4::identity() };
        Mat4::translation(self.translate)
            * Mat4::rotation_y(self.rotate_y_deg.to_radians())
            * Mat4::scale(self.scale)
            * fit
    }
}

/// Translucent box drawn around the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub color: Color,
    pub front_opacity: f32,
    pub back_opacity: f32,
    /// Grows the model's bounding box, in model units
    pub padding: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            color: Color::new(120, 180, 255),
            front_opacity: 0.25,
            back_opacity: 0.15,
            padding: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub width: usize,
    pub height: usize,
    pub background: Color,
    pub camera: CameraConfig,
    pub model: ModelConfig,
    pub shading: ShadingMode,
    pub overlay: Option<OverlayConfig>,
    /// Edge color for a wireframe drawn on top of everything
    pub wireframe: Option<Color>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            background: Color::BLACK,
            camera: CameraConfig::default(),
            model: ModelConfig::default(),
            shading: ShadingMode::None,
            overlay: None,
            wireframe: None,
        }
    }
}

impl SceneConfig {
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }
}

/// Load a scene from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SceneConfig, SceneError> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

/// Load a scene from a RON string
pub fn load_config_from_str(s: &str) -> Result<SceneConfig, SceneError> {
    Ok(ron::from_str(s)?)
}

/// Save a scene to a RON file
pub fn save_config<P: AsRef<Path>>(config: &SceneConfig, path: P) -> Result<(), SceneError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_scene_is_default() {
        let config = load_config_from_str("()").unwrap();
        assert_eq!(config, SceneConfig::default());
        assert_eq!(config.width, 800);
        assert_eq!(config.aspect(), 1.0);
    }

    #[test]
    fn test_parse_full_scene() {
        let src = r#"(
            width: 320,
            height: 240,
            background: (r: 10, g: 20, b: 30),
            camera: (
                placement: Orbit(theta: 1.6, phi: 0.9, radius: 5.0, target: (x: 0.0, y: 0.0, z: 0.0)),
                fov_deg: 45.0,
            ),
            model: (rotate_y_deg: 30.0, fit_to_unit: true),
            shading: Flat(light_dir: (x: 0.577, y: -0.577, z: 0.577), ambient: 0.3),
            overlay: Some((front_opacity: 0.4)),
            wireframe: Some((r: 0, g: 255, b: 0, a: 255)),
        )"#;
        let config = load_config_from_str(src).unwrap();
        assert_eq!(config.width, 320);
        assert_eq!(config.background, Color::new(10, 20, 30));
        assert_eq!(config.camera.fov_deg, 45.0);
        assert_eq!(config.camera.near, 0.1);
        assert!(matches!(config.camera.placement, CameraPlacement::Orbit { radius, .. } if radius == 5.0));
        assert!(config.model.fit_to_unit);
        assert_eq!(config.model.scale, 1.0);
        assert!(matches!(config.shading, ShadingMode::Flat { .. }));
        let overlay = config.overlay.unwrap();
        assert_eq!(overlay.front_opacity, 0.4);
        assert_eq!(overlay.back_opacity, 0.15);
        assert_eq!(config.wireframe, Some(Color::GREEN));

        let camera = config.camera.build(config.aspect());
        assert!(((camera.eye - camera.target).len() - 5.0).abs() < 1e-4);
        assert!((camera.aspect - 320.0 / 240.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(load_config_from_str("(width: \"wide\")"), Err(SceneError::Parse(_))));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("softrender-{}-scene.ron", std::process::id()));
        let config = SceneConfig {
            width: 64,
            overlay: Some(OverlayConfig::default()),
            ..SceneConfig::default()
        };
        save_config(&config, &path).unwrap();
        let back = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back, config);
    }

    #[test]
    fn test_world_matrix_order() {
        let mesh = Mesh::parse("v 0 0 0\nv 4 0 0\nv 0 2 0\nf 1 2 3\n");
        let model = ModelConfig {
            translate: Vec3::new(10.0, 0.0, 0.0),
            scale: 2.0,
            fit_to_unit: true,
            ..ModelConfig::default()
        };
        let world = model.world_matrix(&mesh);
        // fit maps (4, 0, 0) to (1, -0.5, 0), then scale 2, then translate
        let p = world.transform_point(Vec3::new(4.0, 0.0, 0.0));
        assert!((p - Vec3::new(12.0, -1.0, 0.0)).len() < 1e-5);
    }
}
