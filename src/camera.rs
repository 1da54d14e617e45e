//! Orbit camera driven by mouse deltas.
//!
//! The camera circles a target point at some distance. The scene is Z-up:
//! horizontal drags spin around the world Z axis and vertical drags tilt
//! around the camera's X axis.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Camera settings. Angles are in degrees, deltas are per pixel or per wheel step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotation_delta: f32,
    pub pan_delta: f32,
    pub zoom_delta: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 45.0,
            near: 0.1,
            far: 1000.0,
            distance: 10.0,
            min_distance: 0.01,
            max_distance: 1000.0,
            rotation_delta: 0.01,
            pan_delta: 0.05,
            zoom_delta: 0.05,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub config: CameraConfig,
    pub target: Vec3,
    /// Tilt around X (`x`) and spin around Z (`z`), in radians.
    pub rotation: Vec3,
    distance: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

impl Camera {
    pub fn new(config: CameraConfig) -> Self {
        let distance = config
            .distance
            .clamp(config.min_distance, config.max_distance);
        Self {
            config,
            target: Vec3::ZERO,
            rotation: Vec3::ZERO,
            distance,
        }
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// World-to-camera rotation.
    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_x(self.rotation.x) * Quat::from_rotation_z(self.rotation.z)
    }

    /// Eye position in world space.
    pub fn position(&self) -> Vec3 {
        self.target + self.orientation().inverse() * Vec3::new(0.0, 0.0, self.distance)
    }

    /// Rotates proportionally to a pixel delta.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.rotation.z += self.config.rotation_delta * dx;
        self.rotation.x += self.config.rotation_delta * dy;
    }

    /// Moves the target within the camera's view plane so the scene follows the cursor.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let inverse = self.orientation().inverse();
        let right = inverse * Vec3::X;
        let up = inverse * Vec3::Y;

        // scaled with distance so panning speed tracks the zoom level
        let step = self.config.pan_delta * self.distance * 0.1;
        self.target += (-right * dx + up * dy) * step;
    }

    /// Moves towards (positive steps) or away from the target.
    ///
    /// The distance is kept within `[min_distance, max_distance]`.
    pub fn zoom(&mut self, steps: f32) {
        let distance = self.distance - steps * self.config.zoom_delta * self.distance;
        self.distance = distance.clamp(self.config.min_distance, self.config.max_distance);
    }

    pub fn projection(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Mat4::perspective_rh_gl(
            self.config.fov.to_radians(),
            aspect,
            self.config.near,
            self.config.far,
        )
    }

    pub fn viewworld(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance))
            * Mat4::from_quat(self.orientation())
            * Mat4::from_translation(-self.target)
    }
}
