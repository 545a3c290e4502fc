//! Perspective camera and bounding-volume framing.

use glam::{Mat4, Vec3};

use crate::options::CameraOptions;
use crate::render::Aabb;

/// Margin multiplier applied to the fitted camera distance.
const FIT_MARGIN: f32 = 1.6;

/// Fixed elevated-oblique view direction for fitted poses (normalized at
/// use).
const FIT_DIRECTION: Vec3 = Vec3::new(1.0, 0.9, 1.0);

/// Home pose of a fresh session, before anything has been fitted.
const HOME_EYE: Vec3 = Vec3::new(0.0, 300.0, 500.0);

/// Perspective camera defined by eye position, target, and projection
/// parameters.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Eye (camera) position in world space.
    pub eye: Vec3,
    /// Look-at target position.
    pub target: Vec3,
    /// Up direction vector.
    pub up: Vec3,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
}

impl Camera {
    /// Camera at the home pose with the given projection options.
    #[must_use]
    pub fn new(options: &CameraOptions, aspect: f32) -> Self {
        Self {
            eye: HOME_EYE,
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect,
            fovy: options.fovy,
            znear: options.znear,
            zfar: options.zfar,
        }
    }

    /// Build the combined view-projection matrix.
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target, self.up);
        let proj = Mat4::perspective_rh(
            self.fovy.to_radians(),
            self.aspect,
            self.znear,
            self.zfar,
        );
        proj * view
    }

    /// Return to the home pose, keeping projection parameters.
    pub fn reset(&mut self) {
        self.eye = HOME_EYE;
        self.target = Vec3::ZERO;
        self.up = Vec3::Y;
    }

    /// Frame a bounding box: aim at its center from the fixed oblique
    /// direction, at the distance where the largest extent fills the view
    /// with the fit margin. The clip planes are rescaled to the fitted
    /// distance. No-op on empty or zero-extent boxes.
    pub fn fit(&mut self, bounds: &Aabb) {
        if bounds.is_empty() {
            return;
        }
        let size = bounds.size();
        let max_dim = size.x.max(size.y).max(size.z);
        if max_dim <= 0.0 {
            return;
        }

        let center = bounds.center();
        let half_fov = self.fovy.to_radians() / 2.0;
        let distance = (max_dim / 2.0) / half_fov.tan() * FIT_MARGIN;

        self.target = center;
        self.eye = center + FIT_DIRECTION.normalize() * distance;
        self.znear = (distance / 1000.0).max(0.1);
        self.zfar = (distance * 10.0).max(2000.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(&CameraOptions::default(), 16.0 / 9.0)
    }

    #[test]
    fn starts_at_the_home_pose() {
        let cam = camera();
        assert_eq!(cam.eye, Vec3::new(0.0, 300.0, 500.0));
        assert_eq!(cam.target, Vec3::ZERO);
        assert_eq!(cam.fovy, 55.0);
        assert_eq!(cam.znear, 0.1);
        assert_eq!(cam.zfar, 200_000.0);
    }

    #[test]
    fn fit_frames_the_box_from_the_oblique_direction() {
        let mut cam = camera();
        cam.fovy = 90.0; // tan(45 deg) == 1 makes the distance easy to pin
        let bounds = Aabb::new(Vec3::ZERO, Vec3::splat(100.0));
        cam.fit(&bounds);

        let center = Vec3::splat(50.0);
        let distance = (100.0 / 2.0) * 1.6; // (max_dim / 2) / tan(45) * margin
        assert_eq!(cam.target, center);

        let expected_eye =
            center + Vec3::new(1.0, 0.9, 1.0).normalize() * distance;
        assert!((cam.eye - expected_eye).length() < 1e-3);
        assert!(((cam.eye - center).length() - distance).abs() < 1e-3);

        // Near/far rescale with floors.
        assert_eq!(cam.znear, 0.1); // 80 / 1000 floors at 0.1
        assert_eq!(cam.zfar, 2000.0); // 80 * 10 floors at 2000
    }

    #[test]
    fn fit_of_a_large_box_moves_the_clip_planes() {
        let mut cam = camera();
        let bounds = Aabb::new(Vec3::ZERO, Vec3::splat(100_000.0));
        cam.fit(&bounds);
        assert!(cam.znear > 0.1);
        assert!(cam.zfar > 2000.0);
        assert!((cam.zfar / cam.znear - 10_000.0).abs() < 1.0);
    }

    #[test]
    fn fit_ignores_empty_and_degenerate_boxes() {
        let mut cam = camera();
        let before = cam.clone();

        cam.fit(&Aabb::EMPTY);
        assert_eq!(cam.eye, before.eye);
        assert_eq!(cam.target, before.target);

        // A single point has zero extent on every axis.
        cam.fit(&Aabb::new(Vec3::splat(5.0), Vec3::splat(5.0)));
        assert_eq!(cam.eye, before.eye);
        assert_eq!(cam.target, before.target);
    }

    #[test]
    fn reset_restores_the_home_pose() {
        let mut cam = camera();
        cam.fit(&Aabb::new(Vec3::ZERO, Vec3::splat(10.0)));
        assert_ne!(cam.target, Vec3::ZERO);
        cam.reset();
        assert_eq!(cam.eye, Vec3::new(0.0, 300.0, 500.0));
        assert_eq!(cam.target, Vec3::ZERO);
        assert_eq!(cam.up, Vec3::Y);
    }

    #[test]
    fn view_projection_keeps_the_target_in_frustum() {
        let mut cam = camera();
        cam.fit(&Aabb::new(Vec3::ZERO, Vec3::splat(100.0)));
        let clip = cam.view_projection().project_point3(cam.target);
        assert!(clip.x.abs() <= 1.0);
        assert!(clip.y.abs() <= 1.0);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }
}
