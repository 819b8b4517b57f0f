//! Camera: view/projection derivation, chase-follow and free-look modes.
//!
//! Inverse matrices are built analytically from the same parameters as
//! their forward counterparts instead of inverting numerically; the
//! environment backdrop relies on that pair to reconstruct per-pixel view
//! directions.

use std::f32::consts::{FRAC_PI_4, PI};

use crate::input::{InputState, Key};
use crate::math::{Mat4, Vec3};

/// Units per second the free-look mode travels along the view ray.
const DRIVE_SPEED: f32 = 5.0;

#[derive(Debug, Clone)]
pub struct Camera {
    eye: Vec3,
    lookat: Vec3,
    up: Vec3,
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
    velocity: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    pub fn new() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 2.0),
            lookat: Vec3::new(0.0, 0.0, 0.0),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: FRAC_PI_4,
            aspect: 1.0,
            near: 0.01,
            far: 10.0,
            velocity: Vec3::default(),
        }
    }

    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    /// Look-at basis: `w` back, `u` right, `v` up.
    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let w = (self.eye - self.lookat).normalize();
        let u = self.up.cross(w).normalize();
        let v = w.cross(u);
        (u, v, w)
    }

    #[rustfmt::skip]
    pub fn view_matrix(&self) -> Mat4 {
        let (u, v, w) = self.basis();
        Mat4::translation(-self.eye)
            * Mat4::new(
                u.x,  v.x,  w.x,  0.0,
                u.y,  v.y,  w.y,  0.0,
                u.z,  v.z,  w.z,  0.0,
                0.0,  0.0,  0.0,  1.0,
            )
    }

    /// Rotation block of the view inverse only; the translation part is
    /// deliberately left out because its consumer transforms directions.
    #[rustfmt::skip]
    pub fn inverse_view_matrix(&self) -> Mat4 {
        let (u, v, w) = self.basis();
        Mat4::new(
            u.x,  u.y,  u.z,  0.0,
            v.x,  v.y,  v.z,  0.0,
            w.x,  w.y,  w.z,  0.0,
            0.0,  0.0,  0.0,  1.0,
        )
    }

    #[rustfmt::skip]
    pub fn projection_matrix(&self) -> Mat4 {
        debug_assert!(self.near > 0.0 && self.near < self.far);
        let sy = 1.0 / (self.fov / 2.0).tan();
        let (n, f) = (self.near, self.far);
        Mat4::new(
            sy / self.aspect, 0.0,  0.0,                      0.0,
            0.0,              sy,   0.0,                      0.0,
            0.0,              0.0,  -(f + n) / (f - n),      -1.0,
            0.0,              0.0,  -2.0 * f * n / (f - n),   0.0,
        )
    }

    #[rustfmt::skip]
    pub fn inverse_projection_matrix(&self) -> Mat4 {
        let sy = 1.0 / (self.fov / 2.0).tan();
        let (n, f) = (self.near, self.far);
        Mat4::new(
            self.aspect / sy, 0.0,      0.0,   0.0,
            0.0,              1.0 / sy, 0.0,   0.0,
            0.0,              0.0,      0.0,   (n - f) / (2.0 * f * n),
            0.0,              0.0,     -1.0,   (f + n) / (2.0 * f * n),
        )
    }

    /// Clip-to-world direction matrix consumed by the environment shader.
    pub fn view_dir_matrix(&self) -> Mat4 {
        self.inverse_projection_matrix() * self.inverse_view_matrix()
    }

    /// Chase mode: a rigid offset behind and above the target, re-aimed at
    /// a point above it every frame. No smoothing, so the camera trails the
    /// avatar by exactly the one frame between its move and this call.
    pub fn follow(&mut self, target: Vec3, orientation_deg: f32) {
        let radians = orientation_deg * (PI / 180.0);
        self.eye = target + Vec3::new(2.0 * radians.cos(), 2.0, 2.0 * radians.sin());
        self.lookat = target + Vec3::new(0.0, 1.5, 0.0);
    }

    /// Free-look mode: drive the eye along the view ray and swing the look
    /// target around the up axis.
    pub fn free_move(&mut self, dt: f32, input: &InputState) {
        self.velocity = (self.lookat - self.eye).normalize() * DRIVE_SPEED;

        if input.held(Key::CameraForward) {
            self.eye = self.eye + self.velocity * dt;
        }
        if input.held(Key::CameraBackward) {
            self.eye = self.eye - self.velocity * dt;
        }
        if input.held(Key::CameraLeft) {
            self.swing_lookat(0.5 * dt);
        }
        if input.held(Key::CameraRight) {
            self.swing_lookat(-0.5 * dt);
        }
    }

    fn swing_lookat(&mut self, radians: f32) {
        let ahead = (self.lookat - self.eye).normalize();
        let right = self.up.cross(ahead).normalize();
        let turned = ahead * radians.cos() + right * radians.sin();
        self.lookat = self.eye + turned * (self.lookat - self.eye).length();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_identity(m: Mat4, eps: f32) -> bool {
        let id = Mat4::identity();
        (0..4).all(|i| (0..4).all(|j| (m.m[i][j] - id.m[i][j]).abs() < eps))
    }

    #[test]
    fn test_chase_follow_is_exact() {
        let mut camera = Camera::new();
        camera.follow(Vec3::new(0.0, 0.0, 0.0), 0.0);
        assert_eq!(camera.eye(), Vec3::new(2.0, 2.0, 0.0));
        assert_eq!(camera.lookat, Vec3::new(0.0, 1.5, 0.0));

        // Quarter turn moves the offset onto the z axis.
        camera.follow(Vec3::new(1.0, 0.0, -1.0), 90.0);
        let eye = camera.eye();
        assert!((eye.x - 1.0).abs() < 1e-5);
        assert!((eye.y - 2.0).abs() < 1e-6);
        assert!((eye.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_projection_inverse_round_trip() {
        let camera = Camera::new();
        let m = camera.projection_matrix() * camera.inverse_projection_matrix();
        assert!(approx_identity(m, 1e-5));
    }

    #[test]
    fn test_inverse_view_undoes_rotation() {
        let mut camera = Camera::new();
        camera.follow(Vec3::new(3.0, 0.0, -2.0), 35.0);

        // The analytic inverse covers the rotation block only, so compose
        // it with the forward rotation part by canceling the translation.
        let view = Mat4::translation(camera.eye()) * camera.view_matrix();
        let m = view * camera.inverse_view_matrix();
        assert!(approx_identity(m, 1e-5));
    }

    #[test]
    fn test_free_move_drives_along_view_ray() {
        let mut camera = Camera::new();
        let mut input = InputState::new();
        input.set(Key::CameraForward, true);

        // Looking down -z from (0,0,2): one second at speed 5 lands at -3.
        camera.free_move(1.0, &input);
        assert!((camera.eye().z - -3.0).abs() < 1e-5);
        assert!(camera.eye().x.abs() < 1e-6);
    }
}
