//! Pinhole camera and its GPU uniform block.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Pinhole camera: eye position, look-at target, projection parameters,
/// the derived viewport vectors, and the accumulation frame counter.
///
/// The camera is owned by the UI role and sent to the render role by
/// value. Only the UI ever changes `frame_count`; the render role copies
/// whatever value it last received into the uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Eye position in world space.
    pub origin: Vec3,
    /// Look-at target position.
    pub look_at: Vec3,
    /// Up direction.
    pub v_up: Vec3,
    /// Vertical field of view in degrees.
    pub vfov_deg: f32,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Accumulation counter. 0 tells the kernel to discard any stored
    /// samples and start over.
    pub frame_count: u32,

    lower_left: Vec3,
    horizontal: Vec3,
    vertical: Vec3,
}

impl Camera {
    /// Camera at `origin` looking at `look_at` with world-space +Y up.
    #[must_use]
    pub fn new(origin: Vec3, look_at: Vec3, vfov_deg: f32, aspect: f32) -> Self {
        let mut camera = Self {
            origin,
            look_at,
            v_up: Vec3::Y,
            vfov_deg,
            aspect,
            frame_count: 0,
            lower_left: Vec3::ZERO,
            horizontal: Vec3::ZERO,
            vertical: Vec3::ZERO,
        };
        camera.recompute_viewport();
        camera
    }

    /// Lower-left corner of the image plane.
    #[must_use]
    pub fn lower_left(&self) -> Vec3 {
        self.lower_left
    }

    /// Horizontal span of the image plane.
    #[must_use]
    pub fn horizontal(&self) -> Vec3 {
        self.horizontal
    }

    /// Vertical span of the image plane.
    #[must_use]
    pub fn vertical(&self) -> Vec3 {
        self.vertical
    }

    /// World-space ray direction through normalized image coordinates
    /// `(s, t)` in `[0, 1]^2`.
    #[must_use]
    pub fn ray_direction(&self, s: f32, t: f32) -> Vec3 {
        self.lower_left + s * self.horizontal + t * self.vertical - self.origin
    }

    /// Move the eye (and target, preserving view direction) along the
    /// camera's forward axis.
    pub fn move_forward(&mut self, distance: f32) {
        let forward = (self.look_at - self.origin).normalize();
        self.translate(forward * distance);
    }

    /// Move along the camera's right axis.
    pub fn strafe(&mut self, distance: f32) {
        let forward = (self.look_at - self.origin).normalize();
        let right = forward.cross(self.v_up).normalize();
        self.translate(right * distance);
    }

    /// Move along the up axis.
    pub fn rise(&mut self, distance: f32) {
        self.translate(self.v_up.normalize() * distance);
    }

    fn translate(&mut self, delta: Vec3) {
        self.origin += delta;
        self.look_at += delta;
        self.recompute_viewport();
    }

    /// Reset the accumulation counter. Called by the UI on every camera
    /// movement, scene edit, or shading toggle.
    pub fn reset_accumulation(&mut self) {
        self.frame_count = 0;
    }

    /// Advance the accumulation counter by one tick.
    pub fn advance_frame(&mut self) {
        self.frame_count += 1;
    }

    /// Rebuild the viewport triple from origin/look-at/projection. Called
    /// by every mutation of those fields.
    fn recompute_viewport(&mut self) {
        let theta = self.vfov_deg.to_radians();
        let half_height = (theta * 0.5).tan();
        let viewport_height = 2.0 * half_height;
        let viewport_width = self.aspect * viewport_height;

        let w = (self.origin - self.look_at).normalize();
        let u = self.v_up.cross(w).normalize();
        let v = w.cross(u);

        self.horizontal = viewport_width * u;
        self.vertical = viewport_height * v;
        self.lower_left =
            self.origin - self.horizontal * 0.5 - self.vertical * 0.5 - w;
    }
}

/// GPU uniform block mirroring the kernel's camera struct: 80 bytes,
/// vec3 fields on 16-byte boundaries, scalars packed at offset 64.
///
/// Rewritten in full by the render role before every submit from the most
/// recent camera value, sky flag, and exposure it received.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    origin: [f32; 3],
    _pad0: f32,
    lower_left: [f32; 3],
    _pad1: f32,
    horizontal: [f32; 3],
    _pad2: f32,
    vertical: [f32; 3],
    _pad3: f32,
    frame_count: u32,
    sky_enabled: u32,
    exposure: f32,
    _pad4: u32,
}

impl CameraUniform {
    /// Pack a camera value plus the global shading toggles.
    #[must_use]
    pub fn new(camera: &Camera, sky_enabled: bool, exposure: f32) -> Self {
        Self {
            origin: camera.origin.to_array(),
            _pad0: 0.0,
            lower_left: camera.lower_left().to_array(),
            _pad1: 0.0,
            horizontal: camera.horizontal().to_array(),
            _pad2: 0.0,
            vertical: camera.vertical().to_array(),
            _pad3: 0.0,
            frame_count: camera.frame_count,
            sky_enabled: u32::from(sky_enabled),
            exposure,
            _pad4: 0,
        }
    }

    /// The packed accumulation counter.
    #[must_use]
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use std::mem::{offset_of, size_of};

    use super::*;

    fn test_camera() -> Camera {
        Camera::new(Vec3::new(0.0, 2.0, 6.0), Vec3::ZERO, 60.0, 16.0 / 9.0)
    }

    #[test]
    fn uniform_block_layout() {
        assert_eq!(size_of::<CameraUniform>(), 80);
        assert_eq!(offset_of!(CameraUniform, origin), 0);
        assert_eq!(offset_of!(CameraUniform, lower_left), 16);
        assert_eq!(offset_of!(CameraUniform, horizontal), 32);
        assert_eq!(offset_of!(CameraUniform, vertical), 48);
        assert_eq!(offset_of!(CameraUniform, frame_count), 64);
        assert_eq!(offset_of!(CameraUniform, sky_enabled), 68);
        assert_eq!(offset_of!(CameraUniform, exposure), 72);
    }

    #[test]
    fn center_ray_points_at_target() {
        let camera = test_camera();
        let direction = camera.ray_direction(0.5, 0.5).normalize();
        let expected = (camera.look_at - camera.origin).normalize();
        assert!((direction - expected).length() < 1e-5);
    }

    #[test]
    fn viewport_follows_movement() {
        let mut camera = test_camera();
        let before = camera.lower_left();
        camera.strafe(3.0);
        let after = camera.lower_left();
        assert_ne!(before, after);
        // Direction is preserved: the viewport translated with the eye.
        let direction = camera.ray_direction(0.5, 0.5).normalize();
        let expected = (camera.look_at - camera.origin).normalize();
        assert!((direction - expected).length() < 1e-5);
    }

    #[test]
    fn movement_preserves_distance_to_target() {
        let mut camera = test_camera();
        let before = (camera.look_at - camera.origin).length();
        camera.move_forward(2.0);
        camera.rise(-1.0);
        let after = (camera.look_at - camera.origin).length();
        assert!((before - after).abs() < 1e-5);
    }

    #[test]
    fn accumulation_counter_protocol() {
        let mut camera = test_camera();
        assert_eq!(camera.frame_count, 0);
        for expected in 1..=32 {
            camera.advance_frame();
            assert_eq!(camera.frame_count, expected);
        }
        camera.reset_accumulation();
        assert_eq!(camera.frame_count, 0);
    }

    #[test]
    fn uniform_packs_toggles() {
        let mut camera = test_camera();
        camera.advance_frame();
        let uniform = CameraUniform::new(&camera, true, 1.5);
        assert_eq!(uniform.frame_count(), 1);
        assert_eq!(uniform.sky_enabled, 1);
        assert_eq!(uniform.exposure, 1.5);

        let off = CameraUniform::new(&camera, false, 1.0);
        assert_eq!(off.sky_enabled, 0);
    }
}
