//! Keyboard-to-camera input mapping.
//!
//! The UI layer translates its toolkit's key state into a [`MotionKeys`]
//! snapshot per tick; applying it moves the camera along its own axes.
//! Kept toolkit-free so the mapping is testable headless.

use crate::camera::Camera;

/// Pressed state of the six camera-motion keys for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionKeys {
    /// W: along the view direction.
    pub forward: bool,
    /// S: against the view direction.
    pub back: bool,
    /// D: along the camera's right axis.
    pub right: bool,
    /// A: against the camera's right axis.
    pub left: bool,
    /// E: up.
    pub up: bool,
    /// Q: down.
    pub down: bool,
}

impl MotionKeys {
    /// Whether any motion key is held.
    #[must_use]
    pub fn any(&self) -> bool {
        self.forward || self.back || self.right || self.left || self.up || self.down
    }

    /// Apply one tick of movement to `camera`, `step` world units per held
    /// key. Returns `true` when the camera moved (and therefore needs an
    /// accumulation reset).
    pub fn apply(&self, camera: &mut Camera, step: f32) -> bool {
        if self.forward {
            camera.move_forward(step);
        }
        if self.back {
            camera.move_forward(-step);
        }
        if self.right {
            camera.strafe(step);
        }
        if self.left {
            camera.strafe(-step);
        }
        if self.up {
            camera.rise(step);
        }
        if self.down {
            camera.rise(-step);
        }
        self.any()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 60.0, 1.0)
    }

    #[test]
    fn no_keys_no_motion() {
        let mut cam = camera();
        let before = cam.origin;
        let keys = MotionKeys::default();
        assert!(!keys.apply(&mut cam, 0.5));
        assert_eq!(cam.origin, before);
    }

    #[test]
    fn forward_moves_toward_the_target() {
        let mut cam = camera();
        let keys = MotionKeys {
            forward: true,
            ..Default::default()
        };
        assert!(keys.apply(&mut cam, 2.0));
        // Looking down -z from z = 10: forward decreases z.
        assert!((cam.origin.z - 8.0).abs() < 1e-5);
        assert_eq!(cam.origin.x, 0.0);
    }

    #[test]
    fn vertical_keys_move_along_up() {
        let mut cam = camera();
        let keys = MotionKeys {
            up: true,
            ..Default::default()
        };
        let _ = keys.apply(&mut cam, 1.5);
        assert!((cam.origin.y - 1.5).abs() < 1e-5);

        let keys = MotionKeys {
            down: true,
            ..Default::default()
        };
        let _ = keys.apply(&mut cam, 1.5);
        assert!(cam.origin.y.abs() < 1e-5);
    }

    #[test]
    fn opposing_keys_cancel_but_still_count_as_motion() {
        let mut cam = camera();
        let before = cam.origin;
        let keys = MotionKeys {
            forward: true,
            back: true,
            ..Default::default()
        };
        assert!(keys.apply(&mut cam, 1.0));
        assert!((cam.origin - before).length() < 1e-5);
    }

    #[test]
    fn strafe_is_perpendicular_to_view() {
        let mut cam = camera();
        let keys = MotionKeys {
            right: true,
            ..Default::default()
        };
        let _ = keys.apply(&mut cam, 3.0);
        // Looking down -z with +Y up: right is +x.
        assert!((cam.origin.x - 3.0).abs() < 1e-4);
        assert!((cam.origin.z - 10.0).abs() < 1e-4);
    }
}
