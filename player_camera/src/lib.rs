//! Player orientation and the camera pose derived from it.
//!
//! Angles are in degrees. Yaw 0 faces +X; yaw -90 faces -Z.
#![forbid(unsafe_code)]

use rapier3d::math::{Point, Vector};
use rapier3d::prelude::Real;

const PITCH_LIMIT: Real = 89.0;
const DEFAULT_YAW: Real = -90.0;
const DEFAULT_SENSITIVITY: Real = 0.1;

#[derive(Clone, Copy, Debug)]
pub struct CameraPose {
    pub eye: Point<Real>,
    pub look: Vector<Real>,
    pub yaw: Real,
    pub pitch: Real,
}

#[derive(Clone, Copy, Debug)]
pub struct PlayerCamera {
    eye_height: Real,
    sensitivity: Real,
    yaw: Real,
    pitch: Real,
}

impl PlayerCamera {
    /// `eye_height` is measured from the capsule center.
    pub fn new(eye_height: Real) -> Self {
        Self {
            eye_height,
            sensitivity: DEFAULT_SENSITIVITY,
            yaw: DEFAULT_YAW,
            pitch: 0.0,
        }
    }

    pub fn with_sensitivity(mut self, sensitivity: Real) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn yaw(&self) -> Real {
        self.yaw
    }

    pub fn pitch(&self) -> Real {
        self.pitch
    }

    pub fn set_look(&mut self, yaw: Real, pitch: Real) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Applies a mouse delta in pixels; moving the mouse down looks down.
    pub fn apply_look_delta(&mut self, dx: Real, dy: Real) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch - dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Flat movement forward; pitch never tilts the movement axes.
    pub fn forward(&self) -> Vector<Real> {
        let yaw = self.yaw.to_radians();
        Vector::new(yaw.cos(), 0.0, yaw.sin())
    }

    pub fn right(&self) -> Vector<Real> {
        self.forward().cross(&Vector::y()).normalize()
    }

    /// Pitched view direction, used for aiming.
    pub fn look(&self) -> Vector<Real> {
        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.to_radians();
        Vector::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize()
    }

    pub fn pose(&self, origin: Point<Real>) -> CameraPose {
        CameraPose {
            eye: origin + Vector::new(0.0, self.eye_height, 0.0),
            look: self.look(),
            yaw: self.yaw,
            pitch: self.pitch,
        }
    }
}
