use std::f32::consts::PI;

use rapier3d::math::Point;
use rapier3d::prelude::Real;

/// Sag at the middle of a drawn rope, as a fraction of its length.
const ROPE_SAG_FRACTION: Real = 0.02;

/// One grapple cable. Inactive cables hold only default values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cable {
    pub active: bool,
    /// World-space anchor; fixed while active.
    pub attach_point: Point<Real>,
    /// Physical emission point, kept facing the anchor.
    pub start_point: Point<Real>,
    /// Cosmetic emission point at the character's hip.
    pub visual_start_point: Point<Real>,
    pub length: Real,
    pub initial_length: Real,
    /// Set on fire; nothing gates on it.
    pub reeling: bool,
}

impl Default for Cable {
    fn default() -> Self {
        Self {
            active: false,
            attach_point: Point::origin(),
            start_point: Point::origin(),
            visual_start_point: Point::origin(),
            length: 0.0,
            initial_length: 0.0,
            reeling: false,
        }
    }
}

impl Cable {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Polyline from the visual start to the anchor with a slight downward sag.
    pub fn rope_points(&self, segments: usize) -> Vec<Point<Real>> {
        if !self.active || segments == 0 {
            return Vec::new();
        }
        let span = self.attach_point - self.visual_start_point;
        let sag_scale = 0.5 * span.norm() * ROPE_SAG_FRACTION;
        (0..=segments)
            .map(|i| {
                let t = i as Real / segments as Real;
                let mut point = self.visual_start_point + span * t;
                point.y -= sag_scale * (t * PI).sin();
                point
            })
            .collect()
    }
}

/// Anchor distance between two active cables.
pub fn separation(a: &Cable, b: &Cable) -> Option<Real> {
    if a.active && b.active {
        Some((a.attach_point - b.attach_point).norm())
    } else {
        None
    }
}
