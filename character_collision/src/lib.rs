//! Rapier KCC wrapper: capsule sweep-and-slide with collision flag feedback.
//!
//! Policy: collision/stepping must use Rapier KCC; do not reimplement step/slide logic.
#![forbid(unsafe_code)]

use physics_rapier::PhysicsWorld;
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::math::{Isometry, Point, Vector};
use rapier3d::prelude::{Capsule, QueryFilter, Real};
use serde::Deserialize;

/// Normals pointing further down than this count as ceiling contacts.
const CEILING_DOT: Real = -0.1;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CollisionProfile {
    /// Total capsule height in meters, caps included.
    pub height: Real,
    /// Capsule radius in meters.
    pub radius: Real,
    /// Maximum step height for auto-stepping in meters.
    pub step_height: Real,
    /// Minimum width of free space required after stepping.
    pub step_min_width: Real,
    /// Maximum climbable slope angle in degrees.
    pub max_slope_deg: Real,
    /// Distance to snap to ground in meters.
    pub ground_snap_distance: Real,
    /// Small separation to preserve between character and environment.
    pub offset: Real,
}

impl Default for CollisionProfile {
    fn default() -> Self {
        Self::odm_default()
    }
}

impl CollisionProfile {
    pub fn odm_default() -> Self {
        Self {
            height: 1.8,
            radius: 0.35,
            step_height: 0.3,
            step_min_width: 0.2,
            max_slope_deg: 45.0,
            ground_snap_distance: 0.2,
            offset: 0.05,
        }
    }

    /// Half of the distance between the two cap centers.
    pub fn half_segment(&self) -> Real {
        ((self.height - 2.0 * self.radius) * 0.5).max(0.0)
    }

    /// Distance from the capsule center down to the lowest point of the bottom cap.
    pub fn center_to_foot(&self) -> Real {
        self.half_segment() + self.radius
    }

    fn capsule(&self) -> Capsule {
        Capsule::new_y(self.half_segment(), self.radius)
    }

    fn apply_to(&self, controller: &mut KinematicCharacterController) {
        controller.up = Vector::y_axis();
        controller.autostep = if self.step_height > 0.0 {
            Some(CharacterAutostep {
                max_height: CharacterLength::Absolute(self.step_height),
                min_width: CharacterLength::Absolute(self.step_min_width),
                include_dynamic_bodies: false,
            })
        } else {
            None
        };
        controller.max_slope_climb_angle = self.max_slope_deg.to_radians();
        controller.min_slope_slide_angle = self.max_slope_deg.to_radians();
        controller.snap_to_ground = if self.ground_snap_distance > 0.0 {
            Some(CharacterLength::Absolute(self.ground_snap_distance))
        } else {
            None
        };
        controller.offset = CharacterLength::Absolute(self.offset);
    }
}

/// Which sides of the capsule touched geometry during one move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollisionFlags {
    pub down: bool,
    pub up: bool,
    pub sides: bool,
}

impl CollisionFlags {
    pub fn any(&self) -> bool {
        self.down || self.up || self.sides
    }
}

/// Read-only view of a character capsule.
pub trait CharacterBody {
    /// Capsule center.
    fn position(&self) -> Point<Real>;

    fn profile(&self) -> CollisionProfile;

    /// Lowest point of the bottom cap.
    fn foot_position(&self) -> Point<Real> {
        let center = self.position();
        Point::new(
            center.x,
            center.y - self.profile().center_to_foot(),
            center.z,
        )
    }
}

/// A capsule that resolves displacements against a scene of type `S`.
pub trait CharacterController<S: ?Sized>: CharacterBody {
    /// Sweeps the capsule by `displacement`. A zero `dt` or a displacement shorter
    /// than `min_travel` leaves the capsule in place and reports no contact.
    fn move_character(
        &mut self,
        scene: &S,
        displacement: Vector<Real>,
        min_travel: Real,
        dt: Real,
    ) -> CollisionFlags;
}

pub struct CharacterCollision {
    profile: CollisionProfile,
    controller: KinematicCharacterController,
    capsule: Capsule,
    position: Isometry<Real>,
}

impl CharacterCollision {
    pub fn new(profile: CollisionProfile, spawn: Point<Real>) -> Self {
        let capsule = profile.capsule();
        let mut controller = KinematicCharacterController::default();
        profile.apply_to(&mut controller);
        Self {
            profile,
            controller,
            capsule,
            position: Isometry::translation(spawn.x, spawn.y, spawn.z),
        }
    }

    pub fn set_profile(&mut self, profile: CollisionProfile) {
        self.profile = profile;
        self.capsule = profile.capsule();
        profile.apply_to(&mut self.controller);
    }

    pub fn capsule(&self) -> &Capsule {
        &self.capsule
    }

    pub fn teleport(&mut self, position: Point<Real>) {
        self.position = Isometry::translation(position.x, position.y, position.z);
    }
}

impl CharacterController<PhysicsWorld> for CharacterCollision {
    fn move_character(
        &mut self,
        world: &PhysicsWorld,
        displacement: Vector<Real>,
        min_travel: Real,
        dt: Real,
    ) -> CollisionFlags {
        if dt <= 0.0 || displacement.norm() < min_travel.max(0.0) {
            return CollisionFlags::default();
        }
        let up = Vector::y();
        let floor_dot = self.controller.max_slope_climb_angle.cos();
        let original_snap = self.controller.snap_to_ground;
        if displacement.y > 0.0 {
            self.controller.snap_to_ground = None;
        }

        let mut flags = CollisionFlags::default();
        let output = self.controller.move_shape(
            dt,
            world.bodies(),
            world.colliders(),
            world.query_pipeline(),
            &self.capsule,
            &self.position,
            displacement,
            QueryFilter::default(),
            |collision| {
                let up_dot = collision.hit.normal1.dot(&up);
                if up_dot >= floor_dot {
                    flags.down = true;
                } else if up_dot <= CEILING_DOT {
                    flags.up = true;
                } else {
                    flags.sides = true;
                }
            },
        );
        self.controller.snap_to_ground = original_snap;

        if output.grounded && displacement.y <= 0.0 {
            flags.down = true;
        }
        self.position.translation.vector += output.translation;
        flags
    }
}

impl CharacterBody for CharacterCollision {
    fn position(&self) -> Point<Real> {
        Point::from(self.position.translation.vector)
    }

    fn profile(&self) -> CollisionProfile {
        self.profile
    }
}
