//! Dual grapple cables: anchor search, fire/release, obstruction checks.
//!
//! The gear only owns cable state and geometry. Reel movement lives in the
//! player controller, which reads anchors from here.
#![forbid(unsafe_code)]

pub mod cable;

use physics_rapier::SceneQuery;
use rapier3d::math::{Point, Vector};
use rapier3d::prelude::Real;
use serde::Deserialize;
use tracing::debug;

pub use cable::{separation, Cable};

const DIRECTION_EPS: Real = 1.0e-6;

/// Upper bound on rays cast per side by one anchor search.
pub const MAX_SCAN_STEPS: u32 = 3600;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GearConfig {
    /// Player capsule height; the hip sits `hip_drop_fraction` of it below center.
    pub player_height: Real,
    pub hip_drop_fraction: Real,
    /// Lateral hip offset the scan rays start from.
    pub fire_offset: Real,
    /// Lateral hip offset of the drawn rope start.
    pub visual_offset: Real,
    /// Distance from the hip center toward the anchor of the physical start point.
    pub emission_offset: Real,
    pub scan_angle_deg: Real,
    pub scan_step_deg: Real,
    pub max_distance: Real,
    /// Minimum distance between the two anchors.
    pub min_separation: Real,
    /// Obstruction rays skip this much of each cable end.
    pub obstruction_inset: Real,
    /// Cables shorter than this are never considered blocked.
    pub min_blockable_length: Real,
    pub min_obstruction_ray: Real,
}

impl Default for GearConfig {
    fn default() -> Self {
        Self {
            player_height: 1.8,
            hip_drop_fraction: 0.3,
            fire_offset: 0.3,
            visual_offset: 0.4,
            emission_offset: 0.3,
            scan_angle_deg: 60.0,
            scan_step_deg: 1.0,
            max_distance: 100.0,
            min_separation: 2.0,
            obstruction_inset: 0.3,
            min_blockable_length: 0.5,
            min_obstruction_ray: 0.1,
        }
    }
}

impl GearConfig {
    fn scan_steps(&self) -> u32 {
        if self.scan_step_deg <= 0.0 || self.scan_angle_deg <= 0.0 {
            return 0;
        }
        let steps = (self.scan_angle_deg / self.scan_step_deg + 1.0e-4).floor();
        if steps.is_finite() {
            (steps as u32).min(MAX_SCAN_STEPS)
        } else {
            MAX_SCAN_STEPS
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Direction of the scan sweep and hip offset along the player's right axis.
    pub fn sign(self) -> Real {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Released {
    pub left: bool,
    pub right: bool,
}

impl Released {
    pub fn any(&self) -> bool {
        self.left || self.right
    }
}

#[derive(Clone, Debug, Default)]
pub struct OdmGear {
    config: GearConfig,
    left: Cable,
    right: Cable,
    is_active: bool,
}

impl OdmGear {
    pub fn new(config: GearConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &GearConfig {
        &self.config
    }

    pub fn left(&self) -> &Cable {
        &self.left
    }

    pub fn right(&self) -> &Cable {
        &self.right
    }

    pub fn cable(&self, side: Side) -> &Cable {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn cable_mut(&mut self, side: Side) -> &mut Cable {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// True while either cable is attached. Kept current by fire, release and `update`.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Live check, independent of `update`.
    pub fn any_active(&self) -> bool {
        self.left.active || self.right.active
    }

    pub fn both_active(&self) -> bool {
        self.left.active && self.right.active
    }

    pub fn anchor_separation(&self) -> Option<Real> {
        separation(&self.left, &self.right)
    }

    /// Mean of all active anchors.
    pub fn target_center(&self) -> Option<Point<Real>> {
        let mut sum = Vector::zeros();
        let mut count = 0;
        for cable in [&self.left, &self.right] {
            if cable.active {
                sum += cable.attach_point.coords;
                count += 1;
            }
        }
        if count == 0 {
            return None;
        }
        Some(Point::from(sum / count as Real))
    }

    pub fn hip_center(&self, position: Point<Real>) -> Point<Real> {
        let drop = self.config.player_height * self.config.hip_drop_fraction;
        position - Vector::new(0.0, drop, 0.0)
    }

    /// Sweeps from `forward` toward `right * side` in fixed steps and returns the
    /// first grappleable hit at least `min_separation` from `excluded`.
    ///
    /// Scan order wins over distance: a far anchor straight ahead beats a near
    /// one off to the side.
    pub fn find_anchor<S: SceneQuery + ?Sized>(
        &self,
        scene: &S,
        origin: Point<Real>,
        forward: Vector<Real>,
        right: Vector<Real>,
        side: Side,
        excluded: Option<Point<Real>>,
    ) -> Option<Point<Real>> {
        for step in 0..=self.config.scan_steps() {
            let angle = (step as Real * self.config.scan_step_deg * side.sign()).to_radians();
            let dir = forward * angle.cos() + right * angle.sin();
            let len = dir.norm();
            if len <= DIRECTION_EPS {
                continue;
            }
            let Some(hit) = scene.raycast(origin, dir / len, self.config.max_distance) else {
                continue;
            };
            let Some(actor) = hit.actor else {
                continue;
            };
            if !scene.is_grappleable(actor) {
                continue;
            }
            if let Some(other) = excluded {
                if (hit.point - other).norm() < self.config.min_separation {
                    continue;
                }
            }
            return Some(hit.point);
        }
        None
    }

    /// Fires the cable on `side`. Leaves it untouched when no anchor qualifies.
    pub fn fire<S: SceneQuery + ?Sized>(
        &mut self,
        scene: &S,
        side: Side,
        position: Point<Real>,
        forward: Vector<Real>,
        right: Vector<Real>,
    ) -> bool {
        let hip = self.hip_center(position);
        let emission = hip + right * (self.config.fire_offset * side.sign());
        let other = self.cable(side.other());
        let excluded = other.active.then_some(other.attach_point);

        let Some(anchor) = self.find_anchor(scene, emission, forward, right, side, excluded) else {
            debug!(?side, "grapple found no anchor");
            return false;
        };

        let visual = hip + right * (self.config.visual_offset * side.sign());
        let length = (anchor - emission).norm();
        let cable = self.cable_mut(side);
        *cable = Cable {
            active: true,
            attach_point: anchor,
            start_point: emission,
            visual_start_point: visual,
            length,
            initial_length: length,
            reeling: true,
        };
        self.is_active = true;
        debug!(?side, x = anchor.x, y = anchor.y, z = anchor.z, length, "grapple attached");
        true
    }

    pub fn fire_left<S: SceneQuery + ?Sized>(
        &mut self,
        scene: &S,
        position: Point<Real>,
        forward: Vector<Real>,
        right: Vector<Real>,
    ) -> bool {
        self.fire(scene, Side::Left, position, forward, right)
    }

    pub fn fire_right<S: SceneQuery + ?Sized>(
        &mut self,
        scene: &S,
        position: Point<Real>,
        forward: Vector<Real>,
        right: Vector<Real>,
    ) -> bool {
        self.fire(scene, Side::Right, position, forward, right)
    }

    pub fn release(&mut self, side: Side) {
        let cable = self.cable_mut(side);
        if cable.active {
            debug!(?side, "grapple released");
        }
        cable.reset();
        self.is_active = self.any_active();
    }

    pub fn release_left(&mut self) {
        self.release(Side::Left);
    }

    pub fn release_right(&mut self) {
        self.release(Side::Right);
    }

    /// True when geometry crosses the cable away from both of its ends.
    pub fn is_blocked<S: SceneQuery + ?Sized>(&self, scene: &S, cable: &Cable) -> bool {
        if !cable.active {
            return false;
        }
        let span = cable.attach_point - cable.start_point;
        let dist = span.norm();
        if dist < self.config.min_blockable_length {
            return false;
        }
        let dir = span / dist;
        let ray_start = cable.start_point + dir * self.config.obstruction_inset;
        let ray_dist = dist - 2.0 * self.config.obstruction_inset;
        if ray_dist < self.config.min_obstruction_ray {
            return false;
        }
        scene.raycast_short(ray_start, dir, ray_dist)
    }

    pub fn check_obstructions<S: SceneQuery + ?Sized>(&mut self, scene: &S) -> Released {
        let released = Released {
            left: self.is_blocked(scene, &self.left),
            right: self.is_blocked(scene, &self.right),
        };
        if released.left {
            debug!("left cable obstructed");
            self.release_left();
        }
        if released.right {
            debug!("right cable obstructed");
            self.release_right();
        }
        released
    }

    /// Re-aims the physical start points at their anchors and pins the visual
    /// start points to the hips.
    pub fn refresh_geometry(&mut self, player_position: Point<Real>, player_right: Vector<Real>) {
        let hip = self.hip_center(player_position);
        let emission_offset = self.config.emission_offset;
        let visual_offset = self.config.visual_offset;
        for side in [Side::Left, Side::Right] {
            let cable = self.cable_mut(side);
            if !cable.active {
                continue;
            }
            let to_anchor = cable.attach_point - hip;
            let horizontal = Vector::new(to_anchor.x, 0.0, to_anchor.z);
            let horizontal_len = horizontal.norm();
            cable.start_point = if horizontal_len > DIRECTION_EPS {
                hip + horizontal / horizontal_len * emission_offset
            } else {
                hip
            };
            cable.length = (cable.attach_point - cable.start_point).norm();
            cable.visual_start_point = hip + player_right * (visual_offset * side.sign());
        }
    }

    pub fn update(&mut self, _dt: Real, _grounded: bool) {
        self.is_active = self.any_active();
    }
}
