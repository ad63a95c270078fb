//! Player locomotion: walking, jumping and cable-assisted ground reeling.
//!
//! The player owns its gear, orientation and character controller. Each
//! `update` composes one displacement, hands it to the controller, and feeds
//! the collision result back into ground and velocity state.
#![forbid(unsafe_code)]

use character_collision::{CharacterBody, CharacterController, CollisionFlags};
use odm_gear::{GearConfig, OdmGear, Released, Side};
use physics_rapier::SceneQuery;
use player_camera::{CameraPose, PlayerCamera};
use rapier3d::math::{Point, Vector};
use rapier3d::prelude::Real;
use serde::Deserialize;
use tracing::debug;

/// Eye height above the capsule center, as a fraction of capsule height.
const EYE_HEIGHT_FRACTION: Real = 0.45;

/// Held keys for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    /// Reel modifier: turns movement keys into cable movement while grounded.
    pub reel: bool,
}

impl InputSnapshot {
    fn walk_direction(&self, forward: Vector<Real>, right: Vector<Real>) -> Vector<Real> {
        let mut dir = Vector::zeros();
        if self.forward {
            dir += forward;
        }
        if self.back {
            dir -= forward;
        }
        if self.left {
            dir -= right;
        }
        if self.right {
            dir += right;
        }
        let len = dir.norm();
        if len > 0.0 {
            dir / len
        } else {
            dir
        }
    }

    fn lateral(&self) -> Option<Side> {
        match (self.left, self.right) {
            (true, false) => Some(Side::Left),
            (false, true) => Some(Side::Right),
            _ => None,
        }
    }

    /// +1 reels in, -1 reels out.
    fn radial(&self) -> Real {
        match (self.forward, self.back) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    pub walk_speed: Real,
    pub jump_speed: Real,
    pub gravity: Real,
    pub terminal_fall_speed: Real,
    pub reel_speed: Real,
    /// Inside this horizontal distance to the target center, reel speed scales by (d / brake)^2.
    pub brake_distance: Real,
    /// Reeling needs at least this much horizontal distance to the target center.
    pub min_center_distance: Real,
    /// Anchors further apart than this snap the trailing cable on lateral slides.
    pub break_distance: Real,
    pub slide_decay_rate: Real,
    pub slide_stop_speed: Real,
    pub direction_epsilon: Real,
    /// Reeling straight out moves at this multiple of walk speed.
    pub reel_out_multiplier: Real,
    /// Reeling straight in moves at this multiple of reel speed.
    pub reel_in_boost: Real,
    pub ground_drag: Real,
    pub air_drag: Real,
    /// Horizontal velocity scale after a wall hit while any cable is attached.
    pub wall_bonk_damping: Real,
    pub ground_ray_lift: Real,
    pub ground_ray_length: Real,
    /// The ground ray only runs while vertical velocity is at or below this.
    pub ground_ray_max_rise: Real,
    pub min_travel: Real,
    pub mouse_sensitivity: Real,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            walk_speed: 6.0,
            jump_speed: 7.0,
            gravity: 18.0,
            terminal_fall_speed: 40.0,
            reel_speed: 24.0,
            brake_distance: 4.0,
            min_center_distance: 0.5,
            break_distance: 25.0,
            slide_decay_rate: 6.0,
            slide_stop_speed: 0.1,
            direction_epsilon: 0.1,
            reel_out_multiplier: 2.0,
            reel_in_boost: 1.5,
            ground_drag: 0.85,
            air_drag: 0.99,
            wall_bonk_damping: 0.5,
            ground_ray_lift: 0.05,
            ground_ray_length: 0.15,
            ground_ray_max_rise: 0.1,
            min_travel: 1.0e-4,
            mouse_sensitivity: 0.1,
        }
    }
}

/// Which movement regime a frame ran in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocomotionMode {
    Walking,
    Reeling,
    Airborne,
}

#[derive(Clone, Copy, Debug)]
pub struct PlayerFrame {
    pub position: Point<Real>,
    pub velocity: Vector<Real>,
    pub slide_velocity: Vector<Real>,
    pub grounded: bool,
    pub mode: LocomotionMode,
    pub collision: CollisionFlags,
    /// Cable released this frame by a lateral slide between distant anchors.
    pub snapped: Option<Side>,
    pub camera: CameraPose,
}

/// A frame in which the reel keys moved the player along the cables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ReelOutcome {
    /// Trailing cable released because the anchors were too far apart.
    snapped: Option<Side>,
}

pub struct Player<C> {
    config: LocomotionConfig,
    controller: C,
    camera: PlayerCamera,
    gear: OdmGear,
    position: Point<Real>,
    previous_position: Point<Real>,
    velocity: Vector<Real>,
    slide_velocity: Vector<Real>,
    is_grounded: bool,
    real_speed: Real,
    horizontal_speed: Real,
}

impl<C> Player<C> {
    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut LocomotionConfig {
        &mut self.config
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    pub fn camera(&self) -> &PlayerCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut PlayerCamera {
        &mut self.camera
    }

    pub fn gear(&self) -> &OdmGear {
        &self.gear
    }

    pub fn position(&self) -> Point<Real> {
        self.position
    }

    pub fn previous_position(&self) -> Point<Real> {
        self.previous_position
    }

    pub fn velocity(&self) -> Vector<Real> {
        self.velocity
    }

    /// Overrides the residual velocity, e.g. for knockback or scripted launches.
    pub fn set_velocity(&mut self, velocity: Vector<Real>) {
        self.velocity = velocity;
    }

    pub fn slide_velocity(&self) -> Vector<Real> {
        self.slide_velocity
    }

    pub fn is_grounded(&self) -> bool {
        self.is_grounded
    }

    pub fn real_speed(&self) -> Real {
        self.real_speed
    }

    pub fn horizontal_speed(&self) -> Real {
        self.horizontal_speed
    }

    pub fn forward(&self) -> Vector<Real> {
        self.camera.forward()
    }

    pub fn right(&self) -> Vector<Real> {
        self.camera.right()
    }

    pub fn camera_pose(&self) -> CameraPose {
        self.camera.pose(self.position)
    }

    pub fn handle_orientation_delta(&mut self, dx: Real, dy: Real) {
        self.camera.apply_look_delta(dx, dy);
    }

    /// Fires along the view direction, pitch included.
    pub fn fire<S: SceneQuery + ?Sized>(&mut self, scene: &S, side: Side) -> bool {
        let look = self.camera.look();
        let right = self.camera.right();
        self.gear.fire(scene, side, self.position, look, right)
    }

    pub fn fire_left<S: SceneQuery + ?Sized>(&mut self, scene: &S) -> bool {
        self.fire(scene, Side::Left)
    }

    pub fn fire_right<S: SceneQuery + ?Sized>(&mut self, scene: &S) -> bool {
        self.fire(scene, Side::Right)
    }

    pub fn release(&mut self, side: Side) {
        self.gear.release(side);
    }

    pub fn release_left(&mut self) {
        self.release(Side::Left);
    }

    pub fn release_right(&mut self) {
        self.release(Side::Right);
    }

    pub fn check_obstructions<S: SceneQuery + ?Sized>(&mut self, scene: &S) -> Released {
        self.gear.check_obstructions(scene)
    }

    /// Sets `slide_velocity` from the reel keys. Returns `None` when the keys
    /// produce no cable movement this frame.
    fn reel(&mut self, input: &InputSnapshot) -> Option<ReelOutcome> {
        let center = self.gear.target_center()?;
        let to_target = center - self.position;
        let horizontal = Vector::new(to_target.x, 0.0, to_target.z);
        let distance = horizontal.norm();
        if distance <= self.config.min_center_distance {
            return None;
        }
        let toward = horizontal / distance;
        let slide_left = Vector::new(toward.z, 0.0, -toward.x);
        let slide_right = Vector::new(-toward.z, 0.0, toward.x);

        let mut reel_speed = self.config.reel_speed;
        if distance < self.config.brake_distance {
            let t = distance / self.config.brake_distance;
            reel_speed *= t * t;
        }

        let lateral = input.lateral();
        let radial = input.radial();
        let mut dir = toward * radial;
        match lateral {
            Some(Side::Left) => dir += slide_left,
            Some(Side::Right) => dir += slide_right,
            None => {}
        }
        if (lateral.is_none() && radial == 0.0) || dir.norm() <= self.config.direction_epsilon {
            return None;
        }

        let speed = if input.back && !input.forward && !input.left && !input.right {
            self.config.walk_speed * self.config.reel_out_multiplier
        } else if input.forward && !input.left && !input.right {
            reel_speed * self.config.reel_in_boost
        } else {
            reel_speed
        };
        self.slide_velocity = dir.normalize() * speed;

        let mut snapped = None;
        if let (Some(separation), Some(side)) = (self.gear.anchor_separation(), lateral) {
            if separation > self.config.break_distance {
                let trailing = side.other();
                debug!(?trailing, separation, "cable snapped by lateral slide");
                self.gear.release(trailing);
                snapped = Some(trailing);
            }
        }
        Some(ReelOutcome { snapped })
    }

    fn decay_slide(&mut self, dt: Real) {
        self.slide_velocity *= (-self.config.slide_decay_rate * dt).exp();
        if self.slide_velocity.norm() < self.config.slide_stop_speed {
            self.slide_velocity = Vector::zeros();
        }
    }
}

impl<C: CharacterBody> Player<C> {
    pub fn new(controller: C, config: LocomotionConfig, gear: GearConfig) -> Self {
        let height = controller.profile().height;
        let position = controller.position();
        let camera = PlayerCamera::new(height * EYE_HEIGHT_FRACTION)
            .with_sensitivity(config.mouse_sensitivity);
        Self {
            config,
            controller,
            camera,
            gear: OdmGear::new(gear),
            position,
            previous_position: position,
            velocity: Vector::zeros(),
            slide_velocity: Vector::zeros(),
            is_grounded: true,
            real_speed: 0.0,
            horizontal_speed: 0.0,
        }
    }

    /// Advances one frame: compose, move, resolve ground, refresh cables.
    pub fn update<S>(&mut self, scene: &S, input: &InputSnapshot, dt: Real) -> PlayerFrame
    where
        S: SceneQuery + ?Sized,
        C: CharacterController<S>,
    {
        let dt = dt.max(0.0);
        let forward = self.camera.forward();
        let right = self.camera.right();

        let mut walk = input.walk_direction(forward, right) * self.config.walk_speed * dt;
        let mut reeled = false;
        let mut snapped = None;
        if input.reel && self.gear.any_active() && self.is_grounded {
            if let Some(outcome) = self.reel(input) {
                walk = Vector::zeros();
                reeled = true;
                snapped = outcome.snapped;
            }
        }

        self.decay_slide(dt);

        if input.jump && self.is_grounded {
            self.velocity.y = self.config.jump_speed;
            self.is_grounded = false;
        }
        self.velocity.y = (self.velocity.y - self.config.gravity * dt)
            .max(-self.config.terminal_fall_speed);
        let drag = if self.is_grounded {
            self.config.ground_drag
        } else {
            self.config.air_drag
        };
        self.velocity.x *= drag;
        self.velocity.z *= drag;

        let displacement = walk + self.slide_velocity * dt + self.velocity * dt;
        let collision =
            self.controller
                .move_character(scene, displacement, self.config.min_travel, dt);

        let grounded_by_ray =
            self.velocity.y <= self.config.ground_ray_max_rise && self.probe_ground(scene);
        if collision.down || grounded_by_ray {
            self.is_grounded = true;
            self.velocity.y = 0.0;
        } else {
            self.is_grounded = false;
        }
        if collision.up {
            self.velocity.y = 0.0;
        }
        if collision.sides && self.gear.any_active() {
            self.velocity.x *= self.config.wall_bonk_damping;
            self.velocity.z *= self.config.wall_bonk_damping;
        }

        self.previous_position = self.position;
        self.position = self.controller.position();
        if dt > 0.0 {
            let delta = self.position - self.previous_position;
            self.real_speed = delta.norm() / dt;
            self.horizontal_speed = Vector::new(delta.x, 0.0, delta.z).norm() / dt;
        }

        self.gear.update(dt, self.is_grounded);
        self.gear.refresh_geometry(self.position, right);

        let mode = if reeled {
            LocomotionMode::Reeling
        } else if self.is_grounded {
            LocomotionMode::Walking
        } else {
            LocomotionMode::Airborne
        };
        PlayerFrame {
            position: self.position,
            velocity: self.velocity,
            slide_velocity: self.slide_velocity,
            grounded: self.is_grounded,
            mode,
            collision,
            snapped,
            camera: self.camera_pose(),
        }
    }

    /// Short downward ray from just above the capsule's lowest point.
    fn probe_ground<S: SceneQuery + ?Sized>(&self, scene: &S) -> bool {
        let foot = self.controller.foot_position();
        let origin = foot + Vector::new(0.0, self.config.ground_ray_lift, 0.0);
        scene.raycast_short(origin, -Vector::y(), self.config.ground_ray_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use character_collision::{CharacterCollision, CollisionProfile};
    use physics_rapier::{PhysicsWorld, SceneActor};
    use rapier3d::prelude::*;

    const DT: Real = 1.0 / 60.0;

    /// Moves freely and stops on an infinite plane; optionally forces flags.
    struct FlatFloor {
        position: Point<Real>,
        floor_y: Option<Real>,
        forced: CollisionFlags,
        moves: Vec<Vector<Real>>,
    }

    impl FlatFloor {
        fn standing() -> Self {
            let center = CollisionProfile::odm_default().center_to_foot();
            Self {
                position: point![0.0, center, 0.0],
                floor_y: Some(0.0),
                forced: CollisionFlags::default(),
                moves: Vec::new(),
            }
        }
    }

    impl CharacterBody for FlatFloor {
        fn position(&self) -> Point<Real> {
            self.position
        }

        fn profile(&self) -> CollisionProfile {
            CollisionProfile::odm_default()
        }
    }

    impl<S: ?Sized> CharacterController<S> for FlatFloor {
        fn move_character(
            &mut self,
            _scene: &S,
            displacement: Vector<Real>,
            min_travel: Real,
            dt: Real,
        ) -> CollisionFlags {
            if dt <= 0.0 || displacement.norm() < min_travel {
                return CollisionFlags::default();
            }
            self.moves.push(displacement);
            let mut flags = self.forced;
            let mut next = self.position + displacement;
            if let Some(floor) = self.floor_y {
                let lowest = floor + self.profile().center_to_foot();
                if next.y <= lowest {
                    next.y = lowest;
                    flags.down = true;
                }
            }
            self.position = next;
            flags
        }
    }

    fn empty_world() -> PhysicsWorld {
        PhysicsWorld::new(vector![0.0, -9.81, 0.0])
    }

    fn add_pillar(world: &mut PhysicsWorld, x: Real, z: Real) {
        let pillar = ColliderBuilder::cuboid(1.0, 3.0, 1.0)
            .translation(vector![x, 2.0, z])
            .build();
        world.insert_actor_collider(
            pillar,
            SceneActor {
                name: "pillar".to_string(),
                grappleable: true,
            },
        );
        world.refresh_queries();
    }

    fn player_facing_positive_z() -> Player<FlatFloor> {
        let mut player = Player::new(
            FlatFloor::standing(),
            LocomotionConfig::default(),
            GearConfig::default(),
        );
        player.camera_mut().set_look(90.0, 0.0);
        player
    }

    /// Two pillars ~30 m apart, both about 20 m ahead of the player.
    fn wide_anchor_setup() -> (PhysicsWorld, Player<FlatFloor>) {
        let mut world = empty_world();
        add_pillar(&mut world, -15.0, 20.0);
        add_pillar(&mut world, 15.0, 20.0);
        let mut player = player_facing_positive_z();
        assert!(player.fire_left(&world));
        assert!(player.fire_right(&world));
        (world, player)
    }

    fn reel_keys() -> InputSnapshot {
        InputSnapshot {
            reel: true,
            ..Default::default()
        }
    }

    #[test]
    fn jump_sets_impulse_and_leaves_ground_in_same_frame() {
        let world = empty_world();
        let mut player = player_facing_positive_z();
        assert!(player.is_grounded());

        let frame = player.update(
            &world,
            &InputSnapshot {
                jump: true,
                ..Default::default()
            },
            DT,
        );

        assert!(!frame.grounded);
        assert_eq!(frame.mode, LocomotionMode::Airborne);
        let expected = player.config().jump_speed - player.config().gravity * DT;
        assert!((player.velocity().y - expected).abs() < 1.0e-5);
        assert!(player.position().y > player.previous_position().y);
    }

    #[test]
    fn standing_still_stays_grounded() {
        let world = empty_world();
        let mut player = player_facing_positive_z();
        for _ in 0..30 {
            let frame = player.update(&world, &InputSnapshot::default(), DT);
            assert!(frame.grounded);
            assert_eq!(frame.mode, LocomotionMode::Walking);
        }
        assert_eq!(player.velocity().y, 0.0);
        assert_eq!(player.real_speed(), 0.0);
    }

    #[test]
    fn falling_clamps_to_terminal_speed() {
        let world = empty_world();
        let mut controller = FlatFloor::standing();
        controller.floor_y = None;
        let mut player = Player::new(controller, LocomotionConfig::default(), GearConfig::default());
        for _ in 0..600 {
            player.update(&world, &InputSnapshot::default(), DT);
        }
        assert!(!player.is_grounded());
        assert_eq!(player.velocity().y, -player.config().terminal_fall_speed);
        assert!((player.real_speed() - 40.0).abs() < 1.0e-2);
    }

    #[test]
    fn walking_follows_yaw_not_pitch() {
        let world = empty_world();
        let mut player = player_facing_positive_z();
        player.camera_mut().set_look(90.0, -60.0);
        let input = InputSnapshot {
            forward: true,
            right: true,
            ..Default::default()
        };
        player.update(&world, &input, DT);

        let delta = player.position() - player.previous_position();
        let step = player.config().walk_speed * DT;
        // Facing +Z, right is -X.
        assert!((delta.z - step / 2.0_f32.sqrt()).abs() < 1.0e-5);
        assert!((delta.x + step / 2.0_f32.sqrt()).abs() < 1.0e-5);
        assert!((player.horizontal_speed() - player.config().walk_speed).abs() < 1.0e-2);
    }

    #[test]
    fn reel_in_replaces_walking_with_slide() {
        let (world, mut player) = wide_anchor_setup();
        let input = InputSnapshot {
            forward: true,
            ..reel_keys()
        };
        let frame = player.update(&world, &input, DT);

        assert_eq!(frame.mode, LocomotionMode::Reeling);
        assert_eq!(frame.snapped, None);
        let config = *player.config();
        let expected = config.reel_speed * config.reel_in_boost * (-config.slide_decay_rate * DT).exp();
        let slide = player.slide_velocity();
        assert!((slide.norm() - expected).abs() < 1.0e-3);
        assert!(slide.z > 0.0);
        assert!(slide.y.abs() < 1.0e-6);

        // Only the slide moved the player horizontally.
        let moved = player.controller().moves[0];
        assert!((moved.z - slide.z * DT).abs() < 1.0e-5);
        assert!(player.gear().both_active());
    }

    #[test]
    fn reel_out_uses_walk_multiplier() {
        let (world, mut player) = wide_anchor_setup();
        let input = InputSnapshot {
            back: true,
            ..reel_keys()
        };
        player.update(&world, &input, DT);

        let config = *player.config();
        let expected = config.walk_speed * config.reel_out_multiplier
            * (-config.slide_decay_rate * DT).exp();
        assert!((player.slide_velocity().norm() - expected).abs() < 1.0e-3);
        assert!(player.slide_velocity().z < 0.0);
    }

    #[test]
    fn reel_brakes_near_target_center() {
        let mut world = empty_world();
        add_pillar(&mut world, 0.0, 3.0);
        let mut player = player_facing_positive_z();
        assert!(player.fire_left(&world));
        let center = player.gear().target_center().expect("anchor");
        let distance = Vector::new(center.x, 0.0, center.z).norm();
        assert!(distance < player.config().brake_distance);

        let input = InputSnapshot {
            left: true,
            ..reel_keys()
        };
        player.update(&world, &input, DT);

        let config = *player.config();
        let t = distance / config.brake_distance;
        let expected = config.reel_speed * t * t * (-config.slide_decay_rate * DT).exp();
        assert!((player.slide_velocity().norm() - expected).abs() < 1.0e-3);
        // Sliding left around an anchor ahead moves toward +X (the player's left).
        assert!(player.slide_velocity().x > 0.0);
    }

    #[test]
    fn reel_needs_ground_and_modifier() {
        let (world, mut player) = wide_anchor_setup();
        let input = InputSnapshot {
            forward: true,
            ..Default::default()
        };
        let frame = player.update(&world, &input, DT);
        assert_eq!(frame.mode, LocomotionMode::Walking);
        assert_eq!(player.slide_velocity(), Vector::zeros());

        let jump = InputSnapshot {
            jump: true,
            ..Default::default()
        };
        player.update(&world, &jump, DT);
        let frame = player.update(&world, &InputSnapshot { forward: true, ..reel_keys() }, DT);
        assert_ne!(frame.mode, LocomotionMode::Reeling);
        assert_eq!(player.slide_velocity(), Vector::zeros());
    }

    #[test]
    fn opposing_keys_produce_no_reel() {
        let (world, mut player) = wide_anchor_setup();
        let input = InputSnapshot {
            forward: true,
            back: true,
            left: true,
            right: true,
            ..reel_keys()
        };
        let frame = player.update(&world, &input, DT);
        assert_ne!(frame.mode, LocomotionMode::Reeling);
        assert_eq!(player.slide_velocity(), Vector::zeros());
    }

    #[test]
    fn slide_decays_to_exact_zero() {
        let (world, mut player) = wide_anchor_setup();
        player.update(
            &world,
            &InputSnapshot {
                forward: true,
                ..reel_keys()
            },
            DT,
        );
        assert!(player.slide_velocity().norm() > 0.0);

        let mut frames = 0;
        while player.slide_velocity() != Vector::zeros() {
            player.update(&world, &InputSnapshot::default(), DT);
            frames += 1;
            assert!(frames < 120, "slide velocity never settled");
        }
        for _ in 0..10 {
            player.update(&world, &InputSnapshot::default(), DT);
            assert_eq!(player.slide_velocity(), Vector::zeros());
        }
    }

    #[test]
    fn lateral_slide_snaps_trailing_cable() {
        for (side, released) in [(Side::Left, Side::Right), (Side::Right, Side::Left)] {
            let (world, mut player) = wide_anchor_setup();
            assert!(player.gear().anchor_separation().expect("both") > 25.0);
            let input = InputSnapshot {
                left: side == Side::Left,
                right: side == Side::Right,
                ..reel_keys()
            };
            let frame = player.update(&world, &input, DT);

            assert_eq!(frame.snapped, Some(released));
            assert!(!player.gear().cable(released).active);
            assert!(player.gear().cable(side).active);
        }
    }

    #[test]
    fn separation_at_break_distance_does_not_snap() {
        let (world, mut player) = wide_anchor_setup();
        let separation = player.gear().anchor_separation().expect("both");
        player.config_mut().break_distance = separation;
        let input = InputSnapshot {
            left: true,
            ..reel_keys()
        };
        let frame = player.update(&world, &input, DT);
        assert_eq!(frame.snapped, None);
        assert!(player.gear().both_active());

        player.config_mut().break_distance = separation - 0.01;
        let frame = player.update(&world, &input, DT);
        assert_eq!(frame.snapped, Some(Side::Right));
    }

    #[test]
    fn reel_reports_movement_and_snaps_separately() {
        let (_, mut player) = wide_anchor_setup();
        assert_eq!(player.reel(&reel_keys()), None);

        let inward = InputSnapshot {
            forward: true,
            ..reel_keys()
        };
        assert_eq!(player.reel(&inward), Some(ReelOutcome { snapped: None }));
        assert!(player.slide_velocity().norm() > 0.0);

        let sideways = InputSnapshot {
            right: true,
            ..reel_keys()
        };
        assert_eq!(
            player.reel(&sideways),
            Some(ReelOutcome {
                snapped: Some(Side::Left)
            })
        );
        assert!(!player.gear().left().active);
    }

    #[test]
    fn radial_reel_never_snaps() {
        let (world, mut player) = wide_anchor_setup();
        let input = InputSnapshot {
            forward: true,
            ..reel_keys()
        };
        let frame = player.update(&world, &input, DT);
        assert_eq!(frame.snapped, None);
        assert!(player.gear().both_active());
    }

    #[test]
    fn wall_hit_with_cable_halves_residual_velocity() {
        let (world, mut player) = wide_anchor_setup();
        player.controller_mut().forced.sides = true;
        player.set_velocity(vector![10.0, 0.0, 4.0]);
        player.update(&world, &InputSnapshot::default(), DT);

        let drag = player.config().ground_drag;
        assert!((player.velocity().x - 10.0 * drag * 0.5).abs() < 1.0e-4);
        assert!((player.velocity().z - 4.0 * drag * 0.5).abs() < 1.0e-4);
    }

    #[test]
    fn wall_hit_without_cable_keeps_velocity() {
        let world = empty_world();
        let mut player = player_facing_positive_z();
        player.controller_mut().forced.sides = true;
        player.set_velocity(vector![10.0, 0.0, 0.0]);
        player.update(&world, &InputSnapshot::default(), DT);
        assert!((player.velocity().x - 10.0 * player.config().ground_drag).abs() < 1.0e-4);
    }

    #[test]
    fn ceiling_stops_rise_without_grounding() {
        let world = empty_world();
        let mut player = player_facing_positive_z();
        player.controller_mut().forced.up = true;
        player.update(
            &world,
            &InputSnapshot {
                jump: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(player.velocity().y, 0.0);
        assert!(!player.is_grounded());
    }

    #[test]
    fn ground_ray_catches_contact_the_sweep_missed() {
        let mut world = empty_world();
        let floor = ColliderBuilder::cuboid(10.0, 0.1, 10.0)
            .translation(vector![0.0, -0.1, 0.0])
            .build();
        world.insert_static_collider(floor);
        world.refresh_queries();

        let profile = CollisionProfile::odm_default();
        let hover = |height: Real| FlatFloor {
            position: point![0.0, profile.center_to_foot() + height, 0.0],
            floor_y: None,
            forced: CollisionFlags::default(),
            moves: Vec::new(),
        };

        let mut near = Player::new(hover(0.05), LocomotionConfig::default(), GearConfig::default());
        let frame = near.update(&world, &InputSnapshot::default(), DT);
        assert!(!frame.collision.down);
        assert!(frame.grounded);
        assert_eq!(near.velocity().y, 0.0);

        let mut far = Player::new(hover(0.5), LocomotionConfig::default(), GearConfig::default());
        let frame = far.update(&world, &InputSnapshot::default(), DT);
        assert!(!frame.grounded);
        assert!(far.velocity().y < 0.0);
    }

    #[test]
    fn zero_dt_keeps_speed_readings() {
        let world = empty_world();
        let mut player = player_facing_positive_z();
        let walk = InputSnapshot {
            forward: true,
            ..Default::default()
        };
        player.update(&world, &walk, DT);
        let speed = player.real_speed();
        assert!(speed > 0.0);

        let frame = player.update(&world, &walk, 0.0);
        assert_eq!(player.real_speed(), speed);
        assert!(frame.position.coords.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn cable_geometry_follows_player() {
        let (world, mut player) = wide_anchor_setup();
        let anchor = player.gear().left().attach_point;
        player.update(
            &world,
            &InputSnapshot {
                forward: true,
                ..reel_keys()
            },
            DT,
        );
        let cable = player.gear().left();
        assert_eq!(cable.attach_point, anchor);
        let hip = player.gear().hip_center(player.position());
        assert!((cable.start_point.y - hip.y).abs() < 1.0e-5);
        let side = cable.visual_start_point - hip;
        assert!((side - player.right() * -0.4).norm() < 1.0e-4);
        assert!(player.gear().is_active());
    }

    #[test]
    fn orientation_delta_turns_and_clamps() {
        let mut player = player_facing_positive_z();
        player.handle_orientation_delta(-900.0, 0.0);
        assert!(player.camera().yaw().abs() < 1.0e-4);
        assert!((player.forward().x - 1.0).abs() < 1.0e-5);
        player.handle_orientation_delta(0.0, -10_000.0);
        assert_eq!(player.camera().pitch(), 89.0);
    }

    #[test]
    fn controller_walks_and_lands_on_rapier_floor() {
        let mut world = empty_world();
        let floor = ColliderBuilder::cuboid(20.0, 0.1, 20.0)
            .translation(vector![0.0, -0.1, 0.0])
            .build();
        world.insert_static_collider(floor);
        world.step(DT);

        let collision = CharacterCollision::new(CollisionProfile::odm_default(), point![0.0, 2.0, 0.0]);
        let mut player = Player::new(collision, LocomotionConfig::default(), GearConfig::default());
        for _ in 0..90 {
            player.update(&world, &InputSnapshot::default(), DT);
        }
        assert!(player.is_grounded());
        let rest = player.position();
        assert!(rest.y > 0.85 && rest.y < 1.1);

        let walk = InputSnapshot {
            forward: true,
            ..Default::default()
        };
        for _ in 0..60 {
            player.update(&world, &walk, DT);
        }
        // Default yaw faces -Z.
        assert!(player.position().z < -4.0);
        assert!(player.is_grounded());
    }
}
