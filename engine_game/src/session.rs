use std::fmt;

use arena_map::ArenaMap;
use character_collision::CharacterCollision;
use odm_gear::{Released, Side};
use physics_rapier::PhysicsWorld;
use player_controller::{InputSnapshot, Player, PlayerFrame};
use rapier3d::math::{Point, Vector};
use rapier3d::prelude::Real;
use tracing::{debug, info};

use crate::config::GameConfig;

/// Discrete input for one frame, applied in order before the update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    FireLeft,
    FireRight,
    ReleaseLeft,
    ReleaseRight,
    /// Raw pointer motion; positive `dy` looks down.
    Look { dx: Real, dy: Real },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub events: Vec<InputEvent>,
    pub held: InputSnapshot,
    /// Paused frames drop events and skip simulation.
    pub paused: bool,
}

#[derive(Clone, Debug, Default)]
pub struct FrameReport {
    /// Delta after clamping.
    pub dt: Real,
    /// Result of every fire event, in order.
    pub fired: Vec<(Side, bool)>,
    pub player: Option<PlayerFrame>,
    pub obstructed: Released,
    pub physics_steps: u32,
}

/// Read-only snapshot for overlays and logs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hud {
    pub position: Point<Real>,
    pub real_speed: Real,
    pub horizontal_speed: Real,
    pub grounded: bool,
    pub gear_active: bool,
    pub left_length: Option<Real>,
    pub right_length: Option<Real>,
    pub separation: Option<Real>,
    pub over_break: bool,
    pub paused: bool,
}

impl fmt::Display for Hud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pos=({:.1}, {:.1}, {:.1}) speed={:.1} horiz={:.1} grounded={} gear={}",
            self.position.x,
            self.position.y,
            self.position.z,
            self.real_speed,
            self.horizontal_speed,
            self.grounded,
            self.gear_active
        )?;
        let cable = |length: Option<Real>| match length {
            Some(length) => format!("{length:.1}m"),
            None => "---".to_string(),
        };
        write!(
            f,
            " left={} right={}",
            cable(self.left_length),
            cable(self.right_length)
        )?;
        if let Some(separation) = self.separation {
            write!(f, " separation={separation:.1}m")?;
            if self.over_break {
                write!(f, " (over break)")?;
            }
        }
        if self.paused {
            write!(f, " [paused]")?;
        }
        Ok(())
    }
}

/// One player on one map: input events, locomotion, cable upkeep and the
/// fixed-step physics clock.
pub struct Session {
    config: GameConfig,
    map_name: String,
    world: PhysicsWorld,
    player: Player<CharacterCollision>,
    accumulator: Real,
    elapsed: Real,
    frames: u64,
    paused: bool,
}

impl Session {
    pub fn new(config: GameConfig, map: &ArenaMap) -> Self {
        let mut world = PhysicsWorld::new(Vector::new(0.0, -config.locomotion.gravity, 0.0));
        let populated = map.populate(&mut world);
        let spawn = map.spawn_point();
        let collision = CharacterCollision::new(config.collision, spawn);
        let player = Player::new(collision, config.locomotion, config.gear_config());
        info!(
            map = %map.name,
            buildings = populated.buildings.len(),
            x = spawn.x,
            y = spawn.y,
            z = spawn.z,
            "session started"
        );
        Self {
            config,
            map_name: map.name.clone(),
            world,
            player,
            accumulator: 0.0,
            elapsed: 0.0,
            frames: 0,
            paused: false,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// Geometry added here becomes visible to ray casts on the next frame.
    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn player(&self) -> &Player<CharacterCollision> {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player<CharacterCollision> {
        &mut self.player
    }

    /// Simulated seconds.
    pub fn elapsed(&self) -> Real {
        self.elapsed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn frame(&mut self, dt: Real, input: &FrameInput) -> FrameReport {
        let max_dt = self.config.session.max_frame_dt.max(0.0);
        let dt = dt.max(0.0).min(max_dt);
        let mut report = FrameReport {
            dt,
            ..Default::default()
        };
        if input.paused != self.paused {
            info!(paused = input.paused, "pause toggled");
            self.paused = input.paused;
        }
        if input.paused {
            return report;
        }

        self.world.refresh_queries();
        for event in &input.events {
            match *event {
                InputEvent::FireLeft => {
                    report.fired.push((Side::Left, self.player.fire_left(&self.world)));
                }
                InputEvent::FireRight => {
                    report
                        .fired
                        .push((Side::Right, self.player.fire_right(&self.world)));
                }
                InputEvent::ReleaseLeft => self.player.release_left(),
                InputEvent::ReleaseRight => self.player.release_right(),
                InputEvent::Look { dx, dy } => self.player.handle_orientation_delta(dx, dy),
            }
        }

        let frame = self.player.update(&self.world, &input.held, dt);
        if let Some(side) = frame.snapped {
            debug!(?side, frame = self.frames, "cable snapped");
        }
        report.player = Some(frame);
        report.obstructed = self.player.check_obstructions(&self.world);

        self.accumulator += dt;
        let step = self.config.session.physics_timestep;
        while self.accumulator >= step {
            self.world.step(step);
            self.accumulator -= step;
            report.physics_steps += 1;
        }

        self.elapsed += dt;
        self.frames += 1;
        report
    }

    pub fn hud(&self) -> Hud {
        let gear = self.player.gear();
        let length = |side: Side| {
            let cable = gear.cable(side);
            cable.active.then_some(cable.length)
        };
        let separation = gear.anchor_separation();
        Hud {
            position: self.player.position(),
            real_speed: self.player.real_speed(),
            horizontal_speed: self.player.horizontal_speed(),
            grounded: self.player.is_grounded(),
            gear_active: gear.is_active(),
            left_length: length(Side::Left),
            right_length: length(Side::Right),
            separation,
            over_break: separation
                .is_some_and(|separation| separation > self.config.locomotion.break_distance),
            paused: self.paused,
        }
    }

    /// Sagging polyline for an attached cable; empty otherwise.
    pub fn rope(&self, side: Side) -> Vec<Point<Real>> {
        self.player
            .gear()
            .cable(side)
            .rope_points(self.config.session.rope_segments)
    }
}
