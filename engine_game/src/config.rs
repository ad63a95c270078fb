use std::path::Path;

use character_collision::CollisionProfile;
use odm_gear::{GearConfig, MAX_SCAN_STEPS};
use player_controller::LocomotionConfig;
use rapier3d::prelude::Real;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Frame loop tuning.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Frame deltas above this are clamped.
    pub max_frame_dt: Real,
    pub physics_timestep: Real,
    pub rope_segments: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_frame_dt: 0.1,
            physics_timestep: 1.0 / 60.0,
            rope_segments: 20,
        }
    }
}

/// Everything tunable, one TOML table per subsystem. Missing tables and keys
/// fall back to defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub locomotion: LocomotionConfig,
    pub gear: GearConfig,
    pub collision: CollisionProfile,
    pub session: SessionConfig,
}

impl GameConfig {
    pub fn parse_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::parse_toml(&text)?.checked()
    }

    pub fn checked(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Gear geometry that agrees with the collision capsule.
    pub fn gear_config(&self) -> GearConfig {
        GearConfig {
            player_height: self.collision.height,
            ..self.gear
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let loco = &self.locomotion;
        let gear = &self.gear;
        let collision = &self.collision;
        let session = &self.session;

        let positive = [
            ("locomotion.walk_speed", loco.walk_speed),
            ("locomotion.jump_speed", loco.jump_speed),
            ("locomotion.gravity", loco.gravity),
            ("locomotion.terminal_fall_speed", loco.terminal_fall_speed),
            ("locomotion.reel_speed", loco.reel_speed),
            ("locomotion.brake_distance", loco.brake_distance),
            ("locomotion.break_distance", loco.break_distance),
            ("locomotion.slide_decay_rate", loco.slide_decay_rate),
            ("locomotion.ground_ray_length", loco.ground_ray_length),
            ("locomotion.mouse_sensitivity", loco.mouse_sensitivity),
            ("gear.scan_step_deg", gear.scan_step_deg),
            ("gear.max_distance", gear.max_distance),
            ("collision.height", collision.height),
            ("collision.radius", collision.radius),
            ("session.max_frame_dt", session.max_frame_dt),
            ("session.physics_timestep", session.physics_timestep),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                errors.push(format!("{name} must be > 0"));
            }
        }

        let non_negative = [
            ("locomotion.min_center_distance", loco.min_center_distance),
            ("locomotion.slide_stop_speed", loco.slide_stop_speed),
            ("locomotion.direction_epsilon", loco.direction_epsilon),
            ("locomotion.ground_ray_lift", loco.ground_ray_lift),
            ("locomotion.min_travel", loco.min_travel),
            ("gear.scan_angle_deg", gear.scan_angle_deg),
            ("gear.min_separation", gear.min_separation),
            ("gear.obstruction_inset", gear.obstruction_inset),
            ("collision.step_height", collision.step_height),
            ("collision.offset", collision.offset),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{name} must be >= 0"));
            }
        }

        let fractions = [
            ("locomotion.ground_drag", loco.ground_drag),
            ("locomotion.air_drag", loco.air_drag),
            ("locomotion.wall_bonk_damping", loco.wall_bonk_damping),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                errors.push(format!("{name} must be within 0..=1"));
            }
        }

        if gear.scan_step_deg > 0.0 && gear.scan_angle_deg / gear.scan_step_deg > MAX_SCAN_STEPS as Real {
            errors.push(format!(
                "gear.scan_angle_deg / gear.scan_step_deg must not exceed {MAX_SCAN_STEPS} rays"
            ));
        }
        if collision.height < collision.radius * 2.0 {
            errors.push("collision.height must be at least twice collision.radius".to_string());
        }
        if !(0.0..90.0).contains(&collision.max_slope_deg) {
            errors.push("collision.max_slope_deg must be within 0..90".to_string());
        }
        if session.physics_timestep > session.max_frame_dt {
            errors.push("session.physics_timestep must not exceed session.max_frame_dt".to_string());
        }
        errors
    }
}
