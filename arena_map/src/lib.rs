//! Arena layout format: a floor plus axis-aligned buildings.
#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::path::Path;

use physics_rapier::{ActorId, PhysicsWorld, SceneActor};
use rapier3d::prelude::*;
use serde::Deserialize;
use tracing::{info, warn};

/// The bundled city layout, identical to [`ArenaMap::city`].
pub const CITY_TOML: &str = include_str!("../maps/city.toml");

const CITY_SPAWN: [f32; 3] = [0.0, 6.0, -10.0];

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid map: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ArenaMap {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_spawn")]
    pub spawn: [f32; 3],
    /// Infinite ground plane at y = 0. Never grappleable.
    #[serde(default = "default_floor")]
    pub floor: bool,
    #[serde(default)]
    pub buildings: Vec<Building>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Building {
    pub id: String,
    /// Box center.
    pub pos: [f32; 3],
    /// Full extents.
    pub size: [f32; 3],
    #[serde(default = "default_grappleable")]
    pub grappleable: bool,
    #[serde(default)]
    pub color: Option<[f32; 3]>,
}

#[derive(Clone, Debug, Default)]
pub struct MapValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl MapValidation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Handles of everything a map put into a world.
#[derive(Clone, Debug, Default)]
pub struct PopulatedMap {
    pub floor: Option<ColliderHandle>,
    pub buildings: Vec<(ColliderHandle, ActorId)>,
}

impl ArenaMap {
    pub fn parse_toml(text: &str) -> Result<Self, MapError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads, parses and validates a map file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::parse_toml(&text)?.checked()
    }

    /// Returns the map if validation found no errors; warnings are logged.
    pub fn checked(self) -> Result<Self, MapError> {
        let validation = self.validate();
        for warning in &validation.warnings {
            warn!(map = %self.name, "{warning}");
        }
        if validation.is_ok() {
            Ok(self)
        } else {
            Err(MapError::Invalid(validation.errors))
        }
    }

    pub fn validate(&self) -> MapValidation {
        let mut validation = MapValidation::default();
        if self.version != 1 {
            validation
                .errors
                .push(format!("unsupported version {}", self.version));
        }
        if !vector_is_finite(self.spawn) {
            validation.errors.push("spawn must be finite".to_string());
        }
        if self.buildings.is_empty() {
            validation
                .warnings
                .push("map contains no buildings".to_string());
        } else if !self.buildings.iter().any(|building| building.grappleable) {
            validation
                .warnings
                .push("map contains no grappleable buildings".to_string());
        }
        let mut seen = HashSet::new();
        for building in &self.buildings {
            if building.id.trim().is_empty() {
                validation
                    .errors
                    .push("building id must not be empty".to_string());
            } else if !seen.insert(building.id.as_str()) {
                validation
                    .errors
                    .push(format!("duplicate building id '{}'", building.id));
            }
            if !vector_is_finite(building.pos) {
                validation
                    .errors
                    .push(format!("building '{}' has invalid pos", building.id));
            }
            if !vector_is_finite(building.size) || building.size.iter().any(|value| *value <= 0.0) {
                validation
                    .errors
                    .push(format!("building '{}' has invalid size", building.id));
            }
            if let Some(color) = building.color {
                if color.iter().any(|value| !(0.0..=1.0).contains(value)) {
                    validation
                        .warnings
                        .push(format!("building '{}' color outside 0..1", building.id));
                }
            }
        }
        validation
    }

    pub fn spawn_point(&self) -> Point<Real> {
        point![self.spawn[0], self.spawn[1], self.spawn[2]]
    }

    /// Inserts the floor and every building into `world` and refreshes its queries.
    pub fn populate(&self, world: &mut PhysicsWorld) -> PopulatedMap {
        let mut populated = PopulatedMap::default();
        if self.floor {
            let floor = ColliderBuilder::halfspace(Vector::y_axis()).build();
            populated.floor = Some(world.insert_static_collider(floor));
        }
        for building in &self.buildings {
            let [x, y, z] = building.pos;
            let [w, h, d] = building.size;
            let collider = ColliderBuilder::cuboid(w * 0.5, h * 0.5, d * 0.5)
                .translation(vector![x, y, z])
                .build();
            let actor = SceneActor {
                name: building.id.clone(),
                grappleable: building.grappleable,
            };
            populated
                .buildings
                .push(world.insert_actor_collider(collider, actor));
        }
        world.refresh_queries();
        info!(
            map = %self.name,
            buildings = populated.buildings.len(),
            floor = self.floor,
            "map populated"
        );
        populated
    }

    /// Built-in city: a plaza, towers of mixed height and three boundary walls.
    pub fn city() -> Self {
        let block = |id: &str, pos: [f32; 3], size: [f32; 3], color: [f32; 3]| Building {
            id: id.to_string(),
            pos,
            size,
            grappleable: true,
            color: Some(color),
        };
        Self {
            version: 1,
            name: "city".to_string(),
            notes: Some(
                "Nine blocks around a central plaza; every block takes a hook.".to_string(),
            ),
            spawn: CITY_SPAWN,
            floor: true,
            buildings: vec![
                block("plaza", [0.0, 2.5, 0.0], [10.0, 5.0, 10.0], [0.4, 0.35, 0.3]),
                block(
                    "west_tower",
                    [-25.0, 10.0, 20.0],
                    [8.0, 20.0, 8.0],
                    [0.45, 0.4, 0.35],
                ),
                block(
                    "east_tower",
                    [25.0, 15.0, 20.0],
                    [8.0, 30.0, 8.0],
                    [0.48, 0.43, 0.38],
                ),
                block("spire", [0.0, 20.0, 40.0], [10.0, 40.0, 10.0], [0.5, 0.5, 0.55]),
                block(
                    "west_block",
                    [-20.0, 8.0, 0.0],
                    [6.0, 16.0, 6.0],
                    [0.46, 0.41, 0.36],
                ),
                block(
                    "east_block",
                    [20.0, 10.0, 0.0],
                    [6.0, 20.0, 6.0],
                    [0.49, 0.44, 0.39],
                ),
                block(
                    "north_wall",
                    [0.0, 10.0, 60.0],
                    [50.0, 20.0, 5.0],
                    [0.35, 0.32, 0.28],
                ),
                block(
                    "west_wall",
                    [-45.0, 10.0, 30.0],
                    [5.0, 20.0, 30.0],
                    [0.35, 0.32, 0.28],
                ),
                block(
                    "east_wall",
                    [45.0, 10.0, 30.0],
                    [5.0, 20.0, 30.0],
                    [0.35, 0.32, 0.28],
                ),
            ],
        }
    }
}

fn vector_is_finite(value: [f32; 3]) -> bool {
    value.iter().all(|component| component.is_finite())
}

fn default_spawn() -> [f32; 3] {
    CITY_SPAWN
}

fn default_floor() -> bool {
    true
}

fn default_grappleable() -> bool {
    true
}
