//! Headless game session: config loading, the per-frame loop and scripted scenarios.
#![forbid(unsafe_code)]

pub mod config;
pub mod scenario;
pub mod session;

pub use config::{ConfigError, GameConfig, SessionConfig};
pub use scenario::Scenario;
pub use session::{FrameInput, FrameReport, Hud, InputEvent, Session};
