use player_controller::InputSnapshot;
use rapier3d::prelude::Real;

use crate::session::{FrameInput, InputEvent};

/// Frames spent falling from the city spawn before a scripted action starts.
const SETTLE_TICKS: u32 = 90;

/// Pointer motion that turns the view by `degrees` at the default sensitivity.
fn turn(degrees: Real) -> InputEvent {
    InputEvent::Look {
        dx: degrees * 10.0,
        dy: 0.0,
    }
}

/// Scripted input for headless runs on the city map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scenario {
    Idle,
    Walk,
    Jump,
    /// Turn to the plaza, hook it with both cables and reel in.
    GrappleReel,
    /// Hook two blocks 30+ m apart, then slide left until the right cable snaps.
    Snap,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::Idle,
        Scenario::Walk,
        Scenario::Jump,
        Scenario::GrappleReel,
        Scenario::Snap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Idle => "idle",
            Scenario::Walk => "walk",
            Scenario::Jump => "jump",
            Scenario::GrappleReel => "grapple-reel",
            Scenario::Snap => "snap",
        }
    }

    pub fn default_ticks(self) -> u32 {
        match self {
            Scenario::Idle | Scenario::Walk => 120,
            Scenario::Jump => SETTLE_TICKS + 60,
            Scenario::GrappleReel => SETTLE_TICKS + 45,
            // The snap lands on the first slide frame; a longer slide swings the
            // surviving cable into the plaza.
            Scenario::Snap => SETTLE_TICKS + 3,
        }
    }

    pub fn input(self, tick: u32) -> FrameInput {
        let mut input = FrameInput::default();
        match self {
            Scenario::Idle => {}
            Scenario::Walk => input.held.forward = true,
            Scenario::Jump => input.held.jump = tick == SETTLE_TICKS,
            Scenario::GrappleReel => {
                if tick == SETTLE_TICKS {
                    input.events = vec![turn(180.0), InputEvent::FireLeft, InputEvent::FireRight];
                } else if tick > SETTLE_TICKS {
                    input.held = InputSnapshot {
                        forward: true,
                        reel: true,
                        ..Default::default()
                    };
                }
            }
            Scenario::Snap => {
                if tick == SETTLE_TICKS {
                    // Face +X for the right hook, -X for the left, then +Z.
                    input.events = vec![
                        turn(90.0),
                        InputEvent::FireRight,
                        turn(180.0),
                        InputEvent::FireLeft,
                        turn(-90.0),
                    ];
                } else if tick > SETTLE_TICKS {
                    input.held = InputSnapshot {
                        left: true,
                        reel: true,
                        ..Default::default()
                    };
                }
            }
        }
        input
    }
}
