// src/hardware/mod.rs - Collaborator boundary for motion and LED output
pub mod gantry;
pub mod led_strip;

pub use gantry::SimulatedGantry;
pub use led_strip::SimulatedLedStrip;

use async_trait::async_trait;
use thiserror::Error;

use crate::device::{LedColor, Position};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HardwareError {
    #[error("LED index {index} out of range (strip has {count} LEDs)")]
    LedOutOfRange { index: u32, count: usize },
    #[error("motion actuator fault: {0}")]
    Motion(String),
}

/// Moves the gantry. Implementations may block until the move completes.
#[async_trait]
pub trait MotionActuator: Send {
    async fn move_to(&mut self, position: &Position) -> Result<(), HardwareError>;
}

/// Writes to an addressable LED strip.
///
/// Index 0 addresses the whole strip; `n > 0` addresses LED `n`.
#[async_trait]
pub trait LedDriver: Send {
    async fn set_leds(
        &mut self,
        index: u32,
        color: LedColor,
        intensity: f64,
    ) -> Result<(), HardwareError>;
}
