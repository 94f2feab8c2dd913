// src/hardware/gantry.rs - Simulated lead-screw gantry
use std::f64::consts::PI;

use async_trait::async_trait;

use crate::device::Position;
use crate::hardware::{HardwareError, MotionActuator};

/// Stands in for the motor controller: records targets and logs them with the
/// lead-screw shaft angle each axis motor would be driven to.
#[derive(Debug, Clone)]
pub struct SimulatedGantry {
    lead_mm: f64,
    target: Position,
    moves: usize,
}

impl SimulatedGantry {
    pub fn new(lead_mm: f64) -> Self {
        Self {
            lead_mm,
            target: Position::default(),
            moves: 0,
        }
    }

    /// Shaft angle in radians for a linear travel of `mm`.
    pub fn mm_to_radians(&self, mm: f64) -> f64 {
        mm * 2.0 * PI / self.lead_mm
    }

    pub fn target(&self) -> Position {
        self.target
    }

    pub fn moves(&self) -> usize {
        self.moves
    }
}

#[async_trait]
impl MotionActuator for SimulatedGantry {
    async fn move_to(&mut self, position: &Position) -> Result<(), HardwareError> {
        if !position.x.is_finite() || !position.y.is_finite() {
            return Err(HardwareError::Motion(format!(
                "non-finite target X:{} Y:{}",
                position.x, position.y
            )));
        }
        self.target = *position;
        self.moves += 1;
        tracing::info!(
            "Move to X={:.1}mm Y={:.1}mm (radians X={:.3}, Y={:.3})",
            position.x,
            position.y,
            self.mm_to_radians(position.x),
            self.mm_to_radians(position.y)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_to_radians() {
        let gantry = SimulatedGantry::new(8.0);
        assert!((gantry.mm_to_radians(8.0) - 2.0 * PI).abs() < 1e-12);
        assert!((gantry.mm_to_radians(2.0) - PI / 2.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_move_records_target() {
        let mut gantry = SimulatedGantry::new(8.0);
        let target = Position { x: 10.0, y: 20.0, z: None };
        gantry.move_to(&target).await.unwrap();
        assert_eq!(gantry.target(), target);
        assert_eq!(gantry.moves(), 1);
    }
}
