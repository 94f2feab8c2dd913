// src/hardware/led_strip.rs - Simulated NeoPixel-style strip
use async_trait::async_trait;

use crate::device::{LedColor, LedState, BROADCAST_INDEX};
use crate::hardware::{HardwareError, LedDriver};

/// In-memory pixel buffer. Pixels hold the intensity-scaled color, as a real
/// strip would be written.
#[derive(Debug, Clone)]
pub struct SimulatedLedStrip {
    pixels: Vec<LedColor>,
}

impl SimulatedLedStrip {
    pub fn new(count: usize) -> Self {
        tracing::info!("Pixel strip with {} LEDs initialized", count);
        Self {
            pixels: vec![LedColor::OFF; count],
        }
    }

    pub fn pixels(&self) -> &[LedColor] {
        &self.pixels
    }
}

#[async_trait]
impl LedDriver for SimulatedLedStrip {
    async fn set_leds(
        &mut self,
        index: u32,
        color: LedColor,
        intensity: f64,
    ) -> Result<(), HardwareError> {
        let scaled = LedState::new(color, intensity).scaled();
        if index == BROADCAST_INDEX {
            self.pixels.fill(scaled);
            tracing::info!("All LEDs set to {:?} ({:.0}% brightness)", scaled, intensity * 100.0);
            return Ok(());
        }
        let count = self.pixels.len();
        match self.pixels.get_mut(index as usize - 1) {
            Some(pixel) => {
                *pixel = scaled;
                tracing::info!("LED {} set to {:?}", index, scaled);
                Ok(())
            }
            None => {
                tracing::warn!("LED index {} out of range! Valid range is 1-{}", index, count);
                Err(HardwareError::LedOutOfRange { index, count })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fill_and_single_pixel() {
        let mut strip = SimulatedLedStrip::new(4);
        strip.set_leds(0, LedColor::new(0, 0, 255), 0.5).await.unwrap();
        assert!(strip.pixels().iter().all(|p| *p == LedColor::new(0, 0, 127)));

        strip.set_leds(2, LedColor::new(255, 0, 0), 1.0).await.unwrap();
        assert_eq!(strip.pixels()[1], LedColor::new(255, 0, 0));
        assert_eq!(strip.pixels()[0], LedColor::new(0, 0, 127));
    }

    #[tokio::test]
    async fn test_out_of_range() {
        let mut strip = SimulatedLedStrip::new(8);
        assert!(strip.set_leds(8, LedColor::OFF, 1.0).await.is_ok());
        assert_eq!(
            strip.set_leds(9, LedColor::OFF, 1.0).await,
            Err(HardwareError::LedOutOfRange { index: 9, count: 8 })
        );
    }
}
