// src/device.rs - Gantry position and LED state owned by a single run
use std::collections::BTreeMap;

use serde::Serialize;

/// LED index that addresses every tracked LED rather than one slot.
pub const BROADCAST_INDEX: u32 = 0;

/// Gantry position in millimetres. Unbounded; limits are firmware specific.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

/// Axes to change; `None` leaves the axis where it is.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PartialPosition {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl Position {
    pub fn apply(&mut self, partial: PartialPosition) {
        if let Some(x) = partial.x {
            self.x = x;
        }
        if let Some(y) = partial.y {
            self.y = y;
        }
        if let Some(z) = partial.z {
            self.z = Some(z);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LedColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl LedColor {
    pub const OFF: LedColor = LedColor { red: 0, green: 0, blue: 0 };

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// Clamp a raw channel value into 0..=255, truncating any fraction.
pub fn clamp_channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0) as u8
}

pub fn clamp_intensity(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Color plus brightness for one LED. Intensity is always within [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LedState {
    pub color: LedColor,
    pub intensity: f64,
}

impl LedState {
    pub fn new(color: LedColor, intensity: f64) -> Self {
        Self {
            color,
            intensity: clamp_intensity(intensity),
        }
    }

    /// The color as it should be written to a pixel: every channel scaled by intensity.
    pub fn scaled(&self) -> LedColor {
        let scale = |c: u8| (c as f64 * self.intensity) as u8;
        LedColor::new(scale(self.color.red), scale(self.color.green), scale(self.color.blue))
    }
}

/// Channels to change on an LED. Unset channels keep the LED's previous
/// value, or 0 for an LED that has never been set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LedUpdate {
    pub red: Option<u8>,
    pub green: Option<u8>,
    pub blue: Option<u8>,
    pub intensity: f64,
}

impl LedUpdate {
    fn resolve(&self, previous: Option<LedState>) -> LedState {
        let base = previous.map(|s| s.color).unwrap_or(LedColor::OFF);
        LedState::new(
            LedColor::new(
                self.red.unwrap_or(base.red),
                self.green.unwrap_or(base.green),
                self.blue.unwrap_or(base.blue),
            ),
            self.intensity,
        )
    }
}

impl From<LedState> for LedUpdate {
    fn from(state: LedState) -> Self {
        Self {
            red: Some(state.color.red),
            green: Some(state.color.green),
            blue: Some(state.color.blue),
            intensity: state.intensity,
        }
    }
}

/// Mutable device model for one program execution.
#[derive(Debug, Clone, Default)]
pub struct DeviceState {
    position: Position,
    leds: BTreeMap<u32, LedState>,
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Move the named axes and return the resulting position.
    pub fn set_position(&mut self, partial: PartialPosition) -> Position {
        self.position.apply(partial);
        self.position
    }

    pub fn led(&self, index: u32) -> Option<LedState> {
        self.leds.get(&index).copied()
    }

    /// Tracked LEDs in index order.
    pub fn leds(&self) -> impl Iterator<Item = (u32, LedState)> + '_ {
        self.leds.iter().map(|(index, state)| (*index, *state))
    }

    pub fn set_led(&mut self, index: u32, color: LedColor, intensity: f64) -> Vec<(u32, LedState)> {
        self.update_led(index, LedUpdate::from(LedState::new(color, intensity)))
    }

    /// Apply `update` to `index`, or to every tracked LED when `index` is the
    /// broadcast index. A broadcast with nothing tracked yet seeds index 0.
    ///
    /// Returns every `(index, state)` that was written.
    pub fn update_led(&mut self, index: u32, update: LedUpdate) -> Vec<(u32, LedState)> {
        if index == BROADCAST_INDEX && !self.leds.is_empty() {
            return self
                .leds
                .iter_mut()
                .map(|(index, state)| {
                    *state = update.resolve(Some(*state));
                    (*index, *state)
                })
                .collect();
        }
        let state = update.resolve(self.led(index));
        self.leds.insert(index, state);
        vec![(index, state)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: LedColor = LedColor::new(255, 0, 0);
    const BLUE: LedColor = LedColor::new(0, 0, 255);

    #[test]
    fn test_partial_position_keeps_untouched_axes() {
        let mut device = DeviceState::new();
        device.set_position(PartialPosition { x: Some(1.0), y: Some(2.0), z: Some(3.0) });
        let pos = device.set_position(PartialPosition { x: Some(10.0), y: Some(-4.5), z: None });
        assert_eq!(pos, Position { x: 10.0, y: -4.5, z: Some(3.0) });
        assert_eq!(device.position(), pos);
    }

    #[test]
    fn test_set_led_clamps_intensity() {
        let mut device = DeviceState::new();
        device.set_led(1, RED, 1.5);
        assert_eq!(device.led(1).unwrap().intensity, 1.0);
        device.set_led(1, RED, -0.2);
        assert_eq!(device.led(1).unwrap().intensity, 0.0);
    }

    #[test]
    fn test_broadcast_overwrites_all_tracked() {
        let mut device = DeviceState::new();
        device.set_led(1, RED, 1.0);
        device.set_led(5, RED, 0.3);
        let written = device.set_led(BROADCAST_INDEX, BLUE, 0.5);
        assert_eq!(written.len(), 2);
        for (_, state) in device.leds() {
            assert_eq!(state, LedState::new(BLUE, 0.5));
        }
        // Broadcast is an alias, not a slot of its own
        assert!(device.led(BROADCAST_INDEX).is_none());
    }

    #[test]
    fn test_broadcast_with_nothing_tracked_seeds_index_zero() {
        let mut device = DeviceState::new();
        device.set_led(BROADCAST_INDEX, BLUE, 1.0);
        assert_eq!(device.led(0), Some(LedState::new(BLUE, 1.0)));
        device.set_led(2, RED, 1.0);
        device.set_led(BROADCAST_INDEX, RED, 0.1);
        assert_eq!(device.led(0), Some(LedState::new(RED, 0.1)));
        assert_eq!(device.led(2), Some(LedState::new(RED, 0.1)));
    }

    #[test]
    fn test_partial_update_defaults() {
        let mut device = DeviceState::new();
        let update = LedUpdate { red: Some(200), green: None, blue: None, intensity: 1.0 };
        device.update_led(3, update);
        assert_eq!(device.led(3).unwrap().color, LedColor::new(200, 0, 0));

        let update = LedUpdate { red: None, green: Some(10), blue: None, intensity: 0.5 };
        device.update_led(3, update);
        assert_eq!(device.led(3), Some(LedState::new(LedColor::new(200, 10, 0), 0.5)));
    }

    #[test]
    fn test_scaled_color() {
        let state = LedState::new(LedColor::new(255, 100, 0), 0.5);
        assert_eq!(state.scaled(), LedColor::new(127, 50, 0));
    }

    #[test]
    fn test_clamp_channel() {
        assert_eq!(clamp_channel(300.0), 255);
        assert_eq!(clamp_channel(-5.0), 0);
        assert_eq!(clamp_channel(12.9), 12);
    }
}
