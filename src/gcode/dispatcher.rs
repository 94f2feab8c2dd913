// src/gcode/dispatcher.rs - Apply one command to the device state
use std::time::Duration;

use crate::device::{
    clamp_channel, clamp_intensity, DeviceState, LedState, LedUpdate, PartialPosition, Position,
};
use crate::gcode::command::{Command, CommandLetter};
use crate::gcode::GCodeError;

/// One LED write the runner forwards to the LED driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedWrite {
    pub index: u32,
    pub state: LedState,
}

/// What a dispatched command asks of the runner.
///
/// Dispatch itself never sleeps or touches hardware. Each command affects
/// exactly one domain: motion, LEDs or run control.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// `G1`: the gantry should move to this position.
    Moved(Position),
    /// `M150`: LED writes to forward to the driver.
    Leds(Vec<LedWrite>),
    /// `G4`: block before the next command.
    Dwell(Duration),
    /// `M30`: stop the program.
    Halt,
}

/// Dispatch a command against the device state.
///
/// Parameters are validated before anything is mutated, so a failing command
/// leaves the state untouched.
pub fn dispatch(command: &Command, device: &mut DeviceState) -> Result<Effect, GCodeError> {
    match (command.letter, command.code) {
        (CommandLetter::G, 1) => linear_move(command, device),
        (CommandLetter::G, 4) => dwell(command),
        (CommandLetter::M, 150) => set_led(command, device),
        (CommandLetter::M, 30) => Ok(Effect::Halt),
        _ => Err(GCodeError::UnsupportedCommand {
            command: command.name(),
        }),
    }
}

fn linear_move(command: &Command, device: &mut DeviceState) -> Result<Effect, GCodeError> {
    let target = PartialPosition {
        x: Some(command.require('X')?),
        y: Some(command.require('Y')?),
        z: command.param('Z'),
    };
    let position = device.set_position(target);
    tracing::debug!("{} -> X:{} Y:{} Z:{:?}", command.name(), position.x, position.y, position.z);
    Ok(Effect::Moved(position))
}

fn dwell(command: &Command) -> Result<Effect, GCodeError> {
    let millis = command.require('P')?;
    if millis < 0.0 {
        return Err(GCodeError::malformed(
            format!("G4 dwell must be non-negative, got P{}", millis),
            None,
        ));
    }
    Ok(Effect::Dwell(Duration::from_millis(millis as u64)))
}

fn set_led(command: &Command, device: &mut DeviceState) -> Result<Effect, GCodeError> {
    let raw_index = command.require('P')?;
    if raw_index < 0.0 || raw_index.fract() != 0.0 || raw_index > u32::MAX as f64 {
        return Err(GCodeError::malformed(
            format!("M150 LED index must be a non-negative integer, got P{}", raw_index),
            None,
        ));
    }
    let index = raw_index as u32;
    let update = LedUpdate {
        red: command.param('R').map(clamp_channel),
        green: command.param('G').map(clamp_channel),
        blue: command.param('B').map(clamp_channel),
        intensity: clamp_intensity(command.param('I').unwrap_or(1.0)),
    };
    // Broadcast: one write per tracked LED; index 0 only reaches the driver as the seed
    let written = device.update_led(index, update);
    Ok(Effect::Leds(
        written
            .into_iter()
            .map(|(index, state)| LedWrite { index, state })
            .collect(),
    ))
}
