// src/runner.rs - Sequential program execution
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::{FailureMode, RunnerConfig};
use crate::device::DeviceState;
use crate::gcode::{dispatch, Effect, GCodeError, Program};
use crate::hardware::{HardwareError, LedDriver, MotionActuator};

/// `Ready -> Running -> Halted`, or `Running -> Failed` in strict mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunnerState {
    Ready,
    Running,
    Halted,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    /// `M30` was dispatched.
    ProgramEnd,
    /// Ran out of lines without an `M30`.
    EndOfInput,
    /// The stop signal fired.
    Stopped,
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            HaltReason::ProgramEnd => "program end (M30)",
            HaltReason::EndOfInput => "end of input",
            HaltReason::Stopped => "stopped",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("runner is not ready (state: {0:?})")]
    NotReady(RunnerState),
    #[error("line {line}: {source}")]
    Aborted { line: usize, source: GCodeError },
    #[error("line {line}: {source}")]
    Hardware { line: usize, source: HardwareError },
}

/// Counters for one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Lines reached, including ones that were skipped.
    pub lines: usize,
    pub dispatched: usize,
    pub skipped_malformed: usize,
    pub skipped_missing_parameter: usize,
    pub skipped_unsupported: usize,
    pub hardware_errors: usize,
    pub halt_reason: HaltReason,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            lines: 0,
            dispatched: 0,
            skipped_malformed: 0,
            skipped_missing_parameter: 0,
            skipped_unsupported: 0,
            hardware_errors: 0,
            halt_reason: HaltReason::EndOfInput,
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped_malformed + self.skipped_missing_parameter + self.skipped_unsupported
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} lines: {} dispatched, {} skipped ({} malformed, {} missing parameter, {} unsupported), {} hardware errors; halted on {}",
            self.lines,
            self.dispatched,
            self.skipped(),
            self.skipped_malformed,
            self.skipped_missing_parameter,
            self.skipped_unsupported,
            self.hardware_errors,
            self.halt_reason
        )
    }
}

/// Feeds a program, one command at a time, through the dispatcher and out to
/// the motion and LED collaborators.
///
/// Each runner owns its device state for exactly one program execution.
pub struct Runner<A, L> {
    config: RunnerConfig,
    actuator: A,
    leds: L,
    device: DeviceState,
    program: Option<Program>,
    state: RunnerState,
    stop: Option<watch::Receiver<bool>>,
}

impl<A: MotionActuator, L: LedDriver> Runner<A, L> {
    pub fn new(config: RunnerConfig, actuator: A, leds: L) -> Self {
        Self {
            config,
            actuator,
            leds,
            device: DeviceState::new(),
            program: None,
            state: RunnerState::Ready,
            stop: None,
        }
    }

    /// Abort between commands (or mid-dwell) once the channel holds `true`.
    pub fn with_stop_signal(mut self, stop: watch::Receiver<bool>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn load(&mut self, program: Program) -> Result<(), RunError> {
        if self.state != RunnerState::Ready {
            return Err(RunError::NotReady(self.state));
        }
        tracing::info!("Loaded program with {} command lines", program.len());
        self.program = Some(program);
        Ok(())
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn device(&self) -> &DeviceState {
        &self.device
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn led_driver(&self) -> &L {
        &self.leds
    }

    /// Run the loaded program to completion.
    ///
    /// Stops after `M30`, at end of input, or when the stop signal fires. In
    /// `ignore` mode bad lines are skipped and counted; in `error` mode the
    /// first one fails the run.
    pub async fn run(&mut self) -> Result<RunSummary, RunError> {
        if self.state != RunnerState::Ready {
            return Err(RunError::NotReady(self.state));
        }
        let program = self.program.take().ok_or(RunError::NotReady(self.state))?;
        self.state = RunnerState::Running;

        let mut summary = RunSummary::new();
        tracing::info!("Starting run {} ({} command lines)", summary.run_id, program.len());

        for line in program.lines() {
            if self.stop_requested() {
                summary.halt_reason = HaltReason::Stopped;
                break;
            }
            summary.lines += 1;

            let command = match &line.parsed {
                Ok(command) => command,
                Err(e) => {
                    self.recover(line.number, e, &mut summary)?;
                    continue;
                }
            };
            let effect = match dispatch(command, &mut self.device) {
                Ok(effect) => effect,
                Err(e) => {
                    self.recover(line.number, &e, &mut summary)?;
                    continue;
                }
            };
            summary.dispatched += 1;
            tracing::debug!("Line {}: {}", line.number, command);

            match effect {
                Effect::Moved(position) => {
                    let result = self.actuator.move_to(&position).await;
                    self.check_hardware(line.number, result, &mut summary)?;
                }
                Effect::Leds(writes) => {
                    for write in writes {
                        let result = self
                            .leds
                            .set_leds(write.index, write.state.color, write.state.intensity)
                            .await;
                        self.check_hardware(line.number, result, &mut summary)?;
                    }
                }
                Effect::Dwell(duration) => {
                    tracing::info!("Dwell {} ms", duration.as_millis());
                    if !self.pause(duration).await {
                        summary.halt_reason = HaltReason::Stopped;
                        break;
                    }
                }
                Effect::Halt => {
                    summary.halt_reason = HaltReason::ProgramEnd;
                    break;
                }
            }

            let delay = self.config.line_delay();
            if !delay.is_zero() && !self.pause(delay).await {
                summary.halt_reason = HaltReason::Stopped;
                break;
            }
        }

        self.state = RunnerState::Halted;
        if summary.halt_reason == HaltReason::Stopped {
            tracing::warn!("Run {} stopped after {} lines", summary.run_id, summary.lines);
        }
        tracing::info!("{}", summary);
        Ok(summary)
    }

    fn recover(
        &mut self,
        line: usize,
        error: &GCodeError,
        summary: &mut RunSummary,
    ) -> Result<(), RunError> {
        match error {
            GCodeError::Malformed { .. } => summary.skipped_malformed += 1,
            GCodeError::MissingParameter { .. } => summary.skipped_missing_parameter += 1,
            GCodeError::UnsupportedCommand { .. } => summary.skipped_unsupported += 1,
        }
        if self.config.failure_mode == FailureMode::Error {
            self.state = RunnerState::Failed;
            tracing::error!("Aborting run {} at line {}: {}", summary.run_id, line, error);
            return Err(RunError::Aborted {
                line,
                source: error.clone(),
            });
        }
        tracing::warn!("Skipping line {}: {}", line, error);
        Ok(())
    }

    fn check_hardware(
        &mut self,
        line: usize,
        result: Result<(), HardwareError>,
        summary: &mut RunSummary,
    ) -> Result<(), RunError> {
        let Err(error) = result else {
            return Ok(());
        };
        summary.hardware_errors += 1;
        if self.config.failure_mode == FailureMode::Error {
            self.state = RunnerState::Failed;
            tracing::error!("Hardware error at line {}: {}", line, error);
            return Err(RunError::Hardware { line, source: error });
        }
        tracing::warn!("Hardware error at line {}: {}", line, error);
        Ok(())
    }

    fn stop_requested(&self) -> bool {
        self.stop.as_ref().is_some_and(|stop| *stop.borrow())
    }

    /// Sleep for `duration`. Returns `false` if the stop signal fired first.
    async fn pause(&mut self, duration: Duration) -> bool {
        let Some(stop) = self.stop.as_mut() else {
            tokio::time::sleep(duration).await;
            return true;
        };
        if *stop.borrow() {
            return false;
        }
        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                changed = stop.changed() => {
                    // Sender gone: nobody can stop us any more
                    if changed.is_err() {
                        break;
                    }
                    if *stop.borrow_and_update() {
                        return false;
                    }
                }
            }
        }
        sleep.await;
        true
    }
}
