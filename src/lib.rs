// src/lib.rs - G-code motion and LED test-program host
pub mod config;
pub mod device;
pub mod file_manager;
pub mod gcode;
pub mod hardware;
pub mod runner;

pub use config::Config;
pub use device::DeviceState;
pub use runner::{HaltReason, RunError, RunSummary, Runner, RunnerState};
