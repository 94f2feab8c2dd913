// src/gcode/mod.rs - G-code tokenizer, command model and dispatcher
use thiserror::Error;

pub mod command;
pub mod dispatcher;
pub mod parser;


pub use command::{Command, CommandLetter, Program, ProgramLine};
pub use dispatcher::{dispatch, Effect, LedWrite};
pub use parser::{parse_line, GCodeSpan};

/// Everything that can go wrong between reading a line and applying it.
///
/// None of these are fatal on their own; the runner decides whether a
/// failing line is skipped or aborts the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GCodeError {
    #[error("malformed line: {message}{}", describe_span(.span))]
    Malformed {
        message: String,
        span: Option<GCodeSpan>,
    },
    #[error("{command} is missing required parameter '{parameter}'")]
    MissingParameter { command: String, parameter: char },
    #[error("unsupported command {command}")]
    UnsupportedCommand { command: String },
}

impl GCodeError {
    pub(crate) fn malformed(message: impl Into<String>, span: Option<GCodeSpan>) -> Self {
        GCodeError::Malformed {
            message: message.into(),
            span,
        }
    }
}

fn describe_span(span: &Option<GCodeSpan>) -> String {
    match span {
        Some(span) => format!(" (columns {}..{})", span.range.start + 1, span.range.end + 1),
        None => String::new(),
    }
}
