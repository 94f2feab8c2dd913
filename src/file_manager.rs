// src/file_manager.rs - Loading G-code programs from disk or stdin
use tokio::fs;
use tokio::io::BufReader;

use crate::gcode::Program;

/// Path that selects standard input instead of a file.
pub const STDIN_PATH: &str = "-";

#[derive(Debug, Clone, Default)]
pub struct FileManager;

impl FileManager {
    pub fn new() -> Self {
        Self
    }

    pub async fn read_gcode_file(&self, path: &str) -> std::io::Result<String> {
        tracing::info!("Reading G-code file: {}", path);
        fs::read_to_string(path).await
    }

    /// Read and tokenize a program. `-` reads standard input to EOF.
    pub async fn read_program(&self, path: &str) -> std::io::Result<Program> {
        let program = if path == STDIN_PATH {
            tracing::info!("Reading G-code from stdin");
            Program::read_from(BufReader::new(tokio::io::stdin())).await?
        } else {
            Program::parse(&self.read_gcode_file(path).await?)
        };
        let malformed = program.lines().iter().filter(|l| l.parsed.is_err()).count();
        tracing::info!(
            "Processed {} G-code lines from {} ({} malformed)",
            program.len(),
            path,
            malformed
        );
        Ok(program)
    }
}
