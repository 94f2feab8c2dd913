// src/gcode/command.rs - Parsed commands and loaded programs
use std::collections::BTreeMap;
use std::fmt;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::gcode::parser::parse_line;
use crate::gcode::GCodeError;

/// Command family. Only G and M words may start a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandLetter {
    G,
    M,
}

impl CommandLetter {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'G' => Some(CommandLetter::G),
            'M' => Some(CommandLetter::M),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            CommandLetter::G => 'G',
            CommandLetter::M => 'M',
        }
    }
}

impl fmt::Display for CommandLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A single tokenized line, e.g. `M150 P3 R255 G255 B0 I0.7`.
///
/// Parameter letters are stored upper-case. Commands are immutable once
/// parsed and are dropped after dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub letter: CommandLetter,
    pub code: u32,
    pub params: BTreeMap<char, f64>,
}

impl Command {
    pub fn new(letter: CommandLetter, code: u32, params: BTreeMap<char, f64>) -> Self {
        Self { letter, code, params }
    }

    /// Canonical command name, e.g. `G1` for both `G1` and `g01`.
    pub fn name(&self) -> String {
        format!("{}{}", self.letter, self.code)
    }

    pub fn param(&self, letter: char) -> Option<f64> {
        self.params.get(&letter.to_ascii_uppercase()).copied()
    }

    /// Like [`Command::param`] but a missing parameter is an error.
    pub fn require(&self, letter: char) -> Result<f64, GCodeError> {
        self.param(letter).ok_or_else(|| GCodeError::MissingParameter {
            command: self.name(),
            parameter: letter.to_ascii_uppercase(),
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.code)?;
        for (letter, value) in &self.params {
            write!(f, " {}{}", letter, value)?;
        }
        Ok(())
    }
}

/// One non-blank, non-comment source line and what the tokenizer made of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramLine {
    /// 1-based line number in the source.
    pub number: usize,
    pub parsed: Result<Command, GCodeError>,
}

/// An ordered, read-only G-code program.
///
/// Malformed lines are kept in place so the runner can report and count
/// them at the point where they would have executed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    lines: Vec<ProgramLine>,
}

impl Program {
    pub fn parse(source: &str) -> Self {
        source
            .lines()
            .enumerate()
            .filter_map(|(index, line)| Self::entry(index + 1, line))
            .collect()
    }

    /// Reads and tokenizes a program from any buffered async source (files, stdin).
    pub async fn read_from<R>(reader: R) -> std::io::Result<Self>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut source = reader.lines();
        let mut lines = Vec::new();
        let mut number = 0;
        while let Some(line) = source.next_line().await? {
            number += 1;
            if let Some(entry) = Self::entry(number, &line) {
                lines.push(entry);
            }
        }
        Ok(Self { lines })
    }

    fn entry(number: usize, line: &str) -> Option<ProgramLine> {
        match parse_line(line) {
            Ok(None) => None,
            Ok(Some(command)) => Some(ProgramLine {
                number,
                parsed: Ok(command),
            }),
            Err(e) => Some(ProgramLine {
                number,
                parsed: Err(e),
            }),
        }
    }

    pub fn lines(&self) -> &[ProgramLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl FromIterator<ProgramLine> for Program {
    fn from_iter<I: IntoIterator<Item = ProgramLine>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_name_and_display() {
        let cmd = parse_line("m150 p3 r255 i0.5").unwrap().unwrap();
        assert_eq!(cmd.name(), "M150");
        assert_eq!(cmd.to_string(), "M150 I0.5 P3 R255");
    }

    #[test]
    fn test_require_reports_missing_parameter() {
        let cmd = parse_line("G4").unwrap().unwrap();
        assert_eq!(
            cmd.require('p'),
            Err(GCodeError::MissingParameter {
                command: "G4".to_string(),
                parameter: 'P',
            })
        );
    }

    #[test]
    fn test_program_skips_blank_and_comment_lines() {
        let source = "; LED test\n\nG1 X10 Y10\n   \nG1 XABC\nM30\n";
        let program = Program::parse(source);
        assert_eq!(program.len(), 3);
        let numbers: Vec<usize> = program.lines().iter().map(|l| l.number).collect();
        assert_eq!(numbers, vec![3, 5, 6]);
        assert!(program.lines()[1].parsed.is_err());
    }

    #[tokio::test]
    async fn test_program_read_from_async_source() {
        let source: &[u8] = b"G1 X1 Y2\r\n; pause\r\nG4 P10\r\n";
        let program = Program::read_from(source).await.unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(program.lines()[1].number, 3);
        assert_eq!(program, Program::parse("G1 X1 Y2\n; pause\nG4 P10\n"));
    }
}
