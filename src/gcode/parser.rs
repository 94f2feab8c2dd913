//! Line tokenizer for the gantry's G-code dialect.
//!
//! A line is `LETTER CODE (PARAM VALUE)* [; comment]`, whitespace separated.
//! The scanner works on bytes and records spans so diagnostics can point at
//! the offending token.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::gcode::command::{Command, CommandLetter};
use crate::gcode::GCodeError;

/// Span in the original source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GCodeSpan {
    pub range: Range<usize>,
}

/// A letter-prefixed token such as `G1` or `R255`, with the letter upper-cased.
#[derive(Debug, Clone, PartialEq)]
pub struct Word<'a> {
    pub letter: char,
    pub value: &'a str,
    pub span: GCodeSpan,
}

/// Splits one line into words, stopping at the first `;`.
pub struct WordScanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> WordScanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }
}

impl<'a> Iterator for WordScanner<'a> {
    type Item = Result<Word<'a>, GCodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.src.as_bytes();
        let len = bytes.len();
        while self.pos < len && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        // Comment runs to end of line
        if self.pos >= len || bytes[self.pos] == b';' {
            self.pos = len;
            return None;
        }
        let start = self.pos;
        while self.pos < len && !bytes[self.pos].is_ascii_whitespace() && bytes[self.pos] != b';' {
            self.pos += 1;
        }
        let token = &self.src[start..self.pos];
        let span = GCodeSpan { range: start..self.pos };
        let letter = token.chars().next()?;
        if !letter.is_ascii_alphabetic() {
            return Some(Err(GCodeError::malformed(
                format!("expected a letter-prefixed word, found '{}'", token),
                Some(span),
            )));
        }
        Some(Ok(Word {
            letter: letter.to_ascii_uppercase(),
            value: &token[1..],
            span,
        }))
    }
}

/// Tokenize a single line.
///
/// Returns `Ok(None)` for blank lines and full-line comments. Letters are
/// case-insensitive and zero-padded codes normalise (`G01` is `G1`). When a
/// parameter letter repeats, the last value wins.
pub fn parse_line(line: &str) -> Result<Option<Command>, GCodeError> {
    let mut words = WordScanner::new(line);
    let head = match words.next() {
        Some(word) => word?,
        None => return Ok(None),
    };
    let letter = CommandLetter::from_char(head.letter).ok_or_else(|| {
        GCodeError::malformed(
            format!("command must start with G or M, found '{}'", head.letter),
            Some(head.span.clone()),
        )
    })?;
    let code = parse_code(&head)?;

    let mut params = BTreeMap::new();
    for word in words {
        let word = word?;
        let value = parse_value(&word)?;
        params.insert(word.letter, value);
    }
    Ok(Some(Command::new(letter, code, params)))
}

fn parse_code(word: &Word<'_>) -> Result<u32, GCodeError> {
    if word.value.is_empty() || !word.value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GCodeError::malformed(
            format!("command code '{}' is not a number", word.value),
            Some(word.span.clone()),
        ));
    }
    word.value.parse::<u32>().map_err(|e| {
        GCodeError::malformed(
            format!("command code '{}': {}", word.value, e),
            Some(word.span.clone()),
        )
    })
}

fn parse_value(word: &Word<'_>) -> Result<f64, GCodeError> {
    if !is_decimal(word.value) {
        return Err(GCodeError::malformed(
            format!("parameter '{}' has no numeric value ('{}')", word.letter, word.value),
            Some(word.span.clone()),
        ));
    }
    let value = word.value.parse::<f64>().map_err(|e| {
        GCodeError::malformed(
            format!("parameter '{}': {}", word.letter, e),
            Some(word.span.clone()),
        )
    })?;
    // Long digit runs overflow to infinity
    if !value.is_finite() {
        return Err(GCodeError::malformed(
            format!("parameter '{}' is out of range ('{}')", word.letter, word.value),
            Some(word.span.clone()),
        ));
    }
    Ok(value)
}

/// Optional sign, digits, optional fraction. Rejects `inf`, `NaN` and exponents
/// that `f64::from_str` would otherwise accept.
fn is_decimal(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    let mut seen_digit = false;
    let mut seen_dot = false;
    for b in digits.bytes() {
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}
