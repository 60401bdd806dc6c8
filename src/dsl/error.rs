//! Error types for the catrock compiler.

use std::fmt;

use thiserror::Error;

use super::ast::Position;

/// A positioned, non-fatal message from the parser or parameter resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
        }
    }

    pub fn at(message: impl Into<String>, pos: Position) -> Self {
        Self::new(message, pos.line, pos.col)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] {}", self.line, self.col, self.message)
    }
}

/// Why a source file could not be turned into a score.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("syntax errors:\n{}", list(.0))]
    Syntax(Vec<Diagnostic>),
    #[error("nothing to play: the score has no notes, chords, rests, groups or containers")]
    NoPlayables,
    #[error("invalid parameters:\n{}", list(.0))]
    Parameters(Vec<Diagnostic>),
}

impl CompileError {
    /// The positioned messages behind this error, if any.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Syntax(d) | CompileError::Parameters(d) => d,
            CompileError::NoPlayables => &[],
        }
    }
}

fn list(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("  {d}"))
        .collect::<Vec<_>>()
        .join("\n")
}
