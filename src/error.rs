//! Error types for bridge record ingestion.

use crate::record::Label;
use thiserror::Error;

/// A set-once label was written a second time before the accumulator was reset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {label} already set at line {origin_line}")]
pub struct DuplicateLabelError {
    pub label: Label,
    /// Line of the write that populated the label first.
    pub origin_line: u32,
    /// Line of the rejected write.
    pub line: u32,
}

/// Errors that can occur while reading a bridge file
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{name}: binary content at byte {offset}")]
    Garbled { name: String, offset: usize },

    #[error("line {line}: {reason}")]
    Format { line: u32, reason: String },

    #[error(transparent)]
    Duplicate(#[from] DuplicateLabelError),

    /// Raised while reading a file spliced in by an embedded reference;
    /// the line number inside `error` counts lines of `file`.
    #[error("in embedded file {file}: {error}")]
    Embedded {
        file: String,
        #[source]
        error: Box<ParseError>,
    },
}

impl ParseError {
    /// Build a positional parse error.
    pub fn at(line: u32, reason: impl Into<String>) -> Self {
        ParseError::Format {
            line,
            reason: reason.into(),
        }
    }

    /// Line the error points at, when it has one.
    pub fn line(&self) -> Option<u32> {
        match self {
            ParseError::Format { line, .. } => Some(*line),
            ParseError::Duplicate(dup) => Some(dup.line),
            ParseError::Embedded { error, .. } => error.line(),
            ParseError::Io(_) | ParseError::Garbled { .. } => None,
        }
    }

    /// Embedded file the error was raised in; `None` for the top-level file.
    pub fn file(&self) -> Option<&str> {
        match self {
            ParseError::Embedded { file, .. } => Some(file),
            _ => None,
        }
    }
}

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, ParseError>;
