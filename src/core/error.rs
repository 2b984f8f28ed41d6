// This module defines the error types for the brainfly compiler using the thiserror crate.
// CompileError is the single error enum of the pipeline: bracket mismatches found by the
// front-end, unknown names and syntax problems met while reconstructing a canonical artifact,
// codec failures while reading or writing compressed artifacts, and failures of the native
// x86-64 lowering or object writer. Each variant carries the context needed to point at the
// failure (character positions, the offending name, the underlying error text). Running a
// program never produces a CompileError: exhausted input is a defined halt outcome and host
// stream failures surface as std::io::Error.

//! Error types for the brainfly compiler.

use std::fmt;
use thiserror::Error;

/// Which bracket rule a malformed program broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnbalancedBracket {
    /// A `]` with no open `[`.
    UnmatchedClose,
    /// A `[` still open at end of input.
    UnterminatedLoop,
}

impl fmt::Display for UnbalancedBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnbalancedBracket::UnmatchedClose => write!(f, "mismatched ']' with no matching '['"),
            UnbalancedBracket::UnterminatedLoop => write!(f, "mismatched '[' with no matching ']'"),
        }
    }
}

/// Main error type for compilation and artifact handling.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Malformed program: {reason} at character {position}")]
    MalformedProgram {
        reason: UnbalancedBracket,
        position: usize,
    },

    #[error("Unknown symbol: {name}")]
    UnknownSymbol {
        name: String,
    },

    #[error("Malformed artifact at byte {position}: {reason}")]
    MalformedArtifact {
        position: usize,
        reason: String,
    },

    #[error("Artifact codec failed: {0}")]
    Codec(#[from] std::io::Error),

    #[error("Artifact is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Native encoding failed: {reason}")]
    Encoding {
        reason: String,
    },

    #[error("Object emission failed: {reason}")]
    Object {
        reason: String,
    },
}

impl CompileError {
    /// True for the bracket-mismatch family of errors.
    pub fn is_malformed_program(&self) -> bool {
        matches!(self, CompileError::MalformedProgram { .. })
    }
}

/// Result type alias for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;
