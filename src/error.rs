//! Error types for throw analysis.
//!
//! The analysis operations themselves are total. Errors only arise while
//! building a [`Sequence`](crate::frame::Sequence), validating configuration
//! or loading frames from a source.

use thiserror::Error;

/// Main error type for throw analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The frame source produced no usable frames.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A sequence was built from zero frames.
    #[error("Sequence is empty")]
    EmptySequence,

    /// Frame timestamps are not strictly increasing.
    #[error("Timestamps must be strictly increasing at index {index}")]
    NonMonotonicTimestamps { index: usize },

    /// A frame carries a zero or negative timestamp.
    #[error("Timestamp must be positive at index {index}")]
    NonPositiveTimestamp { index: usize },

    /// Two per-frame channels disagree in length.
    #[error("Length mismatch: expected {expected} samples, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Configuration validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading the frame source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for throw analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    /// Create a malformed input error.
    #[must_use]
    pub fn malformed_input(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Create a length mismatch error.
    #[must_use]
    pub const fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::LengthMismatch { expected, actual }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalysisError::length_mismatch(120, 119);
        assert!(err.to_string().contains("120"));
        assert!(err.to_string().contains("119"));

        let err = AnalysisError::NonMonotonicTimestamps { index: 7 };
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.txt");
        let err: AnalysisError = io.into();
        assert!(matches!(err, AnalysisError::Io(_)));
    }

    #[test]
    fn test_error_constructors() {
        let _ = AnalysisError::malformed_input("no rows");
        let _ = AnalysisError::invalid_config("takeoff_height must be positive");
    }
}
