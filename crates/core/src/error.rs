//! Error types for the cutplan engine.

use thiserror::Error;

/// Errors surfaced at the engine and collaborator boundaries.
#[derive(Debug, Error)]
pub enum Error {
    /// The problem failed validation; no placement was attempted.
    #[error("invalid problem: {}", .errors.join("; "))]
    InvalidProblem {
        /// Validation error messages, in evaluation order.
        errors: Vec<String>,
    },

    /// A malformed entity was handed to the API.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An importer was asked to read a format it does not understand.
    /// Never raised by the engine itself.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// An importer failed to parse its input. Never raised by the engine
    /// itself.
    #[error("parse failure: {0}")]
    Parse(String),
}

/// Convenience result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;
