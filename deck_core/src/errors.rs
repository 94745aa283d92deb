//! # Error Types
//!
//! Structured error types for deck_core. Every failure mode of deck
//! generation surfaces as a [`DeckError`] before any output is written,
//! so a failed run never leaves a truncated deck behind.
//!
//! ## Example
//!
//! ```rust
//! use deck_core::errors::{DeckError, DeckResult};
//!
//! fn validate_margin(ms: f64) -> DeckResult<()> {
//!     if !ms.is_finite() {
//!         return Err(DeckError::InvalidInput {
//!             field: "ms".to_string(),
//!             value: ms.to_string(),
//!             reason: "Margin of safety must be finite".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for deck_core operations
pub type DeckResult<T> = Result<T, DeckError>;

/// Structured error type for deck generation.
///
/// Each variant carries enough context to pinpoint the offending card,
/// field, or reference without re-running the generation.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum DeckError {
    /// An input value is invalid (out of range, wrong type, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A value cannot be rendered into its fixed-width field
    #[error("Field overflow on {card} field '{field}': '{value}' does not fit in 8 columns")]
    FieldOverflow {
        card: String,
        field: String,
        value: String,
    },

    /// A disambiguation scheme ran out of room (table keys, suffixes)
    #[error("Capacity exhausted for {kind} '{name}': {reason}")]
    CapacityExhausted {
        kind: String,
        name: String,
        reason: String,
    },

    /// A requested combination has no supported generation path
    #[error("Unsupported configuration: {subject} - {reason}")]
    UnsupportedConfig { subject: String, reason: String },

    /// An entity references an id or label absent from the graph
    #[error("Dangling reference: {card} {id} refers to missing {target_kind} {target}")]
    DanglingReference {
        card: String,
        id: u64,
        target_kind: String,
        target: String,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DeckError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        DeckError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a FieldOverflow error
    pub fn field_overflow(card: impl Into<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        DeckError::FieldOverflow {
            card: card.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a CapacityExhausted error
    pub fn capacity_exhausted(kind: impl Into<String>, name: impl Into<String>, reason: impl Into<String>) -> Self {
        DeckError::CapacityExhausted {
            kind: kind.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedConfig error
    pub fn unsupported(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        DeckError::UnsupportedConfig {
            subject: subject.into(),
            reason: reason.into(),
        }
    }

    /// Create a DanglingReference error
    pub fn dangling(card: impl Into<String>, id: u64, target_kind: impl Into<String>, target: impl Into<String>) -> Self {
        DeckError::DanglingReference {
            card: card.into(),
            id,
            target_kind: target_kind.into(),
            target: target.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        DeckError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            DeckError::InvalidInput { .. } => "INVALID_INPUT",
            DeckError::FieldOverflow { .. } => "FIELD_OVERFLOW",
            DeckError::CapacityExhausted { .. } => "CAPACITY_EXHAUSTED",
            DeckError::UnsupportedConfig { .. } => "UNSUPPORTED_CONFIG",
            DeckError::DanglingReference { .. } => "DANGLING_REFERENCE",
            DeckError::FileError { .. } => "FILE_ERROR",
            DeckError::SerializationError { .. } => "SERIALIZATION_ERROR",
            DeckError::VersionMismatch { .. } => "VERSION_MISMATCH",
            DeckError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
