//! Error types for the spatial adapter.
//!
//! Every fallible operation in this crate returns [`SpatialResult`]. Database
//! failures raised while running a spatial calculation are folded into the
//! single [`SpatialError::Calculation`] variant so callers have one thing to
//! match on, while schema statements and codec problems keep their own kinds.

use thiserror::Error;

/// Errors that can occur while building, running or decoding spatial SQL.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpatialError {
    /// A spatial calculation failed in the database. The message carries the
    /// underlying database error text.
    #[error("Spatial calculation `{operation}` failed: {message}")]
    Calculation { operation: String, message: String },

    /// The connection reported an error outside of a spatial calculation.
    #[error("Database error: {0}")]
    Database(String),

    /// Hex-EWKB input could not be decoded or a geometry could not be encoded.
    #[error("EWKB codec error: {0}")]
    Codec(String),

    /// A geometry was constructed from inconsistent parts.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A calculation parameter could not be rendered safely.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The requested operation cannot be expressed for the given subjects.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A schema statement or catalog lookup failed.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A calculation result or row value could not be converted to the
    /// requested Rust type.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl SpatialError {
    /// Creates the uniform calculation error for `operation`.
    pub fn calculation(operation: impl Into<String>, message: impl Into<String>) -> Self {
        SpatialError::Calculation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is the uniform calculation error.
    pub fn is_calculation(&self) -> bool {
        matches!(self, SpatialError::Calculation { .. })
    }

    /// Returns the bare message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            SpatialError::Calculation { message, .. } => message,
            SpatialError::Database(msg)
            | SpatialError::Codec(msg)
            | SpatialError::InvalidGeometry(msg)
            | SpatialError::InvalidParameter(msg)
            | SpatialError::InvalidOperation(msg)
            | SpatialError::Schema(msg)
            | SpatialError::Decode(msg) => msg,
        }
    }
}

#[cfg(feature = "postgres")]
impl From<postgres::Error> for SpatialError {
    fn from(err: postgres::Error) -> Self {
        SpatialError::Database(err.to_string())
    }
}

/// Alias for results returned by this crate.
pub type SpatialResult<T> = Result<T, SpatialError>;
