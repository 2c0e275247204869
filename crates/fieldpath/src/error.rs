//! Error types for field path operations.

/// Result type alias for field path operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing a field path.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The path string could not be parsed.
    #[error("invalid field path {path:?}: {reason}")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The value at the path does not have the expected shape.
    #[error("unexpected value at {path}: {source}")]
    Decode {
        /// Path that was read.
        path: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A replacement value could not be encoded.
    #[error("cannot encode value for {path}: {source}")]
    Encode {
        /// Path that was written.
        path: String,
        /// Underlying encode error.
        #[source]
        source: serde_json::Error,
    },

    /// A field segment was applied to something that is not an object.
    #[error("cannot set {path}: parent of {field:?} is not an object")]
    NotAnObject {
        /// Path that was written.
        path: String,
        /// Field that could not be set.
        field: String,
    },

    /// An array index does not exist.
    #[error("cannot set {path}: index {index} is out of range")]
    IndexOutOfRange {
        /// Path that was written.
        path: String,
        /// Missing index.
        index: usize,
    },

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn decode(path: &str, source: serde_json::Error) -> Self {
        Self::Decode {
            path: path.to_string(),
            source,
        }
    }

    pub(crate) fn encode(path: &str, source: serde_json::Error) -> Self {
        Self::Encode {
            path: path.to_string(),
            source,
        }
    }

    pub(crate) fn not_an_object(path: &str, field: &str) -> Self {
        Self::NotAnObject {
            path: path.to_string(),
            field: field.to_string(),
        }
    }
}
