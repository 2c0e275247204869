//! Error types for the requirement protocol.

/// Result type alias for composition operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading objects supplied by the host.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// More than one object answered a selector that must be unique.
    #[error("expected at most one object for {key}, got {count}")]
    Ambiguous {
        /// Requirement key.
        key: String,
        /// Number of objects supplied.
        count: usize,
    },

    /// A supplied object could not be decoded into the expected type.
    #[error("cannot decode {key} as {expected}: {source}")]
    Decode {
        /// Requirement key.
        key: String,
        /// Name of the expected type.
        expected: &'static str,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_display() {
        let err = Error::Ambiguous {
            key: "Secret/creds".to_string(),
            count: 2,
        };
        let display = err.to_string();
        assert!(display.contains("Secret/creds"));
        assert!(display.contains('2'));
    }
}
