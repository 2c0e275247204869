//! Error types for Grafana backend operations.
//!
//! Errors are categorized so the caller can decide, per failure, whether
//! to retry, to report a warning against one resource, or to abort the
//! whole invocation.

use std::fmt;

/// Result type alias for grafanakit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of backend errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Backend unreachable, timed out, throttled or failing (transient, retryable).
    Network,
    /// An identifier did not match anything in the backend.
    NotFound,
    /// Provider config, credentials or client settings are unusable.
    Config,
    /// The backend answered with something we cannot interpret.
    Format,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Whether an error of this category must abort the whole invocation.
    ///
    /// Config failures affect every resource under the provider config;
    /// network and format failures reach here only after retries ran out.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Network | Self::Config | Self::Format)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Backend unreachable",
            Self::NotFound => "Name not found",
            Self::Config => "Invalid provider configuration",
            Self::Format => "Unexpected backend response",
            Self::Other => "Unexpected error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to Grafana backends.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    HttpError {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// No object with this ID or name exists.
    #[error("could not find {kind} with ID or name {identifier:?}")]
    NotFound {
        /// What was looked up ("user", "team", ...).
        kind: &'static str,
        /// The identifier as given.
        identifier: String,
    },

    /// The credential payload in the secret is unusable.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// A client needs a setting the provider config does not provide.
    #[error("missing client setting {key:?} for {client}")]
    MissingSetting {
        /// Client being built.
        client: &'static str,
        /// Missing key.
        key: &'static str,
    },

    /// The provider config is not usable as written.
    #[error("invalid provider config: {0}")]
    InvalidProviderConfig(String),

    /// Invalid response from API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// A listing did not terminate within the page budget.
    #[error("listing {resource} did not finish within {limit} pages")]
    PageLimitExceeded {
        /// Listing endpoint.
        resource: &'static str,
        /// Page budget.
        limit: u32,
    },

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::HttpError {
            message: message.into(),
            status,
        }
    }

    /// Create a not-found error.
    pub fn not_found(kind: &'static str, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            identifier: identifier.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::HttpError { status, .. } => match status {
                None | Some(429 | 500..=599) => ErrorCategory::Network,
                Some(401 | 403) => ErrorCategory::Config,
                Some(_) => ErrorCategory::Other,
            },
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::InvalidCredentials(_) => ErrorCategory::Config,
            Error::MissingSetting { .. } => ErrorCategory::Config,
            Error::InvalidProviderConfig(_) => ErrorCategory::Config,
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::PageLimitExceeded { .. } => ErrorCategory::Format,
            Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Whether this error must abort the whole invocation.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.category().is_fatal()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::HttpError {
                message: format!("HTTP {}", code),
                status: Some(code),
            },
            ureq::Error::Json(e) => Self::InvalidResponse(e.to_string()),
            other => Self::HttpError {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(!ErrorCategory::NotFound.is_retryable());
        assert!(!ErrorCategory::Config.is_retryable());
        assert!(!ErrorCategory::Format.is_retryable());
        assert!(!ErrorCategory::Other.is_retryable());
    }

    #[test]
    fn test_error_category_fatal() {
        assert!(ErrorCategory::Network.is_fatal());
        assert!(ErrorCategory::Config.is_fatal());
        assert!(ErrorCategory::Format.is_fatal());
        assert!(!ErrorCategory::NotFound.is_fatal());
        assert!(!ErrorCategory::Other.is_fatal());
    }

    #[test]
    fn test_error_category_description() {
        assert!(!ErrorCategory::Network.description().is_empty());
        assert!(format!("{}", ErrorCategory::NotFound).contains("not found"));
    }

    #[test]
    fn test_http_status_categories() {
        assert_eq!(Error::http("down", Some(503)).category(), ErrorCategory::Network);
        assert_eq!(Error::http("slow down", Some(429)).category(), ErrorCategory::Network);
        assert_eq!(Error::http("reset", None).category(), ErrorCategory::Network);
        assert_eq!(Error::http("denied", Some(401)).category(), ErrorCategory::Config);
        assert_eq!(Error::http("forbidden", Some(403)).category(), ErrorCategory::Config);
        assert_eq!(Error::http("gone", Some(404)).category(), ErrorCategory::Other);
        assert!(Error::http("down", Some(502)).is_retryable());
        assert!(!Error::http("gone", Some(404)).is_fatal());
    }

    #[test]
    fn test_not_found_is_a_warning_class() {
        let err = Error::not_found("team", "payments");
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("payments"));
    }

    #[test]
    fn test_config_errors_are_fatal() {
        assert!(Error::InvalidCredentials("not json".to_string()).is_fatal());
        assert!(
            Error::MissingSetting {
                client: "oncall",
                key: "oncall_url"
            }
            .is_fatal()
        );
        assert!(Error::InvalidProviderConfig("no secretRef".to_string()).is_fatal());
    }

    #[test]
    fn test_page_limit_is_fatal() {
        let err = Error::PageLimitExceeded {
            resource: "users",
            limit: 5,
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("5 pages"));
    }

    #[test]
    fn test_from_serde_json() {
        let json_err = serde_json::from_str::<u32>("x").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.category(), ErrorCategory::Format);
    }
}
