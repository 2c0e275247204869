//! Failure classes of one invocation.
//!
//! [`FunctionError`] aborts the whole invocation with a fatal result.
//! [`StepError`] is local to one field of one resource and usually ends up
//! as a warning; [`StepError::escalate`] says when it must abort instead.

use grafanakit::ErrorCategory;

/// An error that aborts the invocation.
#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    /// The request carries no observed composite resource.
    #[error("cannot get observed composite resource")]
    MissingComposite,

    /// The function input could not be decoded.
    #[error("invalid function input: {0}")]
    InvalidInput(String),

    /// A desired resource does not say which provider config governs it.
    #[error("resource {resource} has no provider config reference at {path}")]
    MissingProviderConfigRef {
        /// Composition resource name.
        resource: String,
        /// Where the reference was expected.
        path: &'static str,
    },

    /// A provider config reference that cannot be looked up.
    #[error("resource {resource}: {reason}")]
    InvalidProviderConfigRef {
        /// Composition resource name.
        resource: String,
        /// What is wrong with the reference.
        reason: String,
    },

    /// A required object was ambiguous or could not be decoded.
    #[error(transparent)]
    Requirement(#[from] composition::Error),

    /// A provider config or its credentials are unusable.
    #[error("provider config {name}: {source}")]
    ProviderConfig {
        /// Provider config name.
        name: String,
        /// Underlying error.
        #[source]
        source: grafanakit::Error,
    },

    /// A backend failure that cannot be scoped to a single field.
    #[error("resource {resource}: {source}")]
    Backend {
        /// Composition resource name.
        resource: String,
        /// Underlying error.
        #[source]
        source: grafanakit::Error,
    },
}

/// Failure to resolve one field.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// The backend could not resolve the value.
    #[error(transparent)]
    Backend(#[from] grafanakit::Error),

    /// The value does not have the shape the field should have.
    #[error(transparent)]
    Path(#[from] fieldpath::Error),
}

impl StepError {
    /// Broad class of the failure, for log lines.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Backend(err) => err.category(),
            Self::Path(_) => ErrorCategory::Other,
        }
    }

    /// The invocation-level error for `resource` when this failure must
    /// abort the invocation, or the failure itself when it is a warning.
    /// Shape mismatches are always warnings.
    pub fn escalate(self, resource: &str) -> Result<FunctionError, Self> {
        match self {
            Self::Backend(source) if source.is_fatal() => Ok(FunctionError::Backend {
                resource: resource.to_string(),
                source,
            }),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escalates(err: impl Into<StepError>) -> bool {
        err.into().escalate("shift").is_ok()
    }

    #[test]
    fn test_not_found_is_a_warning() {
        let err = StepError::from(grafanakit::Error::not_found("oncall team", "payments"));
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(matches!(err.escalate("schedule"), Err(StepError::Backend(_))));
    }

    #[test]
    fn test_transport_and_config_errors_are_fatal() {
        assert!(escalates(grafanakit::Error::http("timeout", None)));
        assert!(escalates(grafanakit::Error::http("HTTP 503", Some(503))));
        assert!(escalates(grafanakit::Error::http("HTTP 401", Some(401))));
        assert!(escalates(grafanakit::Error::MissingSetting {
            client: "oncall",
            key: "oncall_url"
        }));
    }

    #[test]
    fn test_client_errors_are_warnings() {
        assert!(!escalates(grafanakit::Error::http("HTTP 400", Some(400))));
    }

    #[test]
    fn test_shape_mismatch_is_a_warning() {
        let err = fieldpath::get_into::<Vec<String>>(&serde_json::json!({"a": 1}), "a").unwrap_err();
        let err = StepError::from(err);
        assert_eq!(err.category(), ErrorCategory::Other);
        assert!(matches!(err.escalate("shift"), Err(StepError::Path(_))));
    }

    #[test]
    fn test_escalation_keeps_resource() {
        let err = StepError::from(grafanakit::Error::http("timeout", None))
            .escalate("shift")
            .unwrap();
        assert!(err.to_string().starts_with("resource shift:"));
    }
}
