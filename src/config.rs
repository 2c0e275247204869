use crate::error::FunctionError;
use grafanakit::{DEFAULT_CREDENTIALS_KEY, DEFAULT_MAX_PAGES};
use log::warn;
use serde::Deserialize;
use serde_json::Value;

/// API version of the function input.
pub const INPUT_API_VERSION: &str = "grafana-data.fn.crossplane.io/v1beta1";

// ============================================================================
// Function Input
// ============================================================================

/// Optional input object attached to the pipeline step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub spec: InputSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSpec {
    /// Upper bound on pages fetched per listing
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Secret key holding credentials when the provider config names none
    #[serde(default)]
    pub credentials_key: Option<String>,
}

fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}

impl Default for InputSpec {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            credentials_key: None,
        }
    }
}

impl Input {
    /// Decode the request's input; absent input means defaults.
    pub fn from_request(input: Option<&Value>) -> Result<Self, FunctionError> {
        let input = match input {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(value) => Self::deserialize(value)
                .map_err(|e| FunctionError::InvalidInput(e.to_string()))?,
        };
        if !input.api_version.is_empty() && input.api_version != INPUT_API_VERSION {
            warn!(
                "Function input has apiVersion {}, expected {INPUT_API_VERSION}",
                input.api_version
            );
        }
        if input.spec.max_pages == 0 {
            return Err(FunctionError::InvalidInput(
                "spec.maxPages must be at least 1".to_string(),
            ));
        }
        Ok(input)
    }

    /// Secret key used when a provider config's secret ref has no key.
    pub fn credentials_key(&self) -> &str {
        self.spec
            .credentials_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .unwrap_or(DEFAULT_CREDENTIALS_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_input_uses_defaults() {
        let input = Input::from_request(None).unwrap();
        assert_eq!(input.spec.max_pages, DEFAULT_MAX_PAGES);
        assert_eq!(input.credentials_key(), DEFAULT_CREDENTIALS_KEY);
    }

    #[test]
    fn test_input_overrides() {
        let value = json!({
            "apiVersion": INPUT_API_VERSION,
            "kind": "Input",
            "spec": {"maxPages": 20, "credentialsKey": "credentials"}
        });
        let input = Input::from_request(Some(&value)).unwrap();
        assert_eq!(input.api_version, INPUT_API_VERSION);
        assert_eq!(input.spec.max_pages, 20);
        assert_eq!(input.credentials_key(), "credentials");
    }

    #[test]
    fn test_partial_spec_keeps_defaults() {
        let value = json!({"spec": {"credentialsKey": ""}});
        let input = Input::from_request(Some(&value)).unwrap();
        assert_eq!(input.spec.max_pages, DEFAULT_MAX_PAGES);
        assert_eq!(input.credentials_key(), DEFAULT_CREDENTIALS_KEY);
    }

    #[test]
    fn test_undecodable_input_is_an_error() {
        let value = json!({"spec": {"maxPages": "many"}});
        assert!(matches!(
            Input::from_request(Some(&value)),
            Err(FunctionError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_zero_pages_rejected() {
        let value = json!({"spec": {"maxPages": 0}});
        assert!(Input::from_request(Some(&value)).is_err());
    }
}
