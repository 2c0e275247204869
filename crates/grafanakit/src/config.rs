//! Provider configs, credential secrets, and the flat client settings
//! derived from them.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::collections::BTreeMap;

/// API version of the provider config kind.
pub const PROVIDER_CONFIG_API_VERSION: &str = "grafana.crossplane.io/v1beta1";

/// Kind name of the provider config.
pub const PROVIDER_CONFIG_KIND: &str = "ProviderConfig";

/// API version of the provider configs of namespaced managed resources.
pub const NAMESPACED_PROVIDER_CONFIG_API_VERSION: &str = "grafana.m.crossplane.io/v1beta1";

/// Kind name of the cluster-wide provider config of namespaced managed resources.
pub const CLUSTER_PROVIDER_CONFIG_KIND: &str = "ClusterProviderConfig";

/// Secret key holding the credential payload unless the provider config says otherwise.
pub const DEFAULT_CREDENTIALS_KEY: &str = "instanceCredentials";

/// Credential keys copied from the secret payload. Anything else is ignored.
const CREDENTIAL_KEYS: &[&str] = &[
    "auth",
    "url",
    "cloud_access_policy_token",
    "cloud_api_url",
    "cloud_provider_access_token",
    "cloud_provider_url",
    "connections_api_access_token",
    "connections_api_url",
    "fleet_management_auth",
    "fleet_management_url",
    "frontend_o11y_api_access_token",
    "oncall_access_token",
    "oncall_url",
    "sm_access_token",
    "sm_url",
    "cloud_api_key",
    "org_id",
    "stack_id",
    "k6_access_token",
];

/// A Grafana provider config as supplied by the host.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    /// Object metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Provider config spec.
    #[serde(default)]
    pub spec: ProviderConfigSpec,
}

/// Subset of Kubernetes object metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectMeta {
    /// Object name.
    #[serde(default)]
    pub name: String,
    /// Object namespace.
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Spec of a provider config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigSpec {
    /// Where the credentials come from.
    #[serde(default)]
    pub credentials: Credentials,
    /// Grafana URL override.
    #[serde(default)]
    pub url: Option<String>,
    /// Grafana Cloud API URL override.
    #[serde(default)]
    pub cloud_api_url: Option<String>,
    /// Cloud provider API URL override.
    #[serde(default)]
    pub cloud_provider_url: Option<String>,
    /// Connections API URL override.
    #[serde(default)]
    pub connections_api_url: Option<String>,
    /// Fleet management URL override.
    #[serde(default)]
    pub fleet_management_url: Option<String>,
    /// OnCall API URL override.
    #[serde(default, alias = "onCallUrl")]
    pub oncall_url: Option<String>,
    /// Synthetic monitoring API URL override.
    #[serde(default)]
    pub sm_url: Option<String>,
    /// Grafana organization ID.
    #[serde(default)]
    pub org_id: Option<i64>,
    /// Grafana Cloud stack ID.
    #[serde(default)]
    pub stack_id: Option<i64>,
}

/// Credentials block of a provider config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Credential source; only `Secret` is supported.
    #[serde(default)]
    pub source: String,
    /// Secret holding the credential payload.
    #[serde(default)]
    pub secret_ref: Option<SecretRef>,
}

/// Reference to a key of a secret.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecretRef {
    /// Secret name.
    pub name: String,
    /// Secret namespace.
    #[serde(default)]
    pub namespace: String,
    /// Key inside the secret.
    #[serde(default)]
    pub key: String,
}

impl ProviderConfig {
    /// The secret this provider config reads its credentials from.
    pub fn secret_ref(&self) -> Result<&SecretRef> {
        let credentials = &self.spec.credentials;
        if !credentials.source.is_empty() && credentials.source != "Secret" {
            return Err(Error::InvalidProviderConfig(format!(
                "{}: unsupported credentials source {:?}",
                self.metadata.name, credentials.source
            )));
        }
        credentials
            .secret_ref
            .as_ref()
            .filter(|r| !r.name.is_empty())
            .ok_or_else(|| {
                Error::InvalidProviderConfig(format!(
                    "{}: spec.credentials.secretRef is not set",
                    self.metadata.name
                ))
            })
    }
}

/// A Kubernetes secret as supplied by the host.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    /// Object metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Base64-encoded values.
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    /// Plain-text values.
    #[serde(default)]
    pub string_data: BTreeMap<String, String>,
}

impl Secret {
    /// Decoded value of `key`.
    pub fn value(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(encoded) = self.data.get(key) {
            let bytes = STANDARD.decode(encoded.trim()).map_err(|e| {
                Error::InvalidCredentials(format!(
                    "secret {} key {key} is not valid base64: {e}",
                    self.metadata.name
                ))
            })?;
            return Ok(Some(bytes));
        }
        Ok(self.string_data.get(key).map(|v| v.as_bytes().to_vec()))
    }
}

/// Flat configuration map from which backend clients are built.
///
/// Keys follow the Grafana provider's naming (`url`, `auth`, `oncall_url`,
/// `sm_access_token`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSettings {
    values: BTreeMap<String, String>,
}

impl ClientSettings {
    /// Build settings from a provider config and its credentials secret.
    ///
    /// The credential payload is a JSON object of strings stored under the
    /// secret ref's key (or `default_key`). URL overrides on the provider
    /// config take precedence over values from the payload.
    pub fn from_provider_config(
        pc: &ProviderConfig,
        secret: &Secret,
        default_key: &str,
    ) -> Result<Self> {
        let secret_ref = pc.secret_ref()?;
        let key = if secret_ref.key.is_empty() {
            default_key
        } else {
            secret_ref.key.as_str()
        };

        let payload = secret.value(key)?.ok_or_else(|| {
            Error::InvalidCredentials(format!(
                "secret {} has no key {key}",
                secret.metadata.name
            ))
        })?;
        let credentials: BTreeMap<String, String> = serde_json::from_slice(&payload)
            .map_err(|e| {
                Error::InvalidCredentials(format!(
                    "secret {} key {key} is not a JSON object of strings: {e}",
                    secret.metadata.name
                ))
            })?;

        let mut settings = Self::default();
        for &k in CREDENTIAL_KEYS {
            if let Some(v) = credentials.get(k) {
                settings.insert(k, v.clone());
            }
        }

        let spec = &pc.spec;
        let overrides = [
            ("url", &spec.url),
            ("cloud_api_url", &spec.cloud_api_url),
            ("cloud_provider_url", &spec.cloud_provider_url),
            ("connections_api_url", &spec.connections_api_url),
            ("fleet_management_url", &spec.fleet_management_url),
            ("oncall_url", &spec.oncall_url),
            ("sm_url", &spec.sm_url),
        ];
        for (k, v) in overrides {
            if let Some(v) = v.as_deref().filter(|v| !v.is_empty()) {
                settings.insert(k, v);
            }
        }
        if let Some(org_id) = spec.org_id {
            settings.insert("org_id", org_id.to_string());
        }
        if let Some(stack_id) = spec.stack_id {
            settings.insert("stack_id", stack_id.to_string());
        }
        Ok(settings)
    }

    /// Set a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Value of `key`, ignoring empty strings.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Value of `key`, or a [`Error::MissingSetting`] for `client`.
    pub fn require(&self, client: &'static str, key: &'static str) -> Result<&str> {
        self.get(key).ok_or(Error::MissingSetting { client, key })
    }
}
