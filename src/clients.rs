use crate::dispatch::is_namespaced_group;
use crate::error::FunctionError;
use composition::{Readiness, RequirementKey, RequirementTracker, Resource, ResourceSelector};
use grafanakit::config::{
    CLUSTER_PROVIDER_CONFIG_KIND, NAMESPACED_PROVIDER_CONFIG_API_VERSION,
    PROVIDER_CONFIG_API_VERSION, PROVIDER_CONFIG_KIND,
};
use grafanakit::{ClientBundle, ClientFactory, ClientSettings, ProviderConfig, Secret};
use log::info;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Where a resource's provider config name lives.
pub const PROVIDER_CONFIG_REF_PATH: &str = "spec.providerConfigRef.name";

/// Where a namespaced resource's provider config kind lives.
pub const PROVIDER_CONFIG_KIND_PATH: &str = "spec.providerConfigRef.kind";

/// The provider config governing a managed resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderConfigRef {
    pub api_version: &'static str,
    pub kind: String,
    pub name: String,
    /// Set for namespaced `ProviderConfig`s only.
    pub namespace: Option<String>,
}

impl ProviderConfigRef {
    /// Reference of `resource`, named `name` in the composition.
    ///
    /// Cluster-scoped resources always use the cluster `ProviderConfig`.
    /// Namespaced resources honour `providerConfigRef.kind`, which defaults
    /// to `ClusterProviderConfig`; a namespaced `ProviderConfig` is looked up
    /// in the resource's namespace, or the composite's when the resource
    /// sets none.
    pub fn of(
        name: &str,
        resource: &Resource,
        composite_namespace: Option<&str>,
    ) -> Result<Self, FunctionError> {
        let pc_name =
            ref_field(resource, PROVIDER_CONFIG_REF_PATH).ok_or_else(|| {
                FunctionError::MissingProviderConfigRef {
                    resource: name.to_string(),
                    path: PROVIDER_CONFIG_REF_PATH,
                }
            })?;

        if !is_namespaced_group(resource.group()) {
            return Ok(Self {
                api_version: PROVIDER_CONFIG_API_VERSION,
                kind: PROVIDER_CONFIG_KIND.to_string(),
                name: pc_name,
                namespace: None,
            });
        }

        let invalid = |reason: String| FunctionError::InvalidProviderConfigRef {
            resource: name.to_string(),
            reason,
        };
        let kind = ref_field(resource, PROVIDER_CONFIG_KIND_PATH)
            .unwrap_or_else(|| CLUSTER_PROVIDER_CONFIG_KIND.to_string());
        let namespace = match kind.as_str() {
            CLUSTER_PROVIDER_CONFIG_KIND => None,
            PROVIDER_CONFIG_KIND => {
                let namespace = resource.namespace().or(composite_namespace).ok_or_else(|| {
                    invalid(format!(
                        "no namespace to look up ProviderConfig {pc_name} in"
                    ))
                })?;
                Some(namespace.to_string())
            }
            other => return Err(invalid(format!("unsupported provider config kind {other:?}"))),
        };

        Ok(Self {
            api_version: NAMESPACED_PROVIDER_CONFIG_API_VERSION,
            kind,
            name: pc_name,
            namespace,
        })
    }

    fn selector(&self) -> ResourceSelector {
        ResourceSelector::by_name(self.api_version, self.kind.as_str(), self.name.as_str())
            .in_namespace(self.namespace.clone().unwrap_or_default())
    }
}

impl fmt::Display for ProviderConfigRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", RequirementKey::for_selector(&self.selector()))
    }
}

fn ref_field(resource: &Resource, path: &str) -> Option<String> {
    fieldpath::get(&resource.resource, path)
        .ok()
        .flatten()
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Client bundles of one invocation, keyed by provider config.
///
/// A bundle is built the first time its provider config and credentials
/// secret are both available, and is never rebuilt within the invocation.
pub struct ClientCache {
    factory: Arc<dyn ClientFactory>,
    credentials_key: String,
    max_pages: u32,
    bundles: HashMap<ProviderConfigRef, ClientBundle>,
}

impl ClientCache {
    pub fn new(factory: Arc<dyn ClientFactory>, credentials_key: &str, max_pages: u32) -> Self {
        Self {
            factory,
            credentials_key: credentials_key.to_string(),
            max_pages,
            bundles: HashMap::new(),
        }
    }

    /// The bundle for provider config `pc`.
    ///
    /// `Pending` means the provider config or its secret has been requested
    /// and is not supplied yet; the caller should skip the resource.
    pub fn bundle(
        &mut self,
        tracker: &mut RequirementTracker<'_>,
        pc: &ProviderConfigRef,
    ) -> Result<Readiness<&mut ClientBundle>, FunctionError> {
        if !self.bundles.contains_key(pc) {
            let Readiness::Ready(bundle) = self.build(tracker, pc)? else {
                return Ok(Readiness::Pending);
            };
            self.bundles.insert(pc.clone(), bundle);
        }
        Ok(self
            .bundles
            .get_mut(pc)
            .map_or(Readiness::Pending, Readiness::Ready))
    }

    /// Number of bundles built.
    pub fn bundle_count(&self) -> usize {
        self.bundles.len()
    }

    fn build(
        &self,
        tracker: &mut RequirementTracker<'_>,
        pc_ref: &ProviderConfigRef,
    ) -> Result<Readiness<ClientBundle>, FunctionError> {
        let Readiness::Ready(pc) = tracker.require_as::<ProviderConfig>(pc_ref.selector())? else {
            info!("Waiting for provider config {pc_ref}");
            return Ok(Readiness::Pending);
        };

        let invalid = |source| FunctionError::ProviderConfig {
            name: pc_ref.to_string(),
            source,
        };

        let secret_ref = pc.secret_ref().map_err(invalid)?;
        // A namespaced provider config may leave the secret namespace implicit.
        let namespace = if secret_ref.namespace.is_empty() {
            pc_ref.namespace.as_deref().ok_or_else(|| {
                invalid(grafanakit::Error::InvalidProviderConfig(format!(
                    "{}: spec.credentials.secretRef.namespace is not set",
                    pc_ref.name
                )))
            })?
        } else {
            secret_ref.namespace.as_str()
        };
        let selector = ResourceSelector::by_name("v1", "Secret", secret_ref.name.as_str())
            .in_namespace(namespace);
        let Readiness::Ready(secret) = tracker.require_as::<Secret>(selector)? else {
            info!(
                "Waiting for secret {namespace}/{} of provider config {pc_ref}",
                secret_ref.name
            );
            return Ok(Readiness::Pending);
        };

        let settings = ClientSettings::from_provider_config(&pc, &secret, &self.credentials_key)
            .map_err(invalid)?;
        info!("Built client bundle for provider config {pc_ref}");

        Ok(Readiness::Ready(
            ClientBundle::new(pc_ref.to_string(), settings, Arc::clone(&self.factory))
                .with_max_pages(self.max_pages),
        ))
    }
}
