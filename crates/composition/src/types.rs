//! Wire model for a composition function invocation.
//!
//! These types mirror the JSON form of the host's `RunFunctionRequest` and
//! `RunFunctionResponse` messages. Unknown fields are ignored on input.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Time-to-live applied to responses unless the caller picks another.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Metadata sent by the host with each request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMeta {
    /// Opaque tag identifying this request for caching.
    #[serde(default)]
    pub tag: String,
}

/// Metadata returned with each response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    /// Echo of the request tag.
    #[serde(default)]
    pub tag: String,
    /// How long the host may cache this response, e.g. `"60s"`.
    pub ttl: String,
}

/// A single resource in the observed or desired state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// The Kubernetes-style object tree.
    #[serde(default)]
    pub resource: Value,
    /// Connection details published by the resource.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub connection_details: BTreeMap<String, String>,
    /// Readiness as reported by earlier functions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready: Option<Ready>,
}

impl Resource {
    /// Wrap an object tree.
    pub fn new(resource: Value) -> Self {
        Self {
            resource,
            ..Self::default()
        }
    }

    /// `apiVersion` of the object, or an empty string.
    pub fn api_version(&self) -> &str {
        self.str_field("apiVersion")
    }

    /// `kind` of the object, or an empty string.
    pub fn kind(&self) -> &str {
        self.str_field("kind")
    }

    /// API group (the part of `apiVersion` before `/`; empty for core types).
    pub fn group(&self) -> &str {
        match self.api_version().split_once('/') {
            Some((group, _)) => group,
            None => "",
        }
    }

    /// `metadata.namespace` of the object, if set and not empty.
    pub fn namespace(&self) -> Option<&str> {
        self.resource
            .get("metadata")
            .and_then(|m| m.get("namespace"))
            .and_then(Value::as_str)
            .filter(|ns| !ns.is_empty())
    }

    fn str_field(&self, key: &str) -> &str {
        self.resource
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// Readiness of a composed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ready {
    /// Let the host decide.
    #[serde(rename = "READY_UNSPECIFIED")]
    Unspecified,
    /// Resource is ready.
    #[serde(rename = "READY_TRUE")]
    True,
    /// Resource is not ready.
    #[serde(rename = "READY_FALSE")]
    False,
}

/// Observed or desired state: a composite plus its composed resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    /// The composite resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<Resource>,
    /// Composed resources keyed by composition resource name, in input order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub resources: IndexMap<String, Resource>,
}

/// Resources supplied by the host in answer to a requirement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    /// Matching objects; zero or more.
    #[serde(default)]
    pub items: Vec<Resource>,
}

/// How a requirement matches objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceMatch {
    /// Exactly the object with this name.
    MatchName(String),
    /// Every object carrying these labels.
    MatchLabels(MatchLabels),
}

/// Label selector body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchLabels {
    /// Labels that must all be present.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Describes an external object the function needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSelector {
    /// API version of the object.
    pub api_version: String,
    /// Kind of the object.
    pub kind: String,
    /// Name or label match.
    #[serde(flatten)]
    pub r#match: ResourceMatch,
    /// Namespace for namespaced kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ResourceSelector {
    /// Select a single object by name.
    pub fn by_name(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            r#match: ResourceMatch::MatchName(name.into()),
            namespace: None,
        }
    }

    /// Scope the selector to a namespace. Empty namespaces are ignored.
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = (!namespace.is_empty()).then_some(namespace);
        self
    }
}

/// Objects the function asks the host to supply on the next round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    /// Selectors keyed by requirement key.
    #[serde(default, alias = "extraResources")]
    pub resources: BTreeMap<String, ResourceSelector>,
}

impl Requirements {
    /// Whether nothing was requested.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// One function invocation as sent by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Request metadata.
    #[serde(default)]
    pub meta: RequestMeta,
    /// State observed in the cluster.
    #[serde(default)]
    pub observed: State,
    /// State desired by earlier functions in the pipeline.
    #[serde(default)]
    pub desired: State,
    /// Function-specific input object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    /// Pipeline context passed between functions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    /// Objects supplied in answer to earlier requirements.
    #[serde(default, alias = "extraResources")]
    pub required_resources: BTreeMap<String, Resources>,
}

/// Severity of a [`FnResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational.
    #[serde(rename = "SEVERITY_NORMAL")]
    Normal,
    /// Something went wrong but the pipeline continues.
    #[serde(rename = "SEVERITY_WARNING")]
    Warning,
    /// The invocation failed; the host stops the pipeline.
    #[serde(rename = "SEVERITY_FATAL")]
    Fatal,
}

/// Which objects a result or condition is reported on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    /// Only the composite resource.
    #[serde(rename = "TARGET_COMPOSITE")]
    Composite,
    /// The composite and its claim.
    #[serde(rename = "TARGET_COMPOSITE_AND_CLAIM")]
    CompositeAndClaim,
}

/// A message emitted by the function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FnResult {
    /// Severity.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Machine-readable reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Where to surface the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
}

impl FnResult {
    /// Surface this result on the composite and its claim.
    pub fn target_composite_and_claim(&mut self) -> &mut Self {
        self.target = Some(Target::CompositeAndClaim);
        self
    }

    /// Attach a machine-readable reason.
    pub fn with_reason(&mut self, reason: impl Into<String>) -> &mut Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Status of a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    /// Unknown.
    #[serde(rename = "STATUS_CONDITION_UNKNOWN")]
    Unknown,
    /// True.
    #[serde(rename = "STATUS_CONDITION_TRUE")]
    True,
    /// False.
    #[serde(rename = "STATUS_CONDITION_FALSE")]
    False,
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

/// A named status condition set on the composite and/or claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type, e.g. `FunctionSuccess`.
    pub r#type: String,
    /// Status.
    pub status: ConditionStatus,
    /// Machine-readable reason.
    pub reason: String,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Where to set the condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
}

/// The function's answer to one [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Response metadata.
    pub meta: ResponseMeta,
    /// Desired state after this function.
    #[serde(default)]
    pub desired: State,
    /// Results, in the order they were emitted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<FnResult>,
    /// Objects required on the next round.
    #[serde(default, skip_serializing_if = "Requirements::is_empty")]
    pub requirements: Requirements,
    /// Conditions to set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// Pipeline context for later functions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

/// Render a duration the way the host's JSON codec expects (`"60s"`).
pub fn format_ttl(ttl: Duration) -> String {
    let millis = ttl.subsec_millis();
    if millis == 0 {
        format!("{}s", ttl.as_secs())
    } else {
        format!("{}.{:03}s", ttl.as_secs(), millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_decodes_required_resources() {
        let req: Request = serde_json::from_value(json!({
            "meta": {"tag": "abc"},
            "observed": {"composite": {"resource": {"kind": "XStack"}}},
            "desired": {"resources": {
                "second": {"resource": {"kind": "Schedule"}},
                "first": {"resource": {"kind": "OnCallShift"}}
            }},
            "requiredResources": {
                "ProviderConfig/default": {"items": [{"resource": {"kind": "ProviderConfig"}}]}
            }
        }))
        .unwrap();

        assert_eq!(req.meta.tag, "abc");
        let names: Vec<_> = req.desired.resources.keys().cloned().collect();
        assert_eq!(names, vec!["second", "first"]);
        assert_eq!(req.required_resources["ProviderConfig/default"].items.len(), 1);
    }

    #[test]
    fn test_request_accepts_legacy_extra_resources() {
        let req: Request = serde_json::from_value(json!({
            "extraResources": {"Secret/creds": {"items": []}}
        }))
        .unwrap();
        assert!(req.required_resources.contains_key("Secret/creds"));
    }

    #[test]
    fn test_resource_accessors() {
        let res = Resource::new(json!({
            "apiVersion": "oncall.grafana.crossplane.io/v1alpha1",
            "kind": "Schedule",
            "metadata": {"name": "primary", "namespace": "team-a"}
        }));
        assert_eq!(res.group(), "oncall.grafana.crossplane.io");
        assert_eq!(res.kind(), "Schedule");
        assert_eq!(res.namespace(), Some("team-a"));

        let core = Resource::new(json!({"apiVersion": "v1", "kind": "Secret", "metadata": {"namespace": ""}}));
        assert_eq!(core.group(), "");
        assert_eq!(core.namespace(), None);
    }

    #[test]
    fn test_selector_serializes_match_name() {
        let selector = ResourceSelector::by_name("v1", "Secret", "creds").in_namespace("crossplane");
        let value = serde_json::to_value(&selector).unwrap();
        assert_eq!(
            value,
            json!({
                "apiVersion": "v1",
                "kind": "Secret",
                "matchName": "creds",
                "namespace": "crossplane"
            })
        );

        let back: ResourceSelector = serde_json::from_value(value).unwrap();
        assert_eq!(back, selector);
    }

    #[test]
    fn test_selector_ignores_empty_namespace() {
        let selector = ResourceSelector::by_name("v1", "Secret", "creds").in_namespace("");
        assert_eq!(selector.namespace, None);
    }

    #[test]
    fn test_severity_wire_names() {
        assert_eq!(
            serde_json::to_value(Severity::Warning).unwrap(),
            json!("SEVERITY_WARNING")
        );
        assert_eq!(
            serde_json::to_value(Target::CompositeAndClaim).unwrap(),
            json!("TARGET_COMPOSITE_AND_CLAIM")
        );
        assert!(Severity::Fatal > Severity::Warning);
        assert!(Severity::Warning > Severity::Normal);
    }

    #[test]
    fn test_format_ttl() {
        assert_eq!(format_ttl(Duration::from_secs(60)), "60s");
        assert_eq!(format_ttl(Duration::from_millis(1500)), "1.500s");
    }
}
