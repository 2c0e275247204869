//! Two-phase requirement protocol.
//!
//! A function cannot fetch external objects itself. Instead it declares a
//! [`ResourceSelector`] for every object it needs, and the host re-invokes
//! it with the matching objects attached. The tracker holds no state across
//! invocations: every round it re-declares everything it asks for, and
//! learns what is available only from the objects the host supplied.
//!
//! ```text
//! Unrequested ──declare──▶ Requested ──host supplies──▶ Satisfied
//!                               │
//!                               └──not yet supplied──▶ StillRequested
//! ```

use crate::error::{Error, Result};
use crate::types::{Requirements, Resource, ResourceMatch, ResourceSelector, Resources};
use log::debug;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// Outcome of asking for an external object.
///
/// `Pending` is the normal answer on the first round: the requirement has
/// been declared and the caller should skip whatever depended on it.
#[derive(Debug, Clone, PartialEq)]
pub enum Readiness<T> {
    /// The object is available this round.
    Ready(T),
    /// The object has been requested and is not available yet.
    Pending,
}

/// Stable key identifying a requirement in both directions of the protocol.
pub struct RequirementKey;

impl RequirementKey {
    /// Build the key for a selector.
    ///
    /// `Kind/name` for cluster-scoped name matches, `Kind/namespace/name`
    /// when a namespace is set, and `Kind/k=v,...` (sorted) for label matches.
    pub fn for_selector(selector: &ResourceSelector) -> String {
        let target = match &selector.r#match {
            ResourceMatch::MatchName(name) => name.clone(),
            ResourceMatch::MatchLabels(labels) => labels
                .labels
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(","),
        };
        match &selector.namespace {
            Some(namespace) => format!("{}/{}/{}", selector.kind, namespace, target),
            None => format!("{}/{}", selector.kind, target),
        }
    }
}

/// Declares requirements and looks up what the host supplied this round.
pub struct RequirementTracker<'a> {
    supplied: &'a BTreeMap<String, Resources>,
    declared: BTreeMap<String, ResourceSelector>,
}

impl<'a> RequirementTracker<'a> {
    /// Create a tracker over the objects supplied with the current request.
    pub fn new(supplied: &'a BTreeMap<String, Resources>) -> Self {
        Self {
            supplied,
            declared: BTreeMap::new(),
        }
    }

    /// Declare `selector` and return the matching object if supplied.
    ///
    /// The selector is always recorded, whether or not it is already
    /// satisfied, because the host starts each round with no requirements.
    /// An empty answer counts as pending; more than one object is
    /// [`Error::Ambiguous`].
    pub fn require(&mut self, selector: ResourceSelector) -> Result<Readiness<&'a Resource>> {
        let key = RequirementKey::for_selector(&selector);
        self.declared.insert(key.clone(), selector);

        let Some(resources) = self.supplied.get(&key) else {
            debug!("Requirement {key} not supplied yet");
            return Ok(Readiness::Pending);
        };

        match resources.items.as_slice() {
            [] => {
                debug!("Requirement {key} supplied with no matching object");
                Ok(Readiness::Pending)
            }
            [single] => Ok(Readiness::Ready(single)),
            many => Err(Error::Ambiguous {
                key,
                count: many.len(),
            }),
        }
    }

    /// Like [`require`](Self::require), decoding the object into `T`.
    pub fn require_as<T: DeserializeOwned>(
        &mut self,
        selector: ResourceSelector,
    ) -> Result<Readiness<T>> {
        let key = RequirementKey::for_selector(&selector);
        match self.require(selector)? {
            Readiness::Ready(resource) => T::deserialize(&resource.resource)
                .map(Readiness::Ready)
                .map_err(|source| Error::Decode {
                    key,
                    expected: std::any::type_name::<T>(),
                    source,
                }),
            Readiness::Pending => Ok(Readiness::Pending),
        }
    }

    /// Consume the tracker, yielding the requirements to send back.
    pub fn into_requirements(self) -> Requirements {
        Requirements {
            resources: self.declared,
        }
    }
}
