//! # Composition
//!
//! The wire model and protocol helpers for a composition function: a
//! stateless stage that receives the desired state of a composite resource,
//! rewrites it, and returns it together with results and conditions.
//!
//! ## Core Concepts
//!
//! - **Request / Response**: one invocation of the function
//! - **Resource**: an observed or desired object tree
//! - **RequirementTracker**: declares external objects the function needs
//!   and reads back the ones the host supplied
//! - **Results and conditions**: per-invocation messages with a severity,
//!   summarized by [`finalize`]
//!
//! ## Example
//!
//! ```
//! use composition::{
//!     DEFAULT_TTL, Readiness, Request, RequirementTracker, ResourceSelector, Response,
//! };
//!
//! let req = Request::default();
//! let mut rsp = Response::to(&req, DEFAULT_TTL);
//! let mut tracker = RequirementTracker::new(&req.required_resources);
//!
//! let selector = ResourceSelector::by_name("grafana.crossplane.io/v1beta1", "ProviderConfig", "default");
//! if let Readiness::Pending = tracker.require(selector).unwrap() {
//!     // Ask again next round.
//! }
//!
//! rsp.requirements = tracker.into_requirements();
//! assert!(rsp.requirements.resources.contains_key("ProviderConfig/default"));
//! ```

pub mod error;
pub mod requirements;
pub mod response;
pub mod types;

// Re-export main types at crate root
pub use error::{Error, Result};
pub use requirements::{Readiness, RequirementKey, RequirementTracker};
pub use response::{SUCCESS_CONDITION, finalize};
pub use types::{
    Condition, ConditionStatus, DEFAULT_TTL, FnResult, MatchLabels, Ready, Request, RequestMeta,
    Requirements, Resource, ResourceMatch, ResourceSelector, Resources, Response, ResponseMeta,
    Severity, State, Target,
};
