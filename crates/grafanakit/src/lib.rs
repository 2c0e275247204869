//! # grafanakit
//!
//! Pure Rust library for turning Grafana names into the IDs Grafana APIs
//! expect.
//!
//! This crate provides functionality for:
//! - Decoding provider configs and their credential secrets into flat
//!   [`ClientSettings`]
//! - Blocking HTTP clients for Grafana, Grafana OnCall and Synthetic
//!   Monitoring, with retry on transient failures
//! - Resolvers that memoize paginated listings for the lifetime of a
//!   [`ClientBundle`]
//!
//! ## Example
//!
//! ```
//! use grafanakit::ClientBundle;
//! use grafanakit::backend::mock::{MockFactory, MockOnCall};
//! use grafanakit::{ClientSettings, OnCallUser};
//! use std::sync::Arc;
//!
//! let oncall = MockOnCall::new().with_users(vec![OnCallUser {
//!     id: "U100".to_string(),
//!     username: "alice".to_string(),
//!     email: "alice@example.com".to_string(),
//!     role: "user".to_string(),
//! }]);
//! let factory = MockFactory::new().with_oncall(oncall);
//! let mut bundle = ClientBundle::new("default", ClientSettings::default(), Arc::new(factory));
//!
//! let ids = bundle
//!     .oncall()
//!     .unwrap()
//!     .user_ids(&["alice@example.com".to_string()])
//!     .unwrap();
//! assert_eq!(ids, vec!["U100"]);
//! ```
//!
//! ## Backends
//!
//! | Family | Settings | Listings |
//! |--------|----------|----------|
//! | OnCall | `oncall_url`, `oncall_access_token` or `auth` | users, teams, schedules, integrations, Slack channels |
//! | Grafana | `url`, `auth`, `org_id` | org users, teams, roles, service accounts |
//! | Synthetic Monitoring | `sm_url`, `sm_access_token` | probes |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod bundle;
pub mod config;
pub mod error;
pub mod resolver;
pub mod retry;
pub mod types;

pub use backend::http::HttpClientFactory;
pub use backend::{ClientFactory, GrafanaApi, OnCallApi, SyntheticMonitoringApi};
pub use bundle::ClientBundle;
pub use config::{ClientSettings, DEFAULT_CREDENTIALS_KEY, ProviderConfig, Secret};
pub use error::{Error, ErrorCategory, Result};
pub use resolver::{
    DEFAULT_MAX_PAGES, GrafanaResolver, OnCallResolver, SyntheticMonitoringResolver,
};
pub use retry::RetryConfig;
pub use types::{
    GrafanaTeam, OnCallContact, OnCallIntegration, OnCallSchedule, OnCallTeam, OnCallUser,
    OrgUser, PermissionEntry, Probe, ProbeRef, Role, ServiceAccount, SlackChannel,
};
