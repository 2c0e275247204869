//! Backend traits and implementations for the Grafana APIs.
//!
//! Each backend family is a trait so resolvers never depend on HTTP:
//! [`http`] provides the blocking `ureq` implementations used in
//! production, and [`mock`] provides in-memory ones for tests.
//!
//! [`ClientFactory`] is the seam through which a provider config's flat
//! [`ClientSettings`] become client handles.
//!
//! # Testing
//!
//! ```
//! use grafanakit::backend::{ClientFactory, OnCallApi};
//! use grafanakit::backend::mock::{MockFactory, MockOnCall};
//! use grafanakit::{ClientSettings, OnCallUser};
//!
//! let oncall = MockOnCall::new().with_users(vec![OnCallUser {
//!     id: "U100".to_string(),
//!     username: "alice".to_string(),
//!     email: "alice@example.com".to_string(),
//!     role: "user".to_string(),
//! }]);
//! let factory = MockFactory::new().with_oncall(oncall.clone());
//!
//! let client = factory.oncall(&ClientSettings::default()).unwrap();
//! let page = client.list_users(1).unwrap();
//! assert_eq!(page.items.len(), 1);
//! assert_eq!(oncall.calls("users"), 1);
//! ```

pub mod http;
pub mod mock;

use crate::config::ClientSettings;
use crate::error::Result;
use crate::types::{
    GrafanaTeam, OnCallIntegration, OnCallSchedule, OnCallTeam, OnCallUser, OrgUser, Page,
    Probe, Role, ServiceAccount, SlackChannel,
};
use std::sync::Arc;

/// Grafana OnCall API.
///
/// Every listing is paginated; `page` starts at 1.
pub trait OnCallApi: Send + Sync {
    /// List users.
    fn list_users(&self, page: u32) -> Result<Page<OnCallUser>>;

    /// List teams.
    fn list_teams(&self, page: u32) -> Result<Page<OnCallTeam>>;

    /// List schedules.
    fn list_schedules(&self, page: u32) -> Result<Page<OnCallSchedule>>;

    /// List integrations.
    fn list_integrations(&self, page: u32) -> Result<Page<OnCallIntegration>>;

    /// List Slack channels visible to OnCall.
    fn list_slack_channels(&self, page: u32) -> Result<Page<SlackChannel>>;
}

/// Grafana HTTP API (organization scope).
pub trait GrafanaApi: Send + Sync {
    /// List users of the current organization; `page` starts at 1.
    fn list_org_users(&self, page: u32) -> Result<Page<OrgUser>>;

    /// List teams; `page` starts at 1.
    fn list_teams(&self, page: u32) -> Result<Page<GrafanaTeam>>;

    /// List RBAC roles, optionally including hidden ones. Not paginated.
    fn list_roles(&self, include_hidden: bool) -> Result<Vec<Role>>;

    /// Search service accounts whose name matches `query`; `page` starts at 1.
    fn search_service_accounts(&self, query: &str, page: u32) -> Result<Page<ServiceAccount>>;
}

/// Synthetic Monitoring API.
pub trait SyntheticMonitoringApi: Send + Sync {
    /// List probes. Not paginated.
    fn list_probes(&self) -> Result<Vec<Probe>>;
}

/// Builds backend clients from flat client settings.
///
/// Construction errors (missing URL or token) are configuration errors.
pub trait ClientFactory: Send + Sync {
    /// Build an OnCall client.
    fn oncall(&self, settings: &ClientSettings) -> Result<Arc<dyn OnCallApi>>;

    /// Build a Grafana HTTP API client.
    fn grafana(&self, settings: &ClientSettings) -> Result<Arc<dyn GrafanaApi>>;

    /// Build a Synthetic Monitoring client.
    fn synthetic_monitoring(
        &self,
        settings: &ClientSettings,
    ) -> Result<Arc<dyn SyntheticMonitoringApi>>;
}
