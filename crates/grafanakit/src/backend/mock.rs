//! In-memory backends for tests.
//!
//! Mocks are cheap to clone and share their state, so a test can keep a
//! handle to inspect call counts after giving a clone to the code under
//! test.

use crate::backend::{ClientFactory, GrafanaApi, OnCallApi, SyntheticMonitoringApi};
use crate::config::ClientSettings;
use crate::error::{Error, Result};
use crate::types::{
    GrafanaTeam, OnCallIntegration, OnCallSchedule, OnCallTeam, OnCallUser, OrgUser, Page,
    Probe, Role, ServiceAccount, SlackChannel,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Pagination and failure behaviour shared by the mocks.
#[derive(Debug, Default)]
struct Calls {
    counts: HashMap<&'static str, usize>,
    failures: HashMap<&'static str, Option<u16>>,
    page_size: Option<usize>,
    endless: bool,
}

impl Calls {
    /// Record a call and return the injected failure, if any.
    fn record(&mut self, listing: &'static str) -> Result<()> {
        *self.counts.entry(listing).or_default() += 1;
        match self.failures.get(listing) {
            Some(status) => {
                let message = match status {
                    Some(code) => format!("{listing}: HTTP {code}"),
                    None => format!("{listing}: connection refused"),
                };
                Err(Error::http(message, *status))
            }
            None => Ok(()),
        }
    }

    fn page<T: Clone>(&self, items: &[T], page: u32) -> Page<T> {
        let Some(size) = self.page_size else {
            let items = if page <= 1 { items.to_vec() } else { Vec::new() };
            return Page {
                items,
                has_next: self.endless,
            };
        };

        let start = (page.max(1) as usize - 1) * size;
        let end = (start + size).min(items.len());
        let chunk = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();
        Page {
            items: chunk,
            has_next: self.endless || end < items.len(),
        }
    }
}

// =============================================================================
// OnCall
// =============================================================================

#[derive(Debug, Default)]
struct OnCallState {
    users: Vec<OnCallUser>,
    teams: Vec<OnCallTeam>,
    schedules: Vec<OnCallSchedule>,
    integrations: Vec<OnCallIntegration>,
    channels: Vec<SlackChannel>,
    calls: Calls,
}

/// In-memory [`OnCallApi`].
///
/// Listings are named `users`, `teams`, `schedules`, `integrations` and
/// `slack_channels` for [`calls`](Self::calls) and [`fail`](Self::fail).
#[derive(Debug, Clone, Default)]
pub struct MockOnCall {
    state: Arc<Mutex<OnCallState>>,
}

impl MockOnCall {
    /// Create an empty mock. Every listing fits on one page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `users`.
    #[must_use]
    pub fn with_users(self, users: Vec<OnCallUser>) -> Self {
        lock(&self.state).users = users;
        self
    }

    /// Serve `teams`.
    #[must_use]
    pub fn with_teams(self, teams: Vec<OnCallTeam>) -> Self {
        lock(&self.state).teams = teams;
        self
    }

    /// Serve `schedules`.
    #[must_use]
    pub fn with_schedules(self, schedules: Vec<OnCallSchedule>) -> Self {
        lock(&self.state).schedules = schedules;
        self
    }

    /// Serve `integrations`.
    #[must_use]
    pub fn with_integrations(self, integrations: Vec<OnCallIntegration>) -> Self {
        lock(&self.state).integrations = integrations;
        self
    }

    /// Serve Slack `channels`.
    #[must_use]
    pub fn with_channels(self, channels: Vec<SlackChannel>) -> Self {
        lock(&self.state).channels = channels;
        self
    }

    /// Split every listing into pages of `size` items.
    #[must_use]
    pub fn with_page_size(self, size: usize) -> Self {
        lock(&self.state).calls.page_size = Some(size.max(1));
        self
    }

    /// Report a next page on every response.
    #[must_use]
    pub fn with_endless_pages(self) -> Self {
        lock(&self.state).calls.endless = true;
        self
    }

    /// Make `listing` fail with `status` (`None` for a transport error).
    #[must_use]
    pub fn fail(self, listing: &'static str, status: Option<u16>) -> Self {
        lock(&self.state).calls.failures.insert(listing, status);
        self
    }

    /// Number of page requests made for `listing`.
    pub fn calls(&self, listing: &str) -> usize {
        lock(&self.state)
            .calls
            .counts
            .get(listing)
            .copied()
            .unwrap_or(0)
    }
}

impl OnCallApi for MockOnCall {
    fn list_users(&self, page: u32) -> Result<Page<OnCallUser>> {
        let mut state = lock(&self.state);
        state.calls.record("users")?;
        Ok(state.calls.page(&state.users, page))
    }

    fn list_teams(&self, page: u32) -> Result<Page<OnCallTeam>> {
        let mut state = lock(&self.state);
        state.calls.record("teams")?;
        Ok(state.calls.page(&state.teams, page))
    }

    fn list_schedules(&self, page: u32) -> Result<Page<OnCallSchedule>> {
        let mut state = lock(&self.state);
        state.calls.record("schedules")?;
        Ok(state.calls.page(&state.schedules, page))
    }

    fn list_integrations(&self, page: u32) -> Result<Page<OnCallIntegration>> {
        let mut state = lock(&self.state);
        state.calls.record("integrations")?;
        Ok(state.calls.page(&state.integrations, page))
    }

    fn list_slack_channels(&self, page: u32) -> Result<Page<SlackChannel>> {
        let mut state = lock(&self.state);
        state.calls.record("slack_channels")?;
        Ok(state.calls.page(&state.channels, page))
    }
}

// =============================================================================
// Grafana
// =============================================================================

#[derive(Debug, Default)]
struct GrafanaState {
    users: Vec<OrgUser>,
    teams: Vec<GrafanaTeam>,
    roles: Vec<Role>,
    service_accounts: Vec<ServiceAccount>,
    calls: Calls,
}

/// In-memory [`GrafanaApi`].
///
/// Listings are named `org_users`, `teams`, `roles` and `service_accounts`.
#[derive(Debug, Clone, Default)]
pub struct MockGrafana {
    state: Arc<Mutex<GrafanaState>>,
}

impl MockGrafana {
    /// Create an empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve organization `users`.
    #[must_use]
    pub fn with_users(self, users: Vec<OrgUser>) -> Self {
        lock(&self.state).users = users;
        self
    }

    /// Serve `teams`.
    #[must_use]
    pub fn with_teams(self, teams: Vec<GrafanaTeam>) -> Self {
        lock(&self.state).teams = teams;
        self
    }

    /// Serve `roles`.
    #[must_use]
    pub fn with_roles(self, roles: Vec<Role>) -> Self {
        lock(&self.state).roles = roles;
        self
    }

    /// Serve service `accounts`.
    #[must_use]
    pub fn with_service_accounts(self, accounts: Vec<ServiceAccount>) -> Self {
        lock(&self.state).service_accounts = accounts;
        self
    }

    /// Split paginated listings into pages of `size` items.
    #[must_use]
    pub fn with_page_size(self, size: usize) -> Self {
        lock(&self.state).calls.page_size = Some(size.max(1));
        self
    }

    /// Make `listing` fail with `status` (`None` for a transport error).
    #[must_use]
    pub fn fail(self, listing: &'static str, status: Option<u16>) -> Self {
        lock(&self.state).calls.failures.insert(listing, status);
        self
    }

    /// Number of requests made for `listing`.
    pub fn calls(&self, listing: &str) -> usize {
        lock(&self.state)
            .calls
            .counts
            .get(listing)
            .copied()
            .unwrap_or(0)
    }
}

impl GrafanaApi for MockGrafana {
    fn list_org_users(&self, page: u32) -> Result<Page<OrgUser>> {
        let mut state = lock(&self.state);
        state.calls.record("org_users")?;
        Ok(state.calls.page(&state.users, page))
    }

    fn list_teams(&self, page: u32) -> Result<Page<GrafanaTeam>> {
        let mut state = lock(&self.state);
        state.calls.record("teams")?;
        Ok(state.calls.page(&state.teams, page))
    }

    fn list_roles(&self, _include_hidden: bool) -> Result<Vec<Role>> {
        let mut state = lock(&self.state);
        state.calls.record("roles")?;
        Ok(state.roles.clone())
    }

    fn search_service_accounts(&self, query: &str, page: u32) -> Result<Page<ServiceAccount>> {
        let mut state = lock(&self.state);
        state.calls.record("service_accounts")?;
        let query = query.to_lowercase();
        let matching: Vec<ServiceAccount> = state
            .service_accounts
            .iter()
            .filter(|sa| sa.name.to_lowercase().contains(&query))
            .cloned()
            .collect();
        Ok(state.calls.page(&matching, page))
    }
}

// =============================================================================
// Synthetic Monitoring
// =============================================================================

#[derive(Debug, Default)]
struct SmState {
    probes: Vec<Probe>,
    calls: Calls,
}

/// In-memory [`SyntheticMonitoringApi`]. The only listing is `probes`.
#[derive(Debug, Clone, Default)]
pub struct MockSm {
    state: Arc<Mutex<SmState>>,
}

impl MockSm {
    /// Create an empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `probes`.
    #[must_use]
    pub fn with_probes(self, probes: Vec<Probe>) -> Self {
        lock(&self.state).probes = probes;
        self
    }

    /// Make the probe listing fail with `status`.
    #[must_use]
    pub fn fail(self, status: Option<u16>) -> Self {
        lock(&self.state).calls.failures.insert("probes", status);
        self
    }

    /// Number of probe listings made.
    pub fn calls(&self) -> usize {
        lock(&self.state)
            .calls
            .counts
            .get("probes")
            .copied()
            .unwrap_or(0)
    }
}

impl SyntheticMonitoringApi for MockSm {
    fn list_probes(&self) -> Result<Vec<Probe>> {
        let mut state = lock(&self.state);
        state.calls.record("probes")?;
        Ok(state.probes.clone())
    }
}

// =============================================================================
// Factory
// =============================================================================

#[derive(Debug, Default)]
struct FactoryState {
    settings: Vec<ClientSettings>,
    builds: usize,
    fail_builds: bool,
}

/// [`ClientFactory`] handing out the configured mocks.
///
/// Clients that were not configured are served as empty mocks.
#[derive(Debug, Clone, Default)]
pub struct MockFactory {
    oncall: MockOnCall,
    grafana: MockGrafana,
    sm: MockSm,
    state: Arc<Mutex<FactoryState>>,
}

impl MockFactory {
    /// Create a factory serving empty mocks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `oncall` for OnCall clients.
    #[must_use]
    pub fn with_oncall(mut self, oncall: MockOnCall) -> Self {
        self.oncall = oncall;
        self
    }

    /// Serve `grafana` for Grafana clients.
    #[must_use]
    pub fn with_grafana(mut self, grafana: MockGrafana) -> Self {
        self.grafana = grafana;
        self
    }

    /// Serve `sm` for Synthetic Monitoring clients.
    #[must_use]
    pub fn with_sm(mut self, sm: MockSm) -> Self {
        self.sm = sm;
        self
    }

    /// Fail every build as if the settings lacked a URL.
    #[must_use]
    pub fn failing(self) -> Self {
        lock(&self.state).fail_builds = true;
        self
    }

    /// Number of clients built so far.
    pub fn builds(&self) -> usize {
        lock(&self.state).builds
    }

    /// Settings passed to each build, in order.
    pub fn settings(&self) -> Vec<ClientSettings> {
        lock(&self.state).settings.clone()
    }

    fn build(&self, client: &'static str, settings: &ClientSettings) -> Result<()> {
        let mut state = lock(&self.state);
        state.builds += 1;
        state.settings.push(settings.clone());
        if state.fail_builds {
            return Err(Error::MissingSetting { client, key: "url" });
        }
        Ok(())
    }
}

impl ClientFactory for MockFactory {
    fn oncall(&self, settings: &ClientSettings) -> Result<Arc<dyn OnCallApi>> {
        self.build("oncall", settings)?;
        Ok(Arc::new(self.oncall.clone()))
    }

    fn grafana(&self, settings: &ClientSettings) -> Result<Arc<dyn GrafanaApi>> {
        self.build("grafana", settings)?;
        Ok(Arc::new(self.grafana.clone()))
    }

    fn synthetic_monitoring(
        &self,
        settings: &ClientSettings,
    ) -> Result<Arc<dyn SyntheticMonitoringApi>> {
        self.build("synthetic monitoring", settings)?;
        Ok(Arc::new(self.sm.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> OnCallUser {
        OnCallUser {
            id: id.to_string(),
            username: id.to_lowercase(),
            email: String::new(),
            role: String::new(),
        }
    }

    #[test]
    fn test_single_page_by_default() {
        let mock = MockOnCall::new().with_users(vec![user("U1"), user("U2")]);
        let page = mock.list_users(1).unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(!page.has_next);
        assert_eq!(mock.calls("users"), 1);
    }

    #[test]
    fn test_page_size_splits_listing() {
        let mock = MockOnCall::new()
            .with_users(vec![user("U1"), user("U2"), user("U3")])
            .with_page_size(2);
        let first = mock.list_users(1).unwrap();
        let second = mock.list_users(2).unwrap();
        assert_eq!(first.items.len(), 2);
        assert!(first.has_next);
        assert_eq!(second.items, vec![user("U3")]);
        assert!(!second.has_next);
    }

    #[test]
    fn test_failure_injection() {
        let mock = MockOnCall::new().fail("teams", Some(503));
        let err = mock.list_teams(1).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(mock.calls("teams"), 1);
        assert!(mock.list_users(1).is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let mock = MockSm::new();
        let clone = mock.clone();
        clone.list_probes().unwrap();
        assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn test_service_account_search_filters() {
        let mock = MockGrafana::new().with_service_accounts(vec![
            ServiceAccount { id: 1, name: "deployer".to_string() },
            ServiceAccount { id: 2, name: "reader".to_string() },
        ]);
        let page = mock.search_service_accounts("deploy", 1).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, 1);
    }

    #[test]
    fn test_factory_counts_builds() {
        let factory = MockFactory::new();
        let settings = ClientSettings::default().with("url", "https://x");
        factory.grafana(&settings).unwrap();
        factory.oncall(&settings).unwrap();
        assert_eq!(factory.builds(), 2);
        assert_eq!(factory.settings()[0], settings);
    }

    #[test]
    fn test_failing_factory() {
        let factory = MockFactory::new().failing();
        let err = factory.grafana(&ClientSettings::default()).err().unwrap();
        assert!(err.is_fatal());
        assert_eq!(factory.builds(), 1);
    }
}
