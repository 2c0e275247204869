//! Blocking HTTP clients for the Grafana APIs.
//!
//! Every request goes through [`with_retry`], so throttling and server
//! errors are retried before they reach the caller.

use crate::backend::{ClientFactory, GrafanaApi, OnCallApi, SyntheticMonitoringApi};
use crate::config::ClientSettings;
use crate::error::Result;
use crate::retry::{RetryConfig, with_retry};
use crate::types::{
    GrafanaTeam, OnCallIntegration, OnCallSchedule, OnCallTeam, OnCallUser, OrgUser, Page,
    Probe, Role, ServiceAccount, SlackChannel,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Page size requested from paginated Grafana endpoints.
const GRAFANA_PAGE_SIZE: u32 = 100;

const USER_AGENT: &str = concat!("function-grafana-data/", env!("CARGO_PKG_VERSION"));

/// Builds `ureq`-backed clients.
#[derive(Debug, Clone, Default)]
pub struct HttpClientFactory {
    retry: RetryConfig,
}

impl HttpClientFactory {
    /// Create a factory with the default retry policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientFactory for HttpClientFactory {
    fn oncall(&self, settings: &ClientSettings) -> Result<Arc<dyn OnCallApi>> {
        Ok(Arc::new(OnCallHttp::new(settings, self.retry.clone())?))
    }

    fn grafana(&self, settings: &ClientSettings) -> Result<Arc<dyn GrafanaApi>> {
        Ok(Arc::new(GrafanaHttp::new(settings, self.retry.clone())?))
    }

    fn synthetic_monitoring(
        &self,
        settings: &ClientSettings,
    ) -> Result<Arc<dyn SyntheticMonitoringApi>> {
        Ok(Arc::new(SyntheticMonitoringHttp::new(
            settings,
            self.retry.clone(),
        )?))
    }
}

/// Shared request plumbing: base URL, fixed headers, retry policy.
struct JsonClient {
    agent: ureq::Agent,
    base: String,
    headers: Vec<(&'static str, String)>,
    retry: RetryConfig,
}

impl JsonClient {
    fn new(base: &str, headers: Vec<(&'static str, String)>, retry: RetryConfig) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            base: base.trim_end_matches('/').to_string(),
            headers,
            retry,
        }
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base, path);
        debug!("GET {url} {query:?}");

        with_retry(&self.retry, &url, || {
            let mut request = self
                .agent
                .get(&url)
                .header("Accept", "application/json")
                .header("User-Agent", USER_AGENT);
            for (name, value) in &self.headers {
                request = request.header(*name, value.as_str());
            }
            for (name, value) in query {
                request = request.query(*name, value.as_str());
            }
            let body: T = request.call()?.body_mut().read_json()?;
            Ok(body)
        })
    }
}

// =============================================================================
// OnCall
// =============================================================================

/// OnCall API client.
pub struct OnCallHttp {
    client: JsonClient,
}

impl OnCallHttp {
    /// Build from settings: `oncall_url` plus `oncall_access_token` or `auth`.
    pub fn new(settings: &ClientSettings, retry: RetryConfig) -> Result<Self> {
        let base = settings.require("oncall", "oncall_url")?;
        let token = match settings.get("oncall_access_token") {
            Some(token) => token,
            None => settings.require("oncall", "auth")?,
        };

        let mut headers = vec![("Authorization", token.to_string())];
        if let Some(grafana_url) = settings.get("url") {
            headers.push(("X-Grafana-URL", grafana_url.to_string()));
        }

        Ok(Self {
            client: JsonClient::new(base, headers, retry),
        })
    }

    fn list<T: DeserializeOwned>(&self, resource: &str, page: u32) -> Result<Page<T>> {
        let path = format!("/api/v1/{resource}/");
        let response: OnCallPage<T> = self.client.get(&path, &[("page", page.to_string())])?;
        Ok(response.into_page())
    }
}

impl OnCallApi for OnCallHttp {
    fn list_users(&self, page: u32) -> Result<Page<OnCallUser>> {
        self.list("users", page)
    }

    fn list_teams(&self, page: u32) -> Result<Page<OnCallTeam>> {
        self.list("teams", page)
    }

    fn list_schedules(&self, page: u32) -> Result<Page<OnCallSchedule>> {
        self.list("schedules", page)
    }

    fn list_integrations(&self, page: u32) -> Result<Page<OnCallIntegration>> {
        self.list("integrations", page)
    }

    fn list_slack_channels(&self, page: u32) -> Result<Page<SlackChannel>> {
        self.list("slack_channels", page)
    }
}

// =============================================================================
// Grafana
// =============================================================================

/// Grafana HTTP API client.
pub struct GrafanaHttp {
    client: JsonClient,
}

impl GrafanaHttp {
    /// Build from settings: `url` and `auth` (token, or `user:password`),
    /// optionally `org_id`.
    pub fn new(settings: &ClientSettings, retry: RetryConfig) -> Result<Self> {
        let base = settings.require("grafana", "url")?;
        let auth = settings.require("grafana", "auth")?;

        let authorization = if auth.contains(':') {
            format!("Basic {}", STANDARD.encode(auth))
        } else {
            format!("Bearer {auth}")
        };
        let mut headers = vec![("Authorization", authorization)];
        if let Some(org_id) = settings.get("org_id") {
            headers.push(("X-Grafana-Org-Id", org_id.to_string()));
        }

        Ok(Self {
            client: JsonClient::new(base, headers, retry),
        })
    }

    fn search<T: DeserializeOwned>(
        &self,
        path: &str,
        field: &'static str,
        page: u32,
        extra: Option<(&str, &str)>,
    ) -> Result<Page<T>> {
        let mut query = vec![
            ("perpage", GRAFANA_PAGE_SIZE.to_string()),
            ("page", page.to_string()),
        ];
        if let Some((name, value)) = extra {
            query.push((name, value.to_string()));
        }

        let response = self.client.get(path, &query)?;
        search_page(response, field, page)
    }
}

impl GrafanaApi for GrafanaHttp {
    fn list_org_users(&self, page: u32) -> Result<Page<OrgUser>> {
        self.search("/api/org/users/search", "orgUsers", page, None)
    }

    fn list_teams(&self, page: u32) -> Result<Page<GrafanaTeam>> {
        self.search("/api/teams/search", "teams", page, None)
    }

    fn list_roles(&self, include_hidden: bool) -> Result<Vec<Role>> {
        self.client.get(
            "/api/access-control/roles",
            &[("includeHidden", include_hidden.to_string())],
        )
    }

    fn search_service_accounts(&self, query: &str, page: u32) -> Result<Page<ServiceAccount>> {
        self.search(
            "/api/serviceaccounts/search",
            "serviceAccounts",
            page,
            Some(("query", query)),
        )
    }
}

// =============================================================================
// Synthetic Monitoring
// =============================================================================

/// Synthetic Monitoring API client.
pub struct SyntheticMonitoringHttp {
    client: JsonClient,
}

impl SyntheticMonitoringHttp {
    /// Build from settings: `sm_url` and `sm_access_token`.
    pub fn new(settings: &ClientSettings, retry: RetryConfig) -> Result<Self> {
        let base = settings.require("synthetic monitoring", "sm_url")?;
        let token = settings.require("synthetic monitoring", "sm_access_token")?;
        let headers = vec![("Authorization", format!("Bearer {token}"))];
        Ok(Self {
            client: JsonClient::new(base, headers, retry),
        })
    }
}

impl SyntheticMonitoringApi for SyntheticMonitoringHttp {
    fn list_probes(&self) -> Result<Vec<Probe>> {
        self.client.get("/api/v1/probe/list", &[])
    }
}

// =============================================================================
// API response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct OnCallPage<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

impl<T> OnCallPage<T> {
    /// OnCall pages link to their successor; the last one has no `next`.
    fn into_page(self) -> Page<T> {
        Page {
            has_next: self.next.is_some_and(|next| !next.is_empty()),
            items: self.results,
        }
    }
}

/// Decode page `page` (1-based) of a Grafana search response listing its
/// items under `field`.
fn search_page<T: DeserializeOwned>(
    mut response: serde_json::Value,
    field: &str,
    page: u32,
) -> Result<Page<T>> {
    let total = response.get("totalCount").and_then(serde_json::Value::as_u64);
    let items: Vec<T> = match response.get_mut(field).map(serde_json::Value::take) {
        Some(items) if !items.is_null() => serde_json::from_value(items)?,
        _ => Vec::new(),
    };
    let has_next = search_has_next(page, items.len(), total);
    Ok(Page { items, has_next })
}

/// Whether another search page follows page `page` holding `len` items.
///
/// Without a `totalCount`, only a full page is assumed to have a successor.
fn search_has_next(page: u32, len: usize, total: Option<u64>) -> bool {
    if len == 0 {
        return false;
    }
    match total {
        Some(total) => u64::from(page) * u64::from(GRAFANA_PAGE_SIZE) < total,
        None => len >= GRAFANA_PAGE_SIZE as usize,
    }
}
