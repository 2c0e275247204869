//! Per-provider-config set of resolvers.

use crate::backend::ClientFactory;
use crate::config::ClientSettings;
use crate::error::Result;
use crate::resolver::{
    DEFAULT_MAX_PAGES, GrafanaResolver, OnCallResolver, SyntheticMonitoringResolver,
};
use log::info;
use std::sync::Arc;

/// The resolvers of one provider config.
///
/// Each family's client is built through the factory the first time that
/// family is used, then reused along with its listings.
///
/// # Example
///
/// ```
/// use grafanakit::ClientBundle;
/// use grafanakit::backend::mock::{MockFactory, MockSm};
/// use grafanakit::types::{Probe, ProbeRef};
/// use std::sync::Arc;
///
/// let factory = MockFactory::new().with_sm(MockSm::new().with_probes(vec![Probe {
///     id: 3,
///     name: "Paris".to_string(),
/// }]));
/// let mut bundle = ClientBundle::new("default", Default::default(), Arc::new(factory.clone()));
///
/// let id = bundle.sm().unwrap().probe_id(&ProbeRef::Name("Paris".to_string())).unwrap();
/// assert_eq!(id, 3);
/// assert_eq!(factory.builds(), 1);
/// ```
pub struct ClientBundle {
    name: String,
    settings: ClientSettings,
    factory: Arc<dyn ClientFactory>,
    max_pages: u32,
    oncall: Option<OnCallResolver>,
    grafana: Option<GrafanaResolver>,
    sm: Option<SyntheticMonitoringResolver>,
}

impl ClientBundle {
    /// Create a bundle for provider config `name`. No client is built yet.
    pub fn new(
        name: impl Into<String>,
        settings: ClientSettings,
        factory: Arc<dyn ClientFactory>,
    ) -> Self {
        Self {
            name: name.into(),
            settings,
            factory,
            max_pages: DEFAULT_MAX_PAGES,
            oncall: None,
            grafana: None,
            sm: None,
        }
    }

    /// Bound paginated listings to `max_pages` pages.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Provider config name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Settings the clients are built from.
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// The OnCall resolver.
    pub fn oncall(&mut self) -> Result<&mut OnCallResolver> {
        let resolver = match self.oncall.take() {
            Some(resolver) => resolver,
            None => {
                info!("Building OnCall client for provider config {}", self.name);
                let client = self.factory.oncall(&self.settings)?;
                OnCallResolver::new(client, self.max_pages)
            }
        };
        Ok(self.oncall.insert(resolver))
    }

    /// The Grafana resolver.
    pub fn grafana(&mut self) -> Result<&mut GrafanaResolver> {
        let resolver = match self.grafana.take() {
            Some(resolver) => resolver,
            None => {
                info!("Building Grafana client for provider config {}", self.name);
                let client = self.factory.grafana(&self.settings)?;
                GrafanaResolver::new(client, self.max_pages)
            }
        };
        Ok(self.grafana.insert(resolver))
    }

    /// The Synthetic Monitoring resolver.
    pub fn sm(&mut self) -> Result<&mut SyntheticMonitoringResolver> {
        let resolver = match self.sm.take() {
            Some(resolver) => resolver,
            None => {
                info!(
                    "Building Synthetic Monitoring client for provider config {}",
                    self.name
                );
                let client = self.factory.synthetic_monitoring(&self.settings)?;
                SyntheticMonitoringResolver::new(client)
            }
        };
        Ok(self.sm.insert(resolver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{MockFactory, MockOnCall};
    use crate::types::OnCallTeam;

    #[test]
    fn test_clients_are_built_lazily_and_once() {
        let oncall = MockOnCall::new().with_teams(vec![OnCallTeam {
            id: "T1".to_string(),
            name: "ops".to_string(),
            email: String::new(),
        }]);
        let factory = MockFactory::new().with_oncall(oncall.clone());
        let mut bundle = ClientBundle::new("prod", ClientSettings::default(), Arc::new(factory.clone()));
        assert_eq!(factory.builds(), 0);

        assert_eq!(bundle.oncall().unwrap().team_id("ops").unwrap(), "T1");
        assert_eq!(bundle.oncall().unwrap().team_id("T1").unwrap(), "T1");
        assert_eq!(factory.builds(), 1);
        assert_eq!(oncall.calls("teams"), 1);

        bundle.grafana().unwrap();
        assert_eq!(factory.builds(), 2);
    }

    #[test]
    fn test_build_failure_is_fatal_and_retried_next_use() {
        let factory = MockFactory::new().failing();
        let mut bundle = ClientBundle::new("prod", ClientSettings::default(), Arc::new(factory.clone()));
        let err = bundle.grafana().err().unwrap();
        assert!(err.is_fatal());
        assert!(bundle.grafana().is_err());
        assert_eq!(factory.builds(), 2);
    }

    #[test]
    fn test_settings_are_passed_to_factory() {
        let factory = MockFactory::new();
        let settings = ClientSettings::default().with("sm_url", "https://sm.example.com");
        let mut bundle = ClientBundle::new("prod", settings.clone(), Arc::new(factory.clone()));
        bundle.sm().unwrap();
        assert_eq!(factory.settings(), vec![settings]);
        assert_eq!(bundle.name(), "prod");
    }

    #[test]
    fn test_max_pages_bounds_listings() {
        let oncall = MockOnCall::new().with_endless_pages();
        let factory = MockFactory::new().with_oncall(oncall);
        let mut bundle =
            ClientBundle::new("prod", ClientSettings::default(), Arc::new(factory)).with_max_pages(3);
        let err = bundle.oncall().unwrap().user_id("alice").unwrap_err();
        assert!(matches!(err, crate::Error::PageLimitExceeded { limit: 3, .. }));
    }
}
