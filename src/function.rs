//! One invocation: walk the desired resources and resolve names in place.

use crate::clients::{ClientCache, ProviderConfigRef};
use crate::config::Input;
use crate::dispatch::{DispatchTable, Family};
use crate::error::FunctionError;
use composition::{
    DEFAULT_TTL, Readiness, Request, RequirementTracker, Resource, Response, finalize,
};
use fieldpath::Applied;
use grafanakit::ClientFactory;
use indexmap::IndexMap;
use log::{debug, error, info, warn};
use std::sync::Arc;

/// The composition function.
pub struct Function {
    factory: Arc<dyn ClientFactory>,
    table: DispatchTable,
    max_pages: Option<u32>,
}

impl Function {
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            factory,
            table: DispatchTable::grafana(),
            max_pages: None,
        }
    }

    /// Override the input's page budget.
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Run one invocation.
    ///
    /// On a fatal error the desired state is returned as received, with
    /// the fatal result and every requirement declared up to that point.
    pub fn run(&self, req: &Request) -> Response {
        let mut rsp = Response::to(req, DEFAULT_TTL);
        let mut tracker = RequirementTracker::new(&req.required_resources);

        match self.process(req, &mut tracker, &mut rsp) {
            Ok(outcome) => {
                rsp.desired.resources = outcome.resources;
                info!(
                    "Processed {} resource(s), {} waiting for provider configs",
                    outcome.processed, outcome.pending
                );
                finalize(&mut rsp, outcome.processed);
            }
            Err(err) => {
                error!("Aborting: {err}");
                rsp.desired = req.desired.clone();
                rsp.fatal(err.to_string());
            }
        }

        rsp.requirements = tracker.into_requirements();
        rsp
    }

    fn process(
        &self,
        req: &Request,
        tracker: &mut RequirementTracker<'_>,
        rsp: &mut Response,
    ) -> Result<Outcome, FunctionError> {
        let composite = req
            .observed
            .composite
            .as_ref()
            .ok_or(FunctionError::MissingComposite)?;
        let input = Input::from_request(req.input.as_ref())?;
        let max_pages = self.max_pages.unwrap_or(input.spec.max_pages).max(1);

        let mut cache = ClientCache::new(
            Arc::clone(&self.factory),
            input.credentials_key(),
            max_pages,
        );
        let mut outcome = Outcome {
            resources: req.desired.resources.clone(),
            processed: 0,
            pending: 0,
        };

        for (name, resource) in &mut outcome.resources {
            let Some(family) = Family::from_group(resource.group()) else {
                debug!("Skipping {name}: {} is not a Grafana resource", resource.api_version());
                continue;
            };
            let rules = self.table.rules(family, resource.kind());
            if rules.is_empty() {
                debug!("Skipping {name}: nothing to resolve for {family}/{}", resource.kind());
                continue;
            }

            let pc = ProviderConfigRef::of(name, resource, composite.namespace())?;
            let bundle = match cache.bundle(tracker, &pc)? {
                Readiness::Ready(bundle) => bundle,
                Readiness::Pending => {
                    info!("Skipping {name} until provider config {pc} is available");
                    outcome.pending += 1;
                    continue;
                }
            };

            for rule in rules {
                match rule.resolve.apply(bundle, &mut resource.resource, rule.path) {
                    Ok(Applied::Replaced) => debug!("{name}: resolved {}", rule.path),
                    Ok(Applied::Missing) => {}
                    Err(err) => {
                        let err = err.escalate(name)?;
                        warn!("{name}: cannot resolve {} ({}): {err}", rule.path, err.category());
                        rsp.warning(format!("{name}: cannot resolve {}: {err}", rule.path))
                            .with_reason("ResolutionFailed")
                            .target_composite_and_claim();
                    }
                }
            }
            outcome.processed += 1;
        }

        debug!("Built {} client bundle(s)", cache.bundle_count());
        Ok(outcome)
    }
}

struct Outcome {
    resources: IndexMap<String, Resource>,
    processed: usize,
    pending: usize,
}
