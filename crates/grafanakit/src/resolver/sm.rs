use super::{Listing, find, resolve_many};
use crate::backend::SyntheticMonitoringApi;
use crate::error::Result;
use crate::types::{Probe, ProbeRef};
use std::sync::Arc;

/// Resolves synthetic monitoring probes.
pub struct SyntheticMonitoringResolver {
    client: Arc<dyn SyntheticMonitoringApi>,
    probes: Listing<Probe>,
}

impl SyntheticMonitoringResolver {
    /// Wrap `client`. The probe listing is not paginated.
    pub fn new(client: Arc<dyn SyntheticMonitoringApi>) -> Self {
        Self {
            client,
            probes: Listing::default(),
        }
    }

    /// ID of a probe given by ID or by name.
    ///
    /// Numeric IDs, as numbers or digit strings, pass through.
    pub fn probe_id(&mut self, probe: &ProbeRef) -> Result<i64> {
        let name = match probe {
            ProbeRef::Id(id) => return Ok(*id),
            ProbeRef::Name(name) => name,
        };
        if let Ok(id) = name.parse::<i64>() {
            return Ok(id);
        }
        let client = &self.client;
        let probes = self.probes.get_or_fetch(|| client.list_probes())?;
        Ok(find(probes, name)?.id)
    }

    /// [`probe_id`](Self::probe_id) for each element.
    pub fn probe_ids(&mut self, probes: &[ProbeRef]) -> Result<Vec<i64>> {
        resolve_many(probes, |probe| self.probe_id(probe))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockSm;
    use crate::error::Error;

    fn mock() -> MockSm {
        MockSm::new().with_probes(vec![
            Probe { id: 1, name: "Paris".to_string() },
            Probe { id: 2, name: "Tokyo".to_string() },
        ])
    }

    #[test]
    fn test_location_ids_by_name() {
        let sm = mock();
        let mut r = SyntheticMonitoringResolver::new(Arc::new(sm.clone()));
        let ids = r
            .probe_ids(&[
                ProbeRef::Name("Tokyo".to_string()),
                ProbeRef::Name("Paris".to_string()),
            ])
            .unwrap();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(sm.calls(), 1);
    }

    #[test]
    fn test_numeric_locations_pass_through() {
        let sm = mock();
        let mut r = SyntheticMonitoringResolver::new(Arc::new(sm.clone()));
        let ids = r
            .probe_ids(&[ProbeRef::Id(7), ProbeRef::Name("8".to_string())])
            .unwrap();
        assert_eq!(ids, vec![7, 8]);
        assert_eq!(sm.calls(), 0);
    }

    #[test]
    fn test_unknown_location() {
        let mut r = SyntheticMonitoringResolver::new(Arc::new(mock()));
        let err = r.probe_id(&ProbeRef::Name("Atlantis".to_string())).unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "probe", .. }));
    }
}
