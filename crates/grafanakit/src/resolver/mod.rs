//! Name to ID resolution on top of the backend traits.
//!
//! A resolver wraps one client handle and memoizes each full listing the
//! first time it is needed. Resolvers live for one invocation; nothing is
//! ever refreshed.

mod grafana;
mod oncall;
mod sm;

pub use grafana::GrafanaResolver;
pub use oncall::OnCallResolver;
pub use sm::SyntheticMonitoringResolver;

use crate::error::{Error, Result};
use crate::types::{
    GrafanaTeam, OnCallIntegration, OnCallSchedule, OnCallTeam, OnCallUser, OrgUser, Page,
    Probe, Role, ServiceAccount, SlackChannel,
};
use log::debug;

/// Upper bound on pages fetched for a single listing.
pub const DEFAULT_MAX_PAGES: u32 = 500;

/// A backend record that can be looked up by ID or by a human-readable field.
pub trait Record {
    /// Kind used in [`Error::NotFound`].
    const KIND: &'static str;

    /// Whether `identifier` is this record's ID.
    fn has_id(&self, identifier: &str) -> bool;

    /// Whether `identifier` matches one of this record's human-readable fields.
    fn has_name(&self, identifier: &str) -> bool;
}

/// Find `identifier` in `items`: exact ID match first, then name match.
///
/// Ties go to the first record in listing order.
pub fn lookup<'a, T: Record>(items: &'a [T], identifier: &str) -> Option<&'a T> {
    items
        .iter()
        .find(|item| item.has_id(identifier))
        .or_else(|| items.iter().find(|item| item.has_name(identifier)))
}

/// Like [`lookup`], failing with [`Error::NotFound`].
pub fn find<'a, T: Record>(items: &'a [T], identifier: &str) -> Result<&'a T> {
    lookup(items, identifier).ok_or_else(|| Error::not_found(T::KIND, identifier))
}

/// Walk pages starting at 1 until the server reports no next page.
///
/// Fails with [`Error::PageLimitExceeded`] once `limit` pages have been
/// fetched and the server still reports more.
pub fn collect_pages<T, F>(resource: &'static str, limit: u32, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Result<Page<T>>,
{
    let mut all = Vec::new();
    for page in 1..=limit {
        let Page { items, has_next } = fetch(page)?;
        all.extend(items);
        if !has_next {
            debug!("Listed {} {resource} in {page} page(s)", all.len());
            return Ok(all);
        }
    }
    Err(Error::PageLimitExceeded { resource, limit })
}

/// Resolve every identifier; the first failure fails the whole list.
pub fn resolve_many<I, O, F>(identifiers: &[I], mut resolve_one: F) -> Result<Vec<O>>
where
    F: FnMut(&I) -> Result<O>,
{
    identifiers.iter().map(|id| resolve_one(id)).collect()
}

/// [`resolve_many`] one level deeper, for lists of lists.
pub fn resolve_nested_many<I, O, F>(groups: &[Vec<I>], mut resolve_one: F) -> Result<Vec<Vec<O>>>
where
    F: FnMut(&I) -> Result<O>,
{
    groups
        .iter()
        .map(|group| resolve_many(group, &mut resolve_one))
        .collect()
}

/// A listing fetched at most once.
#[derive(Debug)]
pub struct Listing<T> {
    items: Option<Vec<T>>,
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self { items: None }
    }
}

impl<T> Listing<T> {
    /// The memoized items, fetching them on first use.
    ///
    /// A failed fetch is not memoized.
    pub fn get_or_fetch<F>(&mut self, fetch: F) -> Result<&[T]>
    where
        F: FnOnce() -> Result<Vec<T>>,
    {
        if self.items.is_none() {
            self.items = Some(fetch()?);
        }
        Ok(self.items.as_deref().unwrap_or(&[]))
    }
}

/// Whether `identifier` is a plain decimal number.
pub(crate) fn is_numeric(identifier: &str) -> bool {
    !identifier.is_empty() && identifier.bytes().all(|b| b.is_ascii_digit())
}

// =============================================================================
// Record implementations
// =============================================================================

impl Record for OnCallUser {
    const KIND: &'static str = "oncall user";

    fn has_id(&self, identifier: &str) -> bool {
        self.id == identifier
    }

    fn has_name(&self, identifier: &str) -> bool {
        self.username == identifier || self.email == identifier
    }
}

impl Record for OnCallTeam {
    const KIND: &'static str = "oncall team";

    fn has_id(&self, identifier: &str) -> bool {
        self.id == identifier
    }

    fn has_name(&self, identifier: &str) -> bool {
        self.name == identifier || (!self.email.is_empty() && self.email == identifier)
    }
}

impl Record for OnCallSchedule {
    const KIND: &'static str = "oncall schedule";

    fn has_id(&self, identifier: &str) -> bool {
        self.id == identifier
    }

    fn has_name(&self, identifier: &str) -> bool {
        self.name == identifier
    }
}

impl Record for OnCallIntegration {
    const KIND: &'static str = "oncall integration";

    fn has_id(&self, identifier: &str) -> bool {
        self.id == identifier
    }

    fn has_name(&self, identifier: &str) -> bool {
        self.name == identifier
    }
}

impl Record for SlackChannel {
    const KIND: &'static str = "slack channel";

    fn has_id(&self, identifier: &str) -> bool {
        self.slack_id == identifier
    }

    fn has_name(&self, identifier: &str) -> bool {
        self.name == identifier.trim_start_matches('#')
    }
}

impl Record for OrgUser {
    const KIND: &'static str = "grafana user";

    fn has_id(&self, identifier: &str) -> bool {
        self.user_id.to_string() == identifier
    }

    fn has_name(&self, identifier: &str) -> bool {
        self.email == identifier || self.login == identifier
    }
}

impl Record for GrafanaTeam {
    const KIND: &'static str = "grafana team";

    fn has_id(&self, identifier: &str) -> bool {
        self.id.to_string() == identifier
    }

    fn has_name(&self, identifier: &str) -> bool {
        self.name == identifier
    }
}

impl Record for Role {
    const KIND: &'static str = "role";

    fn has_id(&self, identifier: &str) -> bool {
        self.uid == identifier
    }

    fn has_name(&self, identifier: &str) -> bool {
        self.name == identifier || (!self.display_name.is_empty() && self.display_name == identifier)
    }
}

impl Record for ServiceAccount {
    const KIND: &'static str = "service account";

    fn has_id(&self, identifier: &str) -> bool {
        self.id.to_string() == identifier
    }

    fn has_name(&self, identifier: &str) -> bool {
        self.name == identifier
    }
}

impl Record for Probe {
    const KIND: &'static str = "probe";

    fn has_id(&self, identifier: &str) -> bool {
        self.id.to_string() == identifier
    }

    fn has_name(&self, identifier: &str) -> bool {
        self.name == identifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn team(id: &str, name: &str) -> OnCallTeam {
        OnCallTeam {
            id: id.to_string(),
            name: name.to_string(),
            email: String::new(),
        }
    }

    #[test]
    fn test_lookup_prefers_id_over_name() {
        // A team named like another team's ID.
        let teams = vec![team("T2", "T1"), team("T1", "payments")];
        assert_eq!(lookup(&teams, "T1").unwrap().id, "T1");
        assert_eq!(lookup(&teams, "payments").unwrap().id, "T1");
    }

    #[test]
    fn test_lookup_first_listed_wins() {
        let teams = vec![team("T1", "ops"), team("T2", "ops")];
        assert_eq!(lookup(&teams, "ops").unwrap().id, "T1");
    }

    #[test]
    fn test_find_not_found_carries_identifier() {
        let err = find(&[team("T1", "ops")], "payments").unwrap_err();
        match err {
            Error::NotFound { kind, identifier } => {
                assert_eq!(kind, "oncall team");
                assert_eq!(identifier, "payments");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_collect_pages_stops_on_last_page() {
        let pages = collect_pages("items", 10, |page| {
            Ok(if page < 3 {
                Page::more(vec![page])
            } else {
                Page::last(vec![page])
            })
        })
        .unwrap();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[test]
    fn test_collect_pages_is_bounded() {
        let fetched = Cell::new(0);
        let err = collect_pages("items", 4, |_| {
            fetched.set(fetched.get() + 1);
            Ok(Page::more(vec![0u8]))
        })
        .unwrap_err();
        assert!(matches!(err, Error::PageLimitExceeded { limit: 4, .. }));
        assert!(err.is_fatal());
        assert_eq!(fetched.get(), 4);
    }

    #[test]
    fn test_listing_fetches_once() {
        let mut listing = Listing::default();
        let fetched = Cell::new(0);
        for _ in 0..3 {
            let items = listing
                .get_or_fetch(|| {
                    fetched.set(fetched.get() + 1);
                    Ok(vec![1, 2])
                })
                .unwrap();
            assert_eq!(items, &[1, 2]);
        }
        assert_eq!(fetched.get(), 1);
    }

    #[test]
    fn test_listing_failure_is_not_memoized() {
        let mut listing: Listing<u8> = Listing::default();
        assert!(listing.get_or_fetch(|| Err(Error::http("boom", Some(500)))).is_err());
        assert_eq!(listing.get_or_fetch(|| Ok(vec![7])).unwrap(), &[7]);
    }

    #[test]
    fn test_resolve_many_fails_on_first_error() {
        let calls = Cell::new(0);
        let result = resolve_many(&["a", "bad", "c"], |id| {
            calls.set(calls.get() + 1);
            if *id == "bad" {
                Err(Error::not_found("thing", *id))
            } else {
                Ok(id.to_uppercase())
            }
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_resolve_nested_many_keeps_shape() {
        let groups = vec![vec!["a", "b"], vec![], vec!["c"]];
        let resolved = resolve_nested_many(&groups, |id| Ok(id.to_uppercase())).unwrap();
        assert_eq!(resolved, vec![vec!["A", "B"], vec![], vec!["C"]]);
    }

    #[test]
    fn test_slack_channel_name_ignores_hash() {
        let channel = SlackChannel {
            id: "1".to_string(),
            name: "alerts".to_string(),
            slack_id: "C01".to_string(),
        };
        assert!(channel.has_name("#alerts"));
        assert!(channel.has_name("alerts"));
        assert!(channel.has_id("C01"));
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric("42"));
        assert!(!is_numeric(""));
        assert!(!is_numeric("4a"));
        assert!(!is_numeric("-1"));
    }
}
