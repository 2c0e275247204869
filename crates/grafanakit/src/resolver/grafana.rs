use super::{Listing, collect_pages, find, is_numeric};
use crate::backend::GrafanaApi;
use crate::error::Result;
use crate::types::{GrafanaTeam, OrgUser, PermissionEntry, Role, ServiceAccount};
use std::sync::Arc;

/// Resolves Grafana users, teams, roles and service accounts.
///
/// Numeric user, team and service account identifiers are already IDs
/// and pass through without a backend call.
pub struct GrafanaResolver {
    client: Arc<dyn GrafanaApi>,
    max_pages: u32,
    users: Listing<OrgUser>,
    teams: Listing<GrafanaTeam>,
    roles: Listing<Role>,
}

impl GrafanaResolver {
    /// Wrap `client`, fetching at most `max_pages` pages per listing.
    pub fn new(client: Arc<dyn GrafanaApi>, max_pages: u32) -> Self {
        Self {
            client,
            max_pages,
            users: Listing::default(),
            teams: Listing::default(),
            roles: Listing::default(),
        }
    }

    /// ID of the organization user with this email or login.
    pub fn user_id(&mut self, identifier: &str) -> Result<String> {
        if is_numeric(identifier) {
            return Ok(identifier.to_string());
        }
        let (client, limit) = (&self.client, self.max_pages);
        let users = self
            .users
            .get_or_fetch(|| collect_pages("grafana users", limit, |p| client.list_org_users(p)))?;
        Ok(find(users, identifier)?.user_id.to_string())
    }

    /// ID of the team with this name.
    pub fn team_id(&mut self, identifier: &str) -> Result<String> {
        if is_numeric(identifier) {
            return Ok(identifier.to_string());
        }
        let (client, limit) = (&self.client, self.max_pages);
        let teams = self
            .teams
            .get_or_fetch(|| collect_pages("grafana teams", limit, |p| client.list_teams(p)))?;
        Ok(find(teams, identifier)?.id.to_string())
    }

    /// UID of the role with this UID, name or display name.
    ///
    /// Hidden roles are included, since fixed roles are hidden.
    pub fn role_uid(&mut self, identifier: &str) -> Result<String> {
        let client = &self.client;
        let roles = self.roles.get_or_fetch(|| client.list_roles(true))?;
        Ok(find(roles, identifier)?.uid.clone())
    }

    /// ID of the service account named `identifier`.
    ///
    /// Uses the search endpoint rather than a full listing; the search is a
    /// substring match, so only an exact name counts.
    pub fn service_account_id(&mut self, identifier: &str) -> Result<String> {
        if is_numeric(identifier) {
            return Ok(identifier.to_string());
        }
        let client = &self.client;
        let candidates: Vec<ServiceAccount> = collect_pages("service accounts", self.max_pages, |p| {
            client.search_service_accounts(identifier, p)
        })?;
        Ok(find(&candidates, identifier)?.id.to_string())
    }

    /// Resolve the `teamId` of each folder permission entry.
    pub fn folder_permission_teams(
        &mut self,
        permissions: Vec<PermissionEntry>,
    ) -> Result<Vec<PermissionEntry>> {
        permissions
            .into_iter()
            .map(|mut entry| {
                if let Some(team) = entry.team_id.take() {
                    entry.team_id = Some(self.team_id(&team)?);
                }
                Ok(entry)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockGrafana;
    use crate::error::Error;
    use serde_json::json;

    fn resolver(mock: &MockGrafana) -> GrafanaResolver {
        GrafanaResolver::new(Arc::new(mock.clone()), 500)
    }

    fn team(id: i64, name: &str) -> GrafanaTeam {
        GrafanaTeam {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_numeric_ids_pass_through() {
        let mock = MockGrafana::new();
        let mut r = resolver(&mock);
        assert_eq!(r.user_id("12").unwrap(), "12");
        assert_eq!(r.team_id("7").unwrap(), "7");
        assert_eq!(r.service_account_id("3").unwrap(), "3");
        assert_eq!(mock.calls("org_users"), 0);
        assert_eq!(mock.calls("teams"), 0);
        assert_eq!(mock.calls("service_accounts"), 0);
    }

    #[test]
    fn test_user_by_email_or_login() {
        let mock = MockGrafana::new().with_users(vec![OrgUser {
            user_id: 42,
            email: "alice@example.com".to_string(),
            login: "alice".to_string(),
        }]);
        let mut r = resolver(&mock);
        assert_eq!(r.user_id("alice@example.com").unwrap(), "42");
        assert_eq!(r.user_id("alice").unwrap(), "42");
        assert_eq!(mock.calls("org_users"), 1);
    }

    #[test]
    fn test_team_listing_is_paginated_and_cached() {
        let mock = MockGrafana::new()
            .with_teams(vec![team(1, "ops"), team(2, "payments"), team(3, "sre")])
            .with_page_size(2);
        let mut r = resolver(&mock);
        assert_eq!(r.team_id("sre").unwrap(), "3");
        assert_eq!(r.team_id("ops").unwrap(), "1");
        assert_eq!(mock.calls("teams"), 2);
    }

    #[test]
    fn test_role_by_name_or_display_name() {
        let mock = MockGrafana::new().with_roles(vec![Role {
            uid: "fixed_abc".to_string(),
            name: "fixed:dashboards:writer".to_string(),
            display_name: "Dashboard writer".to_string(),
        }]);
        let mut r = resolver(&mock);
        assert_eq!(r.role_uid("fixed:dashboards:writer").unwrap(), "fixed_abc");
        assert_eq!(r.role_uid("Dashboard writer").unwrap(), "fixed_abc");
        assert_eq!(r.role_uid("fixed_abc").unwrap(), "fixed_abc");
        assert_eq!(mock.calls("roles"), 1);
    }

    #[test]
    fn test_service_account_exact_name() {
        let mock = MockGrafana::new().with_service_accounts(vec![
            ServiceAccount { id: 5, name: "deployer-old".to_string() },
            ServiceAccount { id: 6, name: "deployer".to_string() },
        ]);
        let mut r = resolver(&mock);
        assert_eq!(r.service_account_id("deployer").unwrap(), "6");
        assert!(matches!(
            r.service_account_id("deploy"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_folder_permissions() {
        let mock = MockGrafana::new().with_teams(vec![team(9, "payments")]);
        let permissions: Vec<PermissionEntry> = serde_json::from_value(json!([
            {"teamId": "payments", "permission": "Edit"},
            {"role": "Viewer", "permission": "View"}
        ]))
        .unwrap();

        let resolved = resolver(&mock).folder_permission_teams(permissions).unwrap();
        assert_eq!(
            serde_json::to_value(resolved).unwrap(),
            json!([
                {"teamId": "9", "permission": "Edit"},
                {"role": "Viewer", "permission": "View"}
            ])
        );
    }

    #[test]
    fn test_folder_permissions_unknown_team_fails() {
        let mock = MockGrafana::new();
        let permissions: Vec<PermissionEntry> =
            serde_json::from_value(json!([{"teamId": "ghosts"}])).unwrap();
        assert!(resolver(&mock).folder_permission_teams(permissions).is_err());
    }
}
