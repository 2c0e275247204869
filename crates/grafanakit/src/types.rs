//! Records returned by the Grafana backends, and field shapes rewritten
//! in place by resolvers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Whether the server reported another page after this one.
    pub has_next: bool,
}

impl<T> Page<T> {
    /// The last page of a listing.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            has_next: false,
        }
    }

    /// A page that is followed by another.
    pub fn more(items: Vec<T>) -> Self {
        Self {
            items,
            has_next: true,
        }
    }
}

// =============================================================================
// OnCall
// =============================================================================

/// An OnCall user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnCallUser {
    /// OnCall user ID, e.g. `U1A2B3C4D5E6F`.
    pub id: String,
    /// Grafana login.
    #[serde(default)]
    pub username: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// OnCall role.
    #[serde(default)]
    pub role: String,
}

/// An OnCall team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnCallTeam {
    /// OnCall team ID.
    pub id: String,
    /// Team name.
    #[serde(default)]
    pub name: String,
    /// Team email.
    #[serde(default)]
    pub email: String,
}

/// An OnCall schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnCallSchedule {
    /// Schedule ID.
    pub id: String,
    /// Schedule name.
    #[serde(default)]
    pub name: String,
}

/// An OnCall integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnCallIntegration {
    /// Integration ID.
    pub id: String,
    /// Integration name.
    #[serde(default)]
    pub name: String,
    /// Inbound webhook URL.
    #[serde(default)]
    pub link: String,
}

/// A Slack channel known to OnCall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackChannel {
    /// OnCall's ID for the channel.
    #[serde(default)]
    pub id: String,
    /// Channel name without `#`.
    #[serde(default)]
    pub name: String,
    /// Slack's own channel ID, e.g. `C0123ABCD`.
    #[serde(default)]
    pub slack_id: String,
}

// =============================================================================
// Grafana
// =============================================================================

/// A user of the current Grafana organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgUser {
    /// Numeric user ID.
    pub user_id: i64,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Login.
    #[serde(default)]
    pub login: String,
}

/// A Grafana team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrafanaTeam {
    /// Numeric team ID.
    pub id: i64,
    /// Team name.
    #[serde(default)]
    pub name: String,
}

/// A Grafana RBAC role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Role UID.
    pub uid: String,
    /// Role name, e.g. `fixed:dashboards:writer`.
    #[serde(default)]
    pub name: String,
    /// Display name shown in the UI.
    #[serde(default)]
    pub display_name: String,
}

/// A Grafana service account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccount {
    /// Numeric service account ID.
    pub id: i64,
    /// Service account name.
    #[serde(default)]
    pub name: String,
}

// =============================================================================
// Synthetic Monitoring
// =============================================================================

/// A synthetic monitoring probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Probe {
    /// Numeric probe ID.
    pub id: i64,
    /// Probe name, e.g. `Paris`.
    #[serde(default)]
    pub name: String,
}

// =============================================================================
// Field shapes
// =============================================================================

/// Entry of a contact point's `oncall` list; only `url` is rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnCallContact {
    /// Integration URL, or an integration name to resolve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Every other field, kept as is.
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Entry of a folder permission list; only `teamId` is rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionEntry {
    /// Team ID, or a team name to resolve.
    #[serde(rename = "teamId", default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    /// Every other field, kept as is.
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Entry of a check's `probes` list: a probe ID or a probe name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProbeRef {
    /// Numeric probe ID.
    Id(i64),
    /// Probe name, or a probe ID written as a string.
    Name(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_permission_entry_keeps_other_fields() {
        let entry: PermissionEntry = serde_json::from_value(json!({
            "teamId": "payments",
            "permission": "Edit"
        }))
        .unwrap();
        assert_eq!(entry.team_id.as_deref(), Some("payments"));

        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back, json!({"teamId": "payments", "permission": "Edit"}));
    }

    #[test]
    fn test_permission_entry_without_team() {
        let entry: PermissionEntry =
            serde_json::from_value(json!({"role": "Viewer", "permission": "View"})).unwrap();
        assert_eq!(entry.team_id, None);
        let back = serde_json::to_value(&entry).unwrap();
        assert!(back.get("teamId").is_none());
    }

    #[test]
    fn test_org_user_decodes_camel_case() {
        let user: OrgUser = serde_json::from_value(json!({
            "userId": 7,
            "email": "alice@example.com",
            "login": "alice",
            "role": "Admin"
        }))
        .unwrap();
        assert_eq!(user.user_id, 7);
        assert_eq!(user.login, "alice");
    }

    #[test]
    fn test_location_ref_accepts_numbers_and_names() {
        let refs: Vec<ProbeRef> = serde_json::from_value(json!([1, "Paris"])).unwrap();
        assert_eq!(refs, vec![ProbeRef::Id(1), ProbeRef::Name("Paris".to_string())]);
    }

    #[test]
    fn test_page_constructors() {
        assert!(Page::more(vec![1]).has_next);
        assert!(!Page::last(Vec::<u8>::new()).has_next);
    }
}
