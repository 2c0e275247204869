//! Which fields of which kinds are resolved, and how.
//!
//! The table maps a (backend family, kind) pair to an ordered list of
//! rules. Adding a kind is a table edit.

use crate::error::StepError;
use fieldpath::Applied;
use grafanakit::{ClientBundle, OnCallContact, PermissionEntry, ProbeRef};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

const CLUSTER_GROUP_SUFFIX: &str = ".grafana.crossplane.io";
const NAMESPACED_GROUP_SUFFIX: &str = ".grafana.m.crossplane.io";

/// Whether `group` holds namespaced managed resources, whose provider
/// configs are namespaced too.
pub fn is_namespaced_group(group: &str) -> bool {
    group.ends_with(NAMESPACED_GROUP_SUFFIX)
}

/// Backend family, derived from a managed resource's API group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    OnCall,
    Oss,
    SyntheticMonitoring,
    Alerting,
}

impl Family {
    /// Family of an API group such as `oncall.grafana.crossplane.io`.
    ///
    /// Both cluster-scoped (`grafana.crossplane.io`) and namespaced
    /// (`grafana.m.crossplane.io`) groups are recognised.
    pub fn from_group(group: &str) -> Option<Self> {
        let prefix = group
            .strip_suffix(CLUSTER_GROUP_SUFFIX)
            .or_else(|| group.strip_suffix(NAMESPACED_GROUP_SUFFIX))?;
        match prefix {
            "oncall" => Some(Self::OnCall),
            "oss" => Some(Self::Oss),
            "sm" => Some(Self::SyntheticMonitoring),
            "alerting" => Some(Self::Alerting),
            _ => None,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OnCall => "oncall",
            Self::Oss => "oss",
            Self::SyntheticMonitoring => "sm",
            Self::Alerting => "alerting",
        };
        write!(f, "{name}")
    }
}

/// A resolution applied to the value at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolve {
    /// String: OnCall user.
    OnCallUser,
    /// List of strings: OnCall users.
    OnCallUsers,
    /// List of lists of strings: OnCall users.
    OnCallUserGroups,
    /// String: OnCall team.
    OnCallTeam,
    /// String: OnCall schedule.
    OnCallSchedule,
    /// String: Slack channel.
    SlackChannel,
    /// List of contact point entries: OnCall integration links.
    ContactPointIntegrations,
    /// List of permission entries: Grafana teams.
    FolderPermissionTeams,
    /// String: Grafana role.
    Role,
    /// String: Grafana user.
    GrafanaUser,
    /// String: Grafana team.
    GrafanaTeam,
    /// String: Grafana service account.
    ServiceAccount,
    /// List of probe IDs or names: probe IDs.
    Probes,
}

/// Replace the value at `path` with `resolve` applied to it.
fn replace<I, O>(
    root: &mut Value,
    path: &str,
    resolve: impl FnOnce(I) -> grafanakit::Result<O>,
) -> Result<Applied, StepError>
where
    I: DeserializeOwned,
    O: Serialize,
{
    fieldpath::apply(root, path, |value: I| resolve(value).map_err(StepError::from))
}

impl Resolve {
    /// Apply to the value at `path`. Absent values are left alone and no
    /// client is built for them.
    pub fn apply(
        self,
        bundle: &mut ClientBundle,
        root: &mut Value,
        path: &str,
    ) -> Result<Applied, StepError> {
        if fieldpath::get(root, path)?.is_none() {
            return Ok(Applied::Missing);
        }

        match self {
            Self::OnCallUser => {
                let r = bundle.oncall()?;
                replace(root, path, |id: String| r.user_id(&id))
            }
            Self::OnCallUsers => {
                let r = bundle.oncall()?;
                replace(root, path, |ids: Vec<String>| r.user_ids(&ids))
            }
            Self::OnCallUserGroups => {
                let r = bundle.oncall()?;
                replace(root, path, |groups: Vec<Vec<String>>| {
                    r.rolling_user_ids(&groups)
                })
            }
            Self::OnCallTeam => {
                let r = bundle.oncall()?;
                replace(root, path, |id: String| r.team_id(&id))
            }
            Self::OnCallSchedule => {
                let r = bundle.oncall()?;
                replace(root, path, |id: String| r.schedule_id(&id))
            }
            Self::SlackChannel => {
                let r = bundle.oncall()?;
                replace(root, path, |name: String| r.slack_channel_id(&name))
            }
            Self::ContactPointIntegrations => {
                let r = bundle.oncall()?;
                replace(root, path, |contacts: Vec<OnCallContact>| {
                    r.contact_point_urls(contacts)
                })
            }
            Self::FolderPermissionTeams => {
                let r = bundle.grafana()?;
                replace(root, path, |entries: Vec<PermissionEntry>| {
                    r.folder_permission_teams(entries)
                })
            }
            Self::Role => {
                let r = bundle.grafana()?;
                replace(root, path, |name: String| r.role_uid(&name))
            }
            Self::GrafanaUser => {
                let r = bundle.grafana()?;
                replace(root, path, |id: String| r.user_id(&id))
            }
            Self::GrafanaTeam => {
                let r = bundle.grafana()?;
                replace(root, path, |id: String| r.team_id(&id))
            }
            Self::ServiceAccount => {
                let r = bundle.grafana()?;
                replace(root, path, |name: String| r.service_account_id(&name))
            }
            Self::Probes => {
                let r = bundle.sm()?;
                replace(root, path, |probes: Vec<ProbeRef>| r.probe_ids(&probes))
            }
        }
    }
}

/// One field of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub path: &'static str,
    pub resolve: Resolve,
}

const fn rule(path: &'static str, resolve: Resolve) -> Rule {
    Rule { path, resolve }
}

/// (family, kind) to ordered rules.
pub struct DispatchTable {
    rules: HashMap<Family, HashMap<&'static str, Vec<Rule>>>,
}

impl DispatchTable {
    /// The rules for Grafana managed resources.
    pub fn grafana() -> Self {
        use Family::{Alerting, OnCall, Oss, SyntheticMonitoring};

        let entries: [(Family, &'static str, Vec<Rule>); 9] = [
            (
                OnCall,
                "Schedule",
                vec![rule("spec.forProvider.teamId", Resolve::OnCallTeam)],
            ),
            (
                OnCall,
                "OnCallShift",
                vec![
                    rule("spec.forProvider.users", Resolve::OnCallUsers),
                    rule("spec.forProvider.rollingUsers", Resolve::OnCallUserGroups),
                    rule("spec.forProvider.teamId", Resolve::OnCallTeam),
                ],
            ),
            (
                OnCall,
                "Escalation",
                vec![
                    rule("spec.forProvider.personsToNotify", Resolve::OnCallUsers),
                    rule(
                        "spec.forProvider.personsToNotifyNextEachTime",
                        Resolve::OnCallUsers,
                    ),
                    rule(
                        "spec.forProvider.notifyOnCallFromSchedule",
                        Resolve::OnCallSchedule,
                    ),
                ],
            ),
            (
                OnCall,
                "UserNotificationRule",
                vec![rule("spec.forProvider.userId", Resolve::OnCallUser)],
            ),
            (
                OnCall,
                "Integration",
                vec![rule(
                    "spec.forProvider.defaultRoute[0].slack[0].channelId",
                    Resolve::SlackChannel,
                )],
            ),
            (
                Oss,
                "FolderPermission",
                vec![rule(
                    "spec.forProvider.permissions",
                    Resolve::FolderPermissionTeams,
                )],
            ),
            (
                Oss,
                "RoleAssignmentItem",
                vec![
                    rule("spec.forProvider.roleUid", Resolve::Role),
                    rule("spec.forProvider.userId", Resolve::GrafanaUser),
                    rule("spec.forProvider.teamId", Resolve::GrafanaTeam),
                    rule("spec.forProvider.serviceAccountId", Resolve::ServiceAccount),
                ],
            ),
            (
                SyntheticMonitoring,
                "Check",
                vec![rule("spec.forProvider.probes", Resolve::Probes)],
            ),
            (
                Alerting,
                "ContactPoint",
                vec![rule(
                    "spec.forProvider.oncall",
                    Resolve::ContactPointIntegrations,
                )],
            ),
        ];

        let mut rules: HashMap<Family, HashMap<&'static str, Vec<Rule>>> = HashMap::new();
        for (family, kind, kind_rules) in entries {
            rules.entry(family).or_default().insert(kind, kind_rules);
        }
        Self { rules }
    }

    /// Rules for a kind, in application order. Empty for unknown kinds.
    pub fn rules(&self, family: Family, kind: &str) -> &[Rule] {
        self.rules
            .get(&family)
            .and_then(|kinds| kinds.get(kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
