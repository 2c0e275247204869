use super::{Listing, collect_pages, find, resolve_many, resolve_nested_many};
use crate::backend::OnCallApi;
use crate::error::Result;
use crate::types::{
    OnCallContact, OnCallIntegration, OnCallSchedule, OnCallTeam, OnCallUser, SlackChannel,
};
use log::debug;
use std::sync::Arc;

/// Resolves OnCall users, teams, schedules, integrations and Slack channels.
pub struct OnCallResolver {
    client: Arc<dyn OnCallApi>,
    max_pages: u32,
    users: Listing<OnCallUser>,
    teams: Listing<OnCallTeam>,
    schedules: Listing<OnCallSchedule>,
    integrations: Listing<OnCallIntegration>,
    channels: Listing<SlackChannel>,
}

impl OnCallResolver {
    /// Wrap `client`, fetching at most `max_pages` pages per listing.
    pub fn new(client: Arc<dyn OnCallApi>, max_pages: u32) -> Self {
        Self {
            client,
            max_pages,
            users: Listing::default(),
            teams: Listing::default(),
            schedules: Listing::default(),
            integrations: Listing::default(),
            channels: Listing::default(),
        }
    }

    /// ID of the user with this ID, username or email.
    pub fn user_id(&mut self, identifier: &str) -> Result<String> {
        let (client, limit) = (&self.client, self.max_pages);
        let users = self
            .users
            .get_or_fetch(|| collect_pages("oncall users", limit, |p| client.list_users(p)))?;
        Ok(find(users, identifier)?.id.clone())
    }

    /// [`user_id`](Self::user_id) for each element.
    pub fn user_ids(&mut self, identifiers: &[String]) -> Result<Vec<String>> {
        resolve_many(identifiers, |id| self.user_id(id))
    }

    /// [`user_id`](Self::user_id) for each element of each group.
    pub fn rolling_user_ids(&mut self, groups: &[Vec<String>]) -> Result<Vec<Vec<String>>> {
        resolve_nested_many(groups, |id| self.user_id(id))
    }

    /// ID of the team with this ID, name or email.
    pub fn team_id(&mut self, identifier: &str) -> Result<String> {
        let (client, limit) = (&self.client, self.max_pages);
        let teams = self
            .teams
            .get_or_fetch(|| collect_pages("oncall teams", limit, |p| client.list_teams(p)))?;
        Ok(find(teams, identifier)?.id.clone())
    }

    /// ID of the schedule with this ID or name.
    pub fn schedule_id(&mut self, identifier: &str) -> Result<String> {
        let (client, limit) = (&self.client, self.max_pages);
        let schedules = self.schedules.get_or_fetch(|| {
            collect_pages("oncall schedules", limit, |p| client.list_schedules(p))
        })?;
        Ok(find(schedules, identifier)?.id.clone())
    }

    /// Inbound URL of the integration with this ID or name.
    ///
    /// Absolute `http(s)` URLs are returned as is without a backend call.
    pub fn integration_link(&mut self, identifier: &str) -> Result<String> {
        if identifier.starts_with("http://") || identifier.starts_with("https://") {
            return Ok(identifier.to_string());
        }
        let (client, limit) = (&self.client, self.max_pages);
        let integrations = self.integrations.get_or_fetch(|| {
            collect_pages("oncall integrations", limit, |p| client.list_integrations(p))
        })?;
        Ok(find(integrations, identifier)?.link.clone())
    }

    /// Resolve the `url` of each contact point entry to an integration link.
    pub fn contact_point_urls(&mut self, contacts: Vec<OnCallContact>) -> Result<Vec<OnCallContact>> {
        contacts
            .into_iter()
            .map(|mut contact| {
                if let Some(url) = contact.url.take() {
                    contact.url = Some(self.integration_link(&url)?);
                }
                Ok(contact)
            })
            .collect()
    }

    /// Slack's ID for the channel with this name (with or without `#`).
    ///
    /// Channel names are not unique: when no channel or more than one
    /// channel matches, the identifier is returned unchanged.
    pub fn slack_channel_id(&mut self, identifier: &str) -> Result<String> {
        let (client, limit) = (&self.client, self.max_pages);
        let channels = self.channels.get_or_fetch(|| {
            collect_pages("slack channels", limit, |p| client.list_slack_channels(p))
        })?;

        if channels.iter().any(|c| c.slack_id == identifier) {
            return Ok(identifier.to_string());
        }
        let name = identifier.trim_start_matches('#');
        let mut matching = channels.iter().filter(|c| c.name == name);
        match (matching.next(), matching.next()) {
            (Some(channel), None) => Ok(channel.slack_id.clone()),
            (None, _) => {
                debug!("No slack channel named {name}, keeping {identifier}");
                Ok(identifier.to_string())
            }
            (Some(_), Some(_)) => {
                debug!("Several slack channels named {name}, keeping {identifier}");
                Ok(identifier.to_string())
            }
        }
    }
}
