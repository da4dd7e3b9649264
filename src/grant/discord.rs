//! Discord Role Grant
//!
//! Adds the configured role to a guild member through the Discord REST API
//! (`PUT /guilds/{guild}/members/{user}/roles/{role}`).

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::fmt;
use std::str::FromStr;

use super::{EntitlementGrant, GrantError};
use crate::common::config::GrantSettings;

/// Reason recorded in the guild audit log
const AUDIT_LOG_REASON: &str = "Purchase transaction redeemed";

/// Discord snowflake identifying a user
///
/// Only ASCII digits that fit a `u64` parse; anything else is rejected
/// before it can reach a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiscordUserId(u64);

impl DiscordUserId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl FromStr for DiscordUserId {
    type Err = GrantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_snowflake(s)
            .map(Self)
            .ok_or_else(|| GrantError::InvalidRequester(s.to_string()))
    }
}

impl fmt::Display for DiscordUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn parse_snowflake(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Grants a fixed guild role over HTTP
#[derive(Debug, Clone)]
pub struct DiscordRoleGrant {
    client: Client,
    api_base: Url,
    bot_token: String,
    guild_id: u64,
    role_id: u64,
}

impl DiscordRoleGrant {
    pub fn new(settings: &GrantSettings) -> Result<Self, GrantError> {
        let client = Client::builder().timeout(settings.timeout).build()?;

        let api_base = Url::parse(&settings.api_base)
            .map_err(|e| GrantError::InvalidEndpoint(format!("{}: {}", settings.api_base, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(GrantError::InvalidEndpoint(settings.api_base.clone()));
        }
        let guild_id = parse_snowflake(&settings.guild_id).ok_or_else(|| {
            GrantError::InvalidEndpoint(format!("guild id {:?}", settings.guild_id))
        })?;
        let role_id = parse_snowflake(&settings.role_id).ok_or_else(|| {
            GrantError::InvalidEndpoint(format!("role id {:?}", settings.role_id))
        })?;

        Ok(Self {
            client,
            api_base,
            bot_token: settings.bot_token.clone(),
            guild_id,
            role_id,
        })
    }

    /// Endpoint that adds the configured role to `user`
    pub fn member_role_url(&self, user: DiscordUserId) -> Url {
        let mut url = self.api_base.clone();
        let (guild, user, role) = (
            self.guild_id.to_string(),
            user.to_string(),
            self.role_id.to_string(),
        );

        // new() rejected cannot-be-a-base URLs
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "guilds",
                guild.as_str(),
                "members",
                user.as_str(),
                "roles",
                role.as_str(),
            ]);
        }
        url
    }
}

#[async_trait]
impl EntitlementGrant for DiscordRoleGrant {
    async fn grant(&self, requester: &str) -> Result<(), GrantError> {
        let user: DiscordUserId = requester.parse()?;

        let resp = self
            .client
            .put(self.member_role_url(user))
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.bot_token))
            .header("X-Audit-Log-Reason", AUDIT_LOG_REASON)
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { GrantError::Timeout } else { GrantError::Http(e) })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GrantError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(
            target: "redeem::grant",
            guild_id = self.guild_id,
            role_id = self.role_id,
            user_id = user.get(),
            "Role granted"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings(api_base: &str) -> GrantSettings {
        GrantSettings {
            api_base: api_base.to_string(),
            bot_token: "token".to_string(),
            guild_id: "100".to_string(),
            role_id: "200".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_member_role_url() {
        let grant = DiscordRoleGrant::new(&settings("https://discord.com/api/v10/")).unwrap();

        assert_eq!(
            grant.member_role_url(DiscordUserId(300)).as_str(),
            "https://discord.com/api/v10/guilds/100/members/300/roles/200"
        );
    }

    #[test]
    fn test_user_id_must_be_snowflake() {
        assert_eq!("300".parse::<DiscordUserId>().unwrap().get(), 300);

        for bad in [
            "",
            " 300",
            "+300",
            "-1",
            "user-1",
            "300/roles/999?",
            "300%2Froles%2F999",
            "18446744073709551616",
        ] {
            assert!(
                matches!(bad.parse::<DiscordUserId>(), Err(GrantError::InvalidRequester(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_guild_and_role_must_be_snowflakes() {
        let mut bad_role = settings("https://discord.com/api/v10");
        bad_role.role_id = "200/../999".to_string();
        assert!(matches!(
            DiscordRoleGrant::new(&bad_role),
            Err(GrantError::InvalidEndpoint(_))
        ));

        assert!(matches!(
            DiscordRoleGrant::new(&settings("not a url")),
            Err(GrantError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_requester_never_sent() {
        // Nothing listens on port 9; a request would surface as Http, not InvalidRequester
        let grant = DiscordRoleGrant::new(&settings("http://127.0.0.1:9")).unwrap();

        let result = grant.grant("300/roles/999?").await;

        assert!(matches!(result, Err(GrantError::InvalidRequester(_))));
    }
}
