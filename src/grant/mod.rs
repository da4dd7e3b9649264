//! Entitlement Grant Module
//!
//! The grant is an opaque, non-idempotent call made at most once per
//! successful redemption. The shipped implementation assigns a Discord
//! guild role.

pub mod discord;

use async_trait::async_trait;

pub use discord::{DiscordRoleGrant, DiscordUserId};

/// Grant errors
#[derive(Debug, thiserror::Error)]
pub enum GrantError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("grant rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("grant timed out")]
    Timeout,

    /// Requester is not a Discord user id
    #[error("invalid requester id: {0:?}")]
    InvalidRequester(String),

    #[error("invalid grant endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Applies the entitlement to a requester
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntitlementGrant: Send + Sync {
    async fn grant(&self, requester: &str) -> Result<(), GrantError>;
}
