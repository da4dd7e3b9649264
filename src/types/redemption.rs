//! Redemption Types
//!
//! Types shared by the redemption store, the workflow and the adapters.

use serde::{Deserialize, Serialize};

/// Terminal result of one redemption request
///
/// Each outcome maps to exactly one user-facing message. A lost race at the
/// store (`AlreadyRedeemed`) is reported as `AlreadyUsed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionOutcome {
    /// Ledger verified, record written, entitlement granted
    Success,
    /// Transaction id was already redeemed (by anyone)
    AlreadyUsed,
    /// No completed ledger transaction with this id
    NotFound,
    /// Verification could not be completed; the user may retry
    LookupFailed,
    /// Record written but the grant failed; needs operator reconciliation
    GrantFailed,
}

impl RedemptionOutcome {
    /// Message shown to the requester
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Success => "✅ Role successfully assigned!",
            Self::AlreadyUsed => "❌ This code has already been used",
            Self::NotFound => "❌ Transaction ID not found",
            Self::LookupFailed => {
                "⚠️ Could not verify your transaction right now, please try again later"
            }
            Self::GrantFailed => {
                "⚠️ An error occurred while assigning your role, please contact an administrator"
            }
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::AlreadyUsed => "already_used",
            Self::NotFound => "not_found",
            Self::LookupFailed => "lookup_failed",
            Self::GrantFailed => "grant_failed",
        }
    }

    /// Whether the user may resubmit the same id and expect a different result
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotFound | Self::LookupFailed)
    }
}

impl std::fmt::Display for RedemptionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A redeemed transaction id
///
/// Written once, never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRecord {
    pub transaction_id: String,
    /// User identifier of the requester who redeemed it
    pub redeemed_by: String,
    /// Unix timestamp (seconds) of the redemption
    pub redeemed_at: u64,
}

impl RedemptionRecord {
    pub fn new(transaction_id: impl Into<String>, redeemed_by: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            redeemed_by: redeemed_by.into(),
            redeemed_at: chrono::Utc::now().timestamp().max(0) as u64,
        }
    }
}

/// A single submission from the presentation adapter
#[derive(Debug, Clone)]
pub struct RedemptionRequest {
    /// Raw identifier as typed by the user
    pub submitted_id: String,
    pub requester: String,
    /// Ties together every log line of this request
    pub correlation_id: String,
}

impl RedemptionRequest {
    pub fn new(submitted_id: impl Into<String>, requester: impl Into<String>) -> Self {
        Self {
            submitted_id: submitted_id.into(),
            requester: requester.into(),
            correlation_id: crate::common::logging::generate_correlation_id(),
        }
    }
}

/// Running counters for the workflow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionStats {
    pub total_requests: u64,
    pub success: u64,
    pub already_used: u64,
    /// Subset of `already_used` that passed `has` but lost the insert race
    pub races_lost: u64,
    pub not_found: u64,
    pub lookup_failed: u64,
    pub grant_failed: u64,
}

impl RedemptionStats {
    pub(crate) fn count(&mut self, outcome: RedemptionOutcome) {
        self.total_requests += 1;
        match outcome {
            RedemptionOutcome::Success => self.success += 1,
            RedemptionOutcome::AlreadyUsed => self.already_used += 1,
            RedemptionOutcome::NotFound => self.not_found += 1,
            RedemptionOutcome::LookupFailed => self.lookup_failed += 1,
            RedemptionOutcome::GrantFailed => self.grant_failed += 1,
        }
    }
}
