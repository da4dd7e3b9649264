//! Payment Ledger Client
//!
//! Searches the provider's transaction reports for a submitted id. Only
//! completed transactions are requested; the report parser and the match
//! rule in [`crate::types::ledger`] keep other statuses out even if the
//! provider returns them.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::report::parse_report;
use crate::common::config::LedgerSettings;
use crate::types::LedgerTransaction;

/// Status filter sent with every search
pub const COMPLETED_STATUS: &str = "done";
/// Upper bound on rows returned by one search
pub const SEARCH_LIMIT: u32 = 100;
/// Default request bound
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Ledger errors
///
/// Any of these means "verification could not be completed", never "not
/// found".
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ledger returned HTTP {0}")]
    Status(u16),

    #[error("ledger query timed out")]
    Timeout,
}

/// Source of ledger transactions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Fetch the completed transactions matching `transaction_id`
    async fn lookup(&self, transaction_id: &str) -> Result<Vec<LedgerTransaction>, LedgerError>;
}

/// HTTP client for the provider's merchant reports API
#[derive(Debug, Clone)]
pub struct XsollaLedgerClient {
    client: Client,
    base_url: String,
    merchant_id: String,
    api_key: String,
    project_id: String,
}

impl XsollaLedgerClient {
    /// Create a new client; every request is bounded by `timeout`
    pub fn new(settings: &LedgerSettings) -> Result<Self, LedgerError> {
        let client = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            merchant_id: settings.merchant_id.clone(),
            api_key: settings.api_key.clone(),
            project_id: settings.project_id.clone(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Transaction search endpoint for this merchant
    pub fn search_url(&self) -> String {
        format!(
            "{}/merchant/v2/merchants/{}/reports/transactions/search.csv",
            self.base_url, self.merchant_id
        )
    }

    /// Query parameters for one search
    fn search_params(&self, transaction_id: &str) -> [(&'static str, String); 4] {
        [
            ("project_id", self.project_id.clone()),
            ("transaction_id", transaction_id.to_string()),
            ("status", COMPLETED_STATUS.to_string()),
            ("limit", SEARCH_LIMIT.to_string()),
        ]
    }
}

#[async_trait]
impl TransactionLedger for XsollaLedgerClient {
    async fn lookup(&self, transaction_id: &str) -> Result<Vec<LedgerTransaction>, LedgerError> {
        let started = std::time::Instant::now();

        let resp = self
            .client
            .get(self.search_url())
            .basic_auth(&self.merchant_id, Some(&self.api_key))
            .query(&self.search_params(transaction_id))
            .send()
            .await
            .map_err(map_transport)?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(
                target: "redeem::ledger",
                transaction_id,
                status = status.as_u16(),
                "Ledger search rejected"
            );
            return Err(LedgerError::Status(status.as_u16()));
        }

        let body = resp.text().await.map_err(map_transport)?;
        let transactions = parse_report(&body);

        tracing::debug!(
            target: "redeem::ledger",
            transaction_id,
            rows = transactions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ledger search complete"
        );

        Ok(transactions)
    }
}

fn map_transport(e: reqwest::Error) -> LedgerError {
    if e.is_timeout() {
        LedgerError::Timeout
    } else {
        LedgerError::Http(e)
    }
}
