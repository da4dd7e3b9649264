//! Common Error Types
//!
//! Root error for the binary and anything that crosses component lines.
//! The redemption workflow never surfaces these to users; it maps them onto
//! a terminal [`RedemptionOutcome`](crate::types::RedemptionOutcome).

use thiserror::Error;

use crate::grant::GrantError;
use crate::ledger::LedgerError;
use crate::storage::StorageError;

/// Root error type for the redemption service
#[derive(Debug, Error)]
pub enum RedeemError {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),

    /// Logging errors
    #[error("logging error: {0}")]
    Logging(#[from] super::logging::LoggingError),

    /// Redemption store errors
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Payment ledger errors
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Entitlement grant errors
    #[error("grant error: {0}")]
    Grant(#[from] GrantError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RedeemError {
    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        match self {
            RedeemError::Storage(StorageError::Duplicate(_)) => false,
            RedeemError::Storage(_) | RedeemError::Ledger(_) | RedeemError::Io(_) => true,
            _ => false,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            RedeemError::Config(_) => "CONFIG_ERROR",
            RedeemError::Logging(_) => "LOGGING_ERROR",
            RedeemError::Storage(_) => "STORAGE_ERROR",
            RedeemError::Ledger(_) => "LEDGER_ERROR",
            RedeemError::Grant(_) => "GRANT_ERROR",
            RedeemError::Io(_) => "IO_ERROR",
        }
    }
}

/// Result type alias using RedeemError
pub type Result<T> = std::result::Result<T, RedeemError>;
