//! Shared Types
//!
//! Data model for ledger rows and redemption records.

pub mod ledger;
pub mod redemption;

pub use ledger::{find_match, LedgerTransaction, TransactionStatus};
pub use redemption::{RedemptionOutcome, RedemptionRecord, RedemptionRequest, RedemptionStats};
