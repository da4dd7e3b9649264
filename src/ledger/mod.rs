//! Payment Ledger Module
//!
//! Looks up submitted transaction ids in the payment provider's reports.

pub mod client;
pub mod report;

pub use client::{LedgerError, TransactionLedger, XsollaLedgerClient, COMPLETED_STATUS, SEARCH_LIMIT};
pub use report::{parse_report, parse_rows};

#[cfg(test)]
pub use client::MockTransactionLedger;
