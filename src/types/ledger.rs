//! Ledger Types
//!
//! Read-only projection of the payment provider's transaction report rows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Report column holding the transaction identifier
pub const TRANSACTION_ID_FIELD: &str = "Transaction ID";
/// Report column holding the transaction status
pub const STATUS_FIELD: &str = "Status";
pub const AMOUNT_FIELD: &str = "Amount";
pub const CURRENCY_FIELD: &str = "Currency";

/// Status of a ledger transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Completed payment, the only redeemable status
    Done,
    Pending,
    Other(String),
}

impl TransactionStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "done" => Self::Done,
            "pending" => Self::Pending,
            other => Self::Other(other.to_string()),
        })
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Done => write!(f, "done"),
            Self::Pending => write!(f, "pending"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// One transaction row from the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub amount: Option<String>,
    pub currency: Option<String>,
    /// Every column of the row, keyed by header name
    pub raw_row: BTreeMap<String, String>,
}

impl LedgerTransaction {
    /// Project a parsed report row
    ///
    /// A row without a `Status` column is taken as `Done`: the search query
    /// already filters on completed transactions. A row that does carry a
    /// status keeps it, so a pending or failed row never matches.
    pub fn from_row(raw_row: BTreeMap<String, String>) -> Self {
        let field = |name: &str| raw_row.get(name).cloned();
        let non_empty = |name: &str| field(name).filter(|v| !v.is_empty());

        let status = match field(STATUS_FIELD) {
            Some(s) => s.parse().unwrap_or(TransactionStatus::Other(s)),
            None => TransactionStatus::Done,
        };

        Self {
            transaction_id: field(TRANSACTION_ID_FIELD).unwrap_or_default(),
            status,
            amount: non_empty(AMOUNT_FIELD),
            currency: non_empty(CURRENCY_FIELD),
            raw_row,
        }
    }

    /// Whether this row redeems `submitted_id`
    ///
    /// Exact, case-sensitive comparison; the status must be `Done`.
    pub fn matches(&self, submitted_id: &str) -> bool {
        self.status.is_done() && self.transaction_id == submitted_id
    }
}

/// Find the row that redeems `submitted_id`, if any
pub fn find_match<'a>(
    transactions: &'a [LedgerTransaction],
    submitted_id: &str,
) -> Option<&'a LedgerTransaction> {
    transactions.iter().find(|tx| tx.matches(submitted_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_row() {
        let tx = LedgerTransaction::from_row(row(&[
            ("Transaction ID", "TX1"),
            ("Status", "done"),
            ("Amount", "4.99"),
            ("Currency", "USD"),
        ]));

        assert_eq!(tx.transaction_id, "TX1");
        assert_eq!(tx.status, TransactionStatus::Done);
        assert_eq!(tx.amount.as_deref(), Some("4.99"));
        assert_eq!(tx.currency.as_deref(), Some("USD"));
        assert_eq!(tx.raw_row.len(), 4);
    }

    #[test]
    fn test_status_filtering() {
        let pending = LedgerTransaction::from_row(row(&[
            ("Transaction ID", "TX1"),
            ("Status", "pending"),
        ]));
        let canceled = LedgerTransaction::from_row(row(&[
            ("Transaction ID", "TX1"),
            ("Status", "canceled"),
        ]));
        let blank = LedgerTransaction::from_row(row(&[("Transaction ID", "TX1"), ("Status", "")]));

        assert!(!pending.matches("TX1"));
        assert!(!canceled.matches("TX1"));
        assert!(!blank.matches("TX1"));
        assert_eq!(canceled.status, TransactionStatus::Other("canceled".into()));
    }

    #[test]
    fn test_missing_status_column_trusts_query_filter() {
        let tx = LedgerTransaction::from_row(row(&[("Transaction ID", "TX1")]));
        assert!(tx.matches("TX1"));
    }

    #[test]
    fn test_match_is_exact() {
        let tx = LedgerTransaction::from_row(row(&[("Transaction ID", "TX1"), ("Status", "done")]));

        assert!(tx.matches("TX1"));
        assert!(!tx.matches("tx1"));
        assert!(!tx.matches(" TX1"));
        assert!(!tx.matches("TX10"));
    }

    #[test]
    fn test_find_match_skips_non_done() {
        let rows = vec![
            LedgerTransaction::from_row(row(&[("Transaction ID", "TX7"), ("Status", "pending")])),
            LedgerTransaction::from_row(row(&[("Transaction ID", "TX8"), ("Status", "done")])),
        ];

        assert!(find_match(&rows, "TX7").is_none());
        assert_eq!(find_match(&rows, "TX8").unwrap().transaction_id, "TX8");
        assert!(find_match(&[], "TX8").is_none());
    }
}
