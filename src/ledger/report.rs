//! Transaction Report Parser
//!
//! The provider answers searches with a small comma-separated report whose
//! first line names the columns. This parser handles exactly that shape:
//!
//! - every `"` is stripped before splitting, so quoting carries no meaning
//! - a delimiter inside a value, or an escaped quote, is NOT supported and
//!   will shift the remaining cells of that row
//! - a row shorter than the header gets `""` for the missing columns; extra
//!   cells are dropped
//! - blank lines are skipped, and a body with fewer than two non-blank lines
//!   yields no rows

use std::collections::BTreeMap;

use crate::types::LedgerTransaction;

/// Parse a report body into rows keyed by header name
pub fn parse_rows(body: &str) -> Vec<BTreeMap<String, String>> {
    let lines: Vec<String> = body
        .lines()
        .map(|line| line.replace('"', "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() < 2 {
        return Vec::new();
    }

    let headers: Vec<&str> = lines[0].split(',').map(str::trim).collect();

    lines[1..]
        .iter()
        .map(|line| {
            let cells: Vec<&str> = line.split(',').collect();
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let value = cells.get(i).map(|c| c.trim()).unwrap_or_default();
                    (header.to_string(), value.to_string())
                })
                .collect()
        })
        .collect()
}

/// Parse a report body into ledger transactions
pub fn parse_report(body: &str) -> Vec<LedgerTransaction> {
    parse_rows(body)
        .into_iter()
        .map(LedgerTransaction::from_row)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionStatus;

    #[test]
    fn test_single_row() {
        let rows = parse_rows("Transaction ID,Status\n\"TX1\",\"done\"");

        assert_eq!(rows.len(), 1);
        let expected: BTreeMap<String, String> = [
            ("Transaction ID".to_string(), "TX1".to_string()),
            ("Status".to_string(), "done".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(rows[0], expected);
    }

    #[test]
    fn test_header_only_or_empty() {
        assert!(parse_rows("").is_empty());
        assert!(parse_rows("   \n\n").is_empty());
        assert!(parse_rows("Transaction ID,Status").is_empty());
        assert!(parse_rows("Transaction ID,Status\n\n").is_empty());
    }

    #[test]
    fn test_short_and_long_rows() {
        let rows = parse_rows("A,B,C\n1\n1,2,3,4");

        assert_eq!(rows[0]["A"], "1");
        assert_eq!(rows[0]["B"], "");
        assert_eq!(rows[0]["C"], "");
        assert_eq!(rows[1].len(), 3);
        assert_eq!(rows[1]["C"], "3");
    }

    #[test]
    fn test_crlf_and_padding() {
        let rows = parse_rows("\"Transaction ID\" , \"Status\"\r\n \"TX9\" , done \r\n");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Transaction ID"], "TX9");
        assert_eq!(rows[0]["Status"], "done");
    }

    #[test]
    fn test_embedded_delimiter_is_not_supported() {
        // A quoted comma splits like any other
        let rows = parse_rows("Transaction ID,Status,Amount\nTX1,\"done\",\"1,000\"");
        assert_eq!(rows[0]["Amount"], "1");
    }

    #[test]
    fn test_parse_report() {
        let body = "Transaction ID,Status,Amount,Currency\n\
                    \"TX100\",\"done\",\"9.99\",\"EUR\"\n\
                    \"TX101\",\"pending\",\"9.99\",\"EUR\"";
        let txs = parse_report(body);

        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].transaction_id, "TX100");
        assert_eq!(txs[0].status, TransactionStatus::Done);
        assert_eq!(txs[0].currency.as_deref(), Some("EUR"));
        assert_eq!(txs[1].status, TransactionStatus::Pending);
    }
}
