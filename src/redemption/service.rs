//! Redemption Service
//!
//! Runs one redemption request through store check, ledger query, record
//! and grant. Every failure is mapped onto a terminal outcome here; nothing
//! below this layer reaches the adapter as an error.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::time::timeout;

use crate::common::config::AppConfig;
use crate::common::logging::log_redemption_event;
use crate::grant::{EntitlementGrant, GrantError};
use crate::ledger::{LedgerError, TransactionLedger};
use crate::storage::RedemptionStore;
use crate::types::{find_match, RedemptionOutcome, RedemptionRequest, RedemptionStats};

/// Workflow configuration
#[derive(Debug, Clone)]
pub struct RedemptionConfig {
    /// Bound on the ledger query; expiry is `LookupFailed`
    pub ledger_timeout: Duration,
    /// Bound on the grant call; expiry is `GrantFailed`
    pub grant_timeout: Duration,
}

impl Default for RedemptionConfig {
    fn default() -> Self {
        Self {
            ledger_timeout: Duration::from_secs(10),
            grant_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&AppConfig> for RedemptionConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            ledger_timeout: config.ledger.timeout,
            grant_timeout: config.grant.timeout,
        }
    }
}

/// Workflow stage, used for log context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    CheckingStore,
    QueryingLedger,
    Recording,
    Granting,
}

/// A terminal outcome plus the internal detail that goes to the log only
struct Verdict {
    outcome: RedemptionOutcome,
    detail: Option<String>,
}

impl Verdict {
    fn done(outcome: RedemptionOutcome) -> Self {
        Self {
            outcome,
            detail: None,
        }
    }

    fn failed(outcome: RedemptionOutcome, stage: Stage, err: impl std::fmt::Display) -> Self {
        Self {
            outcome,
            detail: Some(format!("{:?}: {}", stage, err)),
        }
    }
}

/// Redemption workflow
///
/// Cheap to clone; every concurrent request may hold its own copy.
#[derive(Clone)]
pub struct RedemptionService {
    config: RedemptionConfig,
    store: Arc<dyn RedemptionStore>,
    ledger: Arc<dyn TransactionLedger>,
    grant: Arc<dyn EntitlementGrant>,
    stats: Arc<RwLock<RedemptionStats>>,
}

impl RedemptionService {
    pub fn new(
        config: RedemptionConfig,
        store: Arc<dyn RedemptionStore>,
        ledger: Arc<dyn TransactionLedger>,
        grant: Arc<dyn EntitlementGrant>,
    ) -> Self {
        Self {
            config,
            store,
            ledger,
            grant,
            stats: Arc::new(RwLock::new(RedemptionStats::default())),
        }
    }

    /// Redeem `raw_id` on behalf of `requester`
    pub async fn submit(&self, raw_id: &str, requester: &str) -> RedemptionOutcome {
        self.process(&RedemptionRequest::new(raw_id, requester)).await
    }

    /// Run one request to its terminal outcome
    pub async fn process(&self, request: &RedemptionRequest) -> RedemptionOutcome {
        let started = Instant::now();
        let verdict = self.run(request).await;

        self.stats.write().await.count(verdict.outcome);

        log_redemption_event(
            verdict.outcome.code(),
            &request.correlation_id,
            &request.submitted_id,
            &request.requester,
            started.elapsed().as_millis() as u64,
            verdict.detail.as_deref(),
        );

        verdict.outcome
    }

    async fn run(&self, request: &RedemptionRequest) -> Verdict {
        let id = request.submitted_id.as_str();
        let requester = request.requester.as_str();

        if id.is_empty() {
            return Verdict::done(RedemptionOutcome::NotFound);
        }

        tracing::debug!(
            target: "redeem::redemption",
            correlation_id = %request.correlation_id,
            stage = ?Stage::CheckingStore,
            transaction_id = id
        );
        match self.store.has(id).await {
            Ok(true) => return Verdict::done(RedemptionOutcome::AlreadyUsed),
            Ok(false) => {}
            Err(e) => {
                return Verdict::failed(RedemptionOutcome::LookupFailed, Stage::CheckingStore, e)
            }
        }

        tracing::debug!(
            target: "redeem::redemption",
            correlation_id = %request.correlation_id,
            stage = ?Stage::QueryingLedger,
            transaction_id = id
        );
        let transactions = match timeout(self.config.ledger_timeout, self.ledger.lookup(id)).await
        {
            Ok(Ok(transactions)) => transactions,
            Ok(Err(e)) => {
                return Verdict::failed(RedemptionOutcome::LookupFailed, Stage::QueryingLedger, e)
            }
            Err(_) => {
                return Verdict::failed(
                    RedemptionOutcome::LookupFailed,
                    Stage::QueryingLedger,
                    LedgerError::Timeout,
                )
            }
        };

        if find_match(&transactions, id).is_none() {
            return Verdict::done(RedemptionOutcome::NotFound);
        }

        // Written after ledger confirmation and before the grant
        match self.store.record(id, requester).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate() => {
                tracing::warn!(
                    target: "redeem::redemption",
                    correlation_id = %request.correlation_id,
                    transaction_id = id,
                    "Concurrent redemption won the insert"
                );
                self.stats.write().await.races_lost += 1;
                return Verdict::done(RedemptionOutcome::AlreadyUsed);
            }
            Err(e) => {
                return Verdict::failed(RedemptionOutcome::LookupFailed, Stage::Recording, e)
            }
        }

        // At most one grant per record; never retried
        match timeout(self.config.grant_timeout, self.grant.grant(requester)).await {
            Ok(Ok(())) => Verdict::done(RedemptionOutcome::Success),
            Ok(Err(e)) => Verdict::failed(RedemptionOutcome::GrantFailed, Stage::Granting, e),
            Err(_) => Verdict::failed(
                RedemptionOutcome::GrantFailed,
                Stage::Granting,
                GrantError::Timeout,
            ),
        }
    }

    /// Get current statistics
    pub async fn stats(&self) -> RedemptionStats {
        self.stats.read().await.clone()
    }

    /// The underlying redemption store
    pub fn store(&self) -> &Arc<dyn RedemptionStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grant::MockEntitlementGrant;
    use crate::ledger::{parse_report, MockTransactionLedger};
    use crate::storage::{MemoryRedemptionStore, MockRedemptionStore, StorageError};
    use async_trait::async_trait;

    const DONE_TX100: &str = "Transaction ID,Status\n\"TX100\",\"done\"";

    fn service(
        store: impl RedemptionStore + 'static,
        ledger: impl TransactionLedger + 'static,
        grant: impl EntitlementGrant + 'static,
    ) -> RedemptionService {
        RedemptionService::new(
            RedemptionConfig {
                ledger_timeout: Duration::from_millis(100),
                grant_timeout: Duration::from_millis(100),
            },
            Arc::new(store),
            Arc::new(ledger),
            Arc::new(grant),
        )
    }

    fn ledger_returning(body: &'static str) -> MockTransactionLedger {
        let mut ledger = MockTransactionLedger::new();
        ledger
            .expect_lookup()
            .returning(move |_| Ok(parse_report(body)));
        ledger
    }

    fn grant_ok(times: usize) -> MockEntitlementGrant {
        let mut grant = MockEntitlementGrant::new();
        grant.expect_grant().times(times).returning(|_| Ok(()));
        grant
    }

    struct SlowLedger;

    #[async_trait]
    impl TransactionLedger for SlowLedger {
        async fn lookup(
            &self,
            _transaction_id: &str,
        ) -> Result<Vec<crate::types::LedgerTransaction>, LedgerError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(parse_report(DONE_TX100))
        }
    }

    struct SlowGrant;

    #[async_trait]
    impl EntitlementGrant for SlowGrant {
        async fn grant(&self, _requester: &str) -> Result<(), GrantError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_success_records_then_grants() {
        let store = MemoryRedemptionStore::new();
        let mut grant = MockEntitlementGrant::new();
        grant
            .expect_grant()
            .withf(|user| user == "user-1")
            .times(1)
            .returning(|_| Ok(()));

        let svc = service(store.clone(), ledger_returning(DONE_TX100), grant);

        assert_eq!(svc.submit("TX100", "user-1").await, RedemptionOutcome::Success);
        assert_eq!(store.get("TX100").await.unwrap().unwrap().redeemed_by, "user-1");
        assert_eq!(svc.stats().await.success, 1);
    }

    #[tokio::test]
    async fn test_already_used_skips_ledger() {
        let mut store = MockRedemptionStore::new();
        store.expect_has().withf(|id| id == "TX100").returning(|_| Ok(true));
        store.expect_record().never();

        let mut ledger = MockTransactionLedger::new();
        ledger.expect_lookup().never();

        let svc = service(store, ledger, grant_ok(0));
        assert_eq!(svc.submit("TX100", "user-1").await, RedemptionOutcome::AlreadyUsed);
    }

    #[tokio::test]
    async fn test_empty_id_touches_nothing() {
        let mut store = MockRedemptionStore::new();
        store.expect_has().never();
        let mut ledger = MockTransactionLedger::new();
        ledger.expect_lookup().never();

        let svc = service(store, ledger, grant_ok(0));
        assert_eq!(svc.submit("", "user-1").await, RedemptionOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_store_check_failure_is_lookup_failed() {
        let mut store = MockRedemptionStore::new();
        store
            .expect_has()
            .returning(|_| Err(StorageError::Connection("pool exhausted".into())));
        let mut ledger = MockTransactionLedger::new();
        ledger.expect_lookup().never();

        let svc = service(store, ledger, grant_ok(0));
        assert_eq!(svc.submit("TX100", "user-1").await, RedemptionOutcome::LookupFailed);
    }

    #[tokio::test]
    async fn test_ledger_error_is_lookup_failed() {
        let store = MemoryRedemptionStore::new();
        let mut ledger = MockTransactionLedger::new();
        ledger
            .expect_lookup()
            .returning(|_| Err(LedgerError::Status(503)));

        let svc = service(store.clone(), ledger, grant_ok(0));

        assert_eq!(svc.submit("TX100", "user-1").await, RedemptionOutcome::LookupFailed);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ledger_timeout_is_lookup_failed() {
        let store = MemoryRedemptionStore::new();
        let svc = service(store.clone(), SlowLedger, grant_ok(0));

        assert_eq!(svc.submit("TX100", "user-1").await, RedemptionOutcome::LookupFailed);
        assert!(!store.has("TX100").await.unwrap());
    }

    #[tokio::test]
    async fn test_non_done_row_is_not_found() {
        let store = MemoryRedemptionStore::new();
        let ledger = ledger_returning("Transaction ID,Status\n\"TX100\",\"pending\"");

        let svc = service(store.clone(), ledger, grant_ok(0));

        assert_eq!(svc.submit("TX100", "user-1").await, RedemptionOutcome::NotFound);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lost_race_collapses_to_already_used() {
        let mut store = MockRedemptionStore::new();
        store.expect_has().returning(|_| Ok(false));
        store
            .expect_record()
            .times(1)
            .returning(|id, _| Err(StorageError::Duplicate(id.to_string())));

        let svc = service(store, ledger_returning(DONE_TX100), grant_ok(0));

        assert_eq!(svc.submit("TX100", "user-2").await, RedemptionOutcome::AlreadyUsed);
        let stats = svc.stats().await;
        assert_eq!(stats.already_used, 1);
        assert_eq!(stats.races_lost, 1);
    }

    #[tokio::test]
    async fn test_record_failure_does_not_grant() {
        let mut store = MockRedemptionStore::new();
        store.expect_has().returning(|_| Ok(false));
        store
            .expect_record()
            .returning(|_, _| Err(StorageError::Database("disk I/O error".into())));

        let svc = service(store, ledger_returning(DONE_TX100), grant_ok(0));
        assert_eq!(svc.submit("TX100", "user-1").await, RedemptionOutcome::LookupFailed);
    }

    #[tokio::test]
    async fn test_grant_failure_keeps_record() {
        let store = MemoryRedemptionStore::new();
        let mut grant = MockEntitlementGrant::new();
        grant.expect_grant().times(1).returning(|_| {
            Err(GrantError::Rejected {
                status: 403,
                body: "Missing Permissions".into(),
            })
        });

        let svc = service(store.clone(), ledger_returning(DONE_TX100), grant);

        assert_eq!(svc.submit("TX100", "user-1").await, RedemptionOutcome::GrantFailed);
        assert!(store.has("TX100").await.unwrap());

        // Retry must not grant again
        assert_eq!(svc.submit("TX100", "user-1").await, RedemptionOutcome::AlreadyUsed);
    }

    #[tokio::test]
    async fn test_grant_timeout_is_grant_failed() {
        let store = MemoryRedemptionStore::new();
        let svc = service(store.clone(), ledger_returning(DONE_TX100), SlowGrant);

        assert_eq!(svc.submit("TX100", "user-1").await, RedemptionOutcome::GrantFailed);
        assert!(store.has("TX100").await.unwrap());
    }
}
