//! Ledger Redeem - Single-Use Purchase Redemption
//!
//! Verifies a user-submitted purchase transaction id against the payment
//! provider's transaction ledger and, on the first successful match, grants
//! the user a role exactly once.
//!
//! ## Components
//!
//! 1. **Ledger Client** - Searches the provider's transaction reports
//! 2. **Redemption Store** - Durable single-use record of redeemed ids
//! 3. **Redemption Service** - Store check → ledger query → record → grant
//! 4. **Grant** - Assigns the entitlement (Discord guild role)
//! 5. **API** - HTTP adapter that submits ids and renders outcomes

pub mod api;
pub mod common;
pub mod grant;
pub mod ledger;
pub mod redemption;
pub mod storage;
pub mod types;

// Re-exports: Common infrastructure
pub use common::{AppConfig, ConfigError, RedeemError, Result};

// Re-exports: Ledger client
pub use ledger::{LedgerError, TransactionLedger, XsollaLedgerClient};

// Re-exports: Redemption store
pub use storage::{
    MemoryRedemptionStore, RedemptionStore, SqliteRedemptionStore, StorageError, StorageResult,
};

// Re-exports: Grant
pub use grant::{DiscordRoleGrant, DiscordUserId, EntitlementGrant, GrantError};

// Re-exports: Redemption service
pub use redemption::{RedemptionConfig, RedemptionService};

// Re-exports: Types
pub use types::{
    LedgerTransaction, RedemptionOutcome, RedemptionRecord, RedemptionRequest, RedemptionStats,
    TransactionStatus,
};
