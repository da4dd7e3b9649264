//! Redemption Service
//!
//! Turns a submitted purchase transaction id into a granted role, once.
//!
//! # Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    REDEMPTION FLOW                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  1. Check the redemption store                                  │
//! │     └── Already recorded → AlreadyUsed (no ledger call)         │
//! │                                                                 │
//! │  2. Query the payment ledger                                    │
//! │     └── Error / timeout → LookupFailed                          │
//! │     └── No completed row with this id → NotFound                │
//! │                                                                 │
//! │  3. Record the redemption (atomic unique insert)                │
//! │     └── Duplicate → AlreadyUsed (lost a concurrent race)        │
//! │                                                                 │
//! │  4. Grant the entitlement                                       │
//! │     └── Error / timeout → GrantFailed (record stays)            │
//! │     └── Ok → Success                                            │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use ledger_redeem::redemption::{RedemptionConfig, RedemptionService};
//!
//! let service = RedemptionService::new(RedemptionConfig::default(), store, ledger, grant);
//! let outcome = service.submit("TX100", "user-id").await;
//! println!("{}", outcome.user_message());
//! ```

pub mod service;

// Re-exports
pub use service::{RedemptionConfig, RedemptionService};
