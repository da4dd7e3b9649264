//! Common Infrastructure Module
//!
//! Shared utilities and configuration for the redemption service.
//!
//! This module contains:
//! - Configuration loading from environment variables
//! - Structured logging setup
//! - Common error types

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::{AppConfig, ConfigError, GrantSettings, LedgerSettings};
pub use error::{RedeemError, Result};
pub use logging::{
    generate_correlation_id, init_from_config, init_logging, log_api_request,
    log_redemption_event, ErrorDetails, EventCategory, LogEvent, LogLevel, LoggingError,
};
