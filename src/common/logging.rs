//! Structured Logging
//!
//! Provides structured logging with:
//! - JSON output for log aggregation
//! - Correlation IDs tying every log line of one redemption together
//! - One outcome event per redemption request
//!
//! # Usage
//!
//! ```rust,ignore
//! use ledger_redeem::common::logging::{init_logging, LogLevel};
//!
//! init_logging(LogLevel::Info, true)?; // JSON mode for production
//!
//! tracing::info!(target: "redeem::ledger", transaction_id = %id, "Querying ledger");
//! ```

use serde::Serialize;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

// ============================================================================
// Log Levels
// ============================================================================

/// Application log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive name used in the `EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

// ============================================================================
// Structured Event Types
// ============================================================================

/// Event categories for structured logging
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Adapter request events
    Api,
    /// Redemption outcomes
    Redemption,
}

/// One JSON line per adapter request or redemption outcome
#[derive(Debug, Serialize)]
pub struct LogEvent {
    /// RFC 3339
    pub timestamp: String,
    pub level: LogLevel,
    pub category: EventCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

/// Error details for error events
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl LogEvent {
    pub fn new(level: LogLevel, category: EventCategory, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level,
            category,
            message: message.into(),
            correlation_id: None,
            data: None,
            duration_ms: None,
            error: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error = Some(ErrorDetails {
            code: code.into(),
            message: message.into(),
        });
        self
    }

    /// Serialize to one JSON line; falls back to the bare message
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }
}

// ============================================================================
// Event Helpers
// ============================================================================

/// Log an adapter request
pub fn log_api_request(method: &str, path: &str, correlation_id: &str) {
    let event = LogEvent::new(LogLevel::Info, EventCategory::Api, format!("{} {}", method, path))
        .with_correlation_id(correlation_id)
        .with_data(serde_json::json!({
            "method": method,
            "path": path,
        }));

    tracing::info!(target: "redeem::api", "{}", event.to_json());
}

/// Log the terminal outcome of one redemption request
///
/// `detail` carries internal error text. It goes to the log only and never
/// to the user.
pub fn log_redemption_event(
    outcome: &str,
    correlation_id: &str,
    transaction_id: &str,
    requester: &str,
    duration_ms: u64,
    detail: Option<&str>,
) {
    let failed = detail.is_some();
    let level = if failed { LogLevel::Error } else { LogLevel::Info };
    let mut event = LogEvent::new(level, EventCategory::Redemption, outcome)
        .with_correlation_id(correlation_id)
        .with_duration(duration_ms)
        .with_data(serde_json::json!({
            "transaction_id": transaction_id,
            "requester": requester,
        }));

    if let Some(err) = detail {
        event = event.with_error(outcome.to_uppercase(), err);
    }

    if failed {
        tracing::error!(target: "redeem::redemption", "{}", event.to_json());
    } else {
        tracing::info!(target: "redeem::redemption", "{}", event.to_json());
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_logging(level: LogLevel, json_format: bool) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "redeem={lvl},ledger_redeem={lvl},tower_http={lvl},axum={lvl}",
            lvl = level.as_str()
        ))
    });

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    }

    Ok(())
}

/// Initialize logging from AppConfig
pub fn init_from_config(config: &super::config::AppConfig) -> Result<(), LoggingError> {
    init_logging(LogLevel::from(config.log_level.as_str()), config.log_json)
}

/// Logging errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to initialize logging: {0}")]
    InitFailed(String),
}

/// Generate a unique correlation ID for request tracing
pub fn generate_correlation_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_serialization() {
        let event = LogEvent::new(LogLevel::Info, EventCategory::Redemption, "success")
            .with_correlation_id("req-123")
            .with_data(serde_json::json!({"transaction_id": "TX100"}))
            .with_duration(42);

        let json = event.to_json();
        assert!(json.contains("\"category\":\"redemption\""));
        assert!(json.contains("\"level\":\"INFO\""));
        assert!(json.contains("req-123"));
        assert!(json.contains("TX100"));
        assert!(json.contains("42"));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::from("INFO"), LogLevel::Info);
        assert_eq!(LogLevel::from("warning"), LogLevel::Warn);
        assert_eq!(LogLevel::from("unknown"), LogLevel::Info);
    }

    #[test]
    fn test_correlation_ids_are_unique() {
        let id1 = generate_correlation_id();
        let id2 = generate_correlation_id();

        assert_eq!(id1.len(), 32);
        assert_ne!(id1, id2);
    }
}
