//! Environment-based Configuration
//!
//! All credentials (provider API key, bot token) MUST come from environment
//! variables, never from hardcoded values. A `.env` file is honoured by the
//! binary through `dotenv`.
//!
//! # Required Environment Variables
//!
//! ## Payment Ledger
//! - `REDEEM_MERCHANT_ID` - Merchant id (URL path and Basic auth user)
//! - `REDEEM_API_KEY` - Merchant API key (Basic auth password)
//! - `REDEEM_PROJECT_ID` - Project the transaction search is scoped to
//!
//! ## Role Grant
//! - `REDEEM_BOT_TOKEN` - Discord bot token
//! - `REDEEM_GUILD_ID` - Guild the role lives in
//! - `REDEEM_ROLE_ID` - Role granted on successful redemption
//!
//! ## Optional Settings
//! - `REDEEM_LEDGER_URL` - Provider base URL (default: https://api.xsolla.com)
//! - `REDEEM_LEDGER_TIMEOUT_SECS` - Ledger query bound (default: 10)
//! - `REDEEM_DISCORD_API` - Discord REST base (default: https://discord.com/api/v10)
//! - `REDEEM_GRANT_TIMEOUT_SECS` - Grant call bound (default: 10)
//! - `REDEEM_DATABASE_PATH` - SQLite file (default: ./database.db)
//! - `REDEEM_API_PORT` - HTTP adapter port (default: 3001)
//! - `REDEEM_LOG_LEVEL` - Logging level (debug, info, warn, error)
//! - `REDEEM_LOG_JSON` - Set to "1" for JSON log output

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_LEDGER_URL: &str = "https://api.xsolla.com";
pub const DEFAULT_DISCORD_API: &str = "https://discord.com/api/v10";
pub const DEFAULT_DATABASE_PATH: &str = "./database.db";
pub const DEFAULT_API_PORT: u16 = 3001;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Connection settings for the payment ledger
#[derive(Debug, Clone)]
pub struct LedgerSettings {
    pub base_url: String,
    pub merchant_id: String,
    pub api_key: String,
    pub project_id: String,
    pub timeout: Duration,
}

/// Connection settings for the role grant
#[derive(Debug, Clone)]
pub struct GrantSettings {
    pub api_base: String,
    pub bot_token: String,
    pub guild_id: String,
    pub role_id: String,
    pub timeout: Duration,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ledger: LedgerSettings,
    pub grant: GrantSettings,
    pub database_path: PathBuf,
    pub api_port: u16,
    pub log_level: String,
    pub log_json: bool,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let ledger = LedgerSettings {
            base_url: lookup("REDEEM_LEDGER_URL")
                .unwrap_or_else(|| DEFAULT_LEDGER_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            merchant_id: required("REDEEM_MERCHANT_ID")?,
            api_key: required("REDEEM_API_KEY")?,
            project_id: required("REDEEM_PROJECT_ID")?,
            timeout: parse_secs(&lookup, "REDEEM_LEDGER_TIMEOUT_SECS")?,
        };

        let grant = GrantSettings {
            api_base: lookup("REDEEM_DISCORD_API")
                .unwrap_or_else(|| DEFAULT_DISCORD_API.to_string())
                .trim_end_matches('/')
                .to_string(),
            bot_token: required("REDEEM_BOT_TOKEN")?,
            guild_id: required("REDEEM_GUILD_ID")?,
            role_id: required("REDEEM_ROLE_ID")?,
            timeout: parse_secs(&lookup, "REDEEM_GRANT_TIMEOUT_SECS")?,
        };

        let database_path = lookup("REDEEM_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

        let api_port = match lookup("REDEEM_API_PORT") {
            Some(v) => v.parse().map_err(|_| {
                ConfigError::InvalidValue("REDEEM_API_PORT".to_string(), v.clone())
            })?,
            None => DEFAULT_API_PORT,
        };

        let log_level = lookup("REDEEM_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_json = lookup("REDEEM_LOG_JSON").map(|v| v == "1").unwrap_or(false);

        Ok(Self {
            ledger,
            grant,
            database_path,
            api_port,
            log_level,
            log_json,
        })
    }

    /// Print configuration summary (hiding sensitive values)
    pub fn print_summary(&self) {
        println!("=== Redemption Configuration ===");
        println!("Ledger URL: {}", self.ledger.base_url);
        println!("Merchant ID: {}", self.ledger.merchant_id);
        println!("Project ID: {}", self.ledger.project_id);
        println!("Ledger Timeout: {:?}", self.ledger.timeout);
        println!("Guild / Role: {} / {}", self.grant.guild_id, self.grant.role_id);
        println!("Grant Timeout: {:?}", self.grant.timeout);
        println!("Database: {}", self.database_path.display());
        println!("API Port: {}", self.api_port);
        println!("Log Level: {}", self.log_level);
        println!("================================");
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match lookup(key) {
        Some(v) => v
            .parse::<u64>()
            .ok()
            .filter(|s| *s > 0)
            .ok_or_else(|| ConfigError::InvalidValue(key.to_string(), v.clone()))?,
        None => DEFAULT_TIMEOUT_SECS,
    };
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("REDEEM_MERCHANT_ID", "12345"),
            ("REDEEM_API_KEY", "secret"),
            ("REDEEM_PROJECT_ID", "678"),
            ("REDEEM_BOT_TOKEN", "bot-token"),
            ("REDEEM_GUILD_ID", "111"),
            ("REDEEM_ROLE_ID", "222"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_source(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_env()).unwrap();

        assert_eq!(config.ledger.base_url, DEFAULT_LEDGER_URL);
        assert_eq!(config.ledger.timeout, Duration::from_secs(10));
        assert_eq!(config.grant.api_base, DEFAULT_DISCORD_API);
        assert_eq!(config.database_path, PathBuf::from("./database.db"));
        assert_eq!(config.api_port, 3001);
        assert!(!config.log_json);
    }

    #[test]
    fn test_missing_required() {
        let mut vars = base_env();
        vars.remove("REDEEM_API_KEY");

        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "REDEEM_API_KEY"));
    }

    #[test]
    fn test_invalid_timeout() {
        let mut vars = base_env();
        vars.insert("REDEEM_LEDGER_TIMEOUT_SECS", "0");
        assert!(matches!(load(&vars), Err(ConfigError::InvalidValue(..))));

        vars.insert("REDEEM_LEDGER_TIMEOUT_SECS", "soon");
        assert!(matches!(load(&vars), Err(ConfigError::InvalidValue(..))));
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_env();
        vars.insert("REDEEM_LEDGER_URL", "http://127.0.0.1:9000/");
        vars.insert("REDEEM_API_PORT", "8080");
        vars.insert("REDEEM_LOG_JSON", "1");

        let config = load(&vars).unwrap();
        assert_eq!(config.ledger.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.api_port, 8080);
        assert!(config.log_json);
    }
}
