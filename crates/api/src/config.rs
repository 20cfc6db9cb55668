//! Application configuration loaded from environment variables.

use std::time::Duration;

use common::{CallerIdentity, ClientId, Role};
use domain::{RetryPolicy, StockPolicy, UnknownStockPolicy};
use recommend::ContextLimits;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    StockPolicy(#[from] UnknownStockPolicy),

    #[error("Malformed AUTH_TOKENS entry {0:?} (expected token=uuid:role)")]
    AuthToken(String),
}

/// A bearer token and the identity it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub token: String,
    pub identity: CallerIdentity,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`, `RUST_LOG`
/// - `DATABASE_URL`: PostgreSQL when set, in-memory otherwise
/// - `DATABASE_MAX_CONNECTIONS` (default: `5`)
/// - `STOCK_POLICY`: `strict` (default) or `clamp`
/// - `STOCK_RETRY_ATTEMPTS` (default: `3`), `STOCK_RETRY_BASE_MS` (default: `25`)
/// - `RECOMMEND_MAX_LINES` (default: `200`), `RECOMMEND_MAX_CHARS` (default: `12000`)
/// - `AUTH_TOKENS`: comma-separated `token=uuid:role` grants
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub stock_policy: StockPolicy,
    pub stock_retry_attempts: u32,
    pub stock_retry_base_ms: u64,
    pub recommend_max_lines: usize,
    pub recommend_max_chars: usize,
    pub auth_tokens: Vec<TokenGrant>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    ///
    /// Unparseable numbers fall back to their default; an unknown stock
    /// policy or a malformed token grant is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let stock_policy = match std::env::var("STOCK_POLICY") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.stock_policy,
        };
        let auth_tokens = match std::env::var("AUTH_TOKENS") {
            Ok(raw) => parse_auth_tokens(&raw)?,
            Err(_) => defaults.auth_tokens,
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            database_max_connections: env_or(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            stock_policy,
            stock_retry_attempts: env_or("STOCK_RETRY_ATTEMPTS", defaults.stock_retry_attempts),
            stock_retry_base_ms: env_or("STOCK_RETRY_BASE_MS", defaults.stock_retry_base_ms),
            recommend_max_lines: env_or("RECOMMEND_MAX_LINES", defaults.recommend_max_lines),
            recommend_max_chars: env_or("RECOMMEND_MAX_CHARS", defaults.recommend_max_chars),
            auth_tokens,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.stock_retry_attempts,
            Duration::from_millis(self.stock_retry_base_ms),
        )
    }

    pub fn context_limits(&self) -> ContextLimits {
        ContextLimits {
            max_lines: self.recommend_max_lines,
            max_chars: self.recommend_max_chars,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let limits = ContextLimits::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            database_max_connections: 5,
            stock_policy: StockPolicy::default(),
            stock_retry_attempts: 3,
            stock_retry_base_ms: 25,
            recommend_max_lines: limits.max_lines,
            recommend_max_chars: limits.max_chars,
            auth_tokens: Vec::new(),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses `token=uuid:role` grants separated by commas.
pub fn parse_auth_tokens(raw: &str) -> Result<Vec<TokenGrant>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let malformed = || ConfigError::AuthToken(entry.to_string());
            let (token, identity) = entry.split_once('=').ok_or_else(malformed)?;
            let (user_id, role) = identity.split_once(':').ok_or_else(malformed)?;
            let user_id: ClientId = user_id.trim().parse().map_err(|_| malformed())?;
            let role: Role = role.trim().parse().unwrap_or_default();

            let token = token.trim();
            if token.is_empty() {
                return Err(malformed());
            }
            Ok(TokenGrant {
                token: token.to_string(),
                identity: CallerIdentity::new(user_id, role),
            })
        })
        .collect()
}
