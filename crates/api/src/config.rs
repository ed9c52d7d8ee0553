//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use workflow::{CommitPolicy, DEFAULT_SESSION_LIFETIME, MAX_SESSION_LIFETIME};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default `"0.0.0.0"`)
/// - `PORT`: listen port (default `8080`)
/// - `RUST_LOG`: tracing filter directive (default `"info"`)
/// - `DATABASE_URL`: PostgreSQL URL; unset runs on the seeded in-memory store
/// - `DB_QUERY_TIMEOUT_SECS`: per-query timeout (default `3`)
/// - `SESSION_LIFETIME_HOURS`: idle session lifetime, 1 hour to 1 year (default `24`)
/// - `IN_PRODUCTION`: marks the session cookie `Secure` (default `false`)
/// - `CSRF_PROTECTION`: require a token on form posts (default `true`)
/// - `COMMIT_POLICY`: `two-step` or `transactional` (default `two-step`)
///
/// Unparseable values fall back to the default.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub db_query_timeout: Duration,
    pub session_lifetime: Duration,
    pub in_production: bool,
    pub csrf_protection: bool,
    pub commit_policy: CommitPolicy,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            db_query_timeout: parsed(&lookup, "DB_QUERY_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.db_query_timeout),
            session_lifetime: parsed(&lookup, "SESSION_LIFETIME_HOURS")
                .and_then(session_lifetime)
                .unwrap_or(defaults.session_lifetime),
            in_production: lookup("IN_PRODUCTION")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.in_production),
            csrf_protection: lookup("CSRF_PROTECTION")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.csrf_protection),
            commit_policy: parsed(&lookup, "COMMIT_POLICY").unwrap_or(defaults.commit_policy),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            database_url: None,
            db_query_timeout: Duration::from_secs(3),
            session_lifetime: DEFAULT_SESSION_LIFETIME,
            in_production: false,
            csrf_protection: true,
            commit_policy: CommitPolicy::TwoStep,
        }
    }
}

fn session_lifetime(hours: u64) -> Option<Duration> {
    let secs = hours.checked_mul(60 * 60)?;
    let lifetime = Duration::from_secs(secs);
    (hours > 0 && lifetime <= MAX_SESSION_LIFETIME).then_some(lifetime)
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
