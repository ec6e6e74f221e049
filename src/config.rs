//! Environment-sourced configuration, loaded once at process start.
//!
//! Grounded on the original service's `internal/config/config.go`
//! "read a required variable, fail fast" idiom, generalized to the full
//! option set in SPEC_FULL.md §4.9.

use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Full runtime configuration for the engine.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub upstream_api_url: String,
    pub upstream_client_id: String,
    pub upstream_client_secret: String,
    pub oidc_issuer: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
    pub billing_timezone: String,
    pub debug_disable_auth: bool,
    /// RSA public key (PEM) used to verify OIDC bearer tokens on admin
    /// routes. Absent unless `OIDC_JWT_PUBLIC_KEY` is set, in which case
    /// those routes 500 until it is configured or auth is disabled.
    pub oidc_jwt_public_key: Option<String>,
}

impl Config {
    /// Load configuration from the process environment. Returns
    /// [`ConfigError`] describing the first missing or malformed value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            upstream_api_url: required("UPSTREAM_API_URL")?,
            upstream_client_id: required("UPSTREAM_CLIENT_ID")?,
            upstream_client_secret: required("UPSTREAM_CLIENT_SECRET")?,
            oidc_issuer: required("OIDC_ISSUER")?,
            log_level: optional("LOG_LEVEL", "info"),
            host: optional("HOST", ""),
            port: parse_optional("PORT", 8080)?,
            billing_timezone: optional("BILLING_TIMEZONE", "America/New_York"),
            debug_disable_auth: parse_bool_optional("DEBUG_DISABLE_AUTH", false)?,
            oidc_jwt_public_key: env::var("OIDC_JWT_PUBLIC_KEY").ok().filter(|v| !v.is_empty()),
        })
    }

    /// The per-job worker timeout mandated by SPEC_FULL.md §4.7/§5.
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(10 * 60)
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn optional(name: &'static str, default: &str) -> String {
    env::var(name).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}

fn parse_optional(name: &'static str, default: u16) -> Result<u16, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.is_empty() => v.parse().map_err(|_| ConfigError::Invalid { name, value: v }),
        _ => Ok(default),
    }
}

fn parse_bool_optional(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.is_empty() => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value: v }),
        },
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variable mutation is process-global; serialize tests that touch it.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_all() {
        for k in [
            "DATABASE_URL",
            "UPSTREAM_API_URL",
            "UPSTREAM_CLIENT_ID",
            "UPSTREAM_CLIENT_SECRET",
            "OIDC_ISSUER",
            "LOG_LEVEL",
            "HOST",
            "PORT",
            "BILLING_TIMEZONE",
            "DEBUG_DISABLE_AUTH",
            "OIDC_JWT_PUBLIC_KEY",
        ] {
            env::remove_var(k);
        }
    }

    #[test]
    fn missing_required_variable_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn defaults_apply_when_optional_vars_absent() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        env::set_var("DATABASE_URL", "postgres://localhost/usage");
        env::set_var("UPSTREAM_API_URL", "https://api.example.com");
        env::set_var("UPSTREAM_CLIENT_ID", "client");
        env::set_var("UPSTREAM_CLIENT_SECRET", "secret");
        env::set_var("OIDC_ISSUER", "https://issuer.example.com");

        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.billing_timezone, "America/New_York");
        assert!(!cfg.debug_disable_auth);
        clear_all();
    }

    #[test]
    fn invalid_port_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        env::set_var("DATABASE_URL", "postgres://localhost/usage");
        env::set_var("UPSTREAM_API_URL", "https://api.example.com");
        env::set_var("UPSTREAM_CLIENT_ID", "client");
        env::set_var("UPSTREAM_CLIENT_SECRET", "secret");
        env::set_var("OIDC_ISSUER", "https://issuer.example.com");
        env::set_var("PORT", "not-a-number");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
        clear_all();
    }
}
