//! Application settings and configuration
//!
//! This module provides configuration management for the application,
//! loading settings from environment variables with sensible defaults.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fmt;

/// The clearly-labeled insecure secret substituted in development when no
/// real `JWT_SECRET` is configured. Never accepted in production.
pub const INSECURE_DEV_SECRET: &str = "insecure-dev-secret-do-not-use";

/// Known placeholder values that must never be used as a signing secret.
const INSECURE_PLACEHOLDERS: [&str; 5] = [
    "secret",
    "changeme",
    "change-me",
    "dev-secret",
    INSECURE_DEV_SECRET,
];

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl Environment {
    /// Staging is held to production's security bar: a weak signing secret
    /// is fatal in both.
    pub fn is_production_like(&self) -> bool {
        !matches!(self, Environment::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!(
                "Invalid environment: {}. Expected: development, staging, or production",
                s
            ),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,

    // Server settings
    pub host: String,
    pub port: u16,

    // Authentication
    /// Static API key whitelist, loaded once at process start
    #[serde(skip_serializing)]
    pub api_keys: HashSet<String>,

    /// Shared HS256 signing secret for JWT verification.
    /// Always `Some` after a successful `load`; the auth middleware treats
    /// `None` as a server misconfiguration and rejects with 500.
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignored in production typically)
        dotenvy::dotenv().ok();

        let environment: Environment = env_or_default("ENVIRONMENT", "development")
            .parse()
            .unwrap_or_default();

        let jwt_secret = resolve_jwt_secret(environment, env::var("JWT_SECRET").ok().as_deref())?;

        let settings = Self {
            // App settings
            app_name: env_or_default("APP_NAME", "chat-gateway"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment,
            log_level: env_or_default("LOG_LEVEL", "info"),

            // Server settings
            host: env_or_default("HOST", "0.0.0.0"),
            port: env_or_default("PORT", "8000")
                .parse()
                .context("Invalid PORT value")?,

            // Authentication
            api_keys: parse_api_keys(&env_or_default("API_KEYS", "")),
            jwt_secret: Some(jwt_secret),
        };

        // Validate settings
        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    fn validate(&self) -> Result<()> {
        // Validate port range
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        // An empty whitelist disables the API-key path entirely; callers can
        // still authenticate with a JWT, so this is a warning, not an error.
        if self.api_keys.is_empty() {
            tracing::warn!("API_KEYS is empty; only JWT authentication will succeed");
        }

        Ok(())
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "chat-gateway".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            api_keys: HashSet::new(),
            jwt_secret: None,
        }
    }
}

/// Parse the comma-separated API key whitelist.
///
/// Entries are trimmed and empty entries are dropped, so `"a, b,,c"` yields
/// three keys.
pub fn parse_api_keys(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve the JWT signing secret against the startup precondition.
///
/// A missing, empty, or known-placeholder secret is fatal in a
/// production-like environment. In development it is downgraded to a
/// warning and the labeled insecure default is substituted.
pub fn resolve_jwt_secret(environment: Environment, raw: Option<&str>) -> Result<String> {
    if let Some(secret) = raw {
        let trimmed = secret.trim();
        if !trimmed.is_empty() && !is_insecure_placeholder(trimmed) {
            return Ok(trimmed.to_string());
        }
    }

    if environment.is_production_like() {
        anyhow::bail!(
            "JWT_SECRET must be set to a strong value in {} (missing, empty, or a known placeholder)",
            environment
        );
    }

    tracing::warn!(
        substitute = INSECURE_DEV_SECRET,
        "JWT_SECRET is missing or a known placeholder; substituting the insecure development default"
    );
    Ok(INSECURE_DEV_SECRET.to_string())
}

fn is_insecure_placeholder(secret: &str) -> bool {
    let lowered = secret.to_ascii_lowercase();
    INSECURE_PLACEHOLDERS.contains(&lowered.as_str())
}

/// Helper function to get environment variable with default
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
