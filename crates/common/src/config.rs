//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Store providers understood by the document store factory
pub const STORE_PROVIDERS: &[&str] = &["memory", "postgres"];

/// Notification providers understood by the notification service factory
pub const NOTIFICATION_PROVIDERS: &[&str] = &["store", "mock"];

/// Capacity policies understood by the waitlist guard
pub const CAPACITY_POLICIES: &[&str] = &["all_entries", "active_entries", "waiting_only"];

/// Log output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Raw capacity policy name, parsed by the waitlist domain
pub type CapacityPolicySetting = String;

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Document store provider (memory, postgres)
    pub store_provider: String,

    /// Database connection URL, required for the postgres store
    pub database_url: Option<String>,

    /// Notification provider (store, mock)
    pub notification_provider: String,

    /// Which waitlist rows count against an event's entrant limit
    pub capacity_policy: CapacityPolicySetting,

    /// Runtime configuration
    pub rust_log: String,
    pub log_format: LogFormat,
    pub port: u16,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("store_provider", &self.store_provider)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("notification_provider", &self.notification_provider)
            .field("capacity_policy", &self.capacity_policy)
            .field("rust_log", &self.rust_log)
            .field("log_format", &self.log_format)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_provider = lookup("STORE_PROVIDER").unwrap_or_else(|| "memory".to_string());
        ensure_known("STORE_PROVIDER", &store_provider, STORE_PROVIDERS)?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        if store_provider == "postgres" && database_url.is_none() {
            bail!("DATABASE_URL is required for the postgres store");
        }

        let notification_provider =
            lookup("NOTIFICATION_PROVIDER").unwrap_or_else(|| "store".to_string());
        ensure_known(
            "NOTIFICATION_PROVIDER",
            &notification_provider,
            NOTIFICATION_PROVIDERS,
        )?;

        let capacity_policy =
            lookup("WAITLIST_CAPACITY_POLICY").unwrap_or_else(|| "all_entries".to_string());
        ensure_known(
            "WAITLIST_CAPACITY_POLICY",
            &capacity_policy,
            CAPACITY_POLICIES,
        )?;

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("LOG_FORMAT must be pretty or json, got {other}"),
        };

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid port number, got {raw}"))?,
            None => 3000,
        };

        Ok(Self {
            store_provider,
            database_url,
            notification_provider,
            capacity_policy,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "konoha=debug".to_string()),
            log_format,
            port,
        })
    }
}

fn ensure_known(name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.contains(&value) {
        bail!(
            "Unknown {name}: {value}. Supported values: {}",
            allowed.join(", ")
        );
    }
    Ok(())
}
