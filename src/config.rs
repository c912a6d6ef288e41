//! Configuration loader for the `solarflow` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). The device list lives here too, so the collector
//! and the history endpoint see the same device identities and labels.
//!
use std::{env, time::Duration};

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// One inverter polled by the collector.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    // ---
    pub id: String,
    pub label: String,

    /// Base URL of the inverter's Solar API, e.g. `http://192.168.1.20`.
    pub url: String,

    /// Cloudflare Access service token, sent when the inverter sits behind a tunnel.
    pub access: Option<AccessToken>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub client_id: String,
    pub client_secret: String,
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Port the HTTP server binds on all interfaces.
    pub listen_port: u16,

    /// Period of the background collector. `None` disables it.
    pub poll_interval: Option<Duration>,

    /// Per-device request timeout for the inverter API.
    pub fetch_timeout: Duration,

    /// Upper bound on the history range query.
    pub query_timeout: Duration,

    /// Display name of the property shown on the live dashboard.
    pub property_label: String,

    pub devices: Vec<DeviceConfig>,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `LISTEN_PORT` – HTTP port (default: 8080)
/// - `POLL_INTERVAL_SECS` – collector period, `0` disables (default: 60)
/// - `FRONIUS_TIMEOUT_MS` – per-device fetch timeout (default: 3500)
/// - `QUERY_TIMEOUT_SECS` – history query timeout (default: 30)
/// - `PROPERTY_LABEL` – dashboard title (default: "Home")
/// - `FRONIUS_DEVICES` – comma-separated device ids, see [`load_devices`]
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = u32::try_from(parse_env_u64!("DB_POOL_MAX", 5))
        .map_err(|e| anyhow!("Invalid DB_POOL_MAX: {}", e))?;
    let listen_port = u16::try_from(parse_env_u64!("LISTEN_PORT", 8080))
        .map_err(|e| anyhow!("Invalid LISTEN_PORT: {}", e))?;
    let poll_secs = parse_env_u64!("POLL_INTERVAL_SECS", 60);
    let fetch_timeout_ms = parse_env_u64!("FRONIUS_TIMEOUT_MS", 3500);
    let query_timeout_secs = parse_env_u64!("QUERY_TIMEOUT_SECS", 30);
    let property_label = env::var("PROPERTY_LABEL").unwrap_or_else(|_| "Home".to_string());

    let device_ids = env::var("FRONIUS_DEVICES").unwrap_or_default();
    let devices = load_devices(&device_ids, |name| env::var(name).ok())?;

    Ok(Config {
        db_url,
        db_pool_max,
        listen_port,
        poll_interval: (poll_secs > 0).then(|| Duration::from_secs(poll_secs)),
        fetch_timeout: Duration::from_millis(fetch_timeout_ms),
        query_timeout: Duration::from_secs(query_timeout_secs),
        property_label,
        devices,
    })
}

/// Build the device list from a comma-separated id list.
///
/// Each id `nelsons-house` reads `FRONIUS_NELSONS_HOUSE_URL` (required),
/// `FRONIUS_NELSONS_HOUSE_LABEL` (defaults to the id) and the optional
/// `FRONIUS_NELSONS_HOUSE_CF_ID` / `FRONIUS_NELSONS_HOUSE_CF_SECRET` pair.
/// The lookup is injected so the parsing can be tested without touching the
/// process environment.
pub fn load_devices<F>(ids: &str, lookup: F) -> Result<Vec<DeviceConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let mut devices: Vec<DeviceConfig> = Vec::new();

    for id in ids.split(',').map(str::trim).filter(|id| !id.is_empty()) {
        if devices.iter().any(|d| d.id == id) {
            return Err(anyhow!("Duplicate device id '{}' in FRONIUS_DEVICES", id));
        }

        let prefix = format!("FRONIUS_{}", id.to_uppercase().replace('-', "_"));
        let url_var = format!("{prefix}_URL");
        let url = lookup(&url_var)
            .ok_or_else(|| anyhow!("{} must be set for device '{}'", url_var, id))?;
        let label = lookup(&format!("{prefix}_LABEL")).unwrap_or_else(|| id.to_string());

        let access = match (
            lookup(&format!("{prefix}_CF_ID")),
            lookup(&format!("{prefix}_CF_SECRET")),
        ) {
            (Some(client_id), Some(client_secret)) => Some(AccessToken {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        devices.push(DeviceConfig {
            id: id.to_string(),
            label,
            url: url.trim_end_matches('/').to_string(),
            access,
        });
    }

    Ok(devices)
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords while showing
    /// all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL       : {}", mask_db_url(&self.db_url));
        tracing::info!("  DB_POOL_MAX        : {}", self.db_pool_max);
        tracing::info!("  LISTEN_PORT        : {}", self.listen_port);
        match self.poll_interval {
            Some(interval) => tracing::info!("  POLL_INTERVAL_SECS : {}", interval.as_secs()),
            None => tracing::info!("  POLL_INTERVAL_SECS : disabled"),
        }
        tracing::info!("  FRONIUS_TIMEOUT_MS : {}", self.fetch_timeout.as_millis());
        tracing::info!("  QUERY_TIMEOUT_SECS : {}", self.query_timeout.as_secs());
        tracing::info!("  PROPERTY_LABEL     : {}", self.property_label);

        if self.devices.is_empty() {
            tracing::warn!("  FRONIUS_DEVICES    : none configured, live polling is idle");
        }
        for device in &self.devices {
            tracing::info!(
                "  device {:<14}: {} ({}) access={}",
                device.id,
                device.url,
                device.label,
                if device.access.is_some() { "****" } else { "none" }
            );
        }
    }
}

/// Mask the password in a database URL for logging.
pub fn mask_db_url(db_url: &str) -> String {
    // ---
    if let Some(at_pos) = db_url.rfind('@') {
        if let Some(colon_pos) = db_url[..at_pos].rfind(':') {
            return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
        }
    }
    db_url.to_string()
}
