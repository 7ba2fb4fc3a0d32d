use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;
use mediadesk_core::delivery::simulation::SimulationParams;
use mediadesk_worker::DeliveryConfig;

/// A configuration value that could not be used.
#[derive(Debug, thiserror::Error)]
#[error("Invalid value '{value}' for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long post-shutdown cleanup may take, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Directory holding the persisted key-value blobs.
    pub data_dir: PathBuf,
    pub delivery: DeliverySettings,
    pub storage: StorageConfig,
    /// Managed data API; `None` selects the in-memory client.
    pub data_api: Option<DataApiConfig>,
}

/// Simulator and retention settings.
#[derive(Debug, Clone)]
pub struct DeliverySettings {
    pub tick_ms: u64,
    pub duration_ms: u64,
    pub retention_days: i64,
}

/// Object storage settings. Without a bucket, URLs are built from
/// `public_base_url`.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: Option<String>,
    pub region: String,
    pub public_base_url: String,
    pub url_ttl_secs: u64,
}

#[derive(Debug, Clone)]
pub struct DataApiConfig {
    pub url: String,
    pub api_key: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                       |
    /// |---------------------------|-------------------------------|
    /// | `HOST`                    | `0.0.0.0`                     |
    /// | `PORT`                    | `3000`                        |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`       |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                          |
    /// | `SHUTDOWN_TIMEOUT_SECS`   | `30`                          |
    /// | `DATA_DIR`                | `./data`                      |
    /// | `DELIVERY_TICK_MS`        | `500`                         |
    /// | `DELIVERY_DURATION_MS`    | `10000`                       |
    /// | `JOB_RETENTION_DAYS`      | `7`                           |
    /// | `STORAGE_BUCKET`          | unset                         |
    /// | `STORAGE_REGION`          | `us-east-1`                   |
    /// | `STORAGE_PUBLIC_BASE_URL` | `http://localhost:3000/files` |
    /// | `STORAGE_URL_TTL_SECS`    | `3600`                        |
    /// | `DATA_API_URL`            | unset                         |
    /// | `DATA_API_KEY`            | unset                         |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".into());
        if host.parse::<std::net::IpAddr>().is_err() {
            return Err(invalid("HOST", &host, "not an IP address"));
        }

        let cors_origins: Vec<String> = get("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for origin in &cors_origins {
            if origin.parse::<HeaderValue>().is_err() {
                return Err(invalid("CORS_ORIGINS", origin, "not a valid origin"));
            }
        }

        let delivery = DeliverySettings {
            tick_ms: parse(&get, "DELIVERY_TICK_MS", 500)?,
            duration_ms: parse(&get, "DELIVERY_DURATION_MS", 10_000)?,
            retention_days: parse(&get, "JOB_RETENTION_DAYS", 7)?,
        };
        if delivery.retention_days <= 0 {
            return Err(invalid(
                "JOB_RETENTION_DAYS",
                &delivery.retention_days.to_string(),
                "must be positive",
            ));
        }

        let public_base_url =
            get("STORAGE_PUBLIC_BASE_URL").unwrap_or_else(|| "http://localhost:3000/files".into());
        if !public_base_url.starts_with("http://") && !public_base_url.starts_with("https://") {
            return Err(invalid(
                "STORAGE_PUBLIC_BASE_URL",
                &public_base_url,
                "must be an http(s) URL",
            ));
        }

        let config = Self {
            host,
            port: parse(&get, "PORT", 3000)?,
            cors_origins,
            request_timeout_secs: parse(&get, "REQUEST_TIMEOUT_SECS", 30)?,
            shutdown_timeout_secs: parse(&get, "SHUTDOWN_TIMEOUT_SECS", 30)?,
            data_dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "./data".into())),
            delivery,
            storage: StorageConfig {
                bucket: get("STORAGE_BUCKET"),
                region: get("STORAGE_REGION").unwrap_or_else(|| "us-east-1".into()),
                public_base_url,
                url_ttl_secs: parse(&get, "STORAGE_URL_TTL_SECS", 3600)?,
            },
            data_api: get("DATA_API_URL").map(|url| DataApiConfig {
                url,
                api_key: get("DATA_API_KEY"),
            }),
        };

        // Surface bad simulator settings at startup, not on first job.
        config.delivery_config()?;
        Ok(config)
    }

    /// Delivery service tunables derived from these settings.
    pub fn delivery_config(&self) -> Result<DeliveryConfig, ConfigError> {
        let simulation = SimulationParams::new(
            Duration::from_millis(self.delivery.tick_ms),
            Duration::from_millis(self.delivery.duration_ms),
        )
        .map_err(|e| invalid("DELIVERY_TICK_MS", &self.delivery.tick_ms.to_string(), &e.to_string()))?;
        Ok(DeliveryConfig {
            simulation,
            retention: chrono::Duration::days(self.delivery.retention_days),
        })
    }

    /// TTL for generated retrieval URLs.
    pub fn storage_url_ttl(&self) -> Duration {
        Duration::from_secs(self.storage.url_ttl_secs)
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(var, &raw, &e.to_string())),
    }
}
