use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate)]
pub struct Settings {
    /// Socket the API should listen on.
    #[serde(default = "default_api_socket")]
    pub api_socket: SocketAddr,
    /// Postgres connection URL
    pub database_url: String,
    /// Largest accepted SAT upload in megabytes
    #[serde(default = "default_upload_limit")]
    #[validate(range(min = 1, max = 1024))]
    pub upload_limit_mb: u32,
    #[validate]
    pub remote: RemoteSetting,
    #[serde(default)]
    #[validate]
    pub monitor: MonitorSetting,
}

impl Settings {
    pub fn upload_limit_bytes(&self) -> usize {
        self.upload_limit_mb as usize * 1024 * 1024
    }
}

/// The hardware / solver API that owns test execution.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_remote_setting", skip_on_field_errors = false))]
pub struct RemoteSetting {
    pub url: Url,
    /// Request timeout in seconds
    #[serde(default = "default_remote_timeout")]
    #[validate(range(min = 1, max = 600))]
    pub timeout: u16,
}

impl RemoteSetting {
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout as u64)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct MonitorSetting {
    /// Seconds between health checks
    #[serde(default = "default_health_interval")]
    #[validate(range(min = 1, max = 30))]
    pub health_interval: u8,
    /// Seconds between metric samples
    #[serde(default = "default_metrics_interval")]
    #[validate(range(min = 1, max = 30))]
    pub metrics_interval: u8,
    /// Number of metric samples kept in memory
    #[serde(default = "default_metrics_window")]
    #[validate(range(min = 1, max = 10000))]
    pub metrics_window: usize,
}

impl Default for MonitorSetting {
    fn default() -> Self {
        Self {
            health_interval: default_health_interval(),
            metrics_interval: default_metrics_interval(),
            metrics_window: default_metrics_window(),
        }
    }
}

impl MonitorSetting {
    pub fn health_interval_duration(&self) -> Duration {
        Duration::from_secs(self.health_interval as u64)
    }
    pub fn metrics_interval_duration(&self) -> Duration {
        Duration::from_secs(self.metrics_interval as u64)
    }
}

impl Settings {
    pub fn new(file: Option<&String>) -> anyhow::Result<Self> {
        let mut s = Config::new();
        match file {
            None => {}
            Some(f) => {
                s.merge(File::with_name(f).format(FileFormat::Toml))
                    .context("Failed to loading config from file")?;
            }
        }
        s.merge(Environment::new().separator("__"))
            .context("Failed loading config from environment")?;
        let r: Settings = s.try_into().context("Failed to load config")?;
        r.validate().context("Failed to validate config")?;
        Ok(r)
    }
}

fn default_api_socket() -> SocketAddr {
    "0.0.0.0:80".parse().unwrap()
}

fn default_upload_limit() -> u32 {
    50
}

fn default_remote_timeout() -> u16 {
    10
}

fn default_health_interval() -> u8 {
    10
}

fn default_metrics_interval() -> u8 {
    30
}

fn default_metrics_window() -> usize {
    120
}

fn validate_remote_setting(remote: &RemoteSetting) -> Result<(), ValidationError> {
    if !matches!(remote.url.scheme(), "http" | "https") {
        return Err(ValidationError::new("Remote url must be http or https"));
    }
    if remote.url.cannot_be_a_base() {
        return Err(ValidationError::new("Remote url must be a base url"));
    }
    if !remote.url.path().ends_with('/') {
        return Err(ValidationError::new("Remote url path must end with /"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(url: &str) -> RemoteSetting {
        RemoteSetting {
            url: url.parse().unwrap(),
            timeout: 10,
        }
    }

    #[test]
    fn remote_url_must_be_http() {
        assert!(remote("https://api.example.com/").validate().is_ok());
        assert!(remote("ftp://api.example.com/").validate().is_err());
        assert!(remote("https://example.com/api").validate().is_err());
        assert!(remote("https://example.com/api/").validate().is_ok());
    }

    #[test]
    fn monitor_intervals_are_bounded() {
        let mut monitor = MonitorSetting::default();
        assert!(monitor.validate().is_ok());
        monitor.health_interval = 0;
        assert!(monitor.validate().is_err());
        monitor.health_interval = 31;
        assert!(monitor.validate().is_err());
    }

    #[test]
    fn upload_limit_in_bytes() {
        let settings = Settings {
            api_socket: default_api_socket(),
            database_url: "postgres://localhost/dacroq".into(),
            upload_limit_mb: 2,
            remote: remote("http://localhost:8001/"),
            monitor: MonitorSetting::default(),
        };
        assert!(settings.validate().is_ok());
        assert_eq!(settings.upload_limit_bytes(), 2 * 1024 * 1024);
    }
}
