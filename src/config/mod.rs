use std::time::Duration;

use serde::Deserialize;

use crate::services::queue::QueueConfig;
use crate::services::scrapers::BrowserConfig;
use crate::services::webhook::WebhookConfig;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3001").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Bearer credential required on every path except the liveness check
    pub api_key: String,

    /// Deployment environment; "production" enables strict checks
    #[serde(default = "default_app_env")]
    pub app_env: String,

    /// Shared secret for signing outbound webhooks
    #[serde(default)]
    pub webhook_secret: Option<String>,

    #[serde(default = "default_webhook_timeout_secs")]
    pub webhook_timeout_secs: u64,

    /// Send `job.progress` when a job starts running
    #[serde(default)]
    pub webhook_progress_events: bool,

    #[serde(default = "default_queue_poll_interval_ms")]
    pub queue_poll_interval_ms: u64,

    /// WebDriver endpoint driving headless Chrome
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,

    #[serde(default = "default_dns_timeout_secs")]
    pub dns_timeout_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_webhook_timeout_secs() -> u64 {
    10
}

fn default_queue_poll_interval_ms() -> u64 {
    1000
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_scroll_settle_ms() -> u64 {
    1500
}

fn default_dns_timeout_secs() -> u64 {
    5
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: AppConfig = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    fn secret(&self) -> Option<&str> {
        self.webhook_secret.as_deref().filter(|s| !s.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        if self.is_production() && self.secret().is_none() {
            return Err(ConfigError::MissingWebhookSecret);
        }
        Ok(())
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            poll_interval: Duration::from_millis(self.queue_poll_interval_ms),
        }
    }

    pub fn webhook_config(&self) -> WebhookConfig {
        if self.secret().is_none() {
            tracing::warn!("WEBHOOK_SECRET not set; webhooks are signed with an empty key");
        }
        WebhookConfig {
            secret: self.secret().unwrap_or_default().to_string(),
            timeout: Duration::from_secs(self.webhook_timeout_secs),
            progress_events: self.webhook_progress_events,
        }
    }

    pub fn browser_config(&self) -> BrowserConfig {
        BrowserConfig {
            webdriver_url: self.webdriver_url.clone(),
            navigation_timeout: Duration::from_secs(self.navigation_timeout_secs),
            scroll_settle: Duration::from_millis(self.scroll_settle_ms),
        }
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("API_KEY must not be empty")]
    EmptyApiKey,

    #[error("WEBHOOK_SECRET is required when APP_ENV=production")]
    MissingWebhookSecret,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, envy::Error> {
        envy::from_iter(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("API_KEY", "k")]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3001");
        assert_eq!(config.webhook_timeout_secs, 10);
        assert_eq!(config.queue_config().poll_interval, Duration::from_secs(1));
        assert!(!config.webhook_progress_events);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_key_required() {
        assert!(config_from(&[]).is_err());
        let config = config_from(&[("API_KEY", " ")]).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyApiKey)));
    }

    #[test]
    fn test_production_requires_secret() {
        let config = config_from(&[("API_KEY", "k"), ("APP_ENV", "production")]).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::MissingWebhookSecret)));

        let config = config_from(&[
            ("API_KEY", "k"),
            ("APP_ENV", "production"),
            ("WEBHOOK_SECRET", "s3cret"),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.webhook_config().secret, "s3cret");
    }

    #[test]
    fn test_empty_secret_outside_production() {
        let config = config_from(&[("API_KEY", "k"), ("WEBHOOK_SECRET", "")]).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.webhook_config().secret, "");
    }
}
