//! NPS widget configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `host.widget-url`
pub const WIDGET_URL_ENV: &str = "NPS_WIDGET_URL";

/// Placeholder frame URL, replaced at deployment
pub const DEFAULT_WIDGET_URL: &str = "https://your-production-domain.com";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Host page launcher settings
    pub host: HostConfig,

    /// Embedded feedback app settings
    pub feedback: FeedbackConfig,

    /// Client-local storage settings
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration with fallback chain, then apply environment overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file_chain(config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load only the log level, ignoring any errors
    ///
    /// Used before logging is initialised so the config file can pick the level.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load_file_chain(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_file_chain(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local config: .npswidget.yml
        let local_config = PathBuf::from(".npswidget.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // User config: ~/.config/npswidget/npswidget.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("npswidget").join("npswidget.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply `NPS_WIDGET_URL`; an empty value counts as unset
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(WIDGET_URL_ENV)
            && !url.trim().is_empty()
        {
            tracing::debug!(%url, "apply_env_overrides: widget url from environment");
            self.host.widget_url = Some(url);
        }
    }
}

/// Host page launcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// URL loaded into the embedded frame; also the source of the trusted origin
    #[serde(rename = "widget-url")]
    pub widget_url: Option<String>,

    /// URL of the page hosting the launcher (origin stamped on host messages)
    #[serde(rename = "page-url")]
    pub page_url: String,

    /// Delay before auto-opening on first visit
    #[serde(rename = "auto-open-delay-ms")]
    pub auto_open_delay_ms: u64,

    /// Lock body scrolling while the overlay is open
    #[serde(rename = "scroll-lock")]
    pub scroll_lock: bool,
}

impl HostConfig {
    /// Configured frame URL, or the placeholder when unset or blank
    pub fn effective_widget_url(&self) -> &str {
        match self.widget_url.as_deref() {
            Some(url) if !url.trim().is_empty() => url,
            _ => DEFAULT_WIDGET_URL,
        }
    }

    pub fn auto_open_delay(&self) -> Duration {
        Duration::from_millis(self.auto_open_delay_ms)
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            widget_url: None,
            page_url: "http://localhost:8080".to_string(),
            auto_open_delay_ms: 1000,
            scroll_lock: true,
        }
    }
}

/// Embedded feedback app configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Endpoint receiving `{rating, feedback}` submissions
    #[serde(rename = "api-url")]
    pub api_url: String,

    /// External review page opened for happy users
    #[serde(rename = "review-url")]
    pub review_url: String,

    /// URL of the parent page trusted to send RESET; unset trusts the host page origin
    #[serde(rename = "parent-url")]
    pub parent_url: Option<String>,

    /// Lowest score routed to the external review page
    #[serde(rename = "positive-threshold")]
    pub positive_threshold: u8,

    /// Highest score that shows the follow-up form
    #[serde(rename = "follow-up-threshold")]
    pub follow_up_threshold: u8,

    /// Delay between deciding to close and posting CLOSE to the host
    #[serde(rename = "close-signal-delay-ms")]
    pub close_signal_delay_ms: u64,

    /// How long the thank-you banner stays up
    #[serde(rename = "thank-you-ms")]
    pub thank_you_ms: u64,

    /// Submission request timeout
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl FeedbackConfig {
    pub fn close_signal_delay(&self) -> Duration {
        Duration::from_millis(self.close_signal_delay_ms)
    }

    pub fn thank_you_duration(&self) -> Duration {
        Duration::from_millis(self.thank_you_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            api_url: "https://parchi.dev.eka.care/service/user-feedback/161467756044203".to_string(),
            review_url: "https://search.google.com/local/writereview?placeid=ChIJUT-b4JIRrjsRZ3uqCVAGBe0"
                .to_string(),
            parent_url: None,
            positive_threshold: 4,
            follow_up_threshold: 3,
            close_signal_delay_ms: 100,
            thank_you_ms: 2000,
            timeout_ms: 10_000,
        }
    }
}

/// Client-local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage file holding the dismissed flag
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: keystore::default_path(),
        }
    }
}
