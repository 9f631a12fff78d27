//! Configuration management for pricewatch
//!
//! Handles loading, saving, and validating configuration from TOML files.
//! A missing config file is not an error: every section has defaults and the
//! email section is simply absent, which disables notifications.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Page fetching configuration
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Tracking cycle configuration
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Scheduled run configuration
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Outbound mail settings; notifications are disabled when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailConfig>,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept-Language header value
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Request timeout in seconds (client default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Tracking cycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Seconds to wait between products
    #[serde(default = "default_request_delay_secs")]
    pub request_delay_secs: f64,

    /// Substrings a product URL must contain (any one of them)
    #[serde(default = "default_site_markers")]
    pub site_markers: Vec<String>,
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Default hours between cycles for `watch`
    #[serde(default = "default_interval_hours")]
    pub interval_hours: f64,

    /// How often the idle loop checks whether a cycle is due
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
}

/// SMTP notification settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    pub from_email: String,
    pub to_email: String,
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub password: String,
}

impl EmailConfig {
    /// Load the standalone JSON email settings file
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for pricewatch data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to SQLite database
    pub db_file: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            timeout_secs: None,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            request_delay_secs: default_request_delay_secs(),
            site_markers: default_site_markers(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_interval_hours(),
            poll_secs: default_poll_secs(),
        }
    }
}

impl Config {
    /// Get the default base directory for pricewatch (~/.pricewatch)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pricewatch")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join(CONFIG_FILE_NAME)
    }

    /// Paths rooted at the directory holding `config_file`
    pub(crate) fn paths_for(config_file: &Path) -> PathsConfig {
        let base = config_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        PathsConfig {
            config_file: config_file.to_path_buf(),
            db_file: base.join(DB_FILE_NAME),
            base_dir: base,
        }
    }

    /// Load configuration from a config file path.
    ///
    /// The file is optional; when it does not exist the defaults are used with
    /// paths rooted at the file's parent directory.
    pub fn load(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            debug!("Loading config from {:?}", config_path);
            let content = std::fs::read_to_string(config_path)?;
            toml::from_str::<Config>(&content)?
        } else {
            debug!("No config file at {:?}, using defaults", config_path);
            Config::default()
        };
        config.paths = Self::paths_for(config_path);

        if config.email.is_none() {
            let legacy = config.paths.base_dir.join(LEGACY_EMAIL_FILE_NAME);
            if legacy.exists() {
                debug!("Loading email settings from {:?}", legacy);
                config.email = Some(EmailConfig::load_json(&legacy)?);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_config_path())
    }

    /// Load configuration from a specific base directory
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        Self::load(&base.join(CONFIG_FILE_NAME))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Directory default charts are written into
    pub fn charts_dir(&self) -> PathBuf {
        self.paths.base_dir.join("charts")
    }

    /// Whether email notifications are configured
    pub fn notifications_enabled(&self) -> bool {
        self.email.is_some()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.tracking.request_delay_secs.is_finite() || self.tracking.request_delay_secs < 0.0
        {
            return Err(Error::Config(
                "tracking.request_delay_secs must be >= 0".to_string(),
            ));
        }

        if self.tracking.site_markers.iter().all(|m| m.trim().is_empty()) {
            return Err(Error::Config(
                "tracking.site_markers must contain at least one marker".to_string(),
            ));
        }

        if !self.schedule.interval_hours.is_finite() || self.schedule.interval_hours <= 0.0 {
            return Err(Error::Config(
                "schedule.interval_hours must be positive".to_string(),
            ));
        }

        if self.schedule.poll_secs == 0 {
            return Err(Error::Config(
                "schedule.poll_secs must be positive".to_string(),
            ));
        }

        if let Some(email) = &self.email {
            if email.smtp_port == 0 {
                return Err(Error::Config("email.smtp_port must be non-zero".to_string()));
            }
            if email.smtp_server.trim().is_empty() {
                return Err(Error::Config("email.smtp_server must be set".to_string()));
            }
        }

        Ok(())
    }
}
