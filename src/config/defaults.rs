//! Default values for configuration

/// Browser-like user agent; the default reqwest identity is blocked outright
pub fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

/// Default Accept-Language header
pub fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

/// Default pause between products within one tracking cycle (seconds)
pub fn default_request_delay_secs() -> f64 {
    2.0
}

/// Default markers identifying a supported product URL
pub fn default_site_markers() -> Vec<String> {
    vec!["amazon.".to_string()]
}

/// Default hours between scheduled tracking cycles
pub fn default_interval_hours() -> f64 {
    6.0
}

/// Default schedule polling tick (seconds)
pub fn default_poll_secs() -> u64 {
    60
}

/// Default SMTP submission port (STARTTLS)
pub fn default_smtp_port() -> u16 {
    587
}

/// Name of the SQLite database file inside the base directory
pub const DB_FILE_NAME: &str = "products.db";

/// Name of the config file inside the base directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Legacy standalone email settings file, read when `[email]` is absent
pub const LEGACY_EMAIL_FILE_NAME: &str = "email_config.json";
