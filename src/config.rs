use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub contact: ContactConfig,
    #[serde(default)]
    pub turnstile: TurnstileConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from_name: default_from_name(),
        }
    }
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Portfolio Contact".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContactConfig {
    /// Fixed address that receives the owner notification for every submission
    #[serde(default = "default_owner_email")]
    pub owner_email: String,
    #[serde(default = "default_owner_name")]
    pub owner_name: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            owner_email: default_owner_email(),
            owner_name: default_owner_name(),
        }
    }
}

fn default_owner_email() -> String {
    "owner@portfolio.local".to_string()
}

fn default_owner_name() -> String {
    "Portfolio Owner".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct TurnstileConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default = "default_verify_url")]
    pub verify_url: String,
}

impl Default for TurnstileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            secret_key: String::new(),
            verify_url: default_verify_url(),
        }
    }
}

fn default_verify_url() -> String {
    "https://challenges.cloudflare.com/turnstile/v0/siteverify".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: default_max_requests(),
            window_hours: default_window_hours(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_max_requests() -> u32 {
    2
}

fn default_window_hours() -> u32 {
    24
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (PORTFOLIO__SMTP__USERNAME, etc.)
    /// 2. Config file specified by path
    /// 3. Hardcoded defaults
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        // Set defaults
        builder = builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?;

        // Load config file if path provided or CONFIG_PATH env var set
        let config_file_path = config_path
            .or_else(|| env::var("CONFIG_PATH").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        // Try to load config file (optional - ignore if not found)
        if std::path::Path::new(&config_file_path).exists() {
            builder = builder.add_source(File::with_name(&config_file_path));
        }

        // Override with environment variables (PORTFOLIO__SMTP__USERNAME, etc.)
        builder = builder.add_source(
            Environment::with_prefix("PORTFOLIO")
                .separator("__")
                .try_parsing(true),
        );

        // Also support the legacy environment variables the deployment already sets
        if let Ok(smtp_user) = env::var("SMTP_USER") {
            builder = builder.set_override("smtp.username", smtp_user)?;
        }
        if let Ok(smtp_pass) = env::var("SMTP_PASS") {
            builder = builder.set_override("smtp.password", smtp_pass)?;
        }
        if let Ok(turnstile_secret) = env::var("TURNSTILE_SECRET_KEY") {
            builder = builder.set_override("turnstile.secret_key", turnstile_secret)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }
        if self.rate_limit.max_requests < 1 {
            return Err("rate_limit.max_requests must be at least 1".to_string());
        }
        if self.rate_limit.window_hours < 1 {
            return Err("rate_limit.window_hours must be at least 1".to_string());
        }
        if self.contact.owner_email.is_empty() {
            return Err("contact.owner_email must not be empty".to_string());
        }
        Ok(())
    }
}
