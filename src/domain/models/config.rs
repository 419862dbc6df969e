//! Client configuration model.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for the IconeSign client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Workflow backend (auth, process, progress, TTN, certificates)
    #[serde(default)]
    pub api: ApiConfig,

    /// Direct signing service used by `sign` and `validate`
    #[serde(default)]
    pub signing_api: SigningApiConfig,

    /// Progress polling
    #[serde(default)]
    pub polling: PollingConfig,

    /// File intake ceilings
    #[serde(default)]
    pub intake: IntakeConfig,

    /// Retry policy for idempotent requests
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where the session file and activity journal live
    #[serde(default)]
    pub storage: StorageConfig,

    /// TTN account used by the e-fact save step
    #[serde(default)]
    pub ttn: TtnCredentials,
}

/// Workflow backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApiConfig {
    /// Base URL including the API prefix
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:8080/api/v1".to_string()
}

const fn default_timeout_secs() -> u64 {
    120
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SigningApiConfig {
    #[serde(default = "default_signing_base_url")]
    pub base_url: String,
}

fn default_signing_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for SigningApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_signing_base_url(),
        }
    }
}

/// Progress polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PollingConfig {
    /// Delay between progress fetches in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
}

const fn default_poll_interval_ms() -> u64 {
    3000
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Size ceilings. The two workflows deliberately differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IntakeConfig {
    /// Ceiling for the upload/process workflow
    #[serde(default = "default_upload_max_bytes")]
    pub upload_max_bytes: u64,

    /// Ceiling for direct sign / validate
    #[serde(default = "default_batch_sign_max_bytes")]
    pub batch_sign_max_bytes: u64,
}

const fn default_upload_max_bytes() -> u64 {
    16 * 1024 * 1024
}

const fn default_batch_sign_max_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            upload_max_bytes: default_upload_max_bytes(),
            batch_sign_max_bytes: default_batch_sign_max_bytes(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_initial_backoff_ms() -> u64 {
    500
}

const fn default_max_backoff_ms() -> u64 {
    5_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation for file output: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StorageConfig {
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".iconesign")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

/// TTN e-fact account. Empty by default; must come from config or env.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TtnCredentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub fiscal_id: String,
}

impl TtnCredentials {
    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty() && !self.fiscal_id.is_empty()
    }
}

impl std::fmt::Debug for TtnCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtnCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("fiscal_id", &self.fiscal_id)
            .finish()
    }
}
