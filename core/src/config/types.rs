use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::ErrorPolicy;
use crate::envelope::Credentials;
use crate::shape::ShapePolicy;
use crate::transport::{TransportOptions, DEFAULT_OUTPUT_EXCERPT_CHARS};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub credentials: CredentialsConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "tcms_bridge_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Remote endpoint and login handed to the worker untouched.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl CredentialsConfig {
    pub fn to_credentials(&self) -> Result<Credentials, String> {
        let creds = Credentials::new(&self.url, &self.username, &self.password);
        creds.validate()?;
        Ok(creds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Kill the worker after this many milliseconds. 0 disables the bound.
    #[serde(default)]
    pub timeout_ms: u64,

    /// How much of undecodable worker output to quote in errors.
    #[serde(default = "default_output_excerpt_chars")]
    pub output_excerpt_chars: usize,
}

fn default_output_excerpt_chars() -> usize {
    DEFAULT_OUTPUT_EXCERPT_CHARS
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 0,
            output_excerpt_chars: default_output_excerpt_chars(),
        }
    }
}

impl WorkerConfig {
    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            timeout: (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms)),
            output_excerpt_chars: self.output_excerpt_chars,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub error_policy: ErrorPolicy,

    #[serde(default)]
    pub shape_policy: ShapePolicy,
}
