//! Configuration — one TOML file, serde defaults for every field.
//!
//! The source deployments carried one hardcoded entry point per target
//! (session path, client identity, browser binary baked in). Here all of
//! that is config, so a single binary covers every target.


use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::WardenError;

/// Top-level Warden configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub qr: QrConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Owner contact lines shown by the `#owner` command.
    #[serde(default)]
    pub owners: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            owners: Vec::new(),
        }
    }
}

/// Credential session storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Credential directory. Empty = `{data_dir}/session`.
    #[serde(default)]
    pub dir: String,
    /// Client identity handed to the platform client.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Whether a graceful shutdown also wipes the credential directory.
    /// The source deployments disagreed on this; most kept the session.
    #[serde(default)]
    pub purge_on_shutdown: bool,
    /// Retries for a purge that hits a busy file.
    #[serde(default = "default_purge_retries")]
    pub purge_retries: u32,
    /// Fixed delay between purge retries, in milliseconds.
    #[serde(default = "default_purge_backoff_ms")]
    pub purge_backoff_ms: u64,
    /// Grace period after client teardown before touching its files.
    /// The browser process releases file locks slightly after its shutdown
    /// signal; purging inside that window hits EBUSY.
    #[serde(default = "default_teardown_grace_ms")]
    pub teardown_grace_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dir: String::new(),
            client_id: default_client_id(),
            purge_on_shutdown: false,
            purge_retries: default_purge_retries(),
            purge_backoff_ms: default_purge_backoff_ms(),
            teardown_grace_ms: default_teardown_grace_ms(),
        }
    }
}

impl SessionConfig {
    /// Resolve the credential directory, defaulting under `data_dir`.
    pub fn resolved_dir(&self, data_dir: &str) -> String {
        if self.dir.is_empty() {
            format!("{}/session", shellexpand(data_dir))
        } else {
            shellexpand(&self.dir)
        }
    }
}

/// Reconnection policy — attempt-proportional backoff with a ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff step per attempt, in seconds (delay = attempt × step).
    #[serde(default = "default_backoff_step_secs")]
    pub backoff_step_secs: u64,
    /// Backoff ceiling, in seconds.
    #[serde(default = "default_backoff_cap_secs")]
    pub backoff_cap_secs: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_step_secs: default_backoff_step_secs(),
            backoff_cap_secs: default_backoff_cap_secs(),
        }
    }
}

/// QR pairing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrConfig {
    /// Minimum interval between accepted QR payloads. The platform re-emits
    /// duplicate QR events while the previous code is still valid.
    #[serde(default = "default_qr_cooldown_secs")]
    pub regen_cooldown_secs: u64,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            regen_cooldown_secs: default_qr_cooldown_secs(),
        }
    }
}

/// Sidecar bridge settings — how the external platform client is launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Interpreter for the sidecar (default: `node`).
    #[serde(default = "default_bridge_program")]
    pub program: String,
    /// Sidecar script path.
    #[serde(default = "default_bridge_script")]
    pub script: String,
    /// Browser binaries probed in order; first existing one wins.
    #[serde(default = "default_chrome_candidates")]
    pub chrome_candidates: Vec<String>,
    /// Extra arguments appended to the sidecar command line.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            program: default_bridge_program(),
            script: default_bridge_script(),
            chrome_candidates: default_chrome_candidates(),
            extra_args: Vec::new(),
        }
    }
}

fn default_name() -> String {
    "warden".to_string()
}

fn default_data_dir() -> String {
    "~/.warden".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_client_id() -> String {
    "warden-bot".to_string()
}

fn default_purge_retries() -> u32 {
    2
}

fn default_purge_backoff_ms() -> u64 {
    2000
}

fn default_teardown_grace_ms() -> u64 {
    4000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_step_secs() -> u64 {
    5
}

fn default_backoff_cap_secs() -> u64 {
    60
}

fn default_qr_cooldown_secs() -> u64 {
    30
}

fn default_bridge_program() -> String {
    "node".to_string()
}

fn default_bridge_script() -> String {
    "bridge/client.js".to_string()
}

fn default_chrome_candidates() -> Vec<String> {
    [
        "/usr/bin/google-chrome-stable",
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, WardenError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| WardenError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| WardenError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}
