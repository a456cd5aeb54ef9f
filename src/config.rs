// Keyforge - Configuration
//
// Optional TOML file; every field has a default, so an absent file or an
// empty table yields a working configuration. The bot token may also come
// from the `BOT_TOKEN` environment variable, which wins over the file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::gateway::{BotToken, DEFAULT_API_BASE};
use crate::params::{DEFAULT_ALIAS, DEFAULT_PASSWORD};
use crate::pipeline::PipelineSettings;
use crate::toolchain::{ExtractorBackend, KeytoolSettings};

pub const DEFAULT_CONFIG_FILE: &str = "keyforge.toml";
pub const TOKEN_ENV: &str = "BOT_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("No bot token: set BOT_TOKEN or bot.token in the config file")]
    MissingToken,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub keystore: KeystoreConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_generated_dir")]
    pub generated_dir: PathBuf,
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            generated_dir: default_generated_dir(),
            archive_dir: default_archive_dir(),
        }
    }
}

fn default_generated_dir() -> PathBuf {
    PathBuf::from("generated")
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("generated_old")
}

#[derive(Deserialize, Clone)]
pub struct KeystoreConfig {
    #[serde(default = "default_alias")]
    pub default_alias: String,
    #[serde(default = "default_password")]
    pub default_password: String,
    #[serde(default = "default_key_algorithm")]
    pub key_algorithm: String,
    #[serde(default = "default_key_size")]
    pub key_size: u32,
    #[serde(default = "default_validity_days")]
    pub validity_days: u32,
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            default_alias: default_alias(),
            default_password: default_password(),
            key_algorithm: default_key_algorithm(),
            key_size: default_key_size(),
            validity_days: default_validity_days(),
        }
    }
}

impl fmt::Debug for KeystoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystoreConfig")
            .field("default_alias", &self.default_alias)
            .field("default_password", &"[REDACTED]")
            .field("key_algorithm", &self.key_algorithm)
            .field("key_size", &self.key_size)
            .field("validity_days", &self.validity_days)
            .finish()
    }
}

fn default_alias() -> String {
    DEFAULT_ALIAS.to_string()
}

fn default_password() -> String {
    DEFAULT_PASSWORD.to_string()
}

fn default_key_algorithm() -> String {
    "RSA".to_string()
}

fn default_key_size() -> u32 {
    2048
}

fn default_validity_days() -> u32 {
    36500
}

#[derive(Debug, Deserialize, Clone)]
pub struct ToolsConfig {
    #[serde(default = "default_keytool")]
    pub keytool: String,
    #[serde(default = "default_openssl")]
    pub openssl: String,
    #[serde(default)]
    pub extractor: ExtractorBackend,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            keytool: default_keytool(),
            openssl: default_openssl(),
            extractor: ExtractorBackend::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_keytool() -> String {
    "keytool".to_string()
}

fn default_openssl() -> String {
    "openssl".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Deserialize, Clone)]
pub struct BotConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    #[serde(default = "default_choice_ttl_secs")]
    pub choice_ttl_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: default_api_base(),
            poll_timeout_secs: default_poll_timeout_secs(),
            choice_ttl_secs: default_choice_ttl_secs(),
        }
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("choice_ttl_secs", &self.choice_ttl_secs)
            .finish()
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_choice_ttl_secs() -> u64 {
    600
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Append-only log file. An empty path disables the file layer.
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

fn default_log_file() -> PathBuf {
    PathBuf::from("logs/bot.log")
}

impl LoggingConfig {
    pub fn log_file(&self) -> Option<&Path> {
        if self.file.as_os_str().is_empty() {
            None
        } else {
            Some(&self.file)
        }
    }
}

fn default_log_filter() -> String {
    "keyforge=info".to_string()
}

impl AppConfig {
    /// Load `path`, or defaults when `path` is absent and not `required`.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Token from `BOT_TOKEN`, else from the file.
    pub fn bot_token(&self) -> Result<BotToken, ConfigError> {
        Self::pick_token(std::env::var(TOKEN_ENV).ok(), self.bot.token.as_deref())
    }

    fn pick_token(env: Option<String>, file: Option<&str>) -> Result<BotToken, ConfigError> {
        let env = env.map(Zeroizing::new);
        match (env.as_deref(), file) {
            (Some(t), _) if !t.trim().is_empty() => Ok(BotToken::new(t.trim())),
            (_, Some(t)) if !t.trim().is_empty() => Ok(BotToken::new(t.trim())),
            _ => Err(ConfigError::MissingToken),
        }
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tools.timeout_secs)
    }

    pub fn choice_ttl(&self) -> Duration {
        Duration::from_secs(self.bot.choice_ttl_secs)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            generated_dir: self.storage.generated_dir.clone(),
            archive_dir: self.storage.archive_dir.clone(),
            keytool: KeytoolSettings {
                program: self.tools.keytool.clone(),
                key_algorithm: self.keystore.key_algorithm.clone(),
                key_size: self.keystore.key_size,
                validity_days: self.keystore.validity_days,
                timeout: self.tool_timeout(),
            },
            extractor: self.tools.extractor,
            openssl_program: self.tools.openssl.clone(),
            default_alias: self.keystore.default_alias.clone(),
            default_password: Zeroizing::new(self.keystore.default_password.clone()),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
