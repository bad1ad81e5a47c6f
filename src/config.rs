use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use dreamclass_core::assistant::DEFAULT_MODEL;
use dreamclass_core::RemoteSettings;

pub const DEFAULT_SHARE_URL: &str = "https://dreamclass.app/";
pub const DEFAULT_DEBOUNCE_MS: u64 = 1500;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
    /// Saved on this device with `sync setup`
    Device,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
            ConfigSource::Device => write!(f, "device"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Remote store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Project URL (e.g., "https://xyz.supabase.co")
    pub url: Option<String>,
    /// Anonymous API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Quiet period after the last edit before pushing
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            url: None,
            key: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl SyncConfig {
    /// Both URL and key, if configured
    pub fn remote_settings(&self) -> Option<RemoteSettings> {
        match (&self.url, &self.key) {
            (Some(url), Some(key)) => Some(RemoteSettings {
                url: url.clone(),
                key: key.clone(),
            }),
            _ => None,
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Text generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
        }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the class data
    pub data_dir: ConfigValue<PathBuf>,
    /// Base URL for share links
    pub share_base_url: ConfigValue<String>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub sync: SyncConfig,
    pub assistant: AssistantConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    share_base_url: Option<String>,
    sync: Option<SyncConfig>,
    assistant: Option<AssistantConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut share_base_url =
            ConfigValue::new(DEFAULT_SHARE_URL.to_string(), ConfigSource::Default);
        let mut config_file = None;
        let mut sync = SyncConfig::default();
        let mut assistant = AssistantConfig::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(url) = file_config.share_base_url {
                share_base_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(sync_config) = file_config.sync {
                sync = sync_config;
            }
            if let Some(assistant_config) = file_config.assistant {
                assistant = assistant_config;
            }
        }

        if let Ok(dir) = std::env::var("DREAMCLASS_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("DREAMCLASS_SHARE_URL") {
            share_base_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("DREAMCLASS_SUPABASE_URL") {
            sync.url = Some(url);
        }
        if let Ok(key) = std::env::var("DREAMCLASS_SUPABASE_KEY") {
            sync.key = Some(key);
        }
        if let Ok(key) = std::env::var("DREAMCLASS_AI_KEY") {
            assistant.api_key = Some(key);
        }

        Ok(Self {
            data_dir,
            share_base_url,
            config_file,
            sync,
            assistant,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/dreamclass/
    /// - macOS: ~/Library/Application Support/dreamclass/
    /// - Windows: %APPDATA%/dreamclass/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dreamclass")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/dreamclass/
    /// - macOS: ~/Library/Application Support/dreamclass/
    /// - Windows: %APPDATA%/dreamclass/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dreamclass")
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert!(config.data_dir.value.ends_with("dreamclass"));
        assert_eq!(config.data_dir.source, ConfigSource::Default);
        assert_eq!(config.share_base_url.value, DEFAULT_SHARE_URL);
        assert_eq!(config.sync.debounce_ms, 1500);
        assert_eq!(config.assistant.model, "gemini-3-flash-preview");
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "data_dir: /custom/class").unwrap();
        writeln!(file, "share_base_url: https://school.example/class").unwrap();
        writeln!(file, "sync:").unwrap();
        writeln!(file, "  url: https://demo.supabase.co").unwrap();
        writeln!(file, "  key: anon").unwrap();
        writeln!(file, "  debounce_ms: 500").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(config.data_dir.value, PathBuf::from("/custom/class"));
        assert_eq!(config.data_dir.source, ConfigSource::File);
        assert_eq!(config.share_base_url.value, "https://school.example/class");
        assert_eq!(config.sync.debounce(), Duration::from_millis(500));
        assert_eq!(
            config.sync.remote_settings(),
            Some(RemoteSettings {
                url: "https://demo.supabase.co".to_string(),
                key: "anon".to_string(),
            })
        );
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_relative_data_dir_resolves_against_config_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "data_dir: class-data\n").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.data_dir.value, temp_dir.path().join("class-data"));
    }

    #[test]
    fn test_partial_sync_section_keeps_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "sync:\n  url: https://demo.supabase.co\n").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.sync.debounce_ms, DEFAULT_DEBOUNCE_MS);
        // A URL without a key is not enough to connect
        assert!(config.sync.remote_settings().is_none());
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "share_base_url: https://fromfile/\n").unwrap();

        std::env::set_var("DREAMCLASS_SHARE_URL", "https://fromenv/");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.share_base_url.value, "https://fromenv/");
        assert_eq!(config.share_base_url.source, ConfigSource::Environment);

        std::env::remove_var("DREAMCLASS_SHARE_URL");
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
