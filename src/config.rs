//! Configuration management for UzTrans.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application name used for config and data directories.
const APP_NAME: &str = "UzTrans";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Placeholder value for unconfigured API keys.
const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Inference and translation API configuration.
    pub api: ApiConfig,

    /// LLM prompts.
    pub prompts: PromptsConfig,

    /// Autosave settings.
    pub autosave: AutosaveConfig,

    /// Project store settings.
    pub storage: StorageConfig,

    /// File paths.
    pub paths: PathsConfig,
}

/// API configuration for LLM endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API key (required).
    pub key: String,

    /// Base URL for the API.
    pub base_url: String,

    /// Model identifier.
    pub model: String,

    /// Sampling temperature for chapter translation.
    pub translation_temperature: f32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: API_KEY_PLACEHOLDER.to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            translation_temperature: 0.7,
        }
    }
}

impl ApiConfig {
    /// Checks if the API key is configured (not placeholder).
    pub fn is_configured(&self) -> bool {
        !self.key.is_empty() && self.key != API_KEY_PLACEHOLDER
    }
}

/// LLM system prompts.
///
/// `translate_chapter` may contain `{genre}` and `{context}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Prompt for metadata analysis.
    pub analyze_metadata: String,

    /// Prompt for chapter segmentation.
    pub split_chapters: String,

    /// System prompt for chapter translation.
    pub translate_chapter: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            analyze_metadata: r#"Analyze this book excerpt and provide metadata in JSON format.
Return ONLY a JSON object with this shape:
{"title":"<title>","author":"<author>","detectedLanguage":"<language>","genre":"<genre>","summary":"<short summary>"}
Choose genre from: fiction, novel, romance, fantasy, sci-fi, self-help, psychology, business, academic, religious, biography, history, children."#.to_string(),
            split_chapters: r#"Split the following book text into logical chapters or parts.
Return ONLY a JSON array of objects with this shape:
[{"title":"<chapter title>","content":"<full chapter text>"}]"#.to_string(),
            translate_chapter: r#"You are a world-class literary translator specializing in Uzbek.
Your goal is to translate the following text into natural, fluent Uzbek.

Genre: {genre}
Context: {context}

Guidelines:
- Avoid literal machine translation feel.
- Preserve the emotional tone and literary style.
- Adapt idioms naturally for Uzbek culture.
- Maintain formatting like dialogues and paragraphs.
- Write as if the book was originally written in Uzbek."#.to_string(),
        }
    }
}

/// Autosave configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    /// Seconds between autosaves.
    pub interval_sec: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self { interval_sec: 120 }
    }
}

impl AutosaveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_sec)
    }
}

/// Project store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Upper bound on the serialized project size, in bytes.
    pub max_bytes: Option<usize>,
}

/// File path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory for exported PDF/DOCX files.
    pub output_directory: PathBuf,

    /// Directory holding the saved project record.
    pub data_directory: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("."),
            data_directory: None,
        }
    }
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api.is_configured() {
            return Err(ConfigError::MissingValue(
                "api.key (set your API key in config file)".to_string(),
            ));
        }

        if let Err(e) = url::Url::parse(&self.api.base_url) {
            return Err(ConfigError::InvalidValue {
                key: "api.base_url".to_string(),
                message: e.to_string(),
            });
        }

        if self.autosave.interval_sec == 0 {
            return Err(ConfigError::InvalidValue {
                key: "autosave.interval_sec".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if self.storage.max_bytes == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "storage.max_bytes".to_string(),
                message: "must be greater than 0 when set".to_string(),
            });
        }

        Ok(())
    }

    /// Returns the effective data directory, using config or default.
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref dir) = self.paths.data_directory {
            Ok(dir.clone())
        } else {
            dirs::data_dir()
                .map(|p| p.join(APP_NAME))
                .ok_or(ConfigError::NoConfigDir)
        }
    }
}
