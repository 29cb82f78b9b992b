//! Configuration settings for Tubecoach.

use crate::error::{Result, TubecoachError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub chat: ChatSettings,
    pub image: ImageSettings,
    pub youtube: YoutubeSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data (illustrations, etc.).
    pub data_dir: String,
    /// Directory where fetched transcripts are exported for download.
    pub export_dir: String,
    /// Optional log file; the file is truncated on each start.
    pub log_file: Option<String>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.tubecoach".to_string(),
            export_dir: "~/.tubecoach/transcripts".to_string(),
            log_file: None,
        }
    }
}

/// Model identifier plus sampling parameters for one chat call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

/// A named override of the default chat parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatProfile {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

/// Chat completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Chat model to use.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum reply length in tokens (provider default if unset).
    pub max_tokens: Option<u32>,
    /// Nucleus sampling cutoff.
    pub top_p: Option<f32>,
    /// Optional system message sent ahead of the conversation.
    pub system_prompt: Option<String>,
    /// Named parameter sets selectable with `--profile`.
    pub profiles: HashMap<String, ChatProfile>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(
            "creative".to_string(),
            ChatProfile {
                temperature: Some(1.0),
                ..Default::default()
            },
        );
        profiles.insert(
            "focused".to_string(),
            ChatProfile {
                model: Some("gpt-4o-mini".to_string()),
                temperature: Some(0.3),
                max_tokens: Some(4096),
                top_p: Some(0.9),
            },
        );

        Self {
            model: "gpt-4o".to_string(),
            temperature: 1.0,
            max_tokens: None,
            top_p: None,
            system_prompt: None,
            profiles,
        }
    }
}

impl ChatSettings {
    /// Resolve the effective model parameters, applying a profile if named.
    pub fn resolve(&self, profile: Option<&str>) -> Result<ModelParams> {
        let mut params = ModelParams {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
        };

        let Some(name) = profile else {
            return Ok(params);
        };

        let overrides = self.profiles.get(name).ok_or_else(|| {
            let mut known: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
            known.sort_unstable();
            TubecoachError::Config(format!(
                "Unknown chat profile '{}'. Known profiles: {}",
                name,
                known.join(", ")
            ))
        })?;

        if let Some(model) = &overrides.model {
            params.model = model.clone();
        }
        if let Some(temperature) = overrides.temperature {
            params.temperature = temperature;
        }
        if overrides.max_tokens.is_some() {
            params.max_tokens = overrides.max_tokens;
        }
        if overrides.top_p.is_some() {
            params.top_p = overrides.top_p;
        }

        Ok(params)
    }
}

/// Image generation backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ImageProvider {
    /// OpenAI images API.
    #[default]
    OpenAI,
    /// Generic JSON text-to-image endpoint.
    Http,
}

impl std::fmt::Display for ImageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageProvider::OpenAI => write!(f, "openai"),
            ImageProvider::Http => write!(f, "http"),
        }
    }
}

/// Illustration generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Generate an illustration when a thumbnail section is found.
    pub enabled: bool,
    /// Backend to call.
    pub provider: ImageProvider,
    /// Image model identifier.
    pub model: String,
    /// Endpoint URL (http provider only).
    pub endpoint: Option<String>,
    /// Environment variable holding the bearer token (http provider only).
    pub api_key_env: String,
    pub width: u32,
    pub height: u32,
    /// Quality hint ("standard" or "hd").
    pub quality: String,
    /// Classifier-free guidance scale (http provider only).
    pub guidance_scale: f32,
    /// Diffusion step count (http provider only).
    pub steps: Option<u32>,
    /// Fixed seed. Unset lets the backend pick, so repeated prompts vary.
    pub seed: Option<u64>,
    /// Template wrapping the extracted design text, `{{design}}` is substituted.
    pub prompt_template: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: ImageProvider::OpenAI,
            model: "dall-e-3".to_string(),
            endpoint: None,
            api_key_env: "IMAGE_API_KEY".to_string(),
            width: 1024,
            height: 1024,
            quality: "standard".to_string(),
            guidance_scale: 8.0,
            steps: None,
            seed: None,
            prompt_template:
                "Create a colorful engaging YouTube Thumbnail without text based on this design: {{design}}"
                    .to_string(),
        }
    }
}

/// YouTube transcript settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// Caption languages to request, in order of preference.
    pub languages: Vec<String>,
    /// Transcribe the audio with Whisper when a video has no captions.
    pub whisper_fallback: bool,
    /// Whisper model for the fallback.
    pub whisper_model: String,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            whisper_fallback: false,
            whisper_model: "whisper-1".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TubecoachError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubecoach")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded transcript export directory.
    pub fn export_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.export_dir)
    }

    /// Directory where generated illustrations are saved.
    pub fn illustration_dir(&self) -> PathBuf {
        self.data_dir().join("illustrations")
    }

    /// Get the expanded log file path, if logging to a file is enabled.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.general.log_file.as_deref().map(Self::expand_path)
    }
}
