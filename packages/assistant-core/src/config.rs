//! Assistant configuration.
//!
//! Loaded from `~/.square-ai/assistant/config.toml` (or
//! `SQUARE_ASSISTANT_CONFIG`), then overridden by environment variables.
//! Every field has a default, so an absent file is a valid configuration.

use crate::state::Cue;
use crate::{Error, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHAT_URL: &str = "https://square-ai-chat.csqr.app/chat/ui";

pub const DEFAULT_WELCOME_MESSAGE: &str = "Hi! I'm Square AI Assistant. I can help you with product information, services, and answer your questions. How can I assist you today?";

/// Widget configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssistantConfig {
    /// Chat backend endpoint handed to the transport
    pub chat_url: String,
    /// Minutes of inactivity after which stored history is discarded
    pub chat_ttl_minutes: i64,
    /// Maximum characters of the trigger preview
    pub preview_length: usize,
    /// Start with the panel closed when no preference is stored
    pub default_collapsed: bool,
    pub draggable: bool,
    /// Viewport width below which dragging is disabled
    pub mobile_breakpoint: f64,
    pub welcome_message: String,
    pub welcome_delay_secs: u64,
    /// Suggestions shown before the assistant sends any
    pub default_suggestions: Vec<String>,
    /// Overrides the default state file location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
    pub sounds: SoundConfig,
}

/// Audio cue assets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SoundConfig {
    pub send_url: String,
    pub send_volume: f32,
    pub receive_url: String,
    pub receive_volume: f32,
}

/// Asset and volume for one cue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CueSettings<'a> {
    pub url: &'a str,
    pub volume: f32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            chat_url: DEFAULT_CHAT_URL.to_string(),
            chat_ttl_minutes: 120,
            preview_length: 100,
            default_collapsed: true,
            draggable: true,
            mobile_breakpoint: 640.0,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            welcome_delay_secs: 5,
            default_suggestions: Vec::new(),
            state_file: None,
            sounds: SoundConfig::default(),
        }
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            send_url: "/sounds/woosh.wav".to_string(),
            send_volume: 0.45,
            receive_url: "/sounds/soap-bubble.wav".to_string(),
            receive_volume: 0.6,
        }
    }
}

impl SoundConfig {
    pub fn for_cue(&self, cue: Cue) -> CueSettings<'_> {
        match cue {
            Cue::Send => CueSettings {
                url: &self.send_url,
                volume: self.send_volume,
            },
            Cue::Receive => CueSettings {
                url: &self.receive_url,
                volume: self.receive_volume,
            },
        }
    }
}

impl AssistantConfig {
    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("SQUARE_ASSISTANT_CONFIG") {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".square-ai/assistant/config.toml"))
            .unwrap_or_else(|| PathBuf::from("assistant.toml"))
    }

    /// Load from the default path and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_path(&Self::default_path())?;
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific path. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// [`AssistantConfig::load`]). Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = non_blank("SQUARE_ASSISTANT_CHAT_URL") {
            self.chat_url = url;
        }
        if let Some(path) = non_blank("SQUARE_ASSISTANT_STATE_FILE") {
            self.state_file = Some(PathBuf::from(path));
        }
        if let Some(minutes) = non_blank("SQUARE_ASSISTANT_CHAT_TTL_MINUTES") {
            match minutes.trim().parse() {
                Ok(minutes) => self.chat_ttl_minutes = minutes,
                Err(e) => tracing::warn!("Ignoring SQUARE_ASSISTANT_CHAT_TTL_MINUTES={}: {}", minutes, e),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chat_ttl_minutes <= 0 {
            return Err(Error::InvalidConfig(format!(
                "chat_ttl_minutes must be positive, got {}",
                self.chat_ttl_minutes
            )));
        }
        if self.preview_length == 0 {
            return Err(Error::InvalidConfig(
                "preview_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn chat_ttl(&self) -> Duration {
        Duration::minutes(self.chat_ttl_minutes)
    }

    /// Dragging is disabled on narrow viewports.
    pub fn drag_enabled(&self, viewport_width: f64) -> bool {
        self.draggable && viewport_width >= self.mobile_breakpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AssistantConfig::default();
        assert_eq!(config.chat_ttl(), Duration::hours(2));
        assert_eq!(config.preview_length, 100);
        assert!(config.default_collapsed);
        assert!(config.default_suggestions.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = AssistantConfig::from_toml_str(
            r#"
            chat_ttl_minutes = 30
            default_suggestions = ["What do you offer?", "Pricing"]

            [sounds]
            receive_volume = 0.2
            "#,
        )
        .unwrap();

        assert_eq!(config.chat_ttl_minutes, 30);
        assert_eq!(config.default_suggestions.len(), 2);
        assert_relative_eq!(config.sounds.receive_volume, 0.2);
        assert_eq!(config.sounds.send_url, "/sounds/woosh.wav");
        assert_eq!(config.chat_url, DEFAULT_CHAT_URL);
    }

    #[test]
    fn test_invalid_toml() {
        let result = AssistantConfig::from_toml_str("chat_ttl_minutes = \"soon\"");
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn test_validation() {
        let result = AssistantConfig::from_toml_str("chat_ttl_minutes = 0");
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let result = AssistantConfig::from_toml_str("preview_length = 0");
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SQUARE_ASSISTANT_CHAT_URL", "http://localhost:8787/chat"),
            ("SQUARE_ASSISTANT_STATE_FILE", "  "),
            ("SQUARE_ASSISTANT_CHAT_TTL_MINUTES", "15"),
        ]
        .into_iter()
        .collect();

        let mut config = AssistantConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.chat_url, "http://localhost:8787/chat");
        assert!(config.state_file.is_none());
        assert_eq!(config.chat_ttl_minutes, 15);
    }

    #[test]
    fn test_bad_ttl_override_ignored() {
        let mut config = AssistantConfig::default();
        config.apply_overrides(|key| {
            (key == "SQUARE_ASSISTANT_CHAT_TTL_MINUTES").then(|| "two hours".to_string())
        });
        assert_eq!(config.chat_ttl_minutes, 120);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AssistantConfig::load_from_path(&dir.path().join("none.toml")).unwrap();
        assert_eq!(config, AssistantConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "draggable = false\nwelcome_delay_secs = 10\n").unwrap();

        let config = AssistantConfig::load_from_path(&path).unwrap();
        assert!(!config.draggable);
        assert_eq!(config.welcome_delay_secs, 10);
    }

    #[test]
    fn test_drag_enabled() {
        let config = AssistantConfig::default();
        assert!(config.drag_enabled(1280.0));
        assert!(!config.drag_enabled(390.0));
    }

    #[test]
    fn test_cue_settings() {
        let sounds = SoundConfig::default();
        assert_eq!(sounds.for_cue(Cue::Send).url, "/sounds/woosh.wav");
        assert_relative_eq!(sounds.for_cue(Cue::Receive).volume, 0.6);
    }
}
