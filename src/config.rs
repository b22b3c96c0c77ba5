//! Configuration loading and types for padtalk
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/padtalk/config.toml)
//! 3. Environment variables (PADTALK_*)
//! 4. CLI arguments (highest priority)

use crate::error::PadtalkError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# Padtalk Configuration
#
# Location: ~/.config/padtalk/config.toml
# All settings can be overridden via CLI flags

# State file for external integrations (Waybar, polybar, etc.)
# Use "auto" for default location ($XDG_RUNTIME_DIR/padtalk/state),
# a custom path, or "disabled" to turn off. The daemon writes state
# ("idle", "recording", "transcribing", "pending") to this file
# whenever it changes. Required for the `padtalk status` command.
state_file = "auto"

[combo]
# Buttons that must all be held to start recording
# Known names: L1, R1, L2, R2, L5, R5, A, B, X, Y
buttons = ["L1", "R1"]

# Enable combo listening (the daemon still accepts `padtalk record`
# commands when this is false)
enabled = true

# Substrings used to find the gamepad device by name
# device_match = ["X-Box 360", "Xbox 360"]

[bridge]
# Signal file poll interval in milliseconds
poll_interval_ms = 50

# Detector liveness is checked every this many poll iterations
health_check_ticks = 20

# How long to wait after spawning the detector before declaring it healthy
launch_grace_ms = 500

[audio]
# Audio input device ("default" uses system default)
# List devices with: pactl list sources short
device = "default"

# Sample rate in Hz (whisper expects 16000)
sample_rate = 16000

# Maximum recording duration in seconds (safety limit)
max_duration_secs = 30

[whisper]
# Model to use for transcription
# Options: tiny, tiny.en, base, base.en, small, small.en, medium, large-v3
# Or provide absolute path to a custom .bin model file
model = "base.en"

# Language for transcription ("auto" for auto-detection)
language = "en"

# Translate non-English speech to English
translate = false

# Number of CPU threads for inference (omit for auto-detection)
# threads = 4

[chat]
# Active game preset (see presets_file; "wow" and "generic" are built in)
preset = "wow"

# Optional path to a JSON presets file merged over the built-in presets
# presets_file = "~/.config/padtalk/presets.json"

# Hold transcribed text for this many seconds before sending, so a
# quick combo tap can cancel a bad transcription. 0 sends immediately.
confirm_delay_secs = 0.0

# Settling delay between injected actions in milliseconds
key_delay_ms = 100
"#;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub combo: ComboConfig,

    #[serde(default)]
    pub bridge: BridgeConfig,

    pub audio: AudioConfig,
    pub whisper: WhisperConfig,
    pub chat: ChatConfig,

    /// Optional path to state file for external integrations (e.g., Waybar)
    /// When set, the daemon writes current state ("idle", "recording",
    /// "transcribing", "pending") to this file whenever state changes.
    #[serde(default)]
    pub state_file: Option<String>,
}

/// Button combo configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComboConfig {
    /// Buttons that must all be held to trigger recording
    /// Known names: L1, R1, L2, R2, L5, R5, A, B, X, Y
    #[serde(default = "default_combo_buttons")]
    pub buttons: Vec<String>,

    /// Enable combo listening (daemon still accepts `padtalk record`)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Substrings used to find the gamepad device by name
    #[serde(default = "default_device_match")]
    pub device_match: Vec<String>,
}

/// Detector supervision configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BridgeConfig {
    /// Signal file poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Detector liveness is checked every this many poll iterations
    #[serde(default = "default_health_check_ticks")]
    pub health_check_ticks: u32,

    /// Grace period after spawning the detector before declaring it healthy
    #[serde(default = "default_launch_grace_ms")]
    pub launch_grace_ms: u64,
}

/// Audio capture configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    /// PipeWire/PulseAudio device name, or "default"
    pub device: String,

    /// Sample rate in Hz (whisper expects 16000)
    pub sample_rate: u32,

    /// Maximum recording duration in seconds (safety limit)
    pub max_duration_secs: u32,
}

/// Whisper speech-to-text configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WhisperConfig {
    /// Model name: tiny, base, small, medium, large-v3
    /// Can also be an absolute path to a .bin file
    pub model: String,

    /// Language code (en, es, fr, auto, etc.)
    pub language: String,

    /// Translate to English if source language is not English
    #[serde(default)]
    pub translate: bool,

    /// Number of threads for inference (None = auto-detect)
    pub threads: Option<usize>,
}

/// Chat routing and injection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatConfig {
    /// Active game preset id ("wow" and "generic" are built in)
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Optional JSON presets file merged over the built-in presets
    #[serde(default)]
    pub presets_file: Option<PathBuf>,

    /// Hold transcribed text for this many seconds before sending; a combo
    /// tap during the window cancels the send. 0 sends immediately.
    #[serde(default)]
    pub confirm_delay_secs: f32,

    /// Settling delay between injected actions in milliseconds
    #[serde(default = "default_key_delay_ms")]
    pub key_delay_ms: u64,
}

fn default_combo_buttons() -> Vec<String> {
    vec!["L1".to_string(), "R1".to_string()]
}

fn default_device_match() -> Vec<String> {
    vec!["X-Box 360".to_string(), "Xbox 360".to_string()]
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_health_check_ticks() -> u32 {
    20
}

fn default_launch_grace_ms() -> u64 {
    500
}

fn default_preset() -> String {
    "wow".to_string()
}

fn default_key_delay_ms() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            health_check_ticks: default_health_check_ticks(),
            launch_grace_ms: default_launch_grace_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            combo: ComboConfig {
                buttons: default_combo_buttons(),
                enabled: true,
                device_match: default_device_match(),
            },
            bridge: BridgeConfig::default(),
            audio: AudioConfig {
                device: "default".to_string(),
                sample_rate: 16000,
                max_duration_secs: 30,
            },
            whisper: WhisperConfig {
                model: "base.en".to_string(),
                language: "en".to_string(),
                translate: false,
                threads: None,
            },
            chat: ChatConfig {
                preset: default_preset(),
                presets_file: None,
                confirm_delay_secs: 0.0,
                key_delay_ms: default_key_delay_ms(),
            },
            state_file: Some("auto".to_string()),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "padtalk")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the runtime directory for ephemeral files (signal, pid, state)
    pub fn runtime_dir() -> PathBuf {
        // Use XDG_RUNTIME_DIR if available, otherwise fall back to /tmp
        std::env::var("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
            .join("padtalk")
    }

    /// Path of the combo signal file written by the detector
    pub fn signal_path() -> PathBuf {
        Self::runtime_dir().join("combo")
    }

    /// Path of the detector PID file
    pub fn listener_pid_path() -> PathBuf {
        Self::runtime_dir().join("listener.pid")
    }

    /// Path of the daemon PID file (target of `padtalk record` signals)
    pub fn daemon_pid_path() -> PathBuf {
        Self::runtime_dir().join("pid")
    }

    /// Resolve the state file path from config
    /// Returns None if state_file is not configured or explicitly disabled
    pub fn resolve_state_file(&self) -> Option<PathBuf> {
        self.state_file.as_ref().and_then(|path| {
            match path.to_lowercase().as_str() {
                "disabled" | "none" | "off" | "false" => None,
                "auto" => Some(Self::runtime_dir().join("state")),
                _ => Some(PathBuf::from(path)),
            }
        })
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "padtalk")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the data directory path (for models)
    pub fn data_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "padtalk")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the models directory path
    pub fn models_dir() -> PathBuf {
        Self::data_dir().join("models")
    }

    /// Validate the combo button list: non-empty, known names, duplicates
    /// removed while preserving order. An unknown name rejects the whole
    /// configuration rather than silently shrinking the combo.
    pub fn validate(&mut self) -> Result<(), PadtalkError> {
        if self.combo.buttons.is_empty() {
            return Err(PadtalkError::Config(
                "combo.buttons must list at least one button".to_string(),
            ));
        }

        let mut seen = Vec::new();
        for name in &self.combo.buttons {
            if crate::combo::button_spec(name).is_none() {
                return Err(PadtalkError::Config(format!(
                    "unknown button '{}' in combo.buttons (known: {})",
                    name,
                    crate::combo::known_button_names().join(", ")
                )));
            }
            if !seen.contains(name) {
                seen.push(name.clone());
            }
        }
        self.combo.buttons = seen;

        if self.chat.confirm_delay_secs < 0.0 {
            return Err(PadtalkError::Config(
                "chat.confirm_delay_secs must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load configuration from file, with defaults for missing values
pub fn load_config(path: Option<&Path>) -> Result<Config, PadtalkError> {
    // Start with defaults
    let mut config = Config::default();

    // Determine config file path
    let config_path = path.map(PathBuf::from).or_else(Config::default_path);

    // Load from file if it exists
    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)
                .map_err(|e| PadtalkError::Config(format!("Failed to read config: {}", e)))?;

            config = toml::from_str(&contents)
                .map_err(|e| PadtalkError::Config(format!("Invalid config: {}", e)))?;
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
        }
    }

    // Override from environment variables
    if let Ok(model) = std::env::var("PADTALK_MODEL") {
        config.whisper.model = model;
    }
    if let Ok(preset) = std::env::var("PADTALK_PRESET") {
        config.chat.preset = preset;
    }
    if let Ok(combo) = std::env::var("PADTALK_COMBO") {
        config.combo.buttons = combo.split(',').map(|s| s.trim().to_string()).collect();
    }

    config.validate()?;

    Ok(config)
}

/// Save configuration to file
#[allow(dead_code)]
pub fn save_config(config: &Config, path: &Path) -> Result<(), PadtalkError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| PadtalkError::Config(format!("Failed to create config dir: {}", e)))?;
    }

    let contents = toml::to_string_pretty(config)
        .map_err(|e| PadtalkError::Config(format!("Failed to serialize config: {}", e)))?;

    std::fs::write(path, contents)
        .map_err(|e| PadtalkError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.combo.buttons, vec!["L1", "R1"]);
        assert!(config.combo.enabled);
        assert_eq!(config.bridge.poll_interval_ms, 50);
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.whisper.model, "base.en");
        assert_eq!(config.chat.preset, "wow");
        assert_eq!(config.chat.confirm_delay_secs, 0.0);
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
            [combo]
            buttons = ["L2", "R2"]
            enabled = false

            [bridge]
            poll_interval_ms = 25

            [audio]
            device = "default"
            sample_rate = 16000
            max_duration_secs = 20

            [whisper]
            model = "small.en"
            language = "en"

            [chat]
            preset = "generic"
            confirm_delay_secs = 2.0
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.combo.buttons, vec!["L2", "R2"]);
        assert!(!config.combo.enabled);
        assert_eq!(config.bridge.poll_interval_ms, 25);
        assert_eq!(config.bridge.health_check_ticks, 20); // default
        assert_eq!(config.whisper.model, "small.en");
        assert_eq!(config.chat.preset, "generic");
        assert_eq!(config.chat.confirm_delay_secs, 2.0);
    }

    #[test]
    fn test_validate_rejects_unknown_button() {
        let mut config = Config::default();
        config.combo.buttons = vec!["L1".to_string(), "Z9".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_combo() {
        let mut config = Config::default();
        config.combo.buttons.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_dedups_preserving_order() {
        let mut config = Config::default();
        config.combo.buttons = vec![
            "R1".to_string(),
            "L1".to_string(),
            "R1".to_string(),
        ];
        config.validate().unwrap();
        assert_eq!(config.combo.buttons, vec!["R1", "L1"]);
    }

    #[test]
    fn test_validate_rejects_negative_confirm_delay() {
        let mut config = Config::default();
        config.chat.confirm_delay_secs = -1.0;
        assert!(config.validate().is_err());
    }
}
