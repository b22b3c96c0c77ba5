//! Game chat presets
//!
//! A preset bundles everything padtalk needs to talk to one game: which
//! chat channels exist, the slash-command prefix typed for each, the key
//! that opens the chat box and the key that sends, and the prompt hint
//! handed to whisper. Presets are stored as JSON; "wow" and "generic"
//! are built in, and a user presets file merges over them.
//!
//! An entry with an empty prefix string is a "plain typing" channel: the
//! text is typed at the current focus with no open/send keys at all.

use crate::error::PadtalkError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Built-in presets. The "wow" entry mirrors the game's slash commands;
/// "generic" types anywhere without touching Enter (search boxes, sign
/// message fields, other games' already-open chat).
pub const DEFAULT_PRESETS: &str = r#"{
  "wow": {
    "name": "World of Warcraft",
    "chat_open_key": "enter",
    "chat_send_key": "enter",
    "default_channel": "say",
    "channels": {
      "say": "/s ",
      "party": "/p ",
      "raid": "/raid ",
      "guild": "/g ",
      "officer": "/o ",
      "yell": "/y ",
      "instance": "/i ",
      "whisper": "/w ",
      "type": ""
    },
    "whisper_prompt": "World of Warcraft gameplay with dungeons, raids, and bosses.",
    "context_file": "wow_context.json"
  },
  "generic": {
    "name": "Generic",
    "chat_open_key": null,
    "chat_send_key": null,
    "default_channel": "type",
    "channels": {
      "type": ""
    },
    "whisper_prompt": ""
  }
}"#;

/// One game's chat behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChannelPreset {
    /// Human-readable name
    pub name: String,

    /// Key pressed to open the chat input, None for games where chat is
    /// always focused (or for plain typing)
    pub chat_open_key: Option<String>,

    /// Key pressed to send the typed message
    pub chat_send_key: Option<String>,

    /// Channel used when no keyword prefix matches
    pub default_channel: String,

    /// Channel keyword → injected prefix ("" marks a plain typing channel)
    pub channels: HashMap<String, String>,

    /// Initial prompt hint for the transcription engine
    #[serde(default)]
    pub whisper_prompt: String,

    /// Optional game-context JSON file enriching the prompt per utterance
    #[serde(default)]
    pub context_file: Option<PathBuf>,
}

impl ChannelPreset {
    /// The injection prefix for a channel, if the channel exists
    pub fn prefix(&self, channel: &str) -> Option<&str> {
        self.channels.get(channel).map(|s| s.as_str())
    }

    /// Whether a channel is typed plainly, without open/send keys
    pub fn is_plain_typing(&self, channel: &str) -> bool {
        self.prefix(channel).map(|p| p.is_empty()).unwrap_or(false)
    }

    /// Structural validation. `id` is only used in error messages.
    ///
    /// Channel names that are strict prefixes of each other are rejected
    /// here: spoken text has no quoting, so "raid" vs "raidlead" would make
    /// routing depend on map iteration order.
    pub fn validate(&self, id: &str) -> Result<(), PadtalkError> {
        if self.channels.is_empty() {
            return Err(PadtalkError::Config(format!(
                "preset '{}' has no channels",
                id
            )));
        }

        if !self.channels.contains_key(&self.default_channel) {
            return Err(PadtalkError::Config(format!(
                "preset '{}': default_channel '{}' is not in channels",
                id, self.default_channel
            )));
        }

        let names: Vec<&String> = self.channels.keys().collect();
        for a in &names {
            for b in &names {
                if a != b && b.to_lowercase().starts_with(&a.to_lowercase()) {
                    return Err(PadtalkError::Config(format!(
                        "preset '{}': channel '{}' is a prefix of '{}'; overlapping channel names are not supported",
                        id, a, b
                    )));
                }
            }
        }

        Ok(())
    }
}

/// All known presets, keyed by id
pub struct PresetStore {
    presets: HashMap<String, ChannelPreset>,
}

impl PresetStore {
    /// Load the built-in presets, merge the optional user file over them,
    /// and validate every entry.
    pub fn load(user_file: Option<&Path>) -> Result<Self, PadtalkError> {
        let mut presets: HashMap<String, ChannelPreset> = serde_json::from_str(DEFAULT_PRESETS)
            .map_err(|e| PadtalkError::Config(format!("built-in presets invalid: {}", e)))?;

        if let Some(path) = user_file {
            let contents = std::fs::read_to_string(path).map_err(|e| {
                PadtalkError::Config(format!("Failed to read presets file {:?}: {}", path, e))
            })?;
            let user: HashMap<String, ChannelPreset> = serde_json::from_str(&contents)
                .map_err(|e| {
                    PadtalkError::Config(format!("Invalid presets file {:?}: {}", path, e))
                })?;

            tracing::info!("Loaded {} preset(s) from {:?}", user.len(), path);
            presets.extend(user);
        }

        for (id, preset) in &presets {
            preset.validate(id)?;
        }

        Ok(Self { presets })
    }

    pub fn get(&self, id: &str) -> Option<&ChannelPreset> {
        self.presets.get(id)
    }

    /// Look up a preset id, with the known ids in the error message
    pub fn select(&self, id: &str) -> Result<&ChannelPreset, PadtalkError> {
        self.get(id).ok_or_else(|| {
            let mut known: Vec<&str> = self.presets.keys().map(|s| s.as_str()).collect();
            known.sort_unstable();
            PadtalkError::Config(format!(
                "unknown preset '{}' (known: {})",
                id,
                known.join(", ")
            ))
        })
    }

    pub fn ids(&self) -> Vec<&str> {
        self.presets.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_presets_parse_and_validate() {
        let store = PresetStore::load(None).unwrap();
        assert!(store.get("wow").is_some());
        assert!(store.get("generic").is_some());
    }

    #[test]
    fn test_wow_preset_shape() {
        let store = PresetStore::load(None).unwrap();
        let wow = store.get("wow").unwrap();

        assert_eq!(wow.chat_open_key.as_deref(), Some("enter"));
        assert_eq!(wow.chat_send_key.as_deref(), Some("enter"));
        assert_eq!(wow.default_channel, "say");
        assert_eq!(wow.prefix("party"), Some("/p "));
        assert!(wow.is_plain_typing("type"));
        assert!(!wow.is_plain_typing("say"));
    }

    #[test]
    fn test_generic_preset_has_null_keys() {
        let store = PresetStore::load(None).unwrap();
        let generic = store.get("generic").unwrap();

        assert!(generic.chat_open_key.is_none());
        assert!(generic.chat_send_key.is_none());
        assert_eq!(generic.default_channel, "type");
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let store = PresetStore::load(None).unwrap();
        assert!(store.select("quake").is_err());
    }

    fn preset_with_channels(channels: &[(&str, &str)], default: &str) -> ChannelPreset {
        ChannelPreset {
            name: "Test".to_string(),
            chat_open_key: Some("enter".to_string()),
            chat_send_key: Some("enter".to_string()),
            default_channel: default.to_string(),
            channels: channels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            whisper_prompt: String::new(),
            context_file: None,
        }
    }

    #[test]
    fn test_default_channel_must_exist() {
        let preset = preset_with_channels(&[("say", "/s ")], "party");
        assert!(preset.validate("test").is_err());
    }

    #[test]
    fn test_overlapping_channel_names_rejected() {
        let preset = preset_with_channels(&[("raid", "/raid "), ("raidlead", "/rl ")], "raid");
        let err = preset.validate("test").unwrap_err();
        assert!(err.to_string().contains("prefix"));
    }

    #[test]
    fn test_empty_channels_rejected() {
        let preset = preset_with_channels(&[], "say");
        assert!(preset.validate("test").is_err());
    }

    #[test]
    fn test_user_file_merges_over_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        std::fs::write(
            &path,
            r#"{
              "ffxiv": {
                "name": "Final Fantasy XIV",
                "chat_open_key": "enter",
                "chat_send_key": "enter",
                "default_channel": "say",
                "channels": { "say": "/say ", "party": "/p " },
                "whisper_prompt": "Final Fantasy XIV gameplay."
              }
            }"#,
        )
        .unwrap();

        let store = PresetStore::load(Some(&path)).unwrap();
        assert!(store.get("ffxiv").is_some());
        // Built-ins survive the merge
        assert!(store.get("wow").is_some());
    }
}
