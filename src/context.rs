//! Game context hints for transcription
//!
//! A companion addon can write a small JSON file describing where the
//! player is and who they are with. Feeding that to whisper as a prompt
//! materially improves recognition of proper nouns ("Ragnaros", party
//! member names) that no general model gets right.
//!
//! The file is re-read for every utterance; a missing or malformed file
//! degrades to the preset's static prompt.

use crate::config::Config;
use crate::preset::ChannelPreset;
use serde::Deserialize;
use std::path::PathBuf;

/// Prompt material handed to the transcriber
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptHints {
    /// Natural-language scene description used as the initial prompt
    pub initial_prompt: String,
    /// Comma-separated proper nouns worth biasing toward
    pub hotwords: String,
}

/// Addon-written context file contents
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameContext {
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub subzone: String,
    #[serde(default)]
    pub boss: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub party: Vec<String>,
}

/// Build hints for one utterance: preset prompt, enriched by the context
/// file when the preset names one and it parses.
pub fn build_hints(preset: &ChannelPreset) -> PromptHints {
    match load_context(preset) {
        Some(context) => hints_from_context(&preset.name, &context),
        None => PromptHints {
            initial_prompt: preset.whisper_prompt.clone(),
            hotwords: String::new(),
        },
    }
}

fn load_context(preset: &ChannelPreset) -> Option<GameContext> {
    let path = resolve_context_path(preset)?;
    let contents = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(context) => Some(context),
        Err(e) => {
            tracing::warn!("Ignoring malformed context file {:?}: {}", path, e);
            None
        }
    }
}

/// Relative context paths resolve against the config directory, where the
/// addon bridge drops its export.
fn resolve_context_path(preset: &ChannelPreset) -> Option<PathBuf> {
    let raw = preset.context_file.as_ref()?;
    if raw.is_absolute() {
        Some(raw.clone())
    } else {
        Config::config_dir().map(|dir| dir.join(raw))
    }
}

/// Pure hint construction from a parsed context
pub fn hints_from_context(game_name: &str, context: &GameContext) -> PromptHints {
    let mut parts = vec![game_name.to_string()];
    if !context.zone.is_empty() {
        parts.push(format!("in {}", context.zone));
    }
    if !context.subzone.is_empty() {
        parts.push(format!("at {}", context.subzone));
    }
    if !context.boss.is_empty() {
        parts.push(format!("fighting {}", context.boss));
    }

    let initial_prompt = format!("{}.", parts.join(" "));

    // Cap at ~10 terms so the prompt stays under the token budget
    let mut hotwords = Vec::new();
    for term in [&context.zone, &context.subzone, &context.boss, &context.target] {
        if !term.is_empty() {
            hotwords.push(term.clone());
        }
    }
    hotwords.extend(context.party.iter().take(6).cloned());
    hotwords.truncate(10);

    PromptHints {
        initial_prompt,
        hotwords: hotwords.join(", "),
    }
}
