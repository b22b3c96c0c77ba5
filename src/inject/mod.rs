//! Chat keystroke injection
//!
//! Turns a routed (channel, message) pair into an ordered sequence of
//! simulated keystrokes: open the chat box, type the channel command plus
//! the message, press send. Planning is pure; execution goes through the
//! [`KeyOutput`] trait so tests never touch a real keyboard.
//!
//! Per-action failures are logged and the remaining actions still run: a
//! dropped Enter is recoverable in-game, an aborted half-typed message
//! is not made worse by skipping the send.

pub mod ydotool;

use crate::error::InjectError;
use crate::preset::ChannelPreset;
use std::time::Duration;

/// One simulated input step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectAction {
    /// Press and release a named key ("enter", "tab", ...)
    PressKey(String),
    /// Type a string at the current focus
    TypeText(String),
}

/// Trait for keystroke injection implementations
#[async_trait::async_trait]
pub trait KeyOutput: Send + Sync {
    /// Press and release a key by name
    async fn press_key(&self, key: &str) -> Result<(), InjectError>;

    /// Type a string
    async fn type_text(&self, text: &str) -> Result<(), InjectError>;

    /// Check if this output method is usable right now
    async fn is_available(&self) -> bool;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Plan the action sequence for a message, without side effects.
///
/// - empty message → no actions at all
/// - plain-typing channel (empty prefix) or a preset without open/send
///   keys → just type the message
/// - otherwise → open key, prefix + message, send key
pub fn plan_actions(channel: &str, message: &str, preset: &ChannelPreset) -> Vec<InjectAction> {
    let message = message.trim();
    if message.is_empty() {
        return Vec::new();
    }

    let prefix = preset.prefix(channel).unwrap_or("");

    let keys = match (&preset.chat_open_key, &preset.chat_send_key) {
        (Some(open), Some(send)) if !prefix.is_empty() => Some((open.clone(), send.clone())),
        _ => None,
    };

    match keys {
        Some((open, send)) => vec![
            InjectAction::PressKey(open),
            InjectAction::TypeText(format!("{}{}", prefix, message)),
            InjectAction::PressKey(send),
        ],
        None => {
            // Whisper likes to end utterances with a period; that is noise
            // when typing into a search box or an already-open input
            let typed = message.trim_end_matches('.').trim_end();
            if typed.is_empty() {
                return Vec::new();
            }
            vec![InjectAction::TypeText(typed.to_string())]
        }
    }
}

/// Executes planned actions against a [`KeyOutput`] with a settling delay
/// between steps, so the game has time to react to the chat box opening.
pub struct ChatInjector {
    output: Box<dyn KeyOutput>,
    key_delay: Duration,
}

impl ChatInjector {
    pub fn new(output: Box<dyn KeyOutput>, key_delay: Duration) -> Self {
        Self { output, key_delay }
    }

    /// Route and deliver one message. Individual action failures are
    /// logged; the rest of the sequence is still attempted.
    pub async fn send(&self, channel: &str, message: &str, preset: &ChannelPreset) {
        let actions = plan_actions(channel, message, preset);
        if actions.is_empty() {
            return;
        }

        tracing::info!("Sending to [{}]: {:?}", channel, message);

        for (i, action) in actions.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.key_delay).await;
            }

            let result = match action {
                InjectAction::PressKey(key) => self.output.press_key(key).await,
                InjectAction::TypeText(text) => self.output.type_text(text).await,
            };

            if let Err(e) = result {
                tracing::error!("Injection action {:?} failed: {}", action, e);
            }
        }
    }

    pub async fn is_available(&self) -> bool {
        self.output.is_available().await
    }

    pub fn backend_name(&self) -> &'static str {
        self.output.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::PresetStore;

    fn wow() -> ChannelPreset {
        PresetStore::load(None).unwrap().get("wow").unwrap().clone()
    }

    fn generic() -> ChannelPreset {
        PresetStore::load(None)
            .unwrap()
            .get("generic")
            .unwrap()
            .clone()
    }

    #[test]
    fn test_normal_channel_is_open_type_send() {
        let actions = plan_actions("say", "hello world", &wow());
        assert_eq!(
            actions,
            vec![
                InjectAction::PressKey("enter".to_string()),
                InjectAction::TypeText("/s hello world".to_string()),
                InjectAction::PressKey("enter".to_string()),
            ]
        );
    }

    #[test]
    fn test_party_prefix_applied() {
        let actions = plan_actions("party", "incoming", &wow());
        assert_eq!(
            actions[1],
            InjectAction::TypeText("/p incoming".to_string())
        );
        assert_eq!(actions.len(), 3);
    }

    #[test]
    fn test_plain_typing_channel_skips_keys() {
        let actions = plan_actions("type", "hello world", &wow());
        assert_eq!(
            actions,
            vec![InjectAction::TypeText("hello world".to_string())]
        );
    }

    #[test]
    fn test_plain_typing_strips_trailing_period() {
        let actions = plan_actions("type", "hello world.", &wow());
        assert_eq!(
            actions,
            vec![InjectAction::TypeText("hello world".to_string())]
        );
    }

    #[test]
    fn test_normal_channel_keeps_trailing_period() {
        let actions = plan_actions("say", "on my way.", &wow());
        assert_eq!(
            actions[1],
            InjectAction::TypeText("/s on my way.".to_string())
        );
    }

    #[test]
    fn test_null_keys_type_only() {
        let actions = plan_actions("type", "search for something", &generic());
        assert_eq!(
            actions,
            vec![InjectAction::TypeText("search for something".to_string())]
        );
    }

    #[test]
    fn test_empty_message_no_actions() {
        assert!(plan_actions("say", "", &wow()).is_empty());
        assert!(plan_actions("say", "   ", &wow()).is_empty());
        assert!(plan_actions("type", "...", &wow()).is_empty());
    }
}
