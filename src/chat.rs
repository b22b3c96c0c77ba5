//! Spoken channel routing
//!
//! The first word of an utterance can name a chat channel: "party pull
//! the boss" goes to party chat, "guild: anyone up for a dungeon?" goes
//! to guild. This module is the pure parser; it never touches the
//! keyboard.
//!
//! If parsing is wrong, messages silently land in the wrong in-game
//! channel, so the rules are deliberately narrow: the keyword must be
//! followed by a colon, comma, period, or space. A channel word alone
//! ("party") is ordinary text for the default channel, not a channel
//! selection with an empty message.

use crate::preset::ChannelPreset;

/// Separators accepted between a channel keyword and the message.
/// Whisper tends to punctuate ("Party, I need mana"), so comma and
/// period count alongside colon and plain space.
const SEPARATORS: [char; 4] = [':', ',', '.', ' '];

/// Split a transcript into (channel, message) against a preset.
///
/// Matching is ASCII case-insensitive on the keyword only; the returned
/// message keeps its original casing. No keyword+separator match returns
/// the default channel with the trimmed text unchanged.
pub fn parse_channel_and_text<'p>(text: &str, preset: &'p ChannelPreset) -> (&'p str, String) {
    let text = text.trim();
    let lower = text.to_ascii_lowercase();

    for channel in preset.channels.keys() {
        let channel_lower = channel.to_ascii_lowercase();

        for sep in SEPARATORS {
            let mut keyword = channel_lower.clone();
            keyword.push(sep);

            if lower.starts_with(&keyword) {
                let message = text[keyword.len()..].trim().to_string();
                return (channel.as_str(), message);
            }
        }
    }

    (preset.default_channel.as_str(), text.to_string())
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
    fn test_space_separator() {
        let (ch, text) = parse_channel_and_text("party let's go", &wow());
        assert_eq!(ch, "party");
        assert_eq!(text, "let's go");
    }

    #[test]
    fn test_colon_separator() {
        let (ch, text) = parse_channel_and_text("party: pull boss", &wow());
        assert_eq!(ch, "party");
        assert_eq!(text, "pull boss");
    }

    #[test]
    fn test_comma_separator() {
        let (ch, text) = parse_channel_and_text("party, I need mana", &wow());
        assert_eq!(ch, "party");
        assert_eq!(text, "I need mana");
    }

    #[test]
    fn test_period_separator() {
        let (ch, text) = parse_channel_and_text("party. ready?", &wow());
        assert_eq!(ch, "party");
        assert_eq!(text, "ready?");
    }

    #[test]
    fn test_case_insensitive_keyword() {
        let (ch, text) = parse_channel_and_text("Party: hello", &wow());
        assert_eq!(ch, "party");
        assert_eq!(text, "hello");

        let (ch, text) = parse_channel_and_text("RAID pull now", &wow());
        assert_eq!(ch, "raid");
        assert_eq!(text, "pull now");
    }

    #[test]
    fn test_message_case_preserved() {
        let (_, text) = parse_channel_and_text("raid: Focus Adds First Please", &wow());
        assert_eq!(text, "Focus Adds First Please");
    }

    #[test]
    fn test_all_wow_channels_recognized() {
        let preset = wow();
        for keyword in [
            "say", "party", "raid", "guild", "officer", "yell", "instance", "whisper", "type",
        ] {
            let (ch, _) = parse_channel_and_text(&format!("{} hello", keyword), &preset);
            assert_eq!(ch, keyword);
        }
    }

    #[test]
    fn test_leading_whitespace_stripped() {
        let (ch, text) = parse_channel_and_text("  party let's go", &wow());
        assert_eq!(ch, "party");
        assert_eq!(text, "let's go");
    }

    #[test]
    fn test_no_prefix_uses_default() {
        let (ch, text) = parse_channel_and_text("hello everyone", &wow());
        assert_eq!(ch, "say");
        assert_eq!(text, "hello everyone");
    }

    #[test]
    fn test_partial_keyword_not_matched() {
        // "par" is not a channel; the separator requirement keeps "party"
        // from matching inside "par hello"
        let (ch, text) = parse_channel_and_text("par hello", &wow());
        assert_eq!(ch, "say");
        assert_eq!(text, "par hello");
    }

    #[test]
    fn test_keyword_alone_is_plain_text() {
        // "party " trims to "party": no separator survives, so it is a
        // message for the default channel, not an empty party message
        let (ch, text) = parse_channel_and_text("party ", &wow());
        assert_eq!(ch, "say");
        assert_eq!(text, "party");
    }

    #[test]
    fn test_generic_preset_has_no_keywords() {
        let (ch, text) = parse_channel_and_text("party let's go", &generic());
        assert_eq!(ch, "type");
        assert_eq!(text, "party let's go");
    }

    #[test]
    fn test_empty_input() {
        let (ch, text) = parse_channel_and_text("   ", &wow());
        assert_eq!(ch, "say");
        assert_eq!(text, "");
    }
}
