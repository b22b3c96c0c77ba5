//! End-to-end routing tests: transcript text in, planned keystrokes out.
//!
//! This is the path where a bug silently lands messages in the wrong
//! in-game channel, so the full parse-then-plan pipeline is exercised
//! against the built-in presets exactly as the daemon uses it.

use padtalk::chat::parse_channel_and_text;
use padtalk::inject::{plan_actions, InjectAction};
use padtalk::preset::{ChannelPreset, PresetStore};

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

/// Parse and plan in one go, the way the session does after transcription
fn route(text: &str, preset: &ChannelPreset) -> Vec<InjectAction> {
    let (channel, message) = parse_channel_and_text(text, preset);
    plan_actions(channel, &message, preset)
}

fn press(key: &str) -> InjectAction {
    InjectAction::PressKey(key.to_string())
}

fn type_text(text: &str) -> InjectAction {
    InjectAction::TypeText(text.to_string())
}

#[test]
fn wow_party_message_is_open_type_send() {
    assert_eq!(
        route("party let's go", &wow()),
        vec![press("enter"), type_text("/p let's go"), press("enter")]
    );
}

#[test]
fn wow_default_channel_is_say() {
    assert_eq!(
        route("hello everyone", &wow()),
        vec![press("enter"), type_text("/s hello everyone"), press("enter")]
    );
}

#[test]
fn wow_separator_variants_route_identically() {
    let preset = wow();
    for text in ["raid: pull now", "raid, pull now", "raid. pull now", "raid pull now"] {
        let actions = route(text, &preset);
        assert_eq!(
            actions[1],
            type_text("/raid pull now"),
            "failed for {:?}",
            text
        );
    }
}

#[test]
fn wow_keyword_case_does_not_matter_but_message_case_does() {
    assert_eq!(
        route("Party: I Need Mana", &wow()),
        vec![press("enter"), type_text("/p I Need Mana"), press("enter")]
    );
}

#[test]
fn wow_type_channel_skips_enter_entirely() {
    assert_eq!(route("type hello world", &wow()), vec![type_text("hello world")]);
}

#[test]
fn wow_type_channel_drops_trailing_period() {
    assert_eq!(route("type hello world.", &wow()), vec![type_text("hello world")]);
}

#[test]
fn wow_bare_channel_word_goes_to_say() {
    // "party" alone is a message, not a channel selection
    assert_eq!(
        route("party ", &wow()),
        vec![press("enter"), type_text("/s party"), press("enter")]
    );
}

#[test]
fn wow_partial_keyword_goes_to_say() {
    assert_eq!(
        route("par hello", &wow()),
        vec![press("enter"), type_text("/s par hello"), press("enter")]
    );
}

#[test]
fn generic_preset_never_presses_enter() {
    let preset = generic();
    for text in ["hello world", "party let's go", "search for something"] {
        let actions = route(text, &preset);
        assert_eq!(actions.len(), 1, "failed for {:?}", text);
        assert!(
            matches!(actions[0], InjectAction::TypeText(_)),
            "failed for {:?}",
            text
        );
    }
}

#[test]
fn generic_preset_keeps_channel_words_in_text() {
    // "party" is not a channel in the generic preset
    assert_eq!(route("party let's go", &generic()), vec![type_text("party let's go")]);
}

#[test]
fn empty_transcript_produces_no_actions() {
    assert!(route("", &wow()).is_empty());
    assert!(route("   ", &wow()).is_empty());
    assert!(route("", &generic()).is_empty());
}

#[test]
fn punctuation_only_transcript_produces_no_actions() {
    // Whisper sometimes emits a lone period for silence; routed to the
    // plain-typing default of the generic preset it must type nothing
    assert!(route(".", &generic()).is_empty());
}

#[test]
fn user_preset_routes_with_its_own_channels() {
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
            "channels": { "say": "/say ", "shout": "/shout " },
            "whisper_prompt": "Final Fantasy XIV gameplay."
          }
        }"#,
    )
    .unwrap();

    let store = PresetStore::load(Some(&path)).unwrap();
    let ffxiv = store.get("ffxiv").unwrap();

    assert_eq!(
        route("shout selling glamour prisms", ffxiv),
        vec![
            press("enter"),
            type_text("/shout selling glamour prisms"),
            press("enter")
        ]
    );
}
