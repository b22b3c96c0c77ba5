//! Error types for padtalk
//!
//! Uses thiserror for ergonomic error definitions with clear messages
//! that guide users toward fixing common issues.
//!
//! Only two conditions are fatal, and both belong to the combo detector at
//! startup: no gamepad present, or a configured button name that is not in
//! the code table. Everything else (a crashed detector, a failed
//! transcription, a failed keystroke) is logged and recovered from.

use thiserror::Error;

/// Top-level error type for the padtalk application
#[derive(Error, Debug)]
pub enum PadtalkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Combo detector error: {0}")]
    Combo(#[from] ComboError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Audio capture error: {0}")]
    Audio(#[from] AudioError),

    #[error("Transcription error: {0}")]
    Transcribe(#[from] TranscribeError),

    #[error("Injection error: {0}")]
    Inject(#[from] InjectError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to combo detection. The first two are fatal to the
/// `padtalk listen` process.
#[derive(Error, Debug)]
pub enum ComboError {
    #[error("No gamepad device found in /dev/input/. Is the controller connected, and is the user in the 'input' group?\n  Run: sudo usermod -aG input $USER\n  Then log out and back in.")]
    NoGamepad,

    #[error("Unknown button name: '{0}'. Known buttons: L1, R1, L2, R2, L5, R5, A, B, X, Y")]
    UnknownButton(String),

    #[error("Cannot open input device '{0}'. Is the user in the 'input' group?")]
    DeviceAccess(String),

    #[error("evdev error: {0}")]
    Evdev(String),
}

/// Errors related to detector supervision
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Combo detector exited immediately after launch{0}")]
    LaunchFailed(String),

    #[error("Failed to spawn combo detector: {0}")]
    SpawnFailed(String),
}

/// Errors related to audio capture
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio connection failed: {0}")]
    Connection(String),

    #[error("Audio device not found: '{0}'. List devices with: pactl list sources short")]
    DeviceNotFound(String),

    #[error("No audio was captured. Check your microphone.")]
    EmptyRecording,

    #[error("Audio stream error: {0}")]
    StreamError(String),

    #[error("Recording timeout: exceeded {0} seconds")]
    Timeout(u32),
}

/// Errors related to speech-to-text transcription
#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("Model not found: {0}\n  Download a ggml model and set its path in [whisper] model.")]
    ModelNotFound(String),

    #[error("Whisper initialization failed: {0}")]
    InitFailed(String),

    #[error("Transcription failed: {0}")]
    InferenceFailed(String),

    #[error("Audio format error: {0}")]
    AudioFormat(String),
}

/// Errors related to keystroke injection
#[derive(Error, Debug)]
pub enum InjectError {
    #[error("ydotool daemon not running.\n  Start with: systemctl --user start ydotool\n  Enable at boot: systemctl --user enable ydotool")]
    YdotoolNotRunning,

    #[error("ydotool not found in PATH. Install via your package manager.")]
    YdotoolNotFound,

    #[error("Unknown key name: '{0}'. Supported: enter, tab, space, escape")]
    UnknownKey(String),

    #[error("Key press failed: {0}")]
    KeyFailed(String),

    #[error("Text injection failed: {0}")]
    TypeFailed(String),
}

/// Result type alias using PadtalkError
pub type Result<T> = std::result::Result<T, PadtalkError>;

impl From<evdev::Error> for ComboError {
    fn from(e: evdev::Error) -> Self {
        ComboError::Evdev(e.to_string())
    }
}
