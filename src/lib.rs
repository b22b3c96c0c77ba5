//! Padtalk: gamepad push-to-talk voice chat for Linux games
//!
//! This library provides the core functionality for:
//! - Detecting a gamepad button combo via evdev, in a supervised child process
//! - Capturing audio via cpal (supports PipeWire, PulseAudio, ALSA)
//! - Transcribing speech using whisper.cpp (fast, local, offline)
//! - Routing the transcript to a chat channel by spoken keyword
//! - Injecting the message into the game via ydotool keystrokes
//!
//! # Architecture
//!
//! ```text
//!   ┌────────────────────┐   signal file    ┌────────────────────────┐
//!   │   padtalk listen   │   ("0" / "1")    │     padtalk daemon     │
//!   │  (combo detector)  │ ───────────────▶ │   Bridge ──▶ Session   │
//!   │   evdev ─▶ tracker │    pid file      │   (poll)    (record)   │
//!   └────────────────────┘ ◀─────────────── └───────────┬────────────┘
//!     launched, probed and                              │
//!     relaunched by the bridge                          │
//!                                                       ▼
//!          [Press] ──▶ start capture (cpal)    ┌──────────────┐
//!          [Release] ─▶ stop and transcribe ─▶ │   Whisper    │
//!                                              │ (whisper-rs) │
//!                                              └──────┬───────┘
//!                                                     │ text
//!                                              ┌──────▼───────┐
//!                                              │   Channel    │
//!                                              │    parser    │
//!                                              └──────┬───────┘
//!                                                     │ (channel, message)
//!                                              ┌──────▼───────┐
//!                                              │   Injector   │
//!                                              │  (ydotool)   │
//!                                              └──────────────┘
//! ```
//!
//! The detector and the daemon share no memory: the combo state crosses
//! processes as a single byte in a file, and liveness as a PID file. With
//! a confirm delay configured, a finished transcription is held as a
//! pending send that a quick combo tap can cancel before it reaches the
//! game.

pub mod audio;
pub mod bridge;
pub mod chat;
pub mod cli;
pub mod combo;
pub mod config;
pub mod context;
pub mod daemon;
pub mod error;
pub mod inject;
pub mod preset;
pub mod session;
pub mod signal;
pub mod transcribe;

pub use cli::{Cli, Commands, RecordAction};
pub use config::Config;
pub use daemon::Daemon;
pub use error::{PadtalkError, Result};
