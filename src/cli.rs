// Command-line interface definitions for padtalk
//
// This module is separate so it can be used by both the binary (main.rs)
// and build.rs for generating man pages.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "padtalk")]
#[command(author, version, about = "Gamepad push-to-talk voice chat for Linux games")]
#[command(long_about = "
Padtalk turns a gamepad button combo into push-to-talk for in-game chat.
Hold the combo to record, release to transcribe; say a channel keyword
(\"party pull the boss\") to route the message to that chat channel.

SETUP:
  1. Add yourself to the input group: sudo usermod -aG input $USER
  2. Log out and back in
  3. Start ydotool daemon: systemctl --user enable --now ydotool
  4. Run: padtalk (to start the daemon)

USAGE:
  Hold L1+R1 (default) while speaking, release to send.
  The message opens chat, types the channel command, and presses send.
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Override whisper model (tiny, base, small, medium, large-v3)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Override the active game preset (e.g. wow, generic)
    #[arg(long, value_name = "PRESET")]
    pub preset: Option<String>,

    /// Override the button combo (e.g. --combo L1,R1)
    #[arg(long, value_name = "BUTTONS", value_delimiter = ',')]
    pub combo: Option<Vec<String>>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as daemon (default if no command specified)
    Daemon,

    /// Run the combo detector in the foreground (normally spawned by the daemon)
    Listen,

    /// Control recording from external sources (scripts, other keybindings)
    Record {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// Show how a transcript would be routed, without injecting anything
    Parse {
        /// The transcript text, e.g. "party let's go"
        text: String,
    },

    /// Transcribe an audio file (WAV, 16kHz, mono) and show its routing
    Transcribe {
        /// Path to audio file
        file: std::path::PathBuf,
    },

    /// Show current configuration
    Config,

    /// Show daemon status (for Waybar/polybar integration)
    Status {
        /// Continuously output status changes (for Waybar exec)
        #[arg(long)]
        follow: bool,

        /// Output format: "text" (default) or "json" (for Waybar)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum RecordAction {
    /// Start recording (send SIGUSR1 to daemon)
    Start,
    /// Stop recording and transcribe (send SIGUSR2 to daemon)
    Stop,
}
