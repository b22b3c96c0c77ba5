//! Padtalk - gamepad push-to-talk voice chat for Linux games
//!
//! Run with `padtalk` or `padtalk daemon` to start the daemon.
//! Use `padtalk parse "party hello"` to preview channel routing.
//! Use `padtalk transcribe <file>` to run a WAV through the pipeline.

use clap::Parser;
use padtalk::cli::{Cli, Commands, RecordAction};
use padtalk::{chat, config, context, inject, transcribe};
use padtalk::config::Config;
use padtalk::preset::PresetStore;
use padtalk::signal::PidFile;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("padtalk={},warn", log_level))),
        )
        .with_target(false)
        .init();

    // Load configuration
    let mut config = config::load_config(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(model) = cli.model {
        config.whisper.model = model;
    }
    if let Some(preset) = cli.preset {
        config.chat.preset = preset;
    }
    if let Some(combo) = cli.combo {
        config.combo.buttons = combo;
        config.validate()?;
    }

    // Run the appropriate command
    match cli.command.unwrap_or(Commands::Daemon) {
        Commands::Daemon => {
            let mut daemon = padtalk::Daemon::new(config, cli.config.clone());
            daemon.run().await?;
        }

        Commands::Listen => {
            let listener = padtalk::combo::listener::ComboListener::new(&config.combo)?;
            listener.run().await?;
        }

        Commands::Record { action } => {
            run_record(action)?;
        }

        Commands::Parse { text } => {
            show_routing(&config, &text)?;
        }

        Commands::Transcribe { file } => {
            transcribe_file(&config, &file)?;
        }

        Commands::Config => {
            show_config(&config);
        }

        Commands::Status { follow, format } => {
            run_status(&config, follow, &format)?;
        }
    }

    Ok(())
}

/// Send a recording control signal to the running daemon
fn run_record(action: RecordAction) -> anyhow::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let pid_file = PidFile::new(Config::daemon_pid_path());
    let pid = match pid_file.read() {
        Some(pid) if pid_file.is_alive() => pid,
        _ => {
            eprintln!("Error: padtalk daemon is not running.");
            std::process::exit(1);
        }
    };

    let signal = match action {
        RecordAction::Start => Signal::SIGUSR1,
        RecordAction::Stop => Signal::SIGUSR2,
    };

    kill(Pid::from_raw(pid), signal)?;
    Ok(())
}

/// Print how a transcript would be routed and injected
fn show_routing(config: &Config, text: &str) -> anyhow::Result<()> {
    let presets = PresetStore::load(config.chat.presets_file.as_deref())?;
    let preset = presets.select(&config.chat.preset)?;

    let (channel, message) = chat::parse_channel_and_text(text, preset);
    println!("Preset:  {} ({})", config.chat.preset, preset.name);
    println!("Channel: {}", channel);
    println!("Message: {:?}", message);

    let actions = inject::plan_actions(channel, &message, preset);
    if actions.is_empty() {
        println!("Actions: (none - empty message)");
    } else {
        println!("Actions:");
        for action in actions {
            match action {
                inject::InjectAction::PressKey(key) => println!("  press {}", key),
                inject::InjectAction::TypeText(text) => println!("  type  {:?}", text),
            }
        }
    }

    Ok(())
}

/// Transcribe an audio file and show its routing, without injecting
fn transcribe_file(config: &Config, path: &std::path::Path) -> anyhow::Result<()> {
    use hound::WavReader;

    println!("Loading audio file: {:?}", path);

    let reader = WavReader::open(path)?;
    let spec = reader.spec();

    println!(
        "Audio format: {} Hz, {} channel(s), {:?}",
        spec.sample_rate, spec.channels, spec.sample_format
    );

    // Convert samples to f32
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .filter_map(|s| s.ok())
                .map(|s| s as f32 / max_val)
                .collect()
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .filter_map(|s| s.ok())
            .collect(),
    };

    // Mix to mono and resample to 16kHz
    let channels = spec.channels as usize;
    let mono: Vec<f32> = if channels > 1 {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        samples
    };
    let mono = padtalk::audio::capture::resample(&mono, spec.sample_rate, 16000);

    let presets = PresetStore::load(config.chat.presets_file.as_deref())?;
    let preset = presets.select(&config.chat.preset)?;

    let transcriber = transcribe::create_transcriber(&config.whisper)?;
    let hints = context::build_hints(preset);

    println!("Transcribing...");
    let text = transcriber.transcribe(&mono, &hints)?;

    if text.is_empty() {
        println!("(no speech detected)");
        return Ok(());
    }

    println!("Transcribed: {:?}", text);
    println!();
    show_routing(config, &text)
}

/// Show daemon status from the state file
fn run_status(config: &Config, follow: bool, format: &str) -> anyhow::Result<()> {
    let state_file = config.resolve_state_file();

    if state_file.is_none() {
        eprintln!("Error: state_file is not configured.");
        eprintln!();
        eprintln!("To enable status monitoring, add to your config.toml:");
        eprintln!();
        eprintln!("  state_file = \"auto\"");
        std::process::exit(1);
    }

    let state_path = state_file.unwrap();

    let print_state = |state: &str| {
        if format == "json" {
            println!("{}", format_state_json(state));
        } else {
            println!("{}", state);
        }
    };

    let read_state =
        || std::fs::read_to_string(&state_path).unwrap_or_else(|_| "stopped".to_string());

    print_state(read_state().trim());

    if !follow {
        return Ok(());
    }

    // Follow mode: watch for changes using inotify
    use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
    use std::sync::mpsc::channel;
    use std::time::Duration;

    let (tx, rx) = channel();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        NotifyConfig::default().with_poll_interval(Duration::from_millis(100)),
    )?;

    // Watch the state file's parent directory (file may not exist yet)
    if let Some(parent) = state_path.parent() {
        std::fs::create_dir_all(parent)?;
        watcher.watch(parent, RecursiveMode::NonRecursive)?;
    }

    let mut last_state = read_state().trim().to_string();

    loop {
        match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(Ok(_event)) => {
                let new_state = read_state().trim().to_string();
                if new_state != last_state {
                    print_state(&new_state);
                    last_state = new_state;
                }
            }
            Ok(Err(e)) => {
                tracing::warn!("Watch error: {:?}", e);
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
                // Check if file was deleted (daemon stopped)
                if !state_path.exists() && last_state != "stopped" {
                    print_state("stopped");
                    last_state = "stopped".to_string();
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                break;
            }
        }
    }

    Ok(())
}

/// Format state as JSON for Waybar consumption
fn format_state_json(state: &str) -> String {
    let (text, class, tooltip) = match state {
        "recording" => ("🎤", "recording", "Recording..."),
        "transcribing" => ("⏳", "transcribing", "Transcribing..."),
        "pending" => ("✋", "pending", "Tap combo to cancel send"),
        "idle" => ("🎙️", "idle", "Padtalk ready - hold combo to talk"),
        "stopped" => ("", "stopped", "Padtalk not running"),
        _ => ("?", "unknown", "Unknown state"),
    };

    format!(
        r#"{{"text": "{}", "class": "{}", "tooltip": "{}"}}"#,
        text, class, tooltip
    )
}

/// Show current configuration
fn show_config(config: &Config) {
    println!("Current Configuration\n");
    println!("=====================\n");

    println!("[combo]");
    println!("  buttons = {:?}", config.combo.buttons);
    println!("  enabled = {}", config.combo.enabled);
    println!("  device_match = {:?}", config.combo.device_match);

    println!("\n[bridge]");
    println!("  poll_interval_ms = {}", config.bridge.poll_interval_ms);
    println!("  health_check_ticks = {}", config.bridge.health_check_ticks);
    println!("  launch_grace_ms = {}", config.bridge.launch_grace_ms);

    println!("\n[audio]");
    println!("  device = {:?}", config.audio.device);
    println!("  sample_rate = {}", config.audio.sample_rate);
    println!("  max_duration_secs = {}", config.audio.max_duration_secs);

    println!("\n[whisper]");
    println!("  model = {:?}", config.whisper.model);
    println!("  language = {:?}", config.whisper.language);
    println!("  translate = {}", config.whisper.translate);
    if let Some(threads) = config.whisper.threads {
        println!("  threads = {}", threads);
    }

    println!("\n[chat]");
    println!("  preset = {:?}", config.chat.preset);
    if let Some(ref path) = config.chat.presets_file {
        println!("  presets_file = {:?}", path);
    }
    println!("  confirm_delay_secs = {}", config.chat.confirm_delay_secs);
    println!("  key_delay_ms = {}", config.chat.key_delay_ms);

    if let Some(ref state_file) = config.state_file {
        println!("\n[integration]");
        println!("  state_file = {:?}", state_file);
        if let Some(resolved) = config.resolve_state_file() {
            println!("  (resolves to: {:?})", resolved);
        }
    }

    println!("\n---");
    println!(
        "Config file: {:?}",
        Config::default_path().unwrap_or_else(|| std::path::PathBuf::from("(not found)"))
    );
    println!("Models dir: {:?}", Config::models_dir());
    println!("Runtime dir: {:?}", Config::runtime_dir());
}
