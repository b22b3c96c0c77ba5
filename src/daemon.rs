//! Daemon module - main event loop orchestration
//!
//! Hosts the supervising bridge and the recording session: launches the
//! combo detector, polls its signal on a fixed interval, and routes
//! SIGUSR1/SIGUSR2 from `padtalk record` through the same session guard
//! the poll loop uses.

use crate::bridge::Bridge;
use crate::config::Config;
use crate::error::Result;
use crate::inject::{ydotool::YdotoolOutput, ChatInjector};
use crate::preset::PresetStore;
use crate::session::{CaptureFactory, ChatSession, SessionOptions};
use crate::signal::PidFile;
use crate::{audio, transcribe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};

/// Main daemon that orchestrates all components
pub struct Daemon {
    config: Config,
    /// Original --config path, forwarded to the spawned detector
    config_path: Option<PathBuf>,
}

impl Daemon {
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Run the daemon main loop
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!("Starting padtalk daemon");

        let daemon_pid = PidFile::new(Config::daemon_pid_path());
        if let Err(e) = daemon_pid.write_self() {
            tracing::warn!("Failed to write daemon PID file: {}", e);
        }

        let mut sigusr1 = signal(SignalKind::user_defined1()).map_err(|e| {
            crate::error::PadtalkError::Config(format!("Failed to set up SIGUSR1 handler: {}", e))
        })?;
        let mut sigusr2 = signal(SignalKind::user_defined2()).map_err(|e| {
            crate::error::PadtalkError::Config(format!("Failed to set up SIGUSR2 handler: {}", e))
        })?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
            crate::error::PadtalkError::Config(format!("Failed to set up SIGTERM handler: {}", e))
        })?;

        // Resolve the active preset
        let presets = PresetStore::load(self.config.chat.presets_file.as_deref())?;
        let preset = presets.select(&self.config.chat.preset)?.clone();
        tracing::info!(
            "Active preset: {} ({})",
            self.config.chat.preset,
            preset.name
        );

        // Load the model up front so the first utterance is not delayed
        tracing::info!("Loading transcription model: {}", self.config.whisper.model);
        let transcriber: Arc<dyn transcribe::Transcriber> =
            Arc::from(transcribe::create_transcriber(&self.config.whisper)?);
        tracing::info!("Model loaded, ready for voice input");

        let injector = ChatInjector::new(
            Box::new(YdotoolOutput::new()),
            Duration::from_millis(self.config.chat.key_delay_ms),
        );
        if !injector.is_available().await {
            tracing::warn!(
                "{} is not usable right now - chat injection will fail until ydotoold is running",
                injector.backend_name()
            );
        }

        let audio_config = self.config.audio.clone();
        let capture_factory: CaptureFactory =
            Box::new(move || audio::create_capture(&audio_config));

        let confirm_delay = Duration::from_secs_f32(self.config.chat.confirm_delay_secs);
        if confirm_delay > Duration::ZERO {
            tracing::info!(
                "Confirm mode: sends held for {:.1}s, tap combo to cancel",
                confirm_delay.as_secs_f32()
            );
        }

        let state_file_path = self.config.resolve_state_file();
        if let Some(ref path) = state_file_path {
            tracing::info!("State file: {:?}", path);
        }

        let session = ChatSession::new(
            preset,
            transcriber,
            injector,
            capture_factory,
            SessionOptions {
                confirm_delay,
                max_duration: Duration::from_secs(self.config.audio.max_duration_secs as u64),
                state_file: state_file_path.clone(),
            },
        );

        // Launch the combo detector
        let mut bridge = Bridge::new(
            self.config.bridge.clone(),
            self.config.combo.enabled,
            self.config_path.clone(),
        );

        if self.config.combo.enabled {
            tracing::info!("Combo: {}", self.config.combo.buttons.join("+"));
            if let Err(e) = bridge.launch().await {
                // Not fatal: the health check keeps retrying, and `padtalk
                // record` works without a detector
                tracing::error!("Combo detector launch failed: {}", e);
            }
        } else {
            tracing::info!("Combo listening disabled, use 'padtalk record start/stop'");
        }

        let mut poll = tokio::time::interval(bridge.poll_interval());
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        // Main event loop
        loop {
            tokio::select! {
                _ = poll.tick() => {
                    bridge.poll(&session).await;
                    session.flush_pending().await;
                    session.check_timeout().await;
                }

                // External start (for scripts and other keybindings)
                _ = sigusr1.recv() => {
                    tracing::debug!("Received SIGUSR1 (start recording)");
                    session.start().await;
                }

                // External stop
                _ = sigusr2.recv() => {
                    tracing::debug!("Received SIGUSR2 (stop recording)");
                    session.stop().await;
                }

                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT, shutting down...");
                    break;
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, shutting down...");
                    break;
                }
            }
        }

        // Teardown: stop listening first so no new edges arrive, then
        // discard whatever was in flight
        bridge.shutdown().await;
        session.abort().await;

        if let Some(ref path) = state_file_path {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    tracing::warn!("Failed to remove state file: {}", e);
                }
            }
        }
        daemon_pid.remove();

        tracing::info!("Daemon stopped");

        Ok(())
    }
}
