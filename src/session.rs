//! Recording session state machine
//!
//! Owns the capture → transcribe → route → inject pipeline. All mutable
//! state (recording handle, pending send) lives behind one async mutex:
//! edges from the combo poll loop and externally triggered start/stop
//! (SIGUSR1/SIGUSR2) go through the same guard, so two callers can never
//! both be starting a recording.
//!
//! Confirm mode: when a positive confirm delay is configured, a finished
//! transcription is parked as a pending send instead of being injected.
//! The poll loop flushes it once the deadline passes; a combo tap before
//! that cancels it outright, and the cancelling tap does NOT start a new
//! recording.

use crate::audio::AudioCapture;
use crate::chat;
use crate::context;
use crate::error::AudioError;
use crate::inject::ChatInjector;
use crate::preset::ChannelPreset;
use crate::transcribe::Transcriber;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Creates a fresh capture for each recording
pub type CaptureFactory =
    Box<dyn Fn() -> Result<Box<dyn AudioCapture>, AudioError> + Send + Sync>;

/// Transcribed text held back from injection until its deadline
#[derive(Debug, Clone)]
pub struct PendingSend {
    pub text: String,
    pub deadline: Instant,
}

enum Recording {
    Idle,
    Active {
        started_at: Instant,
        capture: Box<dyn AudioCapture>,
    },
}

struct SessionState {
    recording: Recording,
    pending: Option<PendingSend>,
}

/// Tunables lifted out of the config structs
pub struct SessionOptions {
    /// Zero disables confirm mode
    pub confirm_delay: Duration,
    /// Recordings longer than this are stopped and discarded
    pub max_duration: Duration,
    /// State file for external integrations, if configured
    pub state_file: Option<PathBuf>,
}

/// The recording state machine service
pub struct ChatSession {
    state: Mutex<SessionState>,
    preset: ChannelPreset,
    transcriber: Arc<dyn Transcriber>,
    injector: ChatInjector,
    capture_factory: CaptureFactory,
    options: SessionOptions,
}

impl ChatSession {
    pub fn new(
        preset: ChannelPreset,
        transcriber: Arc<dyn Transcriber>,
        injector: ChatInjector,
        capture_factory: CaptureFactory,
        options: SessionOptions,
    ) -> Self {
        let session = Self {
            state: Mutex::new(SessionState {
                recording: Recording::Idle,
                pending: None,
            }),
            preset,
            transcriber,
            injector,
            capture_factory,
            options,
        };
        session.write_state("idle");
        session
    }

    pub async fn is_recording(&self) -> bool {
        matches!(self.state.lock().await.recording, Recording::Active { .. })
    }

    /// Combo activation edge. A pending send swallows the edge as a
    /// cancellation; otherwise recording starts.
    pub async fn combo_pressed(&self) {
        let mut state = self.state.lock().await;

        if let Some(pending) = state.pending.take() {
            tracing::info!("Pending send cancelled by combo press: {:?}", pending.text);
            self.write_state("idle");
            return;
        }

        self.start_locked(&mut state).await;
    }

    /// Combo release edge: stop, transcribe, route.
    pub async fn combo_released(&self) {
        let mut state = self.state.lock().await;
        self.stop_locked(&mut state).await;
    }

    /// Externally triggered start (SIGUSR1 / `padtalk record start`).
    /// Deliberately does not cancel a pending send; only the combo does.
    pub async fn start(&self) {
        let mut state = self.state.lock().await;
        self.start_locked(&mut state).await;
    }

    /// Externally triggered stop (SIGUSR2 / `padtalk record stop`)
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        self.stop_locked(&mut state).await;
    }

    /// Inject the pending send if its deadline has passed. Piggybacked on
    /// the bridge poll loop.
    pub async fn flush_pending(&self) {
        let mut state = self.state.lock().await;

        let due = state
            .pending
            .as_ref()
            .map(|p| Instant::now() >= p.deadline)
            .unwrap_or(false);

        if due {
            if let Some(pending) = state.pending.take() {
                self.write_state("idle");
                self.route_and_inject(&pending.text).await;
            }
        }
    }

    /// Stop and discard a recording that exceeded the safety limit
    pub async fn check_timeout(&self) {
        let mut state = self.state.lock().await;

        let expired = match &state.recording {
            Recording::Active { started_at, .. } => {
                started_at.elapsed() > self.options.max_duration
            }
            Recording::Idle => false,
        };

        if expired {
            tracing::warn!(
                "Recording timeout ({:.0}s limit), discarding",
                self.options.max_duration.as_secs_f32()
            );
            if let Recording::Active { mut capture, .. } =
                std::mem::replace(&mut state.recording, Recording::Idle)
            {
                let _ = capture.stop().await;
            }
            self.write_state("idle");
        }
    }

    /// Teardown: discard any in-progress recording and pending send
    pub async fn abort(&self) {
        let mut state = self.state.lock().await;

        if let Recording::Active { mut capture, .. } =
            std::mem::replace(&mut state.recording, Recording::Idle)
        {
            tracing::info!("Discarding in-progress recording on shutdown");
            let _ = capture.stop().await;
        }
        state.pending = None;
        self.write_state("idle");
    }

    async fn start_locked(&self, state: &mut SessionState) {
        if matches!(state.recording, Recording::Active { .. }) {
            tracing::debug!("Already recording, start ignored");
            return;
        }

        let mut capture = match (self.capture_factory)() {
            Ok(capture) => capture,
            Err(e) => {
                tracing::error!("Failed to create audio capture: {}", e);
                return;
            }
        };

        if let Err(e) = capture.start().await {
            tracing::error!("Failed to start audio: {}", e);
            return;
        }

        tracing::info!("Recording started");
        state.recording = Recording::Active {
            started_at: Instant::now(),
            capture,
        };
        self.write_state("recording");
    }

    async fn stop_locked(&self, state: &mut SessionState) {
        let (started_at, mut capture) =
            match std::mem::replace(&mut state.recording, Recording::Idle) {
                Recording::Active {
                    started_at,
                    capture,
                } => (started_at, capture),
                Recording::Idle => {
                    tracing::debug!("Not recording, stop ignored");
                    return;
                }
            };

        tracing::info!(
            "Recording stopped ({:.1}s)",
            started_at.elapsed().as_secs_f32()
        );

        let samples = match capture.stop().await {
            Ok(samples) => samples,
            Err(e) => {
                tracing::warn!("Recording error: {}", e);
                self.write_state("idle");
                return;
            }
        };

        let audio_duration = samples.len() as f32 / 16000.0;
        if audio_duration < 0.3 {
            tracing::debug!("Recording too short ({:.2}s), ignoring", audio_duration);
            self.write_state("idle");
            return;
        }

        self.write_state("transcribing");
        tracing::info!("Transcribing {:.1}s of audio...", audio_duration);

        // Transcription runs to completion or error; there is no
        // cancellation once capture has stopped
        let hints = context::build_hints(&self.preset);
        let transcriber = self.transcriber.clone();
        let text_result =
            tokio::task::spawn_blocking(move || transcriber.transcribe(&samples, &hints)).await;

        let text = match text_result {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::error!("Transcription failed: {}", e);
                self.write_state("idle");
                return;
            }
            Err(e) => {
                tracing::error!("Transcription task panicked: {}", e);
                self.write_state("idle");
                return;
            }
        };

        if text.is_empty() {
            tracing::debug!("Transcription was empty");
            self.write_state("idle");
            return;
        }

        tracing::info!("Transcribed: {:?}", text);

        if self.options.confirm_delay > Duration::ZERO {
            state.pending = Some(PendingSend {
                text,
                deadline: Instant::now() + self.options.confirm_delay,
            });
            tracing::info!(
                "Holding send for {:.1}s (tap combo to cancel)",
                self.options.confirm_delay.as_secs_f32()
            );
            self.write_state("pending");
        } else {
            self.write_state("idle");
            self.route_and_inject(&text).await;
        }
    }

    async fn route_and_inject(&self, text: &str) {
        let (channel, message) = chat::parse_channel_and_text(text, &self.preset);
        self.injector.send(channel, &message, &self.preset).await;
    }

    fn write_state(&self, state_name: &str) {
        if let Some(ref path) = self.options.state_file {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::warn!("Failed to create state file directory: {}", e);
                    return;
                }
            }
            if let Err(e) = std::fs::write(path, state_name) {
                tracing::warn!("Failed to write state file: {}", e);
            }
        }
    }
}
