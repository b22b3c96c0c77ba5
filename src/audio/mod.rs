//! Audio capture module
//!
//! Provides audio recording capabilities using cpal, which works with
//! PipeWire, PulseAudio, and ALSA backends.

pub mod capture;

use crate::config::AudioConfig;
use crate::error::AudioError;

/// Trait for audio capture implementations. One instance covers one
/// recording: start, then stop to collect everything heard in between.
#[async_trait::async_trait]
pub trait AudioCapture: Send + Sync {
    /// Start capturing audio
    async fn start(&mut self) -> Result<(), AudioError>;

    /// Stop capturing and return all recorded samples (f32, mono, 16kHz)
    async fn stop(&mut self) -> Result<Vec<f32>, AudioError>;
}

/// Factory function to create audio capture
pub fn create_capture(config: &AudioConfig) -> Result<Box<dyn AudioCapture>, AudioError> {
    Ok(Box::new(capture::CpalCapture::new(config)?))
}
