//! Speech-to-text transcription module
//!
//! Local whisper.cpp inference via the whisper-rs crate. The trait is the
//! seam the recording session talks through; tests substitute a mock and
//! never load a model.

pub mod whisper;

use crate::config::WhisperConfig;
use crate::context::PromptHints;
use crate::error::TranscribeError;

/// Trait for speech-to-text implementations
pub trait Transcriber: Send + Sync {
    /// Transcribe audio samples to text.
    /// Input: f32 samples, mono, 16kHz. The hints bias recognition toward
    /// the current game situation; either field may be empty. The returned
    /// text may be empty (silence, breath noise).
    fn transcribe(&self, samples: &[f32], hints: &PromptHints)
        -> Result<String, TranscribeError>;
}

/// Factory function to create the configured transcriber
pub fn create_transcriber(config: &WhisperConfig) -> Result<Box<dyn Transcriber>, TranscribeError> {
    tracing::info!("Creating transcriber: model={}", config.model);
    Ok(Box::new(whisper::WhisperTranscriber::new(config)?))
}
