//! Whisper-based speech-to-text transcription
//!
//! Uses whisper.cpp via the whisper-rs crate for fast, local transcription.
//! Game context hints are folded into the initial prompt; whisper.cpp has
//! no separate hotword channel, but prompt biasing covers proper nouns
//! well enough for chat-length utterances.

use super::Transcriber;
use crate::config::{Config, WhisperConfig};
use crate::context::PromptHints;
use crate::error::TranscribeError;
use std::path::PathBuf;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Whisper-based transcriber
pub struct WhisperTranscriber {
    /// Whisper context (holds the model)
    ctx: WhisperContext,
    /// Language for transcription
    language: String,
    /// Whether to translate to English
    translate: bool,
    /// Number of threads to use
    threads: usize,
}

impl WhisperTranscriber {
    /// Create a new whisper transcriber
    pub fn new(config: &WhisperConfig) -> Result<Self, TranscribeError> {
        let model_path = resolve_model_path(&config.model)?;

        tracing::info!("Loading whisper model from {:?}", model_path);
        let start = std::time::Instant::now();

        let ctx = WhisperContext::new_with_params(
            model_path
                .to_str()
                .ok_or_else(|| TranscribeError::ModelNotFound("Invalid path".to_string()))?,
            WhisperContextParameters::default(),
        )
        .map_err(|e| TranscribeError::InitFailed(e.to_string()))?;

        tracing::info!("Model loaded in {:.2}s", start.elapsed().as_secs_f32());

        let threads = config.threads.unwrap_or_else(|| num_cpus::get().min(4));

        Ok(Self {
            ctx,
            language: config.language.clone(),
            translate: config.translate,
            threads,
        })
    }
}

impl Transcriber for WhisperTranscriber {
    fn transcribe(
        &self,
        samples: &[f32],
        hints: &PromptHints,
    ) -> Result<String, TranscribeError> {
        if samples.is_empty() {
            return Err(TranscribeError::AudioFormat("Empty audio buffer".to_string()));
        }

        let duration_secs = samples.len() as f32 / 16000.0;
        tracing::debug!(
            "Transcribing {:.2}s of audio ({} samples)",
            duration_secs,
            samples.len()
        );

        let start = std::time::Instant::now();

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| TranscribeError::InferenceFailed(e.to_string()))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        // Set language (handle "auto" for auto-detection)
        if self.language == "auto" {
            params.set_language(None);
        } else {
            params.set_language(Some(&self.language));
        }

        params.set_translate(self.translate);
        params.set_n_threads(self.threads as i32);

        // Disable output we don't need
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        // Improve transcription quality
        params.set_suppress_blank(true);
        params.set_suppress_nst(true);

        // Bias recognition toward the current game situation
        let prompt = combined_prompt(hints);
        if !prompt.is_empty() {
            tracing::debug!("Initial prompt: {:?}", prompt);
            params.set_initial_prompt(&prompt);
        }

        // Chat messages are short; single segment mode avoids spurious splits
        if duration_secs < 30.0 {
            params.set_single_segment(true);
        }

        state
            .full(params, samples)
            .map_err(|e| TranscribeError::InferenceFailed(e.to_string()))?;

        let mut text = String::new();
        for segment in state.as_iter() {
            text.push_str(
                segment
                    .to_str()
                    .map_err(|e| TranscribeError::InferenceFailed(e.to_string()))?,
            );
        }

        let result = text.trim().to_string();

        tracing::info!(
            "Transcription completed in {:.2}s: {:?}",
            start.elapsed().as_secs_f32(),
            result
        );

        Ok(result)
    }
}

/// Fold the hotwords into the prompt; whisper.cpp accepts only one
/// free-text prompt.
fn combined_prompt(hints: &PromptHints) -> String {
    match (hints.initial_prompt.is_empty(), hints.hotwords.is_empty()) {
        (true, true) => String::new(),
        (false, true) => hints.initial_prompt.clone(),
        (true, false) => hints.hotwords.clone(),
        (false, false) => format!("{} {}", hints.initial_prompt, hints.hotwords),
    }
}

/// Resolve a model name or path to an on-disk ggml model file
fn resolve_model_path(model: &str) -> Result<PathBuf, TranscribeError> {
    // If it's already an absolute path, use it directly
    let path = PathBuf::from(model);
    if path.is_absolute() && path.exists() {
        return Ok(path);
    }

    // Map model names to file names
    let model_filename = match model {
        "tiny" => "ggml-tiny.bin",
        "tiny.en" => "ggml-tiny.en.bin",
        "base" => "ggml-base.bin",
        "base.en" => "ggml-base.en.bin",
        "small" => "ggml-small.bin",
        "small.en" => "ggml-small.en.bin",
        "medium" => "ggml-medium.bin",
        "medium.en" => "ggml-medium.en.bin",
        "large" | "large-v3" => "ggml-large-v3.bin",
        other if other.ends_with(".bin") => other,
        other => {
            return Err(TranscribeError::ModelNotFound(format!(
                "Unknown model: '{}'. Valid models: tiny, base, small, medium, large-v3",
                other
            )));
        }
    };

    // Look in the data directory, then the current directory
    let model_path = Config::models_dir().join(model_filename);
    if model_path.exists() {
        return Ok(model_path);
    }

    let cwd_path = PathBuf::from(model_filename);
    if cwd_path.exists() {
        return Ok(cwd_path);
    }

    Err(TranscribeError::ModelNotFound(format!(
        "Model '{}' not found. Looked in:\n  - {}\n  - {}\n\nDownload from: https://huggingface.co/ggerganov/whisper.cpp/tree/main",
        model,
        model_path.display(),
        cwd_path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_name_rejected() {
        assert!(resolve_model_path("colossal-v9").is_err());
    }

    #[test]
    fn test_combined_prompt_folds_hotwords() {
        let hints = PromptHints {
            initial_prompt: "WoW in Blackrock Depths.".to_string(),
            hotwords: "Ragnaros, Thrall".to_string(),
        };
        assert_eq!(
            combined_prompt(&hints),
            "WoW in Blackrock Depths. Ragnaros, Thrall"
        );

        let empty = PromptHints::default();
        assert_eq!(combined_prompt(&empty), "");
    }
}
