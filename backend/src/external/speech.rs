//! Speech service clients
//!
//! Audio-to-text and text-to-audio over HTTP. Failures here are media
//! errors: they produce a targeted "couldn't process audio" reply and never
//! touch ledger state.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use shared::Language;

use crate::config::SpeechConfig;
use crate::error::{AppError, AppResult};

/// Transcript returned by the speech-to-text service
#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    #[serde(default)]
    text: String,
}

/// Client for transcription and synthesis
#[derive(Clone)]
pub struct SpeechClient {
    stt_endpoint: String,
    tts_endpoint: String,
    api_key: String,
    http_client: Client,
}

impl SpeechClient {
    pub fn new(config: &SpeechConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            stt_endpoint: config.stt_endpoint.clone(),
            tts_endpoint: config.tts_endpoint.clone(),
            api_key: config.api_key.clone(),
            http_client,
        })
    }

    /// Transcribe audio with a language hint
    pub async fn transcribe(&self, audio: Vec<u8>, language: Language) -> AppResult<String> {
        let response = self
            .http_client
            .post(&self.stt_endpoint)
            .bearer_auth(&self.api_key)
            .query(&[("language", language.code())])
            .header("Content-Type", "application/octet-stream")
            .body(audio)
            .send()
            .await
            .map_err(|e| AppError::Media(format!("transcription request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Media(format!(
                "transcription returned {}",
                response.status()
            )));
        }

        let transcript: TranscriptResponse = response
            .json()
            .await
            .map_err(|e| AppError::Media(format!("transcription parse failed: {}", e)))?;

        Ok(transcript.text)
    }

    /// Transcribe without knowing the language: try both supported
    /// languages and keep the longer transcript. Returns the transcript
    /// and the language that produced it.
    pub async fn transcribe_best(&self, audio: Vec<u8>) -> AppResult<(String, Language)> {
        let mut best: Option<(String, Language)> = None;
        for language in [Language::Hindi, Language::English] {
            match self.transcribe(audio.clone(), language).await {
                Ok(text) if !text.trim().is_empty() => {
                    let longer = best
                        .as_ref()
                        .map(|(current, _)| text.chars().count() > current.chars().count())
                        .unwrap_or(true);
                    if longer {
                        best = Some((text, language));
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("transcription attempt ({}) failed: {}", language.code(), e),
            }
        }
        best.ok_or_else(|| AppError::Media("no transcript produced".to_string()))
    }

    /// Synthesize speech for a reply
    pub async fn synthesize(&self, text: &str, language: Language) -> AppResult<Vec<u8>> {
        let response = self
            .http_client
            .post(&self.tts_endpoint)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "text": text, "language": language.code() }))
            .send()
            .await
            .map_err(|e| AppError::Media(format!("synthesis request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Media(format!(
                "synthesis returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Media(format!("synthesis read failed: {}", e)))?;
        Ok(bytes.to_vec())
    }
}
