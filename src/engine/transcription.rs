use async_trait::async_trait;
use tracing::debug;

use super::EngineError;
use crate::config::EngineConfig;

/// Speech-to-text engine boundary: canonical WAV bytes in, recognized text
/// out.
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    async fn transcribe(&self, wav: Vec<u8>, language: &str) -> Result<String, EngineError>;
}

/// Calls an OpenAI-compatible `/v1/audio/transcriptions` endpoint with a
/// multipart upload.
pub struct HttpTranscriptionEngine {
    client: reqwest::Client,
    config: EngineConfig,
}

impl HttpTranscriptionEngine {
    pub fn new(client: reqwest::Client, config: EngineConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl TranscriptionEngine for HttpTranscriptionEngine {
    async fn transcribe(&self, wav: Vec<u8>, language: &str) -> Result<String, EngineError> {
        let url = format!("{}/v1/audio/transcriptions", self.config.base_url);

        debug!("Submitting {} byte segment for transcription", wav.len());

        let file_part = reqwest::multipart::Part::bytes(wav)
            .file_name("segment.wav")
            .mime_str("audio/wav")
            .map_err(|e| EngineError::Request(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.config.transcription_model.clone())
            .text("language", language.to_string())
            .text("response_format", "text");

        let mut request = self.client.post(&url).multipart(form);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(EngineError::Request(format!(
                "transcription endpoint returned {}",
                response.status()
            )));
        }

        let text = response.text().await?;
        let text = text.trim().to_string();

        if text.is_empty() {
            return Err(EngineError::EmptyResponse);
        }

        Ok(text)
    }
}
