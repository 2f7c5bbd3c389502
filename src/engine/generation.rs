use async_trait::async_trait;

use super::EngineError;
use crate::config::EngineConfig;

/// One text-generation call: prompts plus the sampling knobs that differ
/// between the summary, facilitation, and reaction uses.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    /// Ask the engine for a strict JSON object response.
    pub json_output: bool,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// Text-generation engine boundary.
#[async_trait]
pub trait GenerationEngine: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, EngineError>;
}

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct HttpGenerationEngine {
    client: reqwest::Client,
    config: EngineConfig,
}

impl HttpGenerationEngine {
    pub fn new(client: reqwest::Client, config: EngineConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl GenerationEngine for HttpGenerationEngine {
    async fn generate(&self, request: GenerationRequest) -> Result<String, EngineError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);

        let mut body = serde_json::json!({
            "model": self.config.generation_model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user",   "content": request.user   }
            ],
            "temperature": request.temperature,
        });

        if request.json_output {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        let mut req = self.client.post(&url).json(&body);
        if !self.config.api_key.is_empty() {
            req = req.bearer_auth(&self.config.api_key);
        }

        let response = req.send().await?;

        if !response.status().is_success() {
            return Err(EngineError::Request(format!(
                "generation endpoint returned {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EngineError::Parse(e.to_string()))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(EngineError::EmptyResponse)?
            .trim()
            .to_string();

        if content.is_empty() {
            return Err(EngineError::EmptyResponse);
        }

        Ok(content)
    }
}
