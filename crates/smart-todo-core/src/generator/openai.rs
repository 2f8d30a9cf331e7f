//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{Prompt, TextGenerator};
use crate::config::GeneratorConfig;
use crate::error::{CoreError, Result};

const SERVICE: &str = "openai";

/// Client for any `/chat/completions` endpoint speaking the OpenAI protocol.
pub struct OpenAiGenerator {
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    http_client: Client,
}

impl OpenAiGenerator {
    /// Create a client for `endpoint` (base URL, without `/chat/completions`).
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            temperature: 0.4,
            max_tokens: 400,
            http_client: Client::new(),
        }
    }

    /// Build from configuration. `None` when disabled or no API key is set.
    pub fn from_config(config: &GeneratorConfig) -> Option<Self> {
        if !config.is_usable() {
            return None;
        }
        let api_key = config.api_key.clone()?;
        let mut generator = Self::new(&config.endpoint, &config.model, api_key);
        generator.temperature = config.temperature;
        generator.max_tokens = config.max_tokens;
        Some(generator)
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }
}

fn transport(err: reqwest::Error) -> CoreError {
    CoreError::unavailable(SERVICE, err.to_string())
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let body = json!({
            "model": &self.model,
            "messages": [
                { "role": "system", "content": &prompt.system },
                { "role": "user", "content": &prompt.user },
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let resp = self
            .http_client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        let resp: serde_json::Value = resp.json().await.map_err(transport)?;

        if let Some(err) = resp.get("error") {
            let message = err["message"].as_str().unwrap_or("unknown error");
            return Err(CoreError::unavailable(
                SERVICE,
                format!("{status}: {message}"),
            ));
        }
        if !status.is_success() {
            return Err(CoreError::unavailable(SERVICE, format!("HTTP {status}")));
        }

        resp["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CoreError::unavailable(SERVICE, "missing completion content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_api_key() {
        let config = GeneratorConfig::default();
        assert!(OpenAiGenerator::from_config(&config).is_none());

        let config = GeneratorConfig {
            api_key: Some("sk-test".into()),
            ..GeneratorConfig::default()
        };
        let generator = OpenAiGenerator::from_config(&config).unwrap();
        assert_eq!(generator.url(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn disabled_config_builds_nothing() {
        let config = GeneratorConfig {
            enabled: false,
            api_key: Some("sk-test".into()),
            ..GeneratorConfig::default()
        };
        assert!(OpenAiGenerator::from_config(&config).is_none());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let generator = OpenAiGenerator::new("http://localhost:8080/v1/", "m", "k");
        assert_eq!(generator.url(), "http://localhost:8080/v1/chat/completions");
    }
}
