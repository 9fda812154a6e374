//! Completion backends for split suggestions.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::config::{AiConfig, AiProvider};

const MAX_TOKENS: u32 = 2000;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that analyzes PDF documents and suggests how to split them intelligently.";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No {0} API key configured")]
    MissingKey(&'static str),

    #[error("{provider} request failed: {message}")]
    Request {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} response had no text content")]
    EmptyResponse { provider: &'static str },
}

/// A model that turns a prompt into free text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Build the provider selected by configuration.
pub fn from_config(config: &AiConfig) -> Result<Box<dyn CompletionProvider>, ProviderError> {
    let key = || config.api_key.clone();
    Ok(match config.provider {
        AiProvider::Anthropic => Box::new(AnthropicProvider::new(
            key().ok_or(ProviderError::MissingKey("Anthropic"))?,
        )),
        AiProvider::OpenAi => Box::new(OpenAiCompatibleProvider::openai(
            key().ok_or(ProviderError::MissingKey("OpenAI"))?,
        )),
        AiProvider::DeepSeek => Box::new(OpenAiCompatibleProvider::deepseek(
            key().ok_or(ProviderError::MissingKey("DeepSeek"))?,
        )),
        AiProvider::Ollama => Box::new(OllamaProvider::new(
            &config.ollama_host,
            &config.ollama_model,
        )),
    })
}

async fn send_json(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<serde_json::Value, ProviderError> {
    let response = request.send().await.map_err(|e| ProviderError::Request {
        provider,
        message: if e.is_timeout() {
            "request timed out".to_string()
        } else if e.is_connect() {
            format!("cannot connect ({})", e)
        } else {
            e.to_string()
        },
    })?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            provider,
            status,
            body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| ProviderError::Request {
            provider,
            message: format!("failed to parse response: {}", e),
        })
}

/// Anthropic Messages API
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: "claude-3-5-sonnet-20241022".to_string(),
        }
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "Anthropic"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&json!({
                "model": self.model,
                "max_tokens": MAX_TOKENS,
                "messages": [{ "role": "user", "content": prompt }],
            }));

        let body = send_json(self.name(), request).await?;
        body["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or(ProviderError::EmptyResponse {
                provider: self.name(),
            })
    }
}

/// OpenAI chat completions, also spoken by DeepSeek
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    name: &'static str,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatibleProvider {
    pub fn openai(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            name: "OpenAI",
            base_url: "https://api.openai.com/v1".to_string(),
            api_key,
            model: "gpt-4o-mini".to_string(),
        }
    }

    pub fn deepseek(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            name: "DeepSeek",
            base_url: "https://api.deepseek.com".to_string(),
            api_key,
            model: "deepseek-chat".to_string(),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "max_tokens": MAX_TOKENS,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": prompt },
                ],
            }));

        let body = send_json(self.name, request).await?;
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or(ProviderError::EmptyResponse {
                provider: self.name,
            })
    }
}

/// Local Ollama server
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "Ollama"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(Duration::from_secs(120))
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
            }));

        let body = send_json(self.name(), request).await?;
        Ok(body["response"].as_str().unwrap_or("").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_from_config_requires_key() {
        let mut config = Config::default().ai;
        config.provider = AiProvider::OpenAi;
        assert!(matches!(
            from_config(&config),
            Err(ProviderError::MissingKey("OpenAI"))
        ));

        config.api_key = Some("sk-test".to_string());
        assert_eq!(from_config(&config).unwrap().name(), "OpenAI");
    }

    #[test]
    fn test_from_config_ollama() {
        let mut config = Config::default().ai;
        config.provider = AiProvider::Ollama;
        config.ollama_host = "http://localhost:11434/".to_string();
        assert_eq!(from_config(&config).unwrap().name(), "Ollama");
    }

    #[test]
    fn test_deepseek_base_url() {
        let provider = OpenAiCompatibleProvider::deepseek("k".to_string());
        assert_eq!(provider.name(), "DeepSeek");
        assert_eq!(provider.base_url, "https://api.deepseek.com");
        assert_eq!(provider.model, "deepseek-chat");
    }

    #[tokio::test]
    async fn test_unreachable_ollama_is_an_error() {
        let provider = OllamaProvider::new("http://127.0.0.1:1", "llama3.2");
        let result = provider.complete("hello").await;
        assert!(matches!(result, Err(ProviderError::Request { .. })));
    }
}
