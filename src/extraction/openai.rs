//! OpenAI-compatible chat-completions extractor
//!
//! Sends the catalog-aware system prompt plus the customer's text and asks
//! for a JSON object back (`response_format = json_object`).

use super::{ExtractionError, OrderExtractor, build_system_prompt};
use crate::core::catalog::Product;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;

/// Connection settings for the model endpoint
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub timeout_ms: u64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Extractor backed by a chat-completions endpoint
#[derive(Clone)]
pub struct OpenAiExtractor {
    client: reqwest::Client,
    settings: OpenAiSettings,
    system_prompt: String,
}

impl OpenAiExtractor {
    /// Build an extractor whose pricing rules come from `products`
    pub fn new(settings: OpenAiSettings, products: &[Product]) -> Result<Self, ExtractionError> {
        let system_prompt = build_system_prompt(products)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| ExtractionError::Upstream {
                message: format!("Failed to build HTTP client: {}", e),
                status: None,
            })?;

        Ok(Self {
            client,
            settings,
            system_prompt,
        })
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.endpoint.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl OrderExtractor for OpenAiExtractor {
    #[tracing::instrument(skip(self, order_text), fields(model = %self.settings.model))]
    async fn extract(&self, order_text: &str) -> Result<Value, ExtractionError> {
        let url = self.completions_url();
        let messages = [
            ChatMessage {
                role: "system",
                content: &self.system_prompt,
            },
            ChatMessage {
                role: "user",
                content: order_text,
            },
        ];
        let body = json!({
            "model": self.settings.model,
            "messages": messages,
            "response_format": { "type": "json_object" },
        });

        tracing::debug!(url = %url, text_len = order_text.len(), "requesting order extraction");

        let mut request = self.client.post(&url).json(&body);
        // Only add Authorization header if api_key is not empty
        if !self.settings.api_key.is_empty() {
            request = request.bearer_auth(&self.settings.api_key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "extraction request failed");
            ExtractionError::Upstream {
                message: e.to_string(),
                status: None,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "extraction endpoint returned an error");
            return Err(ExtractionError::Upstream {
                message: text,
                status: Some(status.as_u16()),
            });
        }

        let completion: Value = response.json().await.map_err(|e| {
            ExtractionError::MalformedOutput {
                message: e.to_string(),
            }
        })?;

        let raw = parse_completion(&completion)?;
        tracing::info!("order extracted");
        Ok(raw)
    }
}

/// Pull the JSON object out of the first choice of a completion
pub fn parse_completion(completion: &Value) -> Result<Value, ExtractionError> {
    let content = completion["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| ExtractionError::MalformedOutput {
            message: "completion has no message content".to_string(),
        })?;

    let raw: Value =
        serde_json::from_str(content).map_err(|e| ExtractionError::MalformedOutput {
            message: format!("content is not JSON: {}", e),
        })?;

    if raw.is_object() {
        Ok(raw)
    } else {
        Err(ExtractionError::MalformedOutput {
            message: "content is not a JSON object".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(content: &str) -> Value {
        json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
    }

    #[test]
    fn test_parse_completion_object() {
        let raw = parse_completion(&completion(r#"{"order_id": 3}"#)).unwrap();
        assert_eq!(raw["order_id"], 3);
    }

    #[test]
    fn test_parse_completion_rejects_non_object() {
        assert!(parse_completion(&completion("[1, 2]")).is_err());
        assert!(parse_completion(&completion("three routers")).is_err());
        assert!(parse_completion(&json!({"choices": []})).is_err());
    }

    #[test]
    fn test_completions_url_joins_cleanly() {
        let extractor = OpenAiExtractor::new(
            OpenAiSettings {
                endpoint: "http://localhost:9999/v1/".to_string(),
                model: "gpt-4o".to_string(),
                api_key: String::new(),
                timeout_ms: 1000,
            },
            &[],
        )
        .unwrap();
        assert_eq!(
            extractor.completions_url(),
            "http://localhost:9999/v1/chat/completions"
        );
    }
}
