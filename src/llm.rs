//! Language-model collaborator used by assisted-mode agents
//!
//! Speaks the OpenAI Chat Completions protocol, including Azure OpenAI deployments.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::http::{self, ApiClient, HttpError};

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("language model unreachable: {0}")]
    Network(String),

    #[error("language model rejected the request: {0}")]
    Api(String),

    #[error("language model returned an unusable response: {0}")]
    InvalidResponse(String),

    #[error("language model is not configured: {0}")]
    NotConfigured(String),
}

impl LlmError {
    /// Transient kinds worth another attempt
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Network(_))
    }
}

impl From<HttpError> for LlmError {
    fn from(err: HttpError) -> Self {
        match &err {
            e if e.is_transient() => LlmError::Network(err.to_string()),
            HttpError::Decode { .. } => LlmError::InvalidResponse(err.to_string()),
            _ => LlmError::Api(err.to_string()),
        }
    }
}

/// A text-in, text-out completion model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Chat Completions client for OpenAI-compatible and Azure OpenAI endpoints
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    http: ApiClient,
    url: String,
    headers: HeaderMap,
    model: String,
    /// Azure routes by deployment, so the body carries no model
    send_model: bool,
    temperature: f32,
}

impl ChatCompletionsClient {
    pub fn from_config(config: &LlmConfig, http: ApiClient) -> Result<Self, LlmError> {
        let base_url = config
            .base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| LlmError::NotConfigured("llm.base_url is not set".to_string()))?
            .trim_end_matches('/');
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::NotConfigured("llm.api_key is not set".to_string()))?;

        let (url, headers, send_model) = match &config.api_version {
            Some(version) => (
                format!(
                    "{base_url}/openai/deployments/{}/chat/completions?api-version={}",
                    urlencoding::encode(&config.model),
                    urlencoding::encode(version)
                ),
                http::header("api-key", api_key),
                false,
            ),
            None => (
                format!("{base_url}/chat/completions"),
                http::bearer(api_key),
                true,
            ),
        };
        let headers = headers.map_err(|e| LlmError::NotConfigured(e.to_string()))?;

        Ok(Self {
            http,
            url,
            headers,
            model: config.model.clone(),
            send_model,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl LanguageModel for ChatCompletionsClient {
    fn name(&self) -> &str {
        &self.model
    }

    #[tracing::instrument(level = "debug", skip_all, fields(model = %self.model))]
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.send_model.then_some(self.model.as_str()),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.temperature,
        };

        let response: ChatResponse = self
            .http
            .post_json(&self.url, self.headers.clone(), &request)
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("response had no message content".to_string()))?;

        debug!(chars = content.len(), "Completion received");
        Ok(content)
    }
}

/// Pull the JSON payload out of a model reply that may wrap it in prose or code fences
#[must_use]
pub fn extract_json(reply: &str) -> Option<&str> {
    let start = reply.find(['{', '['])?;
    let open = reply[start..].chars().next()?;
    let close = if open == '{' { '}' } else { ']' };
    let end = reply.rfind(close)?;
    (end > start).then(|| &reply[start..=end])
}

/// Convert each element of a model-supplied array on its own, dropping the ones
/// that do not match `T` so one bad element does not sink the rest
#[must_use]
pub fn parse_each<T: DeserializeOwned>(items: Vec<serde_json::Value>) -> Vec<T> {
    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(index, error = %e, "Dropped malformed element from model reply");
                None
            }
        })
        .collect();
    debug!(total, kept = parsed.len(), "Model reply elements parsed");
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_fenced_reply() {
        let reply = "Here you go:\n```json\n[{\"start_date\": \"2025-09-08\"}]\n```\nEnjoy!";
        assert_eq!(extract_json(reply), Some("[{\"start_date\": \"2025-09-08\"}]"));
        assert_eq!(extract_json("{\"a\": 1}"), Some("{\"a\": 1}"));
        assert_eq!(extract_json("no json here"), None);
    }

    #[test]
    fn test_parse_each_skips_bad_elements() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Item {
            n: u8,
        }
        let items: Vec<serde_json::Value> =
            serde_json::from_str(r#"[{"n": 1}, {"n": "two"}, {"m": 3}, {"n": 4}]"#).unwrap();
        let parsed: Vec<Item> = parse_each(items);
        assert_eq!(parsed, vec![Item { n: 1 }, Item { n: 4 }]);
    }

    #[test]
    fn test_azure_url_and_header() {
        let config = LlmConfig {
            base_url: Some("https://contoso.openai.azure.com/".to_string()),
            api_key: Some("k".to_string()),
            model: "gpt-4o".to_string(),
            api_version: Some("2024-06-01".to_string()),
            temperature: 0.2,
        };
        let http = ApiClient::with_settings(std::time::Duration::from_secs(5), 0).unwrap();
        let client = ChatCompletionsClient::from_config(&config, http).unwrap();
        assert_eq!(
            client.url,
            "https://contoso.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-06-01"
        );
        assert!(client.headers.contains_key("api-key"));
        assert!(!client.send_model);
    }

    #[test]
    fn test_missing_key_is_not_configured() {
        let config = LlmConfig {
            base_url: Some("https://api.openai.com/v1".to_string()),
            ..LlmConfig::default()
        };
        let http = ApiClient::with_settings(std::time::Duration::from_secs(5), 0).unwrap();
        let err = ChatCompletionsClient::from_config(&config, http).unwrap_err();
        assert!(matches!(err, LlmError::NotConfigured(_)));
    }
}
