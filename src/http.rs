//! Shared HTTP client for live providers
//!
//! Transport-level transient failures (connect errors, 5xx, 429) are retried by
//! `reqwest-retry`; anything that survives that is classified for the calling agent.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::config::ProvidersConfig;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} answered {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("could not build request: {0}")]
    Request(String),
}

impl HttpError {
    /// Worth another attempt later: connection trouble, throttling, server errors
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            HttpError::Transport { .. } => true,
            HttpError::Status { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::TOO_MANY_REQUESTS
                    || *status == StatusCode::REQUEST_TIMEOUT
            }
            HttpError::Decode { .. } | HttpError::Request(_) => false,
        }
    }

    /// Redacts query strings, which may carry API keys
    fn strip_query(url: &str) -> String {
        url.split('?').next().unwrap_or(url).to_string()
    }
}

/// JSON-over-HTTP client with transient retries
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: ClientWithMiddleware,
}

impl ApiClient {
    pub fn new(config: &ProvidersConfig) -> Result<Self, HttpError> {
        Self::with_settings(Duration::from_secs(config.timeout_seconds), config.max_retries)
    }

    pub fn with_settings(timeout: Duration, max_retries: u32) -> Result<Self, HttpError> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tripplan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Request(e.to_string()))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { client })
    }

    #[tracing::instrument(level = "debug", skip(self, headers), fields(url = %HttpError::strip_query(url)))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<T, HttpError> {
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| HttpError::Transport {
                url: HttpError::strip_query(url),
                message: e.to_string(),
            })?;
        Self::decode(url, response).await
    }

    #[tracing::instrument(level = "debug", skip(self, headers, body), fields(url = %HttpError::strip_query(url)))]
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &B,
    ) -> Result<T, HttpError> {
        let payload = serde_json::to_vec(body).map_err(|e| HttpError::Request(e.to_string()))?;
        let response = self
            .client
            .post(url)
            .headers(headers)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| HttpError::Transport {
                url: HttpError::strip_query(url),
                message: e.to_string(),
            })?;
        Self::decode(url, response).await
    }

    async fn decode<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<T, HttpError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::Status {
                url: HttpError::strip_query(url),
                status,
                body: body.chars().take(300).collect(),
            });
        }
        response.json::<T>().await.map_err(|e| HttpError::Decode {
            url: HttpError::strip_query(url),
            message: e.to_string(),
        })
    }
}

/// `Authorization: Bearer <token>`
pub fn bearer(token: &str) -> Result<HeaderMap, HttpError> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| HttpError::Request(e.to_string()))?;
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

/// Single custom header, e.g. Azure's `api-key`
pub fn header(name: &'static str, value: &str) -> Result<HeaderMap, HttpError> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(value).map_err(|e| HttpError::Request(e.to_string()))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let status = |code: u16| HttpError::Status {
            url: "https://example.com".into(),
            status: StatusCode::from_u16(code).unwrap(),
            body: String::new(),
        };
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(400).is_transient());
        assert!(!status(401).is_transient());
        assert!(
            HttpError::Transport {
                url: "x".into(),
                message: "refused".into()
            }
            .is_transient()
        );
        assert!(
            !HttpError::Decode {
                url: "x".into(),
                message: "eof".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn test_query_is_redacted() {
        assert_eq!(
            HttpError::strip_query("https://graphhopper.com/api/1/route?key=secret"),
            "https://graphhopper.com/api/1/route"
        );
    }

    #[test]
    fn test_bearer_header() {
        let headers = bearer("abc").unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer abc");
    }
}
