//! Sayariq upstream API client
//!
//! Every request goes through one helper: JSON bodies, no bearer header,
//! a fixed timeout and a single attempt. Responses wrapped in a
//! `{ success, data }` envelope are unwrapped; anything else passes through.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::config::UpstreamConfig;
use crate::error::{AppError, AppResult};

/// Client for the upstream Sayariq REST API
#[derive(Clone)]
pub struct SayariqClient {
    client: Client,
    base_url: String,
}

/// Raw upstream response relayed by the proxy
#[derive(Debug)]
pub struct ForwardedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl SayariqClient {
    /// Create a new SayariqClient from configuration
    pub fn new(config: &UpstreamConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a new SayariqClient with custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> AppResult<Self> {
        Self::new(&UpstreamConfig {
            base_url: base_url.into(),
            ..UpstreamConfig::default()
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET a resource and deserialize its (unwrapped) payload
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let value = self.get_value(path).await?;
        decode(path, value)
    }

    /// GET a resource as raw JSON (envelope already unwrapped)
    pub async fn get_value(&self, path: &str) -> AppResult<Value> {
        tracing::debug!(path, "GET upstream");
        self.send(self.client.get(self.url(path))).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        tracing::debug!(path, "POST upstream");
        let value = self.send(self.client.post(self.url(path)).json(body)).await?;
        decode(path, value)
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        tracing::debug!(path, "PUT upstream");
        let value = self.send(self.client.put(self.url(path)).json(body)).await?;
        decode(path, value)
    }

    pub async fn delete(&self, path: &str) -> AppResult<Value> {
        tracing::debug!(path, "DELETE upstream");
        self.send(self.client.delete(self.url(path))).await
    }

    async fn send(&self, request: RequestBuilder) -> AppResult<Value> {
        let response = request.send().await.map_err(network_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(network_error)?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            return Err(AppError::Upstream {
                status: status.as_u16(),
                message: upstream_message(&body),
            });
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        let body: Value = serde_json::from_slice(&bytes).map_err(|e| AppError::Upstream {
            status: status.as_u16(),
            message: format!("Malformed JSON from backend: {}", e),
        })?;

        unwrap_envelope(body)
    }

    /// Relay a request verbatim; the upstream status is returned as is
    pub async fn forward(
        &self,
        method: &str,
        path_and_query: &str,
        body: Vec<u8>,
    ) -> AppResult<ForwardedResponse> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| AppError::ValidationError(format!("Unsupported method {}", method)))?;
        tracing::debug!(%method, path_and_query, "Forwarding to upstream");

        let mut request = self.client.request(method, self.url(path_and_query));
        if !body.is_empty() {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request.send().await.map_err(network_error)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(network_error)?.to_vec();

        Ok(ForwardedResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Strip the `{ success, data }` envelope when present
pub fn unwrap_envelope(body: Value) -> AppResult<Value> {
    match body {
        Value::Object(mut map) if map.get("success").map_or(false, Value::is_boolean) => {
            if map.get("success") == Some(&Value::Bool(false)) {
                let message = map
                    .get("message")
                    .or_else(|| map.get("error"))
                    .and_then(Value::as_str)
                    .unwrap_or("Request rejected by backend")
                    .to_string();
                return Err(AppError::Upstream {
                    status: 200,
                    message,
                });
            }
            Ok(map.remove("data").unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> AppResult<T> {
    serde_json::from_value(value).map_err(|e| AppError::Upstream {
        status: 200,
        message: format!("Unexpected payload from {}: {}", path, e),
    })
}

fn network_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Network("request timed out".to_string())
    } else {
        AppError::Network(e.to_string())
    }
}

/// Best-effort message from an error body
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("detail"))
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_is_unwrapped() {
        let body = json!({ "success": true, "data": [{ "id": 1 }] });
        assert_eq!(unwrap_envelope(body).unwrap(), json!([{ "id": 1 }]));
    }

    #[test]
    fn test_raw_body_passes_through() {
        let body = json!({ "id": 1, "data": "not an envelope" });
        assert_eq!(unwrap_envelope(body.clone()).unwrap(), body);
    }

    #[test]
    fn test_failed_envelope_is_an_error() {
        let body = json!({ "success": false, "message": "Lote no existe" });
        match unwrap_envelope(body) {
            Err(AppError::Upstream { message, .. }) => assert_eq!(message, "Lote no existe"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_upstream_message_prefers_json_fields() {
        assert_eq!(upstream_message(r#"{"detail":"Not found."}"#), "Not found.");
        assert_eq!(upstream_message("Bad Gateway"), "Bad Gateway");
    }
}
