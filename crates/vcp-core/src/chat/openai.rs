//! OpenAI-compatible upstream backend

use super::backend::ModelBackend;
use super::error::ModelError;
use super::types::ChatRequest;
use crate::config::UpstreamConfig;
use crate::error::{VcpError, VcpResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::instrument;

const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Calls `/v1/chat/completions` on an OpenAI-compatible server
pub struct OpenAiBackend {
    config: UpstreamConfig,
    url: String,
    model: String,
    http_client: Client,
}

impl OpenAiBackend {
    pub fn new(config: UpstreamConfig) -> VcpResult<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VcpError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            url: completions_url(&config.base_url),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            config,
            http_client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request_body(&self, request: &ChatRequest) -> Value {
        let mut body = json!({
            "model": request.model.as_deref().unwrap_or(&self.model),
            "messages": request.messages,
            "stream": false,
        });
        if let Value::Object(fields) = &mut body {
            for (key, value) in &request.options {
                fields.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        body
    }

    fn request_error(&self, error: reqwest::Error) -> ModelError {
        if error.is_timeout() {
            ModelError::Timeout(self.config.timeout.as_millis() as u64)
        } else {
            ModelError::Request(error.to_string())
        }
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, request), fields(messages = request.messages.len()), level = "debug")]
    async fn complete(&self, request: &ChatRequest) -> Result<String, ModelError> {
        let mut http_request = self
            .http_client
            .post(&self.url)
            .json(&self.request_body(request));
        if let Some(api_key) = &self.config.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;
        completion_text(&body)
    }
}

/// Resolve the completions endpoint from a configured base URL
pub(crate) fn completions_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/chat/completions") {
        base.to_string()
    } else if base.ends_with("/v1") {
        format!("{}/chat/completions", base)
    } else {
        format!("{}/v1/chat/completions", base)
    }
}

/// Pull the assistant text out of a chat-completion body
pub(crate) fn completion_text(body: &Value) -> Result<String, ModelError> {
    if let Some(error) = body.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ModelError::InvalidResponse(message));
    }

    body.pointer("/choices/0/message/content")
        .map(|content| match content {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .ok_or_else(|| ModelError::InvalidResponse("missing choices[0].message.content".into()))
}
