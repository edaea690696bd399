use super::payload::ProviderPayload;
use super::types::error_message;
use super::{EditProvider, ProviderResult};
use crate::actions::{ActionSpec, ResponseShape};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.stability.ai";

/// Stability AI REST client covering both API generations.
pub struct StabilityClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl StabilityClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, timeout, Client::new())
    }

    pub fn new_with_client(api_key: String, timeout: Duration, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint_url(&self, spec: &ActionSpec) -> String {
        format!("{}{}", self.base_url, spec.endpoint)
    }
}

#[async_trait]
impl EditProvider for StabilityClient {
    async fn send(&self, spec: &ActionSpec, payload: ProviderPayload) -> Result<ProviderResult> {
        let url = self.endpoint_url(spec);
        tracing::debug!("Sending {} request to {}", spec.action, url);

        let request = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, spec.response.accept());

        let request = match payload {
            ProviderPayload::Json(body) => request.json(&body),
            ProviderPayload::Multipart(form) => request.multipart(form.into_form()?),
        };

        let response = request.send().await.map_err(|e| {
            tracing::error!("Failed to send request to Stability: {}", e);
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Stability API error (status {}): {}", status, error_text);
            return Err(Error::Provider {
                status: status.as_u16(),
                message: error_message(&error_text),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_ascii_lowercase())
            .unwrap_or_default();

        let is_json =
            content_type.starts_with("application/json") || content_type.contains("+json");
        let binary = match spec.response {
            ResponseShape::BinaryImage => !is_json,
            ResponseShape::Artifacts | ResponseShape::Job => content_type.starts_with("image/"),
        };

        if binary {
            let bytes = response.bytes().await?;
            return Ok(ProviderResult::Image {
                bytes: bytes.to_vec(),
                content_type,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map(ProviderResult::Json)
            .map_err(|e| {
                tracing::error!("Failed to parse Stability response: {}", e);
                Error::MalformedResponse(format!(
                    "expected image or JSON, got '{}': {}",
                    content_type, e
                ))
            })
    }
}
