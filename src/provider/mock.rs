use super::{EditProvider, ProviderPayload, ProviderResult};
use crate::actions::{ActionSpec, EditAction};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A provider call captured by [`MockProvider`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub action: EditAction,
    pub endpoint: &'static str,
    pub payload: ProviderPayload,
}

#[derive(Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<ProviderResult>>>,
    failure: Arc<Mutex<Option<(u16, String)>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, response: ProviderResult) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    /// Every call is rejected with the given status and message.
    pub fn with_failure(self, status: u16, message: &str) -> Self {
        *self.failure.lock().unwrap() = Some((status, message.to_string()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn get_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EditProvider for MockProvider {
    async fn send(&self, spec: &ActionSpec, payload: ProviderPayload) -> Result<ProviderResult> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                action: spec.action,
                endpoint: spec.endpoint,
                payload,
            });
            calls.len()
        };

        if let Some((status, message)) = self.failure.lock().unwrap().clone() {
            return Err(Error::Provider { status, message });
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Default: a tiny image, or a job id for async actions
            if spec.is_async() {
                Ok(ProviderResult::Json(serde_json::json!({ "id": "mock-generation" })))
            } else {
                Ok(ProviderResult::Image {
                    bytes: vec![0x52, 0x49, 0x46, 0x46],
                    content_type: "image/webp".to_string(),
                })
            }
        } else {
            let index = (count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}
