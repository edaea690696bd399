//! Edit orchestration
//!
//! Validates an incoming [`EditRequest`], fetches the source image, builds
//! the provider payload, dispatches it and normalizes the answer. Every
//! request produces exactly one [`EditEvent`] for the configured observer.

use crate::actions::{ActionSpec, EditAction, Generation};
use crate::fetch::AssetFetcher;
use crate::models::{EditParams, EditRequest, EditResult};
use crate::provider::{self, EditProvider};
use crate::{Error, Result};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Progress of one orchestration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    ImageFetched,
    PayloadBuilt,
    Dispatched,
    Normalized,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::ImageFetched => "image_fetched",
            Stage::PayloadBuilt => "payload_built",
            Stage::Dispatched => "dispatched",
            Stage::Normalized => "normalized",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Summary of one edit request. Carries no prompts or image data.
#[derive(Debug, Clone)]
pub struct EditEvent {
    pub request_id: Uuid,
    pub action: Option<String>,
    pub generation: Generation,
    /// Terminal stage: `Done` or `Failed`.
    pub stage: Stage,
    /// Last stage completed before a failure.
    pub failed_after: Option<Stage>,
    pub success: bool,
    pub status: u16,
    pub error: Option<String>,
    pub latency: Duration,
}

pub trait EditObserver: Send + Sync {
    fn record(&self, event: &EditEvent);
}

/// Writes each [`EditEvent`] as one structured tracing event.
pub struct TracingObserver;

impl EditObserver for TracingObserver {
    fn record(&self, event: &EditEvent) {
        let action = event.action.as_deref().unwrap_or("-");
        let latency_ms = event.latency.as_millis() as u64;

        if event.success {
            tracing::info!(
                request_id = %event.request_id,
                action,
                generation = %event.generation,
                stage = %event.stage,
                status = event.status,
                latency_ms,
                "edit completed"
            );
        } else {
            tracing::warn!(
                request_id = %event.request_id,
                action,
                generation = %event.generation,
                stage = %event.stage,
                failed_after = %event.failed_after.unwrap_or(Stage::Received),
                status = event.status,
                latency_ms,
                error = event.error.as_deref().unwrap_or(""),
                "edit failed"
            );
        }
    }
}

/// A request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedEdit {
    pub image_url: String,
    pub spec: ActionSpec,
    pub params: EditParams,
}

/// HTTP-shaped outcome of [`EditOrchestrator::handle`].
#[derive(Debug, Clone, PartialEq)]
pub struct EditResponse {
    pub status: u16,
    pub body: Value,
}

pub struct EditOrchestrator {
    generation: Generation,
    fetcher: Arc<dyn AssetFetcher>,
    provider: Arc<dyn EditProvider>,
    observer: Arc<dyn EditObserver>,
}

impl EditOrchestrator {
    pub fn new(
        generation: Generation,
        fetcher: Arc<dyn AssetFetcher>,
        provider: Arc<dyn EditProvider>,
    ) -> Self {
        Self {
            generation,
            fetcher,
            provider,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn EditObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Check everything that can be checked without network I/O.
    pub fn validate(&self, request: &EditRequest) -> Result<ValidatedEdit> {
        let image_url = non_blank(&request.image_url);
        let action = non_blank(&request.action);
        let (Some(image_url), Some(action)) = (image_url, action) else {
            return Err(Error::Validation("Missing required fields".to_string()));
        };

        match reqwest::Url::parse(image_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(Error::Validation(
                    "imageUrl must be an absolute http(s) URL".to_string(),
                ))
            }
        }

        let spec = EditAction::parse(action, self.generation)?.spec();
        spec.validate(&request.params)?;

        Ok(ValidatedEdit {
            image_url: image_url.to_string(),
            spec,
            params: request.params.clone(),
        })
    }

    /// Run one edit end to end.
    pub async fn run(&self, request: EditRequest) -> Result<EditResult> {
        let started = Instant::now();
        let request_id = Uuid::new_v4();
        let action = non_blank(&request.action).map(str::to_string);
        let mut stage = Stage::Received;

        let result = self.execute(&request, &mut stage).await;

        let (stage, failed_after) = match &result {
            Ok(_) => (stage, None),
            Err(_) => (Stage::Failed, Some(stage)),
        };
        let event = EditEvent {
            request_id,
            action,
            generation: self.generation,
            stage,
            failed_after,
            success: result.is_ok(),
            status: result.as_ref().map_or_else(Error::status_code, |_| 200),
            error: result.as_ref().err().map(|e| e.to_string()),
            latency: started.elapsed(),
        };
        self.observer.record(&event);

        result
    }

    /// Run one edit and shape the outcome as an HTTP status and JSON body.
    pub async fn handle(&self, request: EditRequest) -> EditResponse {
        match self.run(request).await {
            Ok(result) => EditResponse {
                status: 200,
                body: serde_json::to_value(&result).unwrap_or(Value::Null),
            },
            Err(err) => EditResponse {
                status: err.status_code(),
                body: json!({ "error": client_message(&err) }),
            },
        }
    }

    async fn execute(&self, request: &EditRequest, stage: &mut Stage) -> Result<EditResult> {
        let edit = self.validate(request)?;
        *stage = Stage::Validated;

        let image = self.fetcher.fetch(&edit.image_url).await?;
        *stage = Stage::ImageFetched;

        let payload = provider::build(&edit.spec, &edit.params, image)?;
        *stage = Stage::PayloadBuilt;

        let raw = self.provider.send(&edit.spec, payload).await?;
        *stage = Stage::Dispatched;

        let result = provider::normalize(&edit.spec, raw)?;
        *stage = Stage::Normalized;

        *stage = Stage::Done;
        Ok(result)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn client_message(err: &Error) -> String {
    match err {
        Error::Http(_) | Error::Io(_) | Error::Serialization(_) => {
            "Failed to edit image".to_string()
        }
        _ => err.client_message(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockAssetFetcher;
    use crate::provider::{MockProvider, ProviderPayload, ProviderResult};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<EditEvent>>,
    }

    impl EditObserver for RecordingObserver {
        fn record(&self, event: &EditEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    struct Harness {
        fetcher: MockAssetFetcher,
        provider: MockProvider,
        observer: Arc<RecordingObserver>,
        orchestrator: EditOrchestrator,
    }

    fn harness(
        generation: Generation,
        fetcher: MockAssetFetcher,
        provider: MockProvider,
    ) -> Harness {
        let observer = Arc::new(RecordingObserver::default());
        let orchestrator = EditOrchestrator::new(
            generation,
            Arc::new(fetcher.clone()),
            Arc::new(provider.clone()),
        )
        .with_observer(observer.clone());

        Harness {
            fetcher,
            provider,
            observer,
            orchestrator,
        }
    }

    fn request(action: &str, params: EditParams) -> EditRequest {
        EditRequest {
            image_url: Some("https://assets.example.com/cat.png".to_string()),
            action: Some(action.to_string()),
            params,
        }
    }

    #[tokio::test]
    async fn test_missing_fields_rejected_without_io() {
        let h = harness(Generation::V2, MockAssetFetcher::new(), MockProvider::new());

        let response = h.orchestrator.handle(EditRequest::default()).await;

        assert_eq!(response.status, 400);
        assert_eq!(response.body, json!({ "error": "Missing required fields" }));
        assert_eq!(h.fetcher.get_fetch_count(), 0);
        assert_eq!(h.provider.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_action_params_rejected_without_io() {
        let h = harness(Generation::V2, MockAssetFetcher::new(), MockProvider::new());

        for action in Generation::V2.actions() {
            if action.spec().required_params().is_empty() {
                continue;
            }
            let response = h
                .orchestrator
                .handle(request(action.tag(), EditParams::default()))
                .await;
            assert_eq!(response.status, 400, "{}", action);
        }

        assert_eq!(h.fetcher.get_fetch_count(), 0);
        assert_eq!(h.provider.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_other_generation_tag_is_unsupported() {
        let h = harness(Generation::V2, MockAssetFetcher::new(), MockProvider::new());

        let response = h
            .orchestrator
            .handle(request("background", EditParams::default()))
            .await;

        assert_eq!(response.status, 400);
        assert_eq!(
            response.body,
            json!({ "error": "Unsupported action: background" })
        );
        assert_eq!(h.fetcher.get_fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_image_url_rejected() {
        let h = harness(Generation::V2, MockAssetFetcher::new(), MockProvider::new());

        let mut req = request("remove-background", EditParams::default());
        req.image_url = Some("not a url".to_string());
        let response = h.orchestrator.handle(req).await;

        assert_eq!(response.status, 400);
        assert_eq!(h.fetcher.get_fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_remove_background_success() {
        let h = harness(
            Generation::V2,
            MockAssetFetcher::new().with_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]),
            MockProvider::new().with_response(ProviderResult::Image {
                bytes: b"hi".to_vec(),
                content_type: "image/webp".to_string(),
            }),
        );

        let response = h
            .orchestrator
            .handle(request("remove-background", EditParams::default()))
            .await;

        assert_eq!(response.status, 200);
        assert_eq!(
            response.body,
            json!({ "image": "data:image/webp;base64,aGk=" })
        );
        assert_eq!(
            h.fetcher.get_requested(),
            vec!["https://assets.example.com/cat.png".to_string()]
        );

        let calls = h.provider.get_calls();
        assert_eq!(calls.len(), 1);
        let ProviderPayload::Multipart(form) = &calls[0].payload else {
            panic!("expected multipart payload");
        };
        assert_eq!(form.image, vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(form.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_relight_returns_generation_id() {
        let h = harness(
            Generation::V2,
            MockAssetFetcher::new(),
            MockProvider::new().with_response(ProviderResult::Json(json!({ "id": "gen_123" }))),
        );

        let params = EditParams {
            background_prompt: Some("a forest".into()),
            ..Default::default()
        };
        let response = h
            .orchestrator
            .handle(request("replace-background-and-relight", params))
            .await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({ "generationId": "gen_123" }));
    }

    #[tokio::test]
    async fn test_provider_error_passes_status_through_once() {
        let h = harness(
            Generation::V2,
            MockAssetFetcher::new(),
            MockProvider::new().with_failure(500, "rate limited"),
        );

        let response = h
            .orchestrator
            .handle(request("remove-background", EditParams::default()))
            .await;

        assert_eq!(response.status, 500);
        assert_eq!(response.body, json!({ "error": "rate limited" }));
        assert_eq!(h.provider.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_500_and_skips_provider() {
        let h = harness(
            Generation::V2,
            MockAssetFetcher::new().failing(),
            MockProvider::new(),
        );

        let response = h
            .orchestrator
            .handle(request("remove-background", EditParams::default()))
            .await;

        assert_eq!(response.status, 500);
        assert_eq!(
            response.body,
            json!({ "error": "Failed to fetch source image" })
        );
        assert_eq!(h.provider.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_response_is_500() {
        let h = harness(
            Generation::V2,
            MockAssetFetcher::new(),
            MockProvider::new().with_response(ProviderResult::Json(json!({ "status": "queued" }))),
        );

        let params = EditParams {
            prompt: Some("sunny".into()),
            ..Default::default()
        };
        let response = h
            .orchestrator
            .handle(request("replace-background-and-relight", params))
            .await;

        assert_eq!(response.status, 500);
        assert_eq!(response.body, json!({ "error": "Failed to edit image" }));
    }

    #[tokio::test]
    async fn test_legacy_generation_flow() {
        let h = harness(
            Generation::V1,
            MockAssetFetcher::new(),
            MockProvider::new().with_response(ProviderResult::Json(json!({
                "artifacts": [{ "base64": "aGk=" }]
            }))),
        );

        let params = EditParams {
            prompt: Some("pastel".into()),
            ..Default::default()
        };
        let response = h.orchestrator.handle(request("recolor", params)).await;

        assert_eq!(response.status, 200);
        assert_eq!(
            response.body,
            json!({ "image": "data:image/png;base64,aGk=" })
        );

        let calls = h.provider.get_calls();
        assert_eq!(calls[0].endpoint, "/v1/generation/image-to-image");
        let ProviderPayload::Json(body) = &calls[0].payload else {
            panic!("expected JSON payload");
        };
        assert_eq!(body.text_prompts[0].text, "pastel color style");

        let response = h
            .orchestrator
            .handle(request("search-and-replace", EditParams::default()))
            .await;
        assert_eq!(response.status, 400);
    }

    #[tokio::test]
    async fn test_legacy_prompt_actions_rejected_without_io() {
        let h = harness(
            Generation::V1,
            MockAssetFetcher::new(),
            MockProvider::new().with_response(ProviderResult::Json(json!({
                "artifacts": [{ "base64": "aGk=" }]
            }))),
        );

        for tag in ["replace", "recolor", "relight"] {
            let response = h
                .orchestrator
                .handle(request(tag, EditParams::default()))
                .await;
            assert_eq!(response.status, 400, "{}", tag);
            assert_eq!(
                response.body,
                json!({ "error": format!("prompt is required for {}", tag) })
            );
        }

        assert_eq!(h.fetcher.get_fetch_count(), 0);
        assert_eq!(h.provider.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_one_event_per_request() {
        let h = harness(Generation::V2, MockAssetFetcher::new(), MockProvider::new());

        h.orchestrator
            .handle(request("remove-background", EditParams::default()))
            .await;
        h.orchestrator
            .handle(request("search-and-replace", EditParams::default()))
            .await;

        let events = h.observer.events.lock().unwrap();
        assert_eq!(events.len(), 2);

        assert!(events[0].success);
        assert_eq!(events[0].stage, Stage::Done);
        assert_eq!(events[0].failed_after, None);
        assert_eq!(events[0].status, 200);
        assert_eq!(events[0].action.as_deref(), Some("remove-background"));

        assert!(!events[1].success);
        assert_eq!(events[1].stage, Stage::Failed);
        assert_eq!(events[1].failed_after, Some(Stage::Received));
        assert_eq!(events[1].status, 400);
    }

    #[tokio::test]
    async fn test_failure_event_records_stage() {
        let h = harness(
            Generation::V2,
            MockAssetFetcher::new(),
            MockProvider::new().with_failure(503, "busy"),
        );

        let result = h
            .orchestrator
            .run(request("remove-background", EditParams::default()))
            .await;
        assert!(matches!(result, Err(Error::Provider { status: 503, .. })));

        let events = h.observer.events.lock().unwrap();
        assert_eq!(events[0].stage, Stage::Failed);
        assert_eq!(events[0].failed_after, Some(Stage::PayloadBuilt));
        assert_eq!(events[0].status, 503);
        assert_eq!(events[0].error.as_deref(), Some("busy"));
    }
}
