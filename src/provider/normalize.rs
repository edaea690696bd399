//! Response normalizer
//!
//! Maps whatever the provider returned for an action onto [`EditResult`].

use super::mime::data_uri;
use super::types::{ArtifactsResponse, JobResponse};
use super::ProviderResult;
use crate::actions::{ActionSpec, ResponseShape};
use crate::models::EditResult;
use crate::{Error, Result};

pub fn normalize(spec: &ActionSpec, result: ProviderResult) -> Result<EditResult> {
    match (spec.response, result) {
        (ResponseShape::Job, ProviderResult::Json(value)) => {
            let job: JobResponse = serde_json::from_value(value)
                .map_err(|e| Error::MalformedResponse(format!("invalid job response: {}", e)))?;
            job.id
                .filter(|id| !id.is_empty())
                .map(EditResult::Job)
                .ok_or_else(|| {
                    Error::MalformedResponse("no generation id in provider response".to_string())
                })
        }
        (ResponseShape::BinaryImage, ProviderResult::Image { bytes, .. }) => {
            if bytes.is_empty() {
                return Err(Error::MalformedResponse(
                    "provider returned an empty image".to_string(),
                ));
            }
            Ok(EditResult::InlineImage(data_uri("image/webp", &bytes)))
        }
        // Provider answered JSON instead of raw bytes
        (ResponseShape::BinaryImage, ProviderResult::Json(value)) => value
            .get("image")
            .and_then(|image| image.as_str())
            .filter(|image| !image.is_empty())
            .map(|image| EditResult::InlineImage(format!("data:image/webp;base64,{}", image)))
            .ok_or_else(|| {
                Error::MalformedResponse("no image data in provider response".to_string())
            }),
        (ResponseShape::Artifacts, ProviderResult::Json(value)) => {
            let response: ArtifactsResponse = serde_json::from_value(value)
                .map_err(|e| Error::MalformedResponse(format!("invalid artifacts: {}", e)))?;
            response
                .artifacts
                .into_iter()
                .next()
                .and_then(|artifact| artifact.base64)
                .filter(|b64| !b64.is_empty())
                .map(|b64| EditResult::InlineImage(format!("data:image/png;base64,{}", b64)))
                .ok_or_else(|| {
                    Error::MalformedResponse("no image data received from provider".to_string())
                })
        }
        (shape, ProviderResult::Image { content_type, .. }) => Err(Error::MalformedResponse(
            format!("unexpected {} body for {:?} response", content_type, shape),
        )),
    }
}
