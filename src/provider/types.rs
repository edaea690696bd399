//! Provider wire types: the legacy JSON generation request/response and the
//! envelopes shared by both generations.

use serde::{Deserialize, Serialize};

/// Legacy image-to-image request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageToImageRequest {
    pub init_image: String,
    pub init_image_mode: String,
    pub image_strength: f64,
    pub samples: u32,
    pub steps: u32,
    pub cfg_scale: u32,
    pub seed: u64,
    pub text_prompts: Vec<TextPrompt>,
}

impl ImageToImageRequest {
    /// Request with the fixed generation parameters and a single prompt.
    pub fn new(init_image: String, text: String) -> Self {
        Self {
            init_image,
            init_image_mode: "IMAGE_STRENGTH".to_string(),
            image_strength: 0.35,
            samples: 1,
            steps: 30,
            cfg_scale: 7,
            seed: 0,
            text_prompts: vec![TextPrompt { text, weight: 1.0 }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPrompt {
    pub text: String,
    pub weight: f64,
}

#[derive(Debug, Deserialize)]
pub struct ArtifactsResponse {
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
pub struct Artifact {
    pub base64: Option<String>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

/// Response of an asynchronous generation request.
#[derive(Debug, Deserialize)]
pub struct JobResponse {
    pub id: Option<String>,
}

/// Error body returned by the provider on non-success statuses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    pub name: Option<String>,
}

/// Best human-readable message from an error body; JSON when possible,
/// raw text otherwise.
pub fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();

    parsed
        .and_then(|err| {
            err.message
                .or_else(|| err.errors.into_iter().next())
                .or(err.name)
        })
        .filter(|m| !m.trim().is_empty())
        .or_else(|| {
            let text = body.trim();
            (!text.is_empty() && !text.starts_with('{')).then(|| text.to_string())
        })
        .unwrap_or_else(|| "Failed to edit image".to_string())
}
