//! Image-generation provider integration
//!
//! Builds action-specific payloads, sends them to Stability AI and normalizes
//! the heterogeneous responses into [`crate::models::EditResult`].

pub mod client;
pub mod mime;
pub mod mock;
pub mod normalize;
pub mod payload;
pub mod types;

pub use client::StabilityClient;
pub use mock::MockProvider;
pub use normalize::normalize;
pub use payload::{build, build_for_tag, MultipartPayload, ProviderPayload};

use crate::actions::ActionSpec;
use crate::Result;
use async_trait::async_trait;

/// Raw provider output for a successful call.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResult {
    Image { bytes: Vec<u8>, content_type: String },
    Json(serde_json::Value),
}

#[async_trait]
pub trait EditProvider: Send + Sync {
    /// Issue exactly one call for `spec`. Non-success statuses are returned
    /// as [`crate::Error::Provider`].
    async fn send(&self, spec: &ActionSpec, payload: ProviderPayload) -> Result<ProviderResult>;
}
