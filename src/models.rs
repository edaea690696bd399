//! Data models and structures
//!
//! Defines the wire shapes exchanged with clients (edit requests/results,
//! gallery records, users) and the service configuration.

use crate::actions::{Generation, Param};
use crate::auth::{self, User};
use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Action-specific text parameters of an edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_prompt: Option<String>,
}

impl EditParams {
    /// Returns the parameter when it is present and not blank.
    pub fn get(&self, param: Param) -> Option<&str> {
        let value = match param {
            Param::Prompt => &self.prompt,
            Param::SearchPrompt => &self.search_prompt,
            Param::SelectPrompt => &self.select_prompt,
            Param::BackgroundPrompt => &self.background_prompt,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Body of `POST /edit`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(flatten)]
    pub params: EditParams,
}

/// Normalized outcome of an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditResult {
    /// Synchronous result as a `data:` URI.
    #[serde(rename = "image")]
    InlineImage(String),
    /// Handle of an asynchronous generation.
    #[serde(rename = "generationId")]
    Job(String),
}

/// A gallery entry owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: Uuid,
    pub image_url: String,
    pub feature_type: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewImageRecord {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub feature_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    #[serde(default)]
    pub name: Option<String>,
}

/// Returned by `POST /uploads`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub url: String,
    pub asset_id: String,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub stability_api_key: String,
    pub stability_base_url: String,
    pub generation: Generation,
    pub provider_timeout: Duration,
    pub bind_addr: String,
    pub dry_run: bool,
    pub asset_access_key_id: Option<String>,
    pub asset_secret_access_key: Option<String>,
    pub asset_endpoint: String,
    pub asset_bucket: String,
    pub asset_base_url: String,
    pub sessions: Vec<(String, User)>,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            var(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{} not set", key)))
        };

        let dry_run = var("DRY_RUN")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let generation = match var("PROVIDER_GENERATION") {
            Some(value) => value.parse()?,
            None => Generation::V2,
        };

        let timeout_secs = match var("PROVIDER_TIMEOUT_SECS") {
            Some(value) => value.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("Invalid PROVIDER_TIMEOUT_SECS '{}'", value))
            })?,
            None => 120,
        };

        let (asset_access_key_id, asset_secret_access_key) = if dry_run {
            (var("ASSET_ACCESS_KEY_ID"), var("ASSET_SECRET_ACCESS_KEY"))
        } else {
            (
                Some(required("ASSET_ACCESS_KEY_ID")?),
                Some(required("ASSET_SECRET_ACCESS_KEY")?),
            )
        };

        let sessions = match var("SESSION_TOKENS") {
            Some(value) => auth::parse_session_tokens(&value)?,
            None => Vec::new(),
        };

        Ok(Self {
            stability_api_key: required("STABILITY_API_KEY")?,
            stability_base_url: var("STABILITY_BASE_URL")
                .unwrap_or_else(|| "https://api.stability.ai".to_string()),
            generation,
            provider_timeout: Duration::from_secs(timeout_secs),
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            dry_run,
            asset_access_key_id,
            asset_secret_access_key,
            asset_endpoint: var("ASSET_ENDPOINT")
                .unwrap_or_else(|| "https://nyc3.digitaloceanspaces.com".to_string()),
            asset_bucket: var("ASSET_BUCKET").unwrap_or_else(|| "image-editor".to_string()),
            asset_base_url: var("ASSET_BASE_URL")
                .unwrap_or_else(|| "https://cdn.example.com".to_string()),
            sessions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_edit_request_deserializes_camel_case() {
        let request: EditRequest = serde_json::from_str(
            r#"{"imageUrl":"https://x/y.png","action":"search-and-replace","prompt":"a red car","searchPrompt":"blue car"}"#,
        )
        .unwrap();

        assert_eq!(request.image_url.as_deref(), Some("https://x/y.png"));
        assert_eq!(request.action.as_deref(), Some("search-and-replace"));
        assert_eq!(request.params.get(Param::Prompt), Some("a red car"));
        assert_eq!(request.params.get(Param::SearchPrompt), Some("blue car"));
        assert_eq!(request.params.get(Param::SelectPrompt), None);
    }

    #[test]
    fn test_blank_params_count_as_missing() {
        let params = EditParams {
            prompt: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.get(Param::Prompt), None);
    }

    #[test]
    fn test_edit_result_serialization() {
        let image = serde_json::to_value(EditResult::InlineImage("data:x".into())).unwrap();
        assert_eq!(image, serde_json::json!({ "image": "data:x" }));

        let job = serde_json::to_value(EditResult::Job("gen_123".into())).unwrap();
        assert_eq!(job, serde_json::json!({ "generationId": "gen_123" }));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_vars(vars(&[
            ("STABILITY_API_KEY", "sk-test"),
            ("DRY_RUN", "true"),
        ]))
        .unwrap();

        assert_eq!(config.stability_base_url, "https://api.stability.ai");
        assert_eq!(config.generation, Generation::V2);
        assert_eq!(config.provider_timeout, Duration::from_secs(120));
        assert!(config.dry_run);
        assert!(config.asset_access_key_id.is_none());
        assert!(config.sessions.is_empty());
    }

    #[test]
    fn test_config_requires_api_key() {
        let err = Config::from_vars(vars(&[("DRY_RUN", "true")])).unwrap_err();
        assert!(err.to_string().contains("STABILITY_API_KEY"));
    }

    #[test]
    fn test_config_requires_asset_credentials_outside_dry_run() {
        let err = Config::from_vars(vars(&[("STABILITY_API_KEY", "sk")])).unwrap_err();
        assert!(err.to_string().contains("ASSET_ACCESS_KEY_ID"));
    }

    #[test]
    fn test_config_legacy_generation() {
        let config = Config::from_vars(vars(&[
            ("STABILITY_API_KEY", "sk"),
            ("DRY_RUN", "1"),
            ("PROVIDER_GENERATION", "v1"),
            ("PROVIDER_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(config.generation, Generation::V1);
        assert_eq!(config.provider_timeout, Duration::from_secs(15));
    }
}
