//! Edit action vocabulary
//!
//! Every user-facing edit action maps onto exactly one [`ActionSpec`]: the
//! parameters it needs, how its provider payload is shaped, which endpoint it
//! targets and what kind of response comes back. The other components read
//! the `ActionSpec` instead of branching on the action themselves.

use crate::models::EditParams;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Provider API generation an action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Generation {
    /// JSON body with a base64 `init_image`, JSON `artifacts` response.
    V1,
    /// Multipart body with raw image bytes, binary or job-id response.
    V2,
}

impl Generation {
    pub fn as_str(self) -> &'static str {
        match self {
            Generation::V1 => "v1",
            Generation::V2 => "v2",
        }
    }

    /// Actions available in this generation's vocabulary.
    pub fn actions(self) -> impl Iterator<Item = EditAction> {
        EditAction::ALL
            .into_iter()
            .filter(move |action| action.generation() == self)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Generation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "legacy" => Ok(Generation::V1),
            "v2" | "current" => Ok(Generation::V2),
            other => Err(Error::Config(format!(
                "Unknown provider generation '{}'. Expected v1 or v2",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditAction {
    Replace,
    Recolor,
    Background,
    Relight,
    SearchAndReplace,
    SearchAndRecolor,
    RemoveBackground,
    ReplaceBackgroundAndRelight,
}

impl EditAction {
    pub const ALL: [EditAction; 8] = [
        EditAction::Replace,
        EditAction::Recolor,
        EditAction::Background,
        EditAction::Relight,
        EditAction::SearchAndReplace,
        EditAction::SearchAndRecolor,
        EditAction::RemoveBackground,
        EditAction::ReplaceBackgroundAndRelight,
    ];

    /// Wire tag used by clients and, for the current generation, the endpoint.
    pub fn tag(self) -> &'static str {
        match self {
            EditAction::Replace => "replace",
            EditAction::Recolor => "recolor",
            EditAction::Background => "background",
            EditAction::Relight => "relight",
            EditAction::SearchAndReplace => "search-and-replace",
            EditAction::SearchAndRecolor => "search-and-recolor",
            EditAction::RemoveBackground => "remove-background",
            EditAction::ReplaceBackgroundAndRelight => "replace-background-and-relight",
        }
    }

    pub fn generation(self) -> Generation {
        match self {
            EditAction::Replace
            | EditAction::Recolor
            | EditAction::Background
            | EditAction::Relight => Generation::V1,
            _ => Generation::V2,
        }
    }

    /// Resolve a client tag within one vocabulary.
    ///
    /// Tags from the other generation are rejected, never translated.
    pub fn parse(tag: &str, generation: Generation) -> Result<Self> {
        generation
            .actions()
            .find(|action| action.tag() == tag)
            .ok_or_else(|| Error::UnsupportedAction(tag.to_string()))
    }

    pub fn spec(self) -> ActionSpec {
        match self {
            EditAction::Replace => ActionSpec::legacy(
                self,
                "/v1/generation/image-to-image",
                LegacyPrompt::Literal,
            ),
            EditAction::Recolor => ActionSpec::legacy(
                self,
                "/v1/generation/image-to-image",
                LegacyPrompt::Suffixed(" color style"),
            ),
            EditAction::Background => ActionSpec::legacy(
                self,
                "/v1/generation/image-to-image/upscale",
                LegacyPrompt::Fixed("remove background, transparent background"),
            ),
            EditAction::Relight => ActionSpec::legacy(
                self,
                "/v1/generation/image-to-image",
                LegacyPrompt::PromptOr("adjust lighting and replace background"),
            ),
            EditAction::RemoveBackground => ActionSpec {
                action: self,
                endpoint: "/v2beta/stable-image/edit/remove-background",
                payload: PayloadShape::Multipart {
                    image_field: "image",
                    text_fields: &[],
                },
                response: ResponseShape::BinaryImage,
            },
            EditAction::SearchAndReplace => ActionSpec {
                action: self,
                endpoint: "/v2beta/stable-image/edit/search-and-replace",
                payload: PayloadShape::Multipart {
                    image_field: "image",
                    text_fields: SEARCH_AND_REPLACE_FIELDS,
                },
                response: ResponseShape::BinaryImage,
            },
            EditAction::SearchAndRecolor => ActionSpec {
                action: self,
                endpoint: "/v2beta/stable-image/edit/search-and-recolor",
                payload: PayloadShape::Multipart {
                    image_field: "image",
                    text_fields: SEARCH_AND_RECOLOR_FIELDS,
                },
                response: ResponseShape::BinaryImage,
            },
            EditAction::ReplaceBackgroundAndRelight => ActionSpec {
                action: self,
                endpoint: "/v2beta/stable-image/edit/replace-background-and-relight",
                payload: PayloadShape::Multipart {
                    image_field: "subject_image",
                    text_fields: RELIGHT_FIELDS,
                },
                response: ResponseShape::Job,
            },
        }
    }
}

impl fmt::Display for EditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Optional text parameters a client may send with an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Prompt,
    SearchPrompt,
    SelectPrompt,
    BackgroundPrompt,
}

impl Param {
    /// Client-facing JSON field name.
    pub fn field_name(self) -> &'static str {
        match self {
            Param::Prompt => "prompt",
            Param::SearchPrompt => "searchPrompt",
            Param::SelectPrompt => "selectPrompt",
            Param::BackgroundPrompt => "backgroundPrompt",
        }
    }
}

type TextFields = &'static [(&'static str, &'static [Param])];

const PROMPT_ONLY: &[Param] = &[Param::Prompt];

const SEARCH_AND_REPLACE_FIELDS: TextFields = &[
    ("prompt", PROMPT_ONLY),
    ("search_prompt", &[Param::SearchPrompt]),
];

const SEARCH_AND_RECOLOR_FIELDS: TextFields = &[
    ("prompt", PROMPT_ONLY),
    ("select_prompt", &[Param::SelectPrompt]),
];

const RELIGHT_FIELDS: TextFields = &[(
    "background_prompt",
    &[Param::BackgroundPrompt, Param::Prompt],
)];

/// How the single legacy `text_prompts` entry is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyPrompt {
    Literal,
    Suffixed(&'static str),
    Fixed(&'static str),
    PromptOr(&'static str),
}

impl LegacyPrompt {
    pub fn render(self, params: &EditParams) -> Option<String> {
        let prompt = params.get(Param::Prompt);
        match self {
            LegacyPrompt::Literal => prompt.map(str::to_string),
            LegacyPrompt::Suffixed(suffix) => prompt.map(|p| format!("{}{}", p, suffix)),
            LegacyPrompt::Fixed(text) => Some(text.to_string()),
            LegacyPrompt::PromptOr(fallback) => Some(prompt.unwrap_or(fallback).to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    LegacyJson { prompt: LegacyPrompt },
    /// Each text field takes the first present parameter of its list.
    Multipart {
        image_field: &'static str,
        text_fields: TextFields,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Raw image bytes, wrapped as `image/webp`.
    BinaryImage,
    /// JSON `artifacts[0].base64`, wrapped as `image/png`.
    Artifacts,
    /// JSON `{ "id": ... }` for an asynchronous generation.
    Job,
}

impl ResponseShape {
    pub fn accept(self) -> &'static str {
        match self {
            ResponseShape::BinaryImage => "image/*",
            ResponseShape::Artifacts | ResponseShape::Job => "application/json",
        }
    }
}

/// Everything the pipeline needs to know about one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpec {
    pub action: EditAction,
    /// Path relative to the provider base URL.
    pub endpoint: &'static str,
    pub payload: PayloadShape,
    pub response: ResponseShape,
}

impl ActionSpec {
    fn legacy(action: EditAction, endpoint: &'static str, prompt: LegacyPrompt) -> Self {
        Self {
            action,
            endpoint,
            payload: PayloadShape::LegacyJson { prompt },
            response: ResponseShape::Artifacts,
        }
    }

    /// Parameter groups the request must satisfy; one parameter of each group must be present.
    pub fn required_params(&self) -> Vec<&'static [Param]> {
        match self.payload {
            PayloadShape::LegacyJson {
                prompt: LegacyPrompt::Fixed(_),
            } => Vec::new(),
            PayloadShape::LegacyJson { .. } => vec![PROMPT_ONLY],
            PayloadShape::Multipart { text_fields, .. } => {
                text_fields.iter().map(|(_, params)| *params).collect()
            }
        }
    }

    pub fn validate(&self, params: &EditParams) -> Result<()> {
        for group in self.required_params() {
            if group.iter().all(|param| params.get(*param).is_none()) {
                let names: Vec<&str> = group.iter().map(|p| p.field_name()).collect();
                return Err(Error::Validation(format!(
                    "{} is required for {}",
                    names.join(" or "),
                    self.action
                )));
            }
        }
        Ok(())
    }

    pub fn is_async(&self) -> bool {
        self.response == ResponseShape::Job
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(prompt: Option<&str>, background: Option<&str>) -> EditParams {
        EditParams {
            prompt: prompt.map(str::to_string),
            background_prompt: background.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_respects_generation() {
        assert_eq!(
            EditAction::parse("remove-background", Generation::V2).unwrap(),
            EditAction::RemoveBackground
        );
        assert!(matches!(
            EditAction::parse("background", Generation::V2),
            Err(Error::UnsupportedAction(_))
        ));
        assert!(matches!(
            EditAction::parse("search-and-replace", Generation::V1),
            Err(Error::UnsupportedAction(_))
        ));
        assert!(matches!(
            EditAction::parse("sharpen", Generation::V1),
            Err(Error::UnsupportedAction(_))
        ));
    }

    #[test]
    fn test_each_generation_has_four_actions() {
        assert_eq!(Generation::V1.actions().count(), 4);
        assert_eq!(Generation::V2.actions().count(), 4);
    }

    #[test]
    fn test_generation_from_str() {
        assert_eq!("V2".parse::<Generation>().unwrap(), Generation::V2);
        assert_eq!("legacy".parse::<Generation>().unwrap(), Generation::V1);
        assert!("v3".parse::<Generation>().is_err());
    }

    #[test]
    fn test_current_endpoints_follow_action_tag() {
        for action in Generation::V2.actions() {
            assert_eq!(
                action.spec().endpoint,
                format!("/v2beta/stable-image/edit/{}", action.tag())
            );
        }
    }

    #[test]
    fn test_legacy_endpoints_split_on_background() {
        assert_eq!(
            EditAction::Background.spec().endpoint,
            "/v1/generation/image-to-image/upscale"
        );
        for action in [EditAction::Replace, EditAction::Recolor, EditAction::Relight] {
            assert_eq!(action.spec().endpoint, "/v1/generation/image-to-image");
        }
    }

    #[test]
    fn test_only_relight_is_async() {
        for action in EditAction::ALL {
            assert_eq!(
                action.spec().is_async(),
                action == EditAction::ReplaceBackgroundAndRelight,
                "{}",
                action
            );
        }
    }

    #[test]
    fn test_validation_requirements() {
        let empty = EditParams::default();
        assert!(EditAction::RemoveBackground.spec().validate(&empty).is_ok());
        assert!(EditAction::Background.spec().validate(&empty).is_ok());
        assert!(EditAction::Relight.spec().validate(&params(Some("warm"), None)).is_ok());

        let err = EditAction::SearchAndReplace
            .spec()
            .validate(&params(Some("a red car"), None))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "searchPrompt is required for search-and-replace"
        );

        for action in [EditAction::Replace, EditAction::Recolor, EditAction::Relight] {
            let err = action.spec().validate(&empty).unwrap_err();
            assert_eq!(err.to_string(), format!("prompt is required for {}", action));
        }
    }

    #[test]
    fn test_relight_accepts_prompt_as_fallback() {
        let spec = EditAction::ReplaceBackgroundAndRelight.spec();
        assert!(spec.validate(&params(Some("sunset"), None)).is_ok());
        assert!(spec.validate(&params(None, Some("sunset"))).is_ok());
        let err = spec.validate(&params(Some("  "), None)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "backgroundPrompt or prompt is required for replace-background-and-relight"
        );
    }

    #[test]
    fn test_legacy_prompt_rendering() {
        let with_prompt = params(Some("teal"), None);
        let without = EditParams::default();

        assert_eq!(
            LegacyPrompt::Suffixed(" color style").render(&with_prompt),
            Some("teal color style".to_string())
        );
        assert_eq!(LegacyPrompt::Literal.render(&without), None);
        assert_eq!(
            LegacyPrompt::PromptOr("fallback").render(&without),
            Some("fallback".to_string())
        );
        assert_eq!(
            LegacyPrompt::Fixed("fixed").render(&with_prompt),
            Some("fixed".to_string())
        );
    }
}
