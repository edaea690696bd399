//! Action request builder
//!
//! Turns a validated action, its parameters and the fetched source image into
//! the exact payload the provider expects for that action.

use super::mime::{detect_image_mime, extension_for_mime};
use super::types::ImageToImageRequest;
use crate::actions::{ActionSpec, EditAction, Generation, PayloadShape};
use crate::models::EditParams;
use crate::{Error, Result};
use base64::Engine as _;

/// Output format requested from multipart endpoints.
pub const OUTPUT_FORMAT: &str = "webp";

/// Outbound request body; exactly one encoding per action.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderPayload {
    Json(ImageToImageRequest),
    Multipart(MultipartPayload),
}

/// Multipart form contents, kept inspectable until the client encodes them.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartPayload {
    pub file_field: &'static str,
    pub file_name: String,
    pub mime_type: &'static str,
    pub image: Vec<u8>,
    pub fields: Vec<(&'static str, String)>,
}

impl MultipartPayload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn into_form(self) -> Result<reqwest::multipart::Form> {
        let part = reqwest::multipart::Part::bytes(self.image)
            .file_name(self.file_name)
            .mime_str(self.mime_type)?;

        let form = self
            .fields
            .into_iter()
            .fold(reqwest::multipart::Form::new(), |form, (key, value)| {
                form.text(key, value)
            });

        Ok(form.part(self.file_field, part))
    }
}

/// Resolve `tag` within `generation`, validate and build in one step.
pub fn build_for_tag(
    tag: &str,
    generation: Generation,
    params: &EditParams,
    image: Vec<u8>,
) -> Result<ProviderPayload> {
    let action = EditAction::parse(tag, generation)?;
    build(&action.spec(), params, image)
}

pub fn build(spec: &ActionSpec, params: &EditParams, image: Vec<u8>) -> Result<ProviderPayload> {
    spec.validate(params)?;

    match spec.payload {
        PayloadShape::LegacyJson { prompt } => {
            let text = prompt.render(params).ok_or_else(|| {
                Error::Validation(format!("prompt is required for {}", spec.action))
            })?;
            let init_image = base64::engine::general_purpose::STANDARD.encode(&image);
            Ok(ProviderPayload::Json(ImageToImageRequest::new(init_image, text)))
        }
        PayloadShape::Multipart {
            image_field,
            text_fields,
        } => {
            let mut fields = Vec::with_capacity(text_fields.len() + 1);
            for (name, sources) in text_fields {
                // validate() guarantees one of the sources is present
                if let Some(value) = sources.iter().find_map(|p| params.get(*p)) {
                    fields.push((*name, value.to_string()));
                }
            }
            fields.push(("output_format", OUTPUT_FORMAT.to_string()));

            let mime_type = detect_image_mime(&image);
            Ok(ProviderPayload::Multipart(MultipartPayload {
                file_field: image_field,
                file_name: format!("image.{}", extension_for_mime(mime_type)),
                mime_type,
                image,
                fields,
            }))
        }
    }
}
