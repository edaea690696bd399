//! HTTP surface
//!
//! Exposes the edit endpoint plus the gallery, profile and asset routes the
//! web client uses. Every failure is answered as `{ "error": string }`.

use crate::auth::{SessionStore, User};
use crate::cdn::AssetHost;
use crate::edit::EditOrchestrator;
use crate::gallery::GalleryStore;
use crate::models::{EditRequest, ImageRecord, NewImageRecord, UpdateUser, UploadedAsset};
use crate::provider::mime::{detect_image_mime, extension_for_mime};
use crate::Error;
use axum::extract::multipart::Multipart;
use axum::extract::{DefaultBodyLimit, FromRequest, FromRequestParts, Path, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Largest accepted request body (uploads included).
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub editor: Arc<EditOrchestrator>,
    pub sessions: Arc<dyn SessionStore>,
    pub gallery: Arc<dyn GalleryStore>,
    pub assets: Arc<dyn AssetHost>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if self.is_client_error() {
            tracing::debug!("Request rejected: {}", self);
        } else {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

/// JSON body extractor whose rejections use the `{ "error" }` envelope.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                Error::Validation(format!("Invalid request body: {}", rejection.body_text()))
            })?;
        Ok(ApiJson(value))
    }
}

/// The signed-in user, resolved from a `Bearer` session token.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(Error::Unauthorized)?;

        state
            .sessions
            .current_user(token)
            .await?
            .map(CurrentUser)
            .ok_or(Error::Unauthorized)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/edit", post(edit))
        .route("/images", get(list_images).post(create_image))
        .route("/images/{id}", delete(delete_image))
        .route("/user", get(current_user).patch(update_user))
        .route("/uploads", post(upload_asset))
        .route("/assets/{id}", delete(delete_asset))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn edit(State(state): State<AppState>, ApiJson(request): ApiJson<EditRequest>) -> Response {
    let outcome = state.editor.handle(request).await;
    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(outcome.body)).into_response()
}

async fn list_images(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> crate::Result<Json<Vec<ImageRecord>>> {
    Ok(Json(state.gallery.list_image_records(&user.id).await?))
}

async fn create_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<NewImageRecord>,
) -> crate::Result<Json<ImageRecord>> {
    let image_url = body
        .image_url
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Validation("Image URL is required".to_string()))?;
    let feature_type = body
        .feature_type
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Validation("Feature type is required".to_string()))?;

    let record = state
        .gallery
        .create_image_record(&image_url, &feature_type, &user.id)
        .await?;
    tracing::info!("Saved image {} for user {}", record.id, user.id);
    Ok(Json(record))
}

async fn delete_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> crate::Result<StatusCode> {
    let not_found = || Error::NotFound("Image not found".to_string());
    let id = Uuid::parse_str(&id).map_err(|_| not_found())?;

    match state.gallery.get_image_record(id).await? {
        Some(record) if record.user_id == user.id => {
            state.gallery.delete_image_record(id).await?;
            Ok(StatusCode::NO_CONTENT)
        }
        _ => Err(not_found()),
    }
}

async fn current_user(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<UpdateUser>,
) -> crate::Result<Json<User>> {
    let name = body
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::Validation("Name is required".to_string()))?;

    Ok(Json(state.sessions.update_name(&user.id, &name).await?))
}

async fn upload_asset(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> crate::Result<Json<UploadedAsset>> {
    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Error::Validation(format!("File read error: {}", e)))?;
            data = Some(bytes);
            break;
        }
    }

    let data = data
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| Error::Validation("No file provided".to_string()))?;

    let content_type = detect_image_mime(&data);
    let asset_id = format!("{}.{}", Uuid::new_v4(), extension_for_mime(content_type));
    let url = state
        .assets
        .upload(&asset_key(&asset_id), &data, content_type)
        .await?;

    tracing::info!("User {} uploaded asset {}", user.id, asset_id);
    Ok(Json(UploadedAsset { url, asset_id }))
}

async fn delete_asset(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Response {
    if id.is_empty() || id.contains('/') || id.starts_with('.') {
        return Error::Validation("Invalid asset id".to_string()).into_response();
    }

    match state.assets.delete(&asset_key(&id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Failed to remove asset {}: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to remove image" })),
            )
                .into_response()
        }
    }
}

fn asset_key(asset_id: &str) -> String {
    format!("uploads/{}", asset_id)
}
