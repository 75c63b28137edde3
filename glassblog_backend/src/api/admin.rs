use super::{map_service_error, require_admin, ApiError, ApiResult, AppState};
use crate::auth::{AdminAuth, AdminSession};
use crate::posts::{EditPostInput, PostService, PostView, PublishPostInput, SiteStats};
use crate::storage::{Bucket, ObjectStore, SaveObjectInput};
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct LoginInput {
    email: String,
    password: String,
}

pub(crate) async fn login_handler(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> ApiResult<AdminSession> {
    let auth = AdminAuth::new(state.database.clone(), state.config.admin.clone());
    let session = auth
        .sign_in(&input.email, &input.password)
        .map_err(|err| ApiError::Unauthorized(err.to_string()))?;
    Ok(Json(session))
}

#[derive(Debug, Serialize)]
pub(crate) struct LogoutResponse {
    signed_out: bool,
}

pub(crate) async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<LogoutResponse> {
    let session = require_admin(&state, &headers)?;
    let auth = AdminAuth::new(state.database.clone(), state.config.admin.clone());
    auth.sign_out(&session.token).map_err(ApiError::Internal)?;
    Ok(Json(LogoutResponse { signed_out: true }))
}

pub(crate) async fn session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<AdminSession> {
    let session = require_admin(&state, &headers)?;
    Ok(Json(session))
}

pub(crate) async fn stats_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<SiteStats> {
    require_admin(&state, &headers)?;
    let service = PostService::new(state.database.clone(), state.config.public_base_url.clone());
    Ok(Json(service.stats().map_err(ApiError::Internal)?))
}

pub(crate) async fn list_posts_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<PostView>> {
    require_admin(&state, &headers)?;
    let service = PostService::new(state.database.clone(), state.config.public_base_url.clone());
    Ok(Json(service.list_posts().map_err(ApiError::Internal)?))
}

struct UploadedPart {
    original_name: Option<String>,
    mime: Option<String>,
    data: Vec<u8>,
}

/// Publishes a post from a multipart form: a `json` field carrying the
/// post payload plus optional `cover`, `video`, and `document` file parts.
pub(crate) async fn publish_post_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    require_admin(&state, &headers)?;

    let mut payload: Option<PublishPostInput> = None;
    let mut cover: Option<UploadedPart> = None;
    let mut video: Option<UploadedPart> = None;
    let mut document: Option<UploadedPart> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(format!("malformed multipart body: {err}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "json" => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| ApiError::BadRequest(format!("unreadable json field: {err}")))?;
                payload = Some(
                    serde_json::from_str(&text)
                        .map_err(|err| ApiError::BadRequest(format!("invalid post json: {err}")))?,
                );
            }
            "cover" | "video" | "document" => {
                let original_name = field.file_name().map(|s| s.to_string());
                let mime = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::BadRequest(format!("unreadable file field: {err}")))?
                    .to_vec();
                let part = UploadedPart {
                    original_name,
                    mime,
                    data,
                };
                match name.as_str() {
                    "cover" => cover = Some(part),
                    "video" => video = Some(part),
                    _ => document = Some(part),
                }
            }
            other => {
                tracing::debug!(field = %other, "ignoring unknown multipart field");
            }
        }
    }

    let mut input = payload.ok_or_else(|| ApiError::BadRequest("missing json field".into()))?;
    // Reject before storing any upload, so a failed publish leaves no
    // orphaned objects.
    input.validate_metadata().map_err(map_service_error)?;

    let store = ObjectStore::new(
        state.database.clone(),
        state.config.paths.clone(),
        state.config.storage.clone(),
    );
    if let Some(part) = cover {
        let stored = store
            .put(SaveObjectInput {
                bucket: Bucket::Covers,
                original_name: part.original_name,
                mime: part.mime,
                data: part.data,
            })
            .await
            .map_err(map_service_error)?;
        input.cover_image = Some(stored.url);
    }
    if let Some(part) = video {
        let stored = store
            .put(SaveObjectInput {
                bucket: Bucket::Videos,
                original_name: part.original_name,
                mime: part.mime,
                data: part.data,
            })
            .await
            .map_err(map_service_error)?;
        input.video_url = Some(stored.url);
    }
    if let Some(part) = document {
        let stored = store
            .put(SaveObjectInput {
                bucket: Bucket::Docs,
                original_name: part.original_name,
                mime: part.mime,
                data: part.data,
            })
            .await
            .map_err(map_service_error)?;
        input.file_name = stored.original_name.clone();
        input.file_object_id = Some(stored.id);
    }

    let service = PostService::new(state.database.clone(), state.config.public_base_url.clone());
    let post = service.publish(input).map_err(map_service_error)?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub(crate) async fn edit_post_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<EditPostInput>,
) -> ApiResult<PostView> {
    require_admin(&state, &headers)?;
    let service = PostService::new(state.database.clone(), state.config.public_base_url.clone());
    match service.edit(&id, input).map_err(map_service_error)? {
        Some(post) => Ok(Json(post)),
        None => Err(ApiError::NotFound(format!("post {id} not found"))),
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteResponse {
    deleted: bool,
}

pub(crate) async fn delete_post_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<DeleteResponse> {
    require_admin(&state, &headers)?;
    let service = PostService::new(state.database.clone(), state.config.public_base_url.clone());
    if !service.delete(&id).map_err(ApiError::Internal)? {
        return Err(ApiError::NotFound(format!("post {id} not found")));
    }
    Ok(Json(DeleteResponse { deleted: true }))
}
