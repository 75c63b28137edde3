use super::{map_service_error, ApiResult, AppState};
use crate::likes::{LikeService, LikeState};
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ToggleLikeInput {
    user_key: String,
}

pub(crate) async fn toggle_like_handler(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(input): Json<ToggleLikeInput>,
) -> ApiResult<LikeState> {
    let service = LikeService::new(state.database.clone());
    let result = service
        .toggle(&post_id, &input.user_key)
        .map_err(map_service_error)?;
    Ok(Json(result))
}
