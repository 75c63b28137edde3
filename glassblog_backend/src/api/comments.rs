use super::{map_service_error, ApiResult, AppState};
use crate::comments::{AddCommentInput, CommentNode, CommentService, CommentView};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::ApiError;

pub(crate) async fn list_comments_handler(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<Vec<CommentNode>> {
    let service = CommentService::new(state.database.clone());
    let tree = service.tree_for_post(&post_id).map_err(ApiError::Internal)?;
    Ok(Json(tree))
}

pub(crate) async fn add_comment_handler(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(input): Json<AddCommentInput>,
) -> Result<(StatusCode, Json<CommentView>), ApiError> {
    let service = CommentService::new(state.database.clone());
    let comment = service
        .add_comment(&post_id, input)
        .map_err(map_service_error)?;
    Ok((StatusCode::CREATED, Json(comment)))
}
