use super::{map_service_error, ApiResult, AppState};
use crate::comments::{CommentNode, CommentService};
use crate::feed::{self, FeedFilter, FeedPage, FeedQuery, SortMode};
use crate::likes::LikeService;
use crate::posts::{PostService, PostView};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::ApiError;

#[derive(Debug, Deserialize)]
pub(crate) struct FeedParams {
    #[serde(default)]
    filter: Option<String>,
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    sort: Option<String>,
    #[serde(default)]
    page_size: Option<usize>,
    #[serde(default)]
    pages: Option<usize>,
}

impl FeedParams {
    fn into_query(self) -> Result<FeedQuery, ApiError> {
        let defaults = FeedQuery::default();
        let filter = match self.filter.as_deref() {
            Some(raw) => FeedFilter::from_str(raw)
                .map_err(|err| ApiError::BadRequest(err.to_string()))?,
            None => defaults.filter,
        };
        let sort = match self.sort.as_deref() {
            Some(raw) => {
                SortMode::from_str(raw).map_err(|err| ApiError::BadRequest(err.to_string()))?
            }
            None => defaults.sort,
        };
        let page_size = match self.page_size {
            Some(0) => return Err(ApiError::BadRequest("page_size must be positive".into())),
            Some(size) => size,
            None => defaults.page_size,
        };
        Ok(FeedQuery {
            filter,
            search: self.q.unwrap_or_default(),
            sort,
            page_size,
            pages: self.pages.unwrap_or(defaults.pages).max(1),
        })
    }
}

pub(crate) async fn feed_handler(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> ApiResult<FeedPage> {
    let query = params.into_query()?;
    let service = PostService::new(state.database.clone(), state.config.public_base_url.clone());
    let posts = service.list_posts().map_err(ApiError::Internal)?;
    Ok(Json(feed::visible_window(posts, &query)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostDetailParams {
    #[serde(default)]
    user_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PostDetailResponse {
    #[serde(flatten)]
    post: PostView,
    comments: Vec<CommentNode>,
    share_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    liked: Option<bool>,
}

/// Reader detail view. Opening a post counts a view.
pub(crate) async fn get_post_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PostDetailParams>,
) -> ApiResult<PostDetailResponse> {
    let service = PostService::new(state.database.clone(), state.config.public_base_url.clone());
    let Some(post) = service.open_post(&id).map_err(map_service_error)? else {
        return Err(ApiError::NotFound(format!("post {id} not found")));
    };
    let comments = CommentService::new(state.database.clone())
        .tree_for_post(&id)
        .map_err(ApiError::Internal)?;
    let liked = match params.user_key.as_deref().filter(|key| !key.is_empty()) {
        Some(user_key) => Some(
            LikeService::new(state.database.clone())
                .state(&id, user_key)
                .map_err(ApiError::Internal)?
                .liked,
        ),
        None => None,
    };
    Ok(Json(PostDetailResponse {
        share_url: service.share_url(&id),
        post,
        comments,
        liked,
    }))
}
