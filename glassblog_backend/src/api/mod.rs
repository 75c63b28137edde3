mod admin;
mod comments;
mod likes;
mod objects;
mod posts;

use crate::auth::{AdminAuth, AdminSession};
use crate::config::GlassblogConfig;
use crate::database::Database;
use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: GlassblogConfig,
    pub database: Database,
}

pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl ApiError {
    fn into_response_parts(self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse { message: msg }),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorResponse { message: msg })
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse { message: msg }),
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        message: "internal server error".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_response_parts();
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

/// Service errors carry human-readable messages; sort the validation and
/// lookup failures into client errors and keep the rest internal.
pub(crate) fn map_service_error(err: anyhow::Error) -> ApiError {
    let message = err.to_string();
    if message.contains("not found") {
        ApiError::NotFound(message)
    } else if message.contains("may not be empty")
        || message.contains("is required")
        || message.contains("unknown")
        || message.contains("exceeds")
    {
        ApiError::BadRequest(message)
    } else {
        ApiError::Internal(err)
    }
}

/// Resolves the `Authorization: Bearer <token>` header to a live admin
/// session or rejects the request.
pub(crate) fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<AdminSession, ApiError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or("");
    if token.is_empty() {
        return Err(ApiError::Unauthorized("missing bearer token".into()));
    }
    let auth = AdminAuth::new(state.database.clone(), state.config.admin.clone());
    match auth.check(token).map_err(ApiError::Internal)? {
        Some(session) => Ok(session),
        None => Err(ApiError::Unauthorized("invalid or expired session".into())),
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn router(state: AppState) -> Router {
    let max_body = state.config.storage.max_upload_bytes as usize;
    Router::new()
        .route("/health", get(health_handler))
        .route("/feed", get(posts::feed_handler))
        .route("/posts/:id", get(posts::get_post_handler))
        .route("/posts/:id/comments", get(comments::list_comments_handler).post(comments::add_comment_handler))
        .route("/posts/:id/like", post(likes::toggle_like_handler))
        .route("/objects/:id", get(objects::download_object_handler))
        .route("/admin/login", post(admin::login_handler))
        .route("/admin/logout", post(admin::logout_handler))
        .route("/admin/session", get(admin::session_handler))
        .route("/admin/stats", get(admin::stats_handler))
        .route("/admin/posts", get(admin::list_posts_handler).post(admin::publish_post_handler))
        .route("/admin/posts/:id", put(admin::edit_post_handler).delete(admin::delete_post_handler))
        .layer(DefaultBodyLimit::max(max_body.saturating_add(64 * 1024)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Tries to bind to the given port, or finds the next available port
async fn find_available_port(start_port: u16) -> Result<(TcpListener, u16)> {
    const MAX_PORT_ATTEMPTS: u16 = 100;

    for offset in 0..MAX_PORT_ATTEMPTS {
        let port = start_port + offset;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok((listener, port)),
            Err(e) => {
                if offset == 0 {
                    tracing::debug!(port, error = %e, "port in use, trying next port");
                }
                continue;
            }
        }
    }

    anyhow::bail!(
        "could not find available port in range {}-{}",
        start_port,
        start_port + MAX_PORT_ATTEMPTS - 1
    )
}

pub async fn serve_http(config: GlassblogConfig, database: Database) -> Result<()> {
    let state = AppState {
        config: config.clone(),
        database,
    };
    let app = router(state);

    let (listener, actual_port) = find_available_port(config.api_port).await?;
    if actual_port != config.api_port {
        tracing::warn!(
            requested_port = config.api_port,
            actual_port,
            "configured port was in use, bound to next available port"
        );
    }
    let addr = SocketAddr::from(([0, 0, 0, 0], actual_port));
    tracing::info!(?addr, "HTTP server listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
