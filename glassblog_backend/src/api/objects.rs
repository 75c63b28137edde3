use super::{ApiError, AppState};
use crate::storage::ObjectStore;
use anyhow::Context;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::response::Response;
use tokio::fs::File as TokioFile;
use tokio_util::io::ReaderStream;

pub(crate) async fn download_object_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let store = ObjectStore::new(
        state.database.clone(),
        state.config.paths.clone(),
        state.config.storage.clone(),
    );
    let Some(download) = store
        .prepare_download(&id)
        .await
        .map_err(ApiError::Internal)?
    else {
        return Err(ApiError::NotFound(format!("object {id} not found")));
    };

    let file = TokioFile::open(&download.absolute_path)
        .await
        .with_context(|| format!("unable to open {}", download.absolute_path.display()))
        .map_err(ApiError::Internal)?;
    let stream = ReaderStream::new(file);
    let mut response = Response::new(Body::from_stream(stream));
    let headers = response.headers_mut();

    let content_type = download
        .metadata
        .mime
        .clone()
        .unwrap_or_else(|| "application/octet-stream".into());
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&download.metadata.size_bytes.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    if let Some(name) = download.metadata.original_name.clone() {
        let value = format!("attachment; filename=\"{}\"", name.replace('"', "_"));
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(CONTENT_DISPOSITION, value);
        }
    }

    Ok(response)
}
