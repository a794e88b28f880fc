//! HTTP request handlers for the web server.

use std::path::Path as FsPath;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use super::proxy;
use super::AppState;
use crate::error::ResolveError;
use crate::models::{FormatOption, ResolveResult};
use crate::storage;

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub url: String,
    #[serde(default)]
    pub cookie: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub url: String,
    pub format_id: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub success: bool,
    #[serde(rename = "fileId")]
    pub file_id: String,
    pub url: Option<String>,
    pub webpage_url: String,
    pub filename: String,
    pub size: u64,
    pub thumbnail: Option<String>,
    pub title: String,
    pub formats: Vec<FormatOption>,
}

impl ResolveResponse {
    fn new(file_id: &str, result: &ResolveResult) -> Self {
        Self {
            success: true,
            file_id: file_id.to_string(),
            url: result.direct_url.clone(),
            webpage_url: result.webpage_url.clone(),
            filename: result.filename.clone(),
            size: result.size_bytes,
            thumbnail: result.thumbnail.clone(),
            title: result.title.clone(),
            formats: result.formats.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    #[serde(rename = "fileId")]
    pub file_id: String,
    pub filename: String,
    pub processed: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&ResolveError> for ErrorResponse {
    fn from(error: &ResolveError) -> Self {
        Self {
            success: false,
            error: error.to_string(),
            details: error.details().map(str::to_string),
        }
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "detail": "File link expired or invalid" })),
    )
        .into_response()
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 name.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let encoded: String = filename
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
                (b as char).to_string()
            } else {
                format!("%{:02X}", b)
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

/// Resolve a share link or video page.
pub async fn resolve(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Response {
    let supplied = request
        .cookie
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let effective = match supplied {
        Some(cookie) => Some(cookie.to_string()),
        None => state.cookies.load().await,
    };

    info!(
        "Resolving URL: {} (cookie active: {})",
        request.url,
        effective.is_some()
    );

    match state
        .resolver
        .resolve(&request.url, effective.as_deref())
        .await
    {
        Ok(result) => {
            if let Some(cookie) = supplied {
                match state.cookies.save(cookie).await {
                    Ok(()) => info!("Saved working cookie for future requests"),
                    Err(e) => warn!("Failed to save cookie: {:#}", e),
                }
            }

            let file_id = storage::new_file_id();
            let response = ResolveResponse::new(&file_id, &result);
            state.cache.insert(file_id, result);
            Json(response).into_response()
        }
        Err(e) => {
            warn!("Resolve failed for {}: {}", request.url, e);
            (StatusCode::BAD_REQUEST, Json(ErrorResponse::from(&e))).into_response()
        }
    }
}

/// Merge a chosen format into a local file.
pub async fn process(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> Response {
    info!(
        "Processing media: {} (format: {})",
        request.url, request.format_id
    );

    match state
        .processor
        .process(&request.url, &request.format_id)
        .await
    {
        Some(file) => Json(ProcessResponse {
            success: true,
            file_id: file.file_id,
            filename: file.filename,
            processed: true,
        })
        .into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::from(&ResolveError::ProcessingFailed)),
        )
            .into_response(),
    }
}

/// Serve a processed file, or proxy the cached direct link.
pub async fn download(State(state): State<AppState>, Path(file_id): Path<String>) -> Response {
    if !storage::is_safe_id(&file_id) {
        return not_found();
    }

    match storage::find_by_prefix(&state.downloads_dir, &file_id).await {
        Ok(Some(path)) => return serve_local(&path).await,
        Ok(None) => {}
        Err(e) => warn!("Cannot scan {}: {}", state.downloads_dir.display(), e),
    }

    let Some(entry) = state.cache.get(&file_id) else {
        info!("File ID {} not found in cache or on disk", file_id);
        return not_found();
    };
    let Some(url) = entry.direct_url.clone() else {
        return not_found();
    };

    info!("Proxying download from: {}", url);
    let body = proxy::upstream_body(state.http.clone(), url, &entry.headers);

    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&entry.filename),
            ),
        ],
        body,
    )
        .into_response()
}

async fn serve_local(path: &FsPath) -> Response {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let file = match tokio::fs::File::open(path).await {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to open {}: {}", path.display(), e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file").into_response();
        }
    };
    let length = file.metadata().await.map(|m| m.len()).ok();

    info!("Serving local file: {}", path.display());

    let mime = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();

    let mut response = (
        [
            (header::CONTENT_TYPE, mime),
            (header::CONTENT_DISPOSITION, content_disposition(&filename)),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response();

    if let Some(length) = length {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, length.into());
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_is_ascii() {
        let value = content_disposition("Vidéo \"final\".mp4");
        assert!(value.is_ascii());
        assert!(value.starts_with("attachment; filename=\"Vid_o _final_.mp4\""));
        assert!(value.ends_with("filename*=UTF-8''Vid%C3%A9o%20%22final%22.mp4"));
    }

    #[test]
    fn test_error_body_shape() {
        let body = serde_json::to_value(ErrorResponse::from(&ResolveError::LoginRequired)).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "LOGIN_REQUIRED");
        assert_eq!(
            body["details"],
            "This file can only be accessed by a logged-in user."
        );

        let body = serde_json::to_value(ErrorResponse::from(&ResolveError::ProcessingFailed)).unwrap();
        assert_eq!(body["error"], "Processing failed");
        assert!(body.get("details").is_none());
    }
}
