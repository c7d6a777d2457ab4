//! Library listing and streaming routes.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    routing::get,
    Json, Router,
};
use mediaforge_common::paths::guess_content_type;
use mediaforge_common::{Error, MediaKind};
use serde::Serialize;

use crate::server::error::AppError;
use crate::server::AppContext;
use crate::streaming::{resolve_stream, StreamPlan};

#[derive(Debug, Serialize)]
pub struct MediaListResponse {
    pub files: Vec<String>,
}

pub fn media_routes() -> Router<AppContext> {
    Router::new()
        .route("/audios", get(list_audios))
        .route("/audios/:filename", get(stream_audio))
        .route("/videos", get(list_videos))
        .route("/videos/:filename", get(stream_video))
}

/// Raw `Range` header, if any. Non-ASCII values are malformed ranges.
pub(crate) fn range_header(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    headers
        .get(header::RANGE)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| AppError::from(Error::malformed_range("Range header is not ASCII")))
        })
        .transpose()
}

async fn list_media(ctx: &AppContext, kind: MediaKind) -> Result<Json<MediaListResponse>, AppError> {
    let files = ctx.manager.library().list(kind).await?;
    Ok(Json(MediaListResponse { files }))
}

async fn stream_media(
    ctx: &AppContext,
    kind: MediaKind,
    filename: &str,
    headers: &HeaderMap,
) -> Result<StreamPlan, AppError> {
    let path = ctx.manager.library().source_path(kind, filename).await?;
    let content_type = guess_content_type(filename, kind);
    Ok(resolve_stream(&path, range_header(headers)?, content_type).await?)
}

/// GET /api/audios
async fn list_audios(State(ctx): State<AppContext>) -> Result<Json<MediaListResponse>, AppError> {
    list_media(&ctx, MediaKind::Audio).await
}

/// GET /api/videos
async fn list_videos(State(ctx): State<AppContext>) -> Result<Json<MediaListResponse>, AppError> {
    list_media(&ctx, MediaKind::Video).await
}

/// GET /api/audios/:filename
async fn stream_audio(
    State(ctx): State<AppContext>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Result<StreamPlan, AppError> {
    stream_media(&ctx, MediaKind::Audio, &filename, &headers).await
}

/// GET /api/videos/:filename
async fn stream_video(
    State(ctx): State<AppContext>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Result<StreamPlan, AppError> {
    stream_media(&ctx, MediaKind::Video, &filename, &headers).await
}
