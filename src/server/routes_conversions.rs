//! Conversion task routes.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use mediaforge_common::{Error, MediaKind, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::conversion::{ConversionTask, TaskState};
use crate::server::error::AppError;
use crate::server::routes_media::range_header;
use crate::server::AppContext;
use crate::streaming::{resolve_stream, StreamPlan};

/// Query parameters for starting a conversion.
#[derive(Debug, Deserialize)]
pub struct StartConversionParams {
    pub filename: String,
    pub format: String,
}

#[derive(Debug, Serialize)]
pub struct StartConversionResponse {
    pub task_id: TaskId,
    pub state: TaskState,
}

pub fn conversion_routes() -> Router<AppContext> {
    // The single segment is a media kind for POST and a task id for GET.
    Router::new()
        .route("/conversions", get(list_conversions))
        .route(
            "/conversions/:param",
            get(get_conversion).post(start_conversion),
        )
        .route("/conversions/:param/download", get(download_conversion))
}

/// Unparseable ids can never name a task, so they are reported as unknown.
fn parse_task_id(raw: &str) -> Result<TaskId, Error> {
    raw.parse().map_err(|_| Error::not_found("task", raw))
}

/// POST /api/conversions/:kind?filename=&format=
async fn start_conversion(
    State(ctx): State<AppContext>,
    Path(kind): Path<String>,
    Query(params): Query<StartConversionParams>,
) -> Result<impl IntoResponse, AppError> {
    let kind: MediaKind = kind.parse().map_err(Error::invalid_input)?;

    if !ctx.config.conversion.allows_format(&params.format) {
        return Err(Error::invalid_input(format!(
            "Unsupported target format: {}",
            params.format
        ))
        .into());
    }

    let format = params.format.to_ascii_lowercase();
    let task_id = ctx
        .manager
        .start_conversion(&params.filename, &format, kind)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(StartConversionResponse {
            task_id,
            state: TaskState::Preparing,
        }),
    ))
}

/// GET /api/conversions
async fn list_conversions(
    State(ctx): State<AppContext>,
) -> Json<HashMap<TaskId, ConversionTask>> {
    Json(ctx.manager.list_tasks())
}

/// GET /api/conversions/:task_id
async fn get_conversion(
    State(ctx): State<AppContext>,
    Path(task_id): Path<String>,
) -> Result<Json<ConversionTask>, AppError> {
    let task_id = parse_task_id(&task_id)?;
    Ok(Json(ctx.manager.get_task(task_id)?))
}

/// GET /api/conversions/:task_id/download
async fn download_conversion(
    State(ctx): State<AppContext>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
) -> Result<StreamPlan, AppError> {
    let task_id = parse_task_id(&task_id)?;
    let task = ctx.manager.get_task(task_id)?;

    let output = match (task.state(), task.output_path()) {
        (TaskState::Ready, Some(path)) => path.clone(),
        (state, _) => {
            return Err(Error::conflict(format!("Task {task_id} is {state}, not ready")).into())
        }
    };

    let file_name = output
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', "\\\""))
        .unwrap_or_default();
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .map_err(|e| Error::internal(format!("invalid Content-Disposition: {e}")))?;

    let plan = resolve_stream(&output, range_header(&headers)?, "application/octet-stream")
        .await?
        .with_header(header::CONTENT_DISPOSITION, disposition);

    Ok(plan)
}
