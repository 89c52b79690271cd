//! Artifact download and recent-conversion handlers.

use crate::api::AppState;
use crate::error::ApiError;
use crate::service::{AVIF_CONTENT_TYPE, artifact_response};
use crate::types::{ArtifactId, ConvertedArtifact};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

/// Default number of entries returned by the recent listing
const DEFAULT_RECENT_LIMIT: usize = 10;

/// Upper bound on the recent listing size
const MAX_RECENT_LIMIT: usize = 50;

/// Query parameters for the recent listing
#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    /// Maximum number of entries to return
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /download/:id - Download a converted artifact
///
/// Responds with the raw AVIF bytes, a `Content-Disposition: attachment`
/// header carrying the converted filename, and `Content-Type: image/avif`.
#[utoipa::path(
    get,
    path = "/api/v1/download/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "Artifact ID")
    ),
    responses(
        (status = 200, description = "Converted file bytes", content_type = "image/avif"),
        (status = 404, description = "Artifact not found", body = crate::error::ApiError)
    )
)]
pub async fn download_artifact(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.registry.get_by_id(ArtifactId(id)).await {
        Some(stored) => {
            let headers = [
                (header::CONTENT_TYPE, AVIF_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", stored.converted_name),
                ),
            ];
            (StatusCode::OK, headers, stored.data.as_ref().clone()).into_response()
        }
        None => {
            tracing::warn!(artifact_id = id, "download requested for unknown artifact");
            (
                StatusCode::NOT_FOUND,
                Json(ApiError::not_found(format!("artifact {}", id))),
            )
                .into_response()
        }
    }
}

/// GET /recent - List recent conversions
///
/// Returns the most recent conversions, newest first, rendered the same way
/// as a fresh conversion response.
#[utoipa::path(
    get,
    path = "/api/v1/recent",
    tag = "files",
    params(
        ("limit" = Option<usize>, Query, description = "Maximum number of entries (default 10, capped at 50)")
    ),
    responses(
        (status = 200, description = "Recent conversions, newest first", body = Vec<crate::types::ConvertedArtifact>)
    )
)]
pub async fn recent_conversions(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> impl IntoResponse {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .min(MAX_RECENT_LIMIT);

    let records = state.registry.list_recent(limit).await;
    let responses: Vec<ConvertedArtifact> = records.iter().map(artifact_response).collect();

    (StatusCode::OK, Json(responses))
}
