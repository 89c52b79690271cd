//! Conversion upload handler.

use crate::api::AppState;
use crate::error::{ApiError, Error};
use crate::service::ConversionService;
use crate::types::SourceFile;
use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// POST /convert - Upload a JPEG and convert it to AVIF
///
/// Expects a multipart form with the file in a `file` field. The converted
/// artifact is stored in the registry and its metadata returned, including
/// the download URL and the size saving achieved.
#[utoipa::path(
    post,
    path = "/api/v1/convert",
    tag = "convert",
    request_body(content = Vec<u8>, description = "JPEG file upload (multipart/form-data, field name 'file')", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Conversion succeeded", body = crate::types::ConvertedArtifact),
        (status = 400, description = "Missing file or unsupported input", body = crate::error::ApiError),
        (status = 500, description = "Conversion failed", body = crate::error::ApiError)
    )
)]
pub async fn convert_image(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            if let Some(filename) = field.file_name() {
                file_name = Some(filename.to_string());
            }
            if let Some(mime) = field.content_type() {
                content_type = Some(mime.to_string());
            }
            match field.bytes().await {
                Ok(bytes) => file_bytes = Some(bytes.to_vec()),
                Err(e) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(ApiError::new(
                            "invalid_file",
                            format!("Failed to read file: {}", e),
                        )),
                    )
                        .into_response();
                }
            }
        }
    }

    let Some(data) = file_bytes else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                "missing_file",
                "No file provided in 'file' field",
            )),
        )
            .into_response();
    };

    let source = SourceFile::new(
        file_name.unwrap_or_else(|| "upload".to_string()),
        content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
        data,
    );

    tracing::info!(
        name = %source.name,
        size = source.size(),
        "conversion upload received"
    );

    match state.service.convert(&source).await {
        Ok(artifact) => (StatusCode::OK, Json(artifact)).into_response(),
        Err(e) => Error::Convert(e).into_response(),
    }
}
