//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the avif-batch REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the avif-batch REST API
///
/// This struct is used to generate the OpenAPI 3.1 specification that
/// describes all available endpoints, request/response types, and API
/// behavior.
///
/// The spec can be accessed via:
/// - `/api/v1/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (if enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "avif-batch REST API",
        version = "0.2.0",
        description = "REST API for converting JPEG images to AVIF and retrieving the converted artifacts",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    paths(
        // Conversion
        crate::api::routes::convert_image,

        // Files
        crate::api::routes::download_artifact,
        crate::api::routes::recent_conversions,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::ArtifactId,
        crate::types::ConvertedArtifact,
        crate::types::FileStatus,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "convert", description = "Conversion - Upload JPEG images for AVIF conversion"),
        (name = "files", description = "Files - Download converted artifacts and list recent conversions"),
        (name = "system", description = "System endpoints - Health checks and OpenAPI spec"),
    )
)]
pub struct ApiDoc;
