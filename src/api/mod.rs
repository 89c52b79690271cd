//! REST API server module
//!
//! Provides an OpenAPI 3.1 compliant REST API exposing the conversion
//! service over HTTP: upload a JPEG, download the converted AVIF, list
//! recent conversions. This is the surface [`HttpConversionClient`] talks
//! to, so two avif-batch processes compose directly.
//!
//! [`HttpConversionClient`]: crate::service::HttpConversionClient

use crate::config::Config;
use crate::error::Result;
use crate::service::LocalConversionService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Conversion
/// - `POST /api/v1/convert` - Upload a JPEG and convert it to AVIF
///
/// ## Files
/// - `GET /api/v1/download/:id` - Download a converted artifact
/// - `GET /api/v1/recent` - List recent conversions
///
/// ## System
/// - `GET /api/v1/health` - Health check
/// - `GET /api/v1/openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(service: Arc<LocalConversionService>, config: Arc<Config>) -> Router {
    let state = AppState::new(service, config.clone());

    // Build the router with all routes
    let router = Router::new()
        // Conversion
        .route("/api/v1/convert", post(routes::convert_image))
        // Files
        .route("/api/v1/download/:id", get(routes::download_artifact))
        .route("/api/v1/recent", get(routes::recent_conversions))
        // System
        .route("/api/v1/health", get(routes::health_check))
        .route("/api/v1/openapi.json", get(routes::openapi_spec));

    // Merge Swagger UI routes if enabled in config (before applying state).
    // The UI serves its own copy of the spec at a distinct path so it does
    // not collide with the /api/v1/openapi.json route above.
    let router = if config.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    // Add state to all routes
    let router = router.with_state(state);

    // Axum caps request bodies at 2 MB by default, well under the configured
    // upload ceiling. Raise it to the ceiling plus headroom for the
    // multipart framing around the file part.
    let router = router
        .layer(DefaultBodyLimit::max(
            config.max_file_size() as usize + 64 * 1024,
        ))
        .layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config
    if config.api.cors_enabled {
        let cors = build_cors_layer(&config.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// # Arguments
///
/// * `origins` - List of allowed origins (supports "*" for any origin)
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    // Check if "*" (all origins) is in the list
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        // Allow all origins (default for local development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Allow specific origins
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// This function creates a TCP listener, binds it to the configured address,
/// and starts serving the API router. It runs until the server is shut down.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use avif_batch::{Config, FileRegistry, LocalConversionService};
///
/// # async fn example() -> avif_batch::Result<()> {
/// let config = Arc::new(Config::default());
/// let registry = FileRegistry::new();
/// let service = Arc::new(LocalConversionService::new(&config, registry));
///
/// // Start API server (blocks until shutdown)
/// avif_batch::api::start_api_server(service, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(
    service: Arc<LocalConversionService>,
    config: Arc<Config>,
) -> Result<()> {
    let bind_address = config.api.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    // Create the router with all routes
    let app = create_router(service, config);

    // Bind TCP listener to the configured address
    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

/// Spawn the REST API server in a background task
///
/// The server runs concurrently with the caller and listens on the
/// configured bind address (default: 127.0.0.1:5000).
pub fn spawn_api_server(
    service: Arc<LocalConversionService>,
    config: Arc<Config>,
) -> tokio::task::JoinHandle<Result<()>> {
    tokio::spawn(async move { start_api_server(service, config).await })
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
