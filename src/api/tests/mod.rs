use super::*;
use crate::converter::test_helpers::tiny_jpeg;
use crate::registry::FileRegistry;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;


const BOUNDARY: &str = "avif-batch-test-boundary";

/// Build a router over a fresh registry, returning both
fn test_app_with_config(config: Config) -> (Router, FileRegistry) {
    let config = Arc::new(config);
    let registry = FileRegistry::new();
    let service = Arc::new(LocalConversionService::new(&config, registry.clone()));
    (create_router(service, config), registry)
}

/// Build a router with the default configuration
fn test_app() -> (Router, FileRegistry) {
    test_app_with_config(Config::default())
}

/// A multipart upload request with a single `file` field
fn upload_request(filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/v1/convert")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Parse a response body as JSON
async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
