//! HTTP conversion client
//!
//! Talks to a remote avif-batch instance's REST API and normalizes every
//! failure into the [`ConvertError`] taxonomy: transport problems become
//! `ServiceUnavailable`, input rejections become `UnsupportedInput`, other
//! non-success responses become `ServiceError`, and anything that goes wrong
//! after a successful conversion becomes `RetrievalError`.

use crate::error::{ApiError, ConvertError, Error, Result};
use crate::service::{AVIF_CONTENT_TYPE, ConversionService};
use crate::types::{ArtifactId, ConvertedArtifact, RetrievedArtifact, SourceFile};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default timeout for conversion requests
///
/// Generous because AVIF encoding of a 10 MB photo can legitimately take a
/// while on a busy server.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Conversion client backed by a remote avif-batch REST API
pub struct HttpConversionClient {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpConversionClient {
    /// Create a client for the service at `base_url` (e.g. "http://127.0.0.1:5000")
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL does not parse.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| Error::Config {
            message: format!("invalid conversion endpoint '{}': {}", base_url, e),
            key: Some("endpoint".to_string()),
        })?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::Network)?;

        Ok(Self { base_url, client })
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, ConvertError> {
        self.base_url
            .join(path)
            .map_err(|e| ConvertError::ServiceError(format!("invalid endpoint path: {}", e)))
    }
}

/// Extract the error message from an API error body, falling back to the
/// status code when the body is not parseable
async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ApiError>().await {
        Ok(api_error) => api_error.error.message,
        Err(_) => format!("conversion service returned status {}", status),
    }
}

/// The filename from a `Content-Disposition: attachment; filename="..."` header
fn filename_from_content_disposition(value: &str) -> Option<String> {
    let rest = value.split("filename=\"").nth(1)?;
    rest.split('"').next().map(str::to_string)
}

#[async_trait]
impl ConversionService for HttpConversionClient {
    async fn convert(&self, source: &SourceFile) -> std::result::Result<ConvertedArtifact, ConvertError> {
        let url = self.endpoint("/api/v1/convert")?;

        let part = reqwest::multipart::Part::bytes(source.data.as_ref().clone())
            .file_name(source.name.clone())
            .mime_str(&source.content_type)
            .map_err(|e| ConvertError::UnsupportedInput {
                reason: format!("invalid content type '{}': {}", source.content_type, e),
            })?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ConvertError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            tracing::warn!(status = %status, error = %message, "conversion request rejected");

            // 4xx validation rejections are the server's defensive re-check
            // of our own validation; everything else is a service fault.
            return Err(
                if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY
                {
                    ConvertError::UnsupportedInput { reason: message }
                } else {
                    ConvertError::ServiceError(message)
                },
            );
        }

        response
            .json::<ConvertedArtifact>()
            .await
            .map_err(|e| ConvertError::ServiceError(format!("invalid conversion response: {}", e)))
    }

    async fn fetch(&self, id: ArtifactId) -> std::result::Result<RetrievedArtifact, ConvertError> {
        let url = self
            .endpoint(&format!("/api/v1/download/{}", id))
            .map_err(|e| ConvertError::RetrievalError(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ConvertError::RetrievalError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(ConvertError::RetrievalError(message));
        }

        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_content_disposition)
            .unwrap_or_else(|| format!("{}.avif", id));

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(AVIF_CONTENT_TYPE)
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ConvertError::RetrievalError(e.to_string()))?;

        Ok(RetrievedArtifact {
            filename,
            content_type,
            data: Arc::new(bytes.to_vec()),
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source() -> SourceFile {
        SourceFile::new("photo.jpg", "image/jpeg", vec![0xFFu8, 0xD8, 0xFF, 0xE0])
    }

    #[test]
    fn new_rejects_unparseable_base_url() {
        match HttpConversionClient::new("not a url") {
            Err(Error::Config { key, .. }) => {
                assert_eq!(key.as_deref(), Some("endpoint"));
            }
            other => panic!("expected config error, got: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn convert_parses_success_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/convert"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 7,
                "originalName": "photo.jpg",
                "convertedName": "photo.avif",
                "originalSize": 1_000_000,
                "convertedSize": 400_000,
                "savingsPercent": 60,
                "url": "/api/v1/download/7"
            })))
            .mount(&server)
            .await;

        let client = HttpConversionClient::new(&server.uri()).unwrap();
        let artifact = client.convert(&source()).await.unwrap();

        assert_eq!(artifact.id, ArtifactId(7));
        assert_eq!(artifact.converted_name, "photo.avif");
        assert_eq!(artifact.savings_percent, 60);
    }

    #[tokio::test]
    async fn convert_maps_400_to_unsupported_input() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/convert"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": "unsupported_input",
                    "message": "photo.jpg exceeds the 10 MB limit"
                }
            })))
            .mount(&server)
            .await;

        let client = HttpConversionClient::new(&server.uri()).unwrap();

        match client.convert(&source()).await {
            Err(ConvertError::UnsupportedInput { reason }) => {
                assert_eq!(reason, "photo.jpg exceeds the 10 MB limit");
            }
            other => panic!("expected UnsupportedInput, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn convert_maps_500_to_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/convert"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": { "code": "conversion_failed", "message": "encoder crashed" }
            })))
            .mount(&server)
            .await;

        let client = HttpConversionClient::new(&server.uri()).unwrap();

        match client.convert(&source()).await {
            Err(ConvertError::ServiceError(message)) => {
                assert_eq!(message, "encoder crashed");
            }
            other => panic!("expected ServiceError, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn convert_unparseable_error_body_falls_back_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/convert"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = HttpConversionClient::new(&server.uri()).unwrap();

        match client.convert(&source()).await {
            Err(ConvertError::ServiceError(message)) => {
                assert!(message.contains("502"), "message should mention status");
            }
            other => panic!("expected ServiceError, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn convert_unreachable_service_is_service_unavailable() {
        // Bind and drop a listener so the port is very likely refused
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = HttpConversionClient::new(&format!("http://127.0.0.1:{port}")).unwrap();

        match client.convert(&source()).await {
            Err(ConvertError::ServiceUnavailable(_)) => {}
            other => panic!("expected ServiceUnavailable, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn fetch_returns_bytes_and_suggested_filename() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/download/3"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/avif")
                    .insert_header(
                        "content-disposition",
                        "attachment; filename=\"photo.avif\"",
                    )
                    .set_body_bytes(b"avif-bytes".to_vec()),
            )
            .mount(&server)
            .await;

        let client = HttpConversionClient::new(&server.uri()).unwrap();
        let retrieved = client.fetch(ArtifactId(3)).await.unwrap();

        assert_eq!(retrieved.filename, "photo.avif");
        assert_eq!(retrieved.content_type, "image/avif");
        assert_eq!(*retrieved.data, b"avif-bytes".to_vec());
    }

    #[tokio::test]
    async fn fetch_without_content_disposition_falls_back_to_id_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/download/9"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
            .mount(&server)
            .await;

        let client = HttpConversionClient::new(&server.uri()).unwrap();
        let retrieved = client.fetch(ArtifactId(9)).await.unwrap();

        assert_eq!(retrieved.filename, "9.avif");
    }

    #[tokio::test]
    async fn fetch_missing_artifact_is_retrieval_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/download/404"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": "not_found", "message": "artifact 404 not found" }
            })))
            .mount(&server)
            .await;

        let client = HttpConversionClient::new(&server.uri()).unwrap();

        match client.fetch(ArtifactId(404)).await {
            Err(ConvertError::RetrievalError(message)) => {
                assert_eq!(message, "artifact 404 not found");
            }
            other => panic!("expected RetrievalError, got: {:?}", other),
        }
    }

    #[test]
    fn content_disposition_parsing() {
        assert_eq!(
            filename_from_content_disposition("attachment; filename=\"a b.avif\""),
            Some("a b.avif".to_string())
        );
        assert_eq!(filename_from_content_disposition("inline"), None);
    }
}
