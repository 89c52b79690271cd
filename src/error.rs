//! Error types for avif-batch
//!
//! This module provides comprehensive error handling for the library, including:
//! - Domain-specific error types (Convert, Batch, Archive, Codec)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use crate::types::{EntryId, FileStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for avif-batch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for avif-batch
///
/// This is the primary error type used throughout the library. Each variant
/// includes contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "encoding.quality")
        key: Option<String>,
    },

    /// Conversion-related error
    #[error("conversion error: {0}")]
    Convert(#[from] ConvertError),

    /// Batch orchestration error
    #[error("batch error: {0}")]
    Batch(#[from] BatchError),

    /// Archive building error
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Image codec error
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Conversion failures, normalized across service implementations
///
/// One conversion request produces exactly one of these on failure. None of
/// them are retried automatically; a failed entry stays failed until the
/// user re-submits the file.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Input is not a JPEG or exceeds the size ceiling
    ///
    /// Validation catches this before a conversion is attempted, but the
    /// service re-checks defensively.
    #[error("unsupported input: {reason}")]
    UnsupportedInput {
        /// Why the input was rejected
        reason: String,
    },

    /// The conversion service could not be reached
    #[error("conversion service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The conversion service reported a non-success outcome
    #[error("conversion failed: {0}")]
    ServiceError(String),

    /// Conversion succeeded but the converted artifact could not be fetched
    #[error("failed to retrieve converted artifact: {0}")]
    RetrievalError(String),
}

/// Batch orchestration errors
#[derive(Debug, Error)]
pub enum BatchError {
    /// Entry not found in the tracked collection
    #[error("entry {id} not found")]
    EntryNotFound {
        /// The entry ID that was not found
        id: EntryId,
    },

    /// Download requested for an entry that has not been converted
    #[error("entry {id} is {status}, not converted")]
    NotConverted {
        /// The entry the download was requested for
        id: EntryId,
        /// The entry's current status
        status: FileStatus,
    },

    /// Download-all requested while no entry is converted
    #[error("no converted files to download")]
    NoConvertedFiles,
}

/// Archive building errors
///
/// An archive either builds completely or fails as a whole; converted
/// entries remain available for individual download either way.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// A converted artifact could not be read while building the archive
    #[error("artifact {name} is unreadable: {reason}")]
    ArtifactUnreadable {
        /// In-container name of the artifact
        name: String,
        /// Why the artifact could not be read
        reason: String,
    },

    /// Writing the archive container failed
    #[error("failed to build archive: {0}")]
    Build(String),
}

/// Image codec errors
#[derive(Debug, Error)]
pub enum CodecError {
    /// The source bytes could not be decoded as a JPEG image
    #[error("failed to decode JPEG: {0}")]
    Decode(String),

    /// AVIF encoding failed
    #[error("failed to encode AVIF: {0}")]
    Encode(String),
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
/// It follows a standard format with machine-readable error codes,
/// human-readable messages, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "artifact 123 not found",
///     "details": {
///       "artifact_id": 123
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "unsupported_input")
    ///
    /// Clients can use this for programmatic error handling.
    pub code: String,

    /// Human-readable error message
    ///
    /// This is suitable for displaying to end users.
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    /// Create a "service unavailable" error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new("service_unavailable", message)
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::Convert(ConvertError::UnsupportedInput { .. }) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,
            Error::Batch(BatchError::EntryNotFound { .. }) => 404,

            // 409 Conflict - Entry not in the state the operation needs
            Error::Batch(BatchError::NotConverted { .. }) => 409,
            Error::Batch(BatchError::NoConvertedFiles) => 409,

            // 422 Unprocessable Entity - input accepted but undecodable
            Error::Codec(CodecError::Decode(_)) => 422,

            // 500 Internal Server Error - Server-side issues
            Error::Convert(ConvertError::ServiceError(_)) => 500,
            Error::Archive(_) => 500,
            Error::Codec(CodecError::Encode(_)) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::Convert(ConvertError::RetrievalError(_)) => 502,
            Error::Network(_) => 502,

            // 503 Service Unavailable
            Error::Convert(ConvertError::ServiceUnavailable(_)) => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Convert(e) => match e {
                ConvertError::UnsupportedInput { .. } => "unsupported_input",
                ConvertError::ServiceUnavailable(_) => "service_unavailable",
                ConvertError::ServiceError(_) => "conversion_failed",
                ConvertError::RetrievalError(_) => "retrieval_failed",
            },
            Error::Batch(e) => match e {
                BatchError::EntryNotFound { .. } => "entry_not_found",
                BatchError::NotConverted { .. } => "not_converted",
                BatchError::NoConvertedFiles => "no_converted_files",
            },
            Error::Archive(e) => match e {
                ArchiveError::ArtifactUnreadable { .. } => "artifact_unreadable",
                ArchiveError::Build(_) => "archive_failed",
            },
            Error::Codec(e) => match e {
                CodecError::Decode(_) => "decode_failed",
                CodecError::Encode(_) => "encode_failed",
            },
            Error::NotFound(_) => "not_found",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::Batch(BatchError::EntryNotFound { id }) => Some(serde_json::json!({
                "entry_id": id,
            })),
            Error::Batch(BatchError::NotConverted { id, status }) => Some(serde_json::json!({
                "entry_id": id,
                "status": status,
            })),
            Error::Archive(ArchiveError::ArtifactUnreadable { name, .. }) => {
                Some(serde_json::json!({
                    "name": name,
                }))
            }
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArtifactId;

    // -----------------------------------------------------------------------
    // Helpers: construct every Error variant for status/error_code tests
    // -----------------------------------------------------------------------

    /// Returns a vec of (Error, expected_status_code, expected_error_code) for
    /// every reachable match arm in ToHttpStatus.
    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        vec![
            (
                Error::Config {
                    message: "bad value".into(),
                    key: Some("encoding.quality".into()),
                },
                400,
                "config_error",
            ),
            (Error::NotFound("artifact 99".into()), 404, "not_found"),
            (
                Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
                500,
                "io_error",
            ),
            (
                Error::ApiServerError("bind failed".into()),
                500,
                "api_server_error",
            ),
            (Error::Other("unknown".into()), 500, "internal_error"),
            // ConvertError variants
            (
                Error::Convert(ConvertError::UnsupportedInput {
                    reason: "cat.png is not a JPG image".into(),
                }),
                400,
                "unsupported_input",
            ),
            (
                Error::Convert(ConvertError::ServiceUnavailable("connection refused".into())),
                503,
                "service_unavailable",
            ),
            (
                Error::Convert(ConvertError::ServiceError("encoder crashed".into())),
                500,
                "conversion_failed",
            ),
            (
                Error::Convert(ConvertError::RetrievalError("artifact 7 missing".into())),
                502,
                "retrieval_failed",
            ),
            // BatchError variants
            (
                Error::Batch(BatchError::EntryNotFound { id: EntryId(42) }),
                404,
                "entry_not_found",
            ),
            (
                Error::Batch(BatchError::NotConverted {
                    id: EntryId(42),
                    status: FileStatus::Pending,
                }),
                409,
                "not_converted",
            ),
            (
                Error::Batch(BatchError::NoConvertedFiles),
                409,
                "no_converted_files",
            ),
            // ArchiveError variants
            (
                Error::Archive(ArchiveError::ArtifactUnreadable {
                    name: "photo.avif".into(),
                    reason: "artifact 3 missing".into(),
                }),
                500,
                "artifact_unreadable",
            ),
            (
                Error::Archive(ArchiveError::Build("zip write failed".into())),
                500,
                "archive_failed",
            ),
            // CodecError variants
            (
                Error::Codec(CodecError::Decode("not a JPEG".into())),
                422,
                "decode_failed",
            ),
            (
                Error::Codec(CodecError::Encode("out of memory".into())),
                500,
                "encode_failed",
            ),
        ]
    }

    // -----------------------------------------------------------------------
    // 1. Every Error variant -> correct HTTP status code
    // -----------------------------------------------------------------------

    #[test]
    fn every_variant_maps_to_expected_status_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let actual_status = error.status_code();
            assert_eq!(
                actual_status, expected_status,
                "Error variant with error_code={expected_code} returned status {actual_status}, expected {expected_status}"
            );
        }
    }

    // -----------------------------------------------------------------------
    // 2. Every Error variant -> correct machine-readable error code
    // -----------------------------------------------------------------------

    #[test]
    fn every_variant_maps_to_expected_error_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let actual_code = error.error_code();
            assert_eq!(
                actual_code, expected_code,
                "Error variant with expected status={expected_status} returned error_code={actual_code}, expected {expected_code}"
            );
        }
    }

    // -----------------------------------------------------------------------
    // Targeted status code tests for boundary categories to catch regressions
    // if someone moves a variant between match arms.
    // -----------------------------------------------------------------------

    #[test]
    fn unsupported_input_is_400_not_422() {
        let err = Error::Convert(ConvertError::UnsupportedInput {
            reason: "too large".into(),
        });
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn entry_not_found_is_404() {
        let err = Error::Batch(BatchError::EntryNotFound { id: EntryId(1) });
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn not_converted_is_409_conflict() {
        let err = Error::Batch(BatchError::NotConverted {
            id: EntryId(1),
            status: FileStatus::Converting,
        });
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn service_unavailable_is_503() {
        let err = Error::Convert(ConvertError::ServiceUnavailable("down".into()));
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn retrieval_error_is_502_bad_gateway() {
        let err = Error::Convert(ConvertError::RetrievalError("gone".into()));
        assert_eq!(err.status_code(), 502);
    }

    #[test]
    fn decode_failure_is_422_unprocessable() {
        let err = Error::Codec(CodecError::Decode("truncated".into()));
        assert_eq!(err.status_code(), 422);
    }

    // -----------------------------------------------------------------------
    // 3. Error -> ApiError preserves structured details
    // -----------------------------------------------------------------------

    #[test]
    fn api_error_from_entry_not_found_has_entry_id() {
        let err = Error::Batch(BatchError::EntryNotFound { id: EntryId(42) });
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "entry_not_found");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["entry_id"], 42);
    }

    #[test]
    fn api_error_from_not_converted_has_id_and_status() {
        let err = Error::Batch(BatchError::NotConverted {
            id: EntryId(7),
            status: FileStatus::Pending,
        });
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "not_converted");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["entry_id"], 7);
        assert_eq!(details["status"], "pending");
    }

    #[test]
    fn api_error_from_artifact_unreadable_has_name() {
        let err = Error::Archive(ArchiveError::ArtifactUnreadable {
            name: "photo.avif".into(),
            reason: "missing".into(),
        });
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "artifact_unreadable");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["name"], "photo.avif");
    }

    #[test]
    fn api_error_from_config_with_key_has_key() {
        let err = Error::Config {
            message: "quality out of range".into(),
            key: Some("encoding.quality".into()),
        };
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "config_error");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["key"], "encoding.quality");
    }

    // -----------------------------------------------------------------------
    // 4. Error -> ApiError produces None details for context-free variants
    // -----------------------------------------------------------------------

    #[test]
    fn api_error_from_context_free_variants_has_no_details() {
        let variants: Vec<Error> = vec![
            Error::NotFound("artifact 9".into()),
            Error::Other("something went wrong".into()),
            Error::Convert(ConvertError::ServiceError("encoder crashed".into())),
            Error::Convert(ConvertError::ServiceUnavailable("refused".into())),
            Error::Codec(CodecError::Decode("bad".into())),
            Error::Archive(ArchiveError::Build("zip failed".into())),
            Error::Config {
                message: "bad".into(),
                key: None,
            },
        ];

        for err in variants {
            let code = err.error_code().to_string();
            let api: ApiError = err.into();
            assert!(
                api.error.details.is_none(),
                "variant with code={code} should not have structured details"
            );
        }
    }

    // -----------------------------------------------------------------------
    // 5. ApiError factory methods produce correct codes and messages
    // -----------------------------------------------------------------------

    #[test]
    fn api_error_not_found_factory() {
        let api = ApiError::not_found("artifact 123");

        assert_eq!(api.error.code, "not_found");
        assert_eq!(api.error.message, "artifact 123 not found");
        assert!(api.error.details.is_none());
    }

    #[test]
    fn api_error_validation_factory() {
        let api = ApiError::validation("file field is required");

        assert_eq!(api.error.code, "validation_error");
        assert_eq!(api.error.message, "file field is required");
    }

    #[test]
    fn api_error_internal_factory() {
        let api = ApiError::internal("unexpected failure");

        assert_eq!(api.error.code, "internal_error");
        assert_eq!(api.error.message, "unexpected failure");
    }

    #[test]
    fn api_error_service_unavailable_factory() {
        let api = ApiError::service_unavailable("encoder overloaded");

        assert_eq!(api.error.code, "service_unavailable");
        assert_eq!(api.error.message, "encoder overloaded");
    }

    // -----------------------------------------------------------------------
    // 6. JSON serialization behavior
    // -----------------------------------------------------------------------

    #[test]
    fn api_error_without_details_omits_details_in_json() {
        let api = ApiError::new("test_code", "test message");

        let json_str = serde_json::to_string(&api).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json_str).unwrap();

        assert_eq!(parsed["error"]["code"], "test_code");
        assert_eq!(parsed["error"]["message"], "test message");
        // skip_serializing_if = "Option::is_none" should omit the field entirely
        assert!(
            parsed["error"].get("details").is_none(),
            "details field should be omitted from JSON when None"
        );
    }

    #[test]
    fn api_error_round_trips_through_json() {
        let original = ApiError::with_details(
            "not_found",
            "artifact 42 not found",
            serde_json::json!({"artifact_id": ArtifactId(42)}),
        );

        let json_str = serde_json::to_string(&original).unwrap();
        let deserialized: ApiError = serde_json::from_str(&json_str).unwrap();

        assert_eq!(deserialized.error.code, original.error.code);
        assert_eq!(deserialized.error.message, original.error.message);
        assert_eq!(deserialized.error.details, original.error.details);
    }

    #[test]
    fn api_error_message_matches_error_display() {
        let err = Error::Batch(BatchError::NotConverted {
            id: EntryId(5),
            status: FileStatus::Error,
        });
        let display_msg = err.to_string();
        let api: ApiError = err.into();

        assert_eq!(
            api.error.message, display_msg,
            "ApiError message should match the Error's Display output"
        );
    }
}
