//! Conversion service boundary
//!
//! The batch orchestrator never talks to a codec or a registry directly; it
//! goes through the [`ConversionService`] trait. Two implementations ship
//! with the crate:
//! - [`LocalConversionService`] - converts in-process (codec + registry)
//! - [`HttpConversionClient`] - forwards to a remote instance's REST API
//!
//! Tests substitute their own implementation to script outcomes.

use crate::archive::TARGET_EXTENSION;
use crate::codec::AvifCodec;
use crate::config::Config;
use crate::error::ConvertError;
use crate::registry::{FileRegistry, NewImage, StoredImage};
use crate::types::{
    ArtifactId, ConvertedArtifact, RetrievedArtifact, SourceFile, savings_percent,
};
use async_trait::async_trait;
use std::sync::Arc;

mod http;

pub use http::HttpConversionClient;

/// MIME type of converted artifacts
pub const AVIF_CONTENT_TYPE: &str = "image/avif";

/// The external conversion capability, as seen by the batch orchestrator
///
/// One call converts exactly one file; a second call retrieves a converted
/// artifact's bytes by identifier. Implementations normalize every failure
/// into a [`ConvertError`] with a human-readable message. Failures are never
/// retried automatically - the user re-submits a failed file.
#[async_trait]
pub trait ConversionService: Send + Sync {
    /// Convert one source file, returning the artifact metadata
    async fn convert(&self, source: &SourceFile) -> Result<ConvertedArtifact, ConvertError>;

    /// Retrieve the raw bytes of a previously converted artifact
    async fn fetch(&self, id: ArtifactId) -> Result<RetrievedArtifact, ConvertError>;
}

/// The API response shape for a registry record
///
/// Computes the savings percentage and the retrieval locator the same way
/// for every surface that renders a stored artifact.
pub fn artifact_response(stored: &StoredImage) -> ConvertedArtifact {
    ConvertedArtifact {
        id: stored.id,
        original_name: stored.original_name.clone(),
        converted_name: stored.converted_name.clone(),
        original_size: stored.original_size,
        converted_size: stored.converted_size,
        savings_percent: savings_percent(stored.original_size, stored.converted_size),
        url: format!("/api/v1/download/{}", stored.id),
    }
}

/// In-process conversion service: codec plus registry
///
/// This is what the REST API serves, and what an embedding application uses
/// when it wants conversion without any network hop.
#[derive(Clone)]
pub struct LocalConversionService {
    codec: AvifCodec,
    registry: FileRegistry,
    max_file_size: u64,
}

impl LocalConversionService {
    /// Create a service converting with `config`'s encoder settings and
    /// storing artifacts in `registry`
    pub fn new(config: &Config, registry: FileRegistry) -> Self {
        Self {
            codec: AvifCodec::new(&config.encoding),
            registry,
            max_file_size: config.max_file_size(),
        }
    }

    /// The registry this service stores artifacts in
    pub fn registry(&self) -> &FileRegistry {
        &self.registry
    }

    // Validation is the caller's job; this re-check is the service's own
    // contract and catches callers that skipped it.
    fn check_input(&self, source: &SourceFile) -> Result<(), ConvertError> {
        if !source.is_jpeg() {
            return Err(ConvertError::UnsupportedInput {
                reason: format!("{} is not a JPG image", source.name),
            });
        }
        if source.size() > self.max_file_size {
            return Err(ConvertError::UnsupportedInput {
                reason: format!(
                    "{} exceeds the {} MB limit",
                    source.name,
                    self.max_file_size / (1024 * 1024)
                ),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ConversionService for LocalConversionService {
    async fn convert(&self, source: &SourceFile) -> Result<ConvertedArtifact, ConvertError> {
        self.check_input(source)?;

        let original_size = source.size();
        let avif = self
            .codec
            .encode(source.data.as_ref().clone())
            .await
            .map_err(|e| ConvertError::ServiceError(e.to_string()))?;

        let stored = self
            .registry
            .save(NewImage {
                original_name: source.name.clone(),
                converted_name: format!("{}.{}", source.stem(), TARGET_EXTENSION),
                original_size,
                converted_size: avif.len() as u64,
                data: Arc::new(avif),
            })
            .await;

        tracing::info!(
            artifact_id = %stored.id,
            original_name = %stored.original_name,
            original_size = stored.original_size,
            converted_size = stored.converted_size,
            "converted to AVIF"
        );

        Ok(artifact_response(&stored))
    }

    async fn fetch(&self, id: ArtifactId) -> Result<RetrievedArtifact, ConvertError> {
        match self.registry.get_by_id(id).await {
            Some(stored) => Ok(RetrievedArtifact {
                filename: stored.converted_name,
                content_type: AVIF_CONTENT_TYPE.to_string(),
                data: stored.data,
            }),
            None => Err(ConvertError::RetrievalError(format!(
                "artifact {} not found",
                id
            ))),
        }
    }
}
