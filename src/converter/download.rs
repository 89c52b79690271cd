//! Download delivery - single files, a combined archive, or staggered singles.

use crate::archive::{ArchiveEntry, build_archive};
use crate::error::{ArchiveError, BatchError, Error, Result};
use crate::types::{ArtifactId, Delivery, EntryId, Event};
use std::sync::Arc;

use super::BatchConverter;

/// MIME type for the combined archive download
const ZIP_CONTENT_TYPE: &str = "application/zip";

impl BatchConverter {
    /// Deliver one converted entry
    ///
    /// Valid only for entries with status `converted`; anything else is
    /// reported via [`Event::DownloadUnavailable`] and fails with
    /// [`BatchError::NotConverted`]. The artifact bytes are fetched through
    /// the conversion service's retrieval contract.
    pub async fn download_one(&self, id: EntryId) -> Result<Delivery> {
        let lookup = {
            let entries = self.entries.lock().await;
            let entry = entries
                .iter()
                .find(|e| e.id == id)
                .ok_or(Error::Batch(BatchError::EntryNotFound { id }))?;

            match entry.state.result() {
                Some(artifact) => Ok(artifact.clone()),
                None => Err(entry.state.status()),
            }
        };

        let artifact = match lookup {
            Ok(artifact) => artifact,
            Err(status) => {
                tracing::warn!(entry_id = %id, %status, "download requested for non-converted entry");
                self.emit_event(Event::DownloadUnavailable { id, status });
                return Err(Error::Batch(BatchError::NotConverted { id, status }));
            }
        };

        let retrieved = self.service.fetch(artifact.id).await.map_err(|e| {
            tracing::warn!(entry_id = %id, error = %e, "artifact retrieval failed");
            Error::Convert(e)
        })?;

        Ok(Delivery {
            filename: retrieved.filename,
            content_type: retrieved.content_type,
            data: retrieved.data,
        })
    }

    /// Deliver all converted entries as one combined archive
    ///
    /// Requires at least one converted entry. The archive either builds
    /// completely or the whole operation fails - a single unreadable
    /// artifact aborts with [`ArchiveError::ArtifactUnreadable`] and nothing
    /// is delivered, while the converted entries stay available for
    /// individual download.
    pub async fn download_all(&self) -> Result<Delivery> {
        let converted = self.converted_artifacts().await;

        if converted.is_empty() {
            tracing::info!("download_all called with no converted entries");
            self.emit_event(Event::NoConvertedFiles);
            return Err(Error::Batch(BatchError::NoConvertedFiles));
        }

        let mut archive_entries = Vec::with_capacity(converted.len());
        for (name, artifact_id) in &converted {
            match self.service.fetch(*artifact_id).await {
                Ok(retrieved) => archive_entries.push(ArchiveEntry {
                    original_name: name.clone(),
                    data: retrieved.data,
                }),
                Err(e) => {
                    let error = ArchiveError::ArtifactUnreadable {
                        name: name.clone(),
                        reason: e.to_string(),
                    };
                    tracing::warn!(error = %error, "archive build aborted");
                    self.emit_event(Event::ArchiveFailed {
                        error: error.to_string(),
                    });
                    return Err(Error::Archive(error));
                }
            }
        }

        let bytes = match build_archive(&archive_entries) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "archive build failed");
                self.emit_event(Event::ArchiveFailed {
                    error: e.to_string(),
                });
                return Err(Error::Archive(e));
            }
        };

        self.emit_event(Event::ArchiveBuilt {
            entry_count: archive_entries.len(),
            archive_size: bytes.len() as u64,
        });

        Ok(Delivery {
            filename: self.config.archive_name().to_string(),
            content_type: ZIP_CONTENT_TYPE.to_string(),
            data: Arc::new(bytes),
        })
    }

    /// Deliver every converted entry individually, spaced by the configured
    /// stagger delay
    ///
    /// The non-archive variant of download-all: browser hosts suppress rapid
    /// consecutive downloads, so deliveries are spaced out (default 500 ms).
    /// A failing entry is reported and skipped; the remaining entries still
    /// deliver.
    pub async fn download_all_staggered(&self) -> Result<Vec<Delivery>> {
        let converted = self.converted_artifacts().await;

        if converted.is_empty() {
            self.emit_event(Event::NoConvertedFiles);
            return Err(Error::Batch(BatchError::NoConvertedFiles));
        }

        let stagger = self.config.download_stagger();
        let ids: Vec<EntryId> = {
            let entries = self.entries.lock().await;
            entries
                .iter()
                .filter(|e| e.state.result().is_some())
                .map(|e| e.id)
                .collect()
        };

        let mut deliveries = Vec::with_capacity(ids.len());
        for (index, id) in ids.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(stagger).await;
            }
            match self.download_one(*id).await {
                Ok(delivery) => deliveries.push(delivery),
                Err(e) => {
                    tracing::warn!(entry_id = %id, error = %e, "skipping entry in staggered download");
                }
            }
        }

        Ok(deliveries)
    }

    /// (source name, artifact id) for every converted entry, in order
    async fn converted_artifacts(&self) -> Vec<(String, ArtifactId)> {
        let entries = self.entries.lock().await;
        entries
            .iter()
            .filter_map(|e| {
                e.state
                    .result()
                    .map(|artifact| (e.source.name.clone(), artifact.id))
            })
            .collect()
    }
}
