//! Tracked-file collection management - add, remove, reset, snapshots.

use crate::error::{BatchError, Error, Result};
use crate::types::{
    BatchStats, EntryId, Event, FileState, FileStatus, SourceFile, TrackedFileInfo,
    savings_percent,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use super::{BatchConverter, TrackedFile};

impl BatchConverter {
    /// Add candidate files to the batch
    ///
    /// Each candidate is validated: it must look like a JPEG (MIME type or
    /// `.jpg`/`.jpeg` extension) and must not exceed the configured size
    /// ceiling. Rejected candidates produce a [`Event::FileRejected`] notice
    /// per file and are dropped; accepted candidates become new `pending`
    /// entries appended to the end of the collection, so insertion order is
    /// preserved for both display and conversion.
    ///
    /// Re-adding a file that is already tracked creates a new, independent
    /// entry - there is no duplicate detection.
    ///
    /// # Returns
    ///
    /// The number of candidates actually added.
    pub async fn add_files(&self, candidates: Vec<SourceFile>) -> usize {
        let mut accepted = Vec::new();

        for candidate in candidates {
            if let Err(reason) = self.validate_candidate(&candidate) {
                tracing::warn!(name = %candidate.name, reason = %reason, "candidate rejected");
                self.emit_event(Event::FileRejected {
                    name: candidate.name.clone(),
                    reason,
                });
                continue;
            }

            let id = EntryId(self.next_entry_id.fetch_add(1, Ordering::Relaxed) + 1);
            let preview = self.previews.register(candidate.data.clone());
            let source = Arc::new(candidate);

            tracing::info!(
                entry_id = %id,
                name = %source.name,
                size = source.size(),
                "file added to batch"
            );

            accepted.push(TrackedFile {
                id,
                source,
                state: FileState::Pending,
                preview,
            });
        }

        let added = accepted.len();
        if added > 0 {
            let mut entries = self.entries.lock().await;
            for entry in &accepted {
                self.emit_event(Event::FileAdded {
                    id: entry.id,
                    name: entry.source.name.clone(),
                });
            }
            entries.extend(accepted);
        }

        added
    }

    /// Remove an entry from the batch, at any status
    ///
    /// Releases the entry's preview. If the entry is mid-conversion, its
    /// eventual result is discarded when the conversion completes.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::EntryNotFound`] if no entry has this ID.
    pub async fn remove_file(&self, id: EntryId) -> Result<()> {
        let mut entry = {
            let mut entries = self.entries.lock().await;
            let index = entries
                .iter()
                .position(|e| e.id == id)
                .ok_or(Error::Batch(BatchError::EntryNotFound { id }))?;
            entries.remove(index)
        };

        entry.preview.release();

        tracing::info!(entry_id = %id, name = %entry.source.name, "entry removed from batch");
        self.emit_event(Event::FileRemoved {
            id,
            name: entry.source.name.clone(),
        });

        Ok(())
    }

    /// Clear the batch back to its initial empty state
    ///
    /// Releases every preview and drops every entry, whatever its status.
    pub async fn reset_all(&self) {
        let drained: Vec<TrackedFile> = {
            let mut entries = self.entries.lock().await;
            entries.drain(..).collect()
        };

        let count = drained.len();
        for mut entry in drained {
            entry.preview.release();
        }

        tracing::info!(cleared = count, "batch reset");
        self.emit_event(Event::Reset);
    }

    /// Snapshot of all tracked entries, in insertion order
    pub async fn files(&self) -> Vec<TrackedFileInfo> {
        let entries = self.entries.lock().await;
        entries.iter().map(TrackedFile::info).collect()
    }

    /// Aggregate statistics over the current batch
    ///
    /// The byte totals and aggregate savings cover converted entries only.
    pub async fn stats(&self) -> BatchStats {
        let entries = self.entries.lock().await;

        let mut stats = BatchStats {
            total: entries.len(),
            ..BatchStats::default()
        };

        for entry in entries.iter() {
            match entry.state.status() {
                FileStatus::Pending => stats.pending += 1,
                FileStatus::Converting => stats.converting += 1,
                FileStatus::Converted => stats.converted += 1,
                FileStatus::Error => stats.failed += 1,
            }
            if let Some(artifact) = entry.state.result() {
                stats.original_bytes += artifact.original_size;
                stats.converted_bytes += artifact.converted_size;
            }
        }

        stats.savings_percent = savings_percent(stats.original_bytes, stats.converted_bytes);
        stats
    }

    /// Number of tracked entries
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the batch is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn validate_candidate(&self, candidate: &SourceFile) -> std::result::Result<(), String> {
        if !candidate.is_jpeg() {
            return Err(format!("{} is not a JPG image", candidate.name));
        }

        let max = self.config.max_file_size();
        if candidate.size() > max {
            return Err(format!(
                "{} exceeds the {} MB limit",
                candidate.name,
                max / (1024 * 1024)
            ));
        }

        Ok(())
    }
}
