//! Sequential conversion driver.

use crate::types::{BatchSummary, EntryId, Event, FileState, SourceFile};
use std::sync::Arc;

use super::BatchConverter;

/// What happened to one entry after its conversion call returned
enum Applied {
    Converted { savings_percent: u8 },
    Failed { message: String },
    Discarded,
}

impl BatchConverter {
    /// Convert every pending entry, strictly sequentially in insertion order
    ///
    /// With no pending entries this is a no-op that emits
    /// [`Event::NothingToConvert`]. Otherwise entries are processed one at a
    /// time: an entry moves to `converting` only when the driver reaches it,
    /// so at most one entry is ever `converting` - the one whose request is
    /// in flight. This caps peak memory and network usage at a single
    /// conversion and keeps progress reporting exact.
    ///
    /// Each entry ends up `converted` or `error` independently; one entry's
    /// failure does not abort or skip the remaining entries, and this method
    /// itself only fails on infrastructure problems, never on a per-file
    /// conversion failure.
    ///
    /// Concurrent calls are serialized: a second `convert_all` waits for the
    /// running batch and then picks up whatever is pending by then. Entries
    /// removed while their conversion is in flight have their late result
    /// discarded.
    pub async fn convert_all(&self) -> crate::error::Result<BatchSummary> {
        // One batch at a time
        let _gate = self.convert_gate.lock().await;

        let queue: Vec<(EntryId, Arc<SourceFile>)> = {
            let entries = self.entries.lock().await;
            entries
                .iter()
                .filter(|e| matches!(e.state, FileState::Pending))
                .map(|e| (e.id, Arc::clone(&e.source)))
                .collect()
        };

        if queue.is_empty() {
            tracing::info!("convert_all called with no pending entries");
            self.emit_event(Event::NothingToConvert);
            return Ok(BatchSummary::default());
        }

        let total = queue.len();
        tracing::info!(pending = total, "starting batch conversion");

        let mut converted = 0;
        let mut failed = 0;

        for (id, source) in queue {
            if !self.mark_converting(id).await {
                tracing::debug!(entry_id = %id, "entry removed before conversion started, skipping");
                continue;
            }

            self.emit_event(Event::ConversionStarted {
                id,
                name: source.name.clone(),
            });

            let outcome = self.service.convert(&source).await;

            match self.apply_outcome(id, outcome).await {
                Applied::Converted { savings_percent } => {
                    converted += 1;
                    tracing::info!(
                        entry_id = %id,
                        name = %source.name,
                        savings_percent,
                        "entry converted"
                    );
                    self.emit_event(Event::Converted {
                        id,
                        name: source.name.clone(),
                        savings_percent,
                    });
                }
                Applied::Failed { message } => {
                    failed += 1;
                    tracing::warn!(entry_id = %id, name = %source.name, error = %message, "entry failed");
                    self.emit_event(Event::ConversionFailed {
                        id,
                        name: source.name.clone(),
                        error: message,
                    });
                }
                Applied::Discarded => {
                    tracing::debug!(entry_id = %id, "entry removed mid-conversion, result discarded");
                }
            }
        }

        tracing::info!(total, converted, failed, "batch conversion finished");
        self.emit_event(Event::BatchComplete { converted, failed });

        Ok(BatchSummary {
            total,
            converted,
            failed,
        })
    }

    /// Transition an entry from `pending` to `converting`
    ///
    /// Returns false when the entry is gone (removed since the queue was
    /// snapshotted) or is no longer pending.
    async fn mark_converting(&self, id: EntryId) -> bool {
        let mut entries = self.entries.lock().await;
        match entries.iter_mut().find(|e| e.id == id) {
            Some(entry) if matches!(entry.state, FileState::Pending) => {
                entry.state = FileState::Converting;
                true
            }
            _ => false,
        }
    }

    /// Apply a conversion outcome to an entry, unless the entry was removed
    /// while the request was in flight
    async fn apply_outcome(
        &self,
        id: EntryId,
        outcome: Result<crate::types::ConvertedArtifact, crate::error::ConvertError>,
    ) -> Applied {
        let mut entries = self.entries.lock().await;

        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            return Applied::Discarded;
        };
        if !matches!(entry.state, FileState::Converting) {
            // Only a converting entry can accept a result; anything else
            // means the collection changed under us.
            return Applied::Discarded;
        }

        match outcome {
            Ok(artifact) => {
                let savings_percent = artifact.savings_percent;
                entry.state = FileState::Converted(artifact);
                Applied::Converted { savings_percent }
            }
            Err(e) => {
                let message = e.to_string();
                entry.state = FileState::Error {
                    message: message.clone(),
                };
                Applied::Failed { message }
            }
        }
    }
}
