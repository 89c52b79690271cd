//! Batch conversion orchestrator split into focused submodules.
//!
//! The `BatchConverter` struct and its methods are organized by domain:
//! - [`batch`] - Tracked-file collection management (add/remove/reset)
//! - [`convert`] - Sequential conversion driver
//! - [`download`] - Single, archived, and staggered downloads

mod batch;
mod convert;
mod download;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::error::Result;
use crate::preview::{PreviewHandle, PreviewStore};
use crate::service::ConversionService;
use crate::types::{EntryId, Event, FileState, SourceFile, TrackedFileInfo};
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

/// One entry in the tracked-file collection
///
/// Owned exclusively by the orchestrator; the outside world sees
/// [`TrackedFileInfo`] snapshots. The preview handle is released on every
/// exit path: explicit removal, batch reset, or the entry being dropped.
pub(crate) struct TrackedFile {
    pub(crate) id: EntryId,
    pub(crate) source: Arc<SourceFile>,
    pub(crate) state: FileState,
    pub(crate) preview: PreviewHandle,
}

impl TrackedFile {
    pub(crate) fn info(&self) -> TrackedFileInfo {
        TrackedFileInfo {
            id: self.id,
            name: self.source.name.clone(),
            size: self.source.size(),
            status: self.state.status(),
            result: self.state.result().cloned(),
            error: self.state.error_message().map(str::to_string),
        }
    }
}

/// Batch conversion orchestrator (cloneable - all fields are Arc-wrapped)
///
/// Owns the ordered collection of tracked files and drives them through
/// `pending -> converting -> converted | error`, strictly one conversion in
/// flight at a time. All user-visible notices are emitted as [`Event`]s on a
/// broadcast channel.
#[derive(Clone)]
pub struct BatchConverter {
    /// Ordered tracked-file collection; insertion order is display order and
    /// conversion order
    pub(crate) entries: Arc<tokio::sync::Mutex<Vec<TrackedFile>>>,
    /// Next entry ID counter
    pub(crate) next_entry_id: Arc<AtomicU64>,
    /// Preview bytes for the entries currently in the batch
    pub(crate) previews: PreviewStore,
    /// Serializes conversion runs so no two batches interleave
    pub(crate) convert_gate: Arc<tokio::sync::Mutex<()>>,
    /// The conversion capability (trait object for pluggable implementations)
    pub(crate) service: Arc<dyn ConversionService>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
}

impl BatchConverter {
    /// Create a new BatchConverter using the given conversion service
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the configuration fails
    /// validation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use avif_batch::{BatchConverter, Config, FileRegistry, LocalConversionService};
    ///
    /// # fn example() -> avif_batch::Result<()> {
    /// let config = Config::default();
    /// let registry = FileRegistry::new();
    /// let service = Arc::new(LocalConversionService::new(&config, registry));
    /// let converter = BatchConverter::new(config, service)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: Config, service: Arc<dyn ConversionService>) -> Result<Self> {
        config.validate()?;

        // Buffer size of 1000 events lets slow subscribers lag without
        // stalling the conversion pipeline.
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        Ok(Self {
            entries: Arc::new(tokio::sync::Mutex::new(Vec::new())),
            next_entry_id: Arc::new(AtomicU64::new(0)),
            previews: PreviewStore::new(),
            convert_gate: Arc::new(tokio::sync::Mutex::new(())),
            service,
            config: Arc::new(config),
            event_tx,
        })
    }

    /// Subscribe to batch events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all
    /// events independently; a subscriber that falls more than 1000 events
    /// behind receives a `RecvError::Lagged` error.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// The preview store holding renderable previews for current entries
    pub fn previews(&self) -> &PreviewStore {
        &self.previews
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// conversion continues whether or not anyone is listening.
    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine
        self.event_tx.send(event).ok();
    }
}
