//! In-memory file registry for converted artifacts
//!
//! The registry is the collaborator that assigns identifiers to converted
//! artifacts and serves them back by id. It is deliberately non-persistent
//! (records live for the lifetime of the process) and is constructed
//! explicitly at startup and injected wherever needed - there is no module
//! level singleton. The contract is save / get_by_id / list_recent; records
//! are never updated or deleted.

use crate::types::{ArtifactId, Timestamp};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

/// A converted artifact record held by the registry
#[derive(Clone, Debug)]
pub struct StoredImage {
    /// Registry-assigned identifier
    pub id: ArtifactId,
    /// Original filename as uploaded
    pub original_name: String,
    /// Converted filename with the target extension
    pub converted_name: String,
    /// Size of the original file in bytes
    pub original_size: u64,
    /// Size of the converted file in bytes
    pub converted_size: u64,
    /// Converted file bytes
    pub data: Arc<Vec<u8>>,
    /// When the conversion happened
    pub converted_at: Timestamp,
}

/// A converted artifact about to be saved (no id yet)
#[derive(Clone, Debug)]
pub struct NewImage {
    /// Original filename as uploaded
    pub original_name: String,
    /// Converted filename with the target extension
    pub converted_name: String,
    /// Size of the original file in bytes
    pub original_size: u64,
    /// Size of the converted file in bytes
    pub converted_size: u64,
    /// Converted file bytes
    pub data: Arc<Vec<u8>>,
}

/// In-memory registry of converted artifacts
///
/// Cloneable; all clones share the same underlying map. Identifiers are
/// assigned from an auto-incrementing counter starting at 1.
#[derive(Clone, Default)]
pub struct FileRegistry {
    images: Arc<RwLock<HashMap<ArtifactId, StoredImage>>>,
    next_id: Arc<AtomicI64>,
}

impl FileRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            images: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Save a converted artifact, assigning it the next identifier
    pub async fn save(&self, image: NewImage) -> StoredImage {
        let id = ArtifactId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let stored = StoredImage {
            id,
            original_name: image.original_name,
            converted_name: image.converted_name,
            original_size: image.original_size,
            converted_size: image.converted_size,
            data: image.data,
            converted_at: chrono::Utc::now(),
        };

        let mut images = self.images.write().await;
        images.insert(id, stored.clone());

        tracing::debug!(
            artifact_id = %id,
            converted_name = %stored.converted_name,
            converted_size = stored.converted_size,
            "artifact saved to registry"
        );

        stored
    }

    /// Look up an artifact by identifier
    pub async fn get_by_id(&self, id: ArtifactId) -> Option<StoredImage> {
        let images = self.images.read().await;
        images.get(&id).cloned()
    }

    /// The most recently converted artifacts, newest first
    ///
    /// Ordered by conversion time with the identifier as tie-break, so the
    /// order is stable even for conversions in the same instant.
    pub async fn list_recent(&self, limit: usize) -> Vec<StoredImage> {
        let images = self.images.read().await;
        let mut all: Vec<StoredImage> = images.values().cloned().collect();
        all.sort_by(|a, b| {
            b.converted_at
                .cmp(&a.converted_at)
                .then(b.id.cmp(&a.id))
        });
        all.truncate(limit);
        all
    }

    /// Number of stored artifacts
    pub async fn len(&self) -> usize {
        self.images.read().await.len()
    }

    /// Whether the registry holds no artifacts
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
