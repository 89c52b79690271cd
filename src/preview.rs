//! Revocable preview handles for source files
//!
//! Every tracked file owns a renderable preview of its source bytes for the
//! duration of its life in the batch. The preview is held in a shared store
//! and referenced through a [`PreviewHandle`], which releases the stored
//! bytes exactly once - either explicitly when the entry is removed or the
//! batch is reset, or implicitly when the handle is dropped. This mirrors an
//! object-URL lifecycle: create on add, revoke on every exit path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Identifier for a registered preview
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PreviewId(u64);

impl std::fmt::Display for PreviewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "preview-{}", self.0)
    }
}

#[derive(Default)]
struct StoreInner {
    entries: Mutex<HashMap<PreviewId, Arc<Vec<u8>>>>,
    released: AtomicU64,
}

/// In-memory store of preview bytes, shared between the orchestrator and
/// the handles it gives out
#[derive(Clone, Default)]
pub struct PreviewStore {
    inner: Arc<StoreInner>,
    next_id: Arc<AtomicU64>,
}

impl PreviewStore {
    /// Create an empty preview store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register preview bytes and return the owning handle
    pub fn register(&self, data: Arc<Vec<u8>>) -> PreviewHandle {
        let id = PreviewId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut entries) = self.inner.entries.lock() {
            entries.insert(id, data);
        }
        PreviewHandle {
            id,
            store: Arc::downgrade(&self.inner),
            released: false,
        }
    }

    /// Look up the preview bytes for a handle that has not been released
    pub fn get(&self, id: PreviewId) -> Option<Arc<Vec<u8>>> {
        self.inner
            .entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(&id).cloned())
    }

    /// Number of live (unreleased) previews
    pub fn len(&self) -> usize {
        self.inner.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the store holds no live previews
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of previews released since the store was created
    ///
    /// Each preview counts at most once, however many times its handle is
    /// asked to release.
    pub fn released_count(&self) -> u64 {
        self.inner.released.load(Ordering::Relaxed)
    }
}

/// Exclusively-owned, revocable reference to a stored preview
///
/// The handle releases its store entry exactly once. Calling
/// [`release`](PreviewHandle::release) again is a no-op, and dropping an
/// already-released handle does nothing.
#[derive(Debug)]
pub struct PreviewHandle {
    id: PreviewId,
    store: Weak<StoreInner>,
    released: bool,
}

impl PreviewHandle {
    /// The identifier of the stored preview
    pub fn id(&self) -> PreviewId {
        self.id
    }

    /// Release the stored preview bytes
    ///
    /// Idempotent: only the first call removes the entry and counts as a
    /// release.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Some(inner) = self.store.upgrade() {
            let removed = inner
                .entries
                .lock()
                .map(|mut entries| entries.remove(&self.id).is_some())
                .unwrap_or(false);
            if removed {
                inner.released.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.release();
    }
}
