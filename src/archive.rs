//! Combined archive building for multi-file downloads
//!
//! Packages converted artifacts into a single ZIP so the user gets one
//! download instead of N. Entries are named after their source file with the
//! extension swapped to `.avif`; name collisions are resolved
//! deterministically by suffixing the entry's batch position. The archive is
//! built in memory and either completes as a whole or fails as a whole - a
//! partially written container is never handed out.

use crate::error::ArchiveError;
use crate::types::file_stem;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::sync::Arc;
use zip::write::FileOptions;

/// Extension given to converted files inside the archive
pub const TARGET_EXTENSION: &str = "avif";

/// One converted artifact to be placed in the archive
#[derive(Clone, Debug)]
pub struct ArchiveEntry {
    /// Original source filename (the in-container name derives from this)
    pub original_name: String,
    /// Converted file bytes
    pub data: Arc<Vec<u8>>,
}

/// The in-container name for a source file
///
/// Swaps the source extension for [`TARGET_EXTENSION`]. If that name is
/// already taken by an earlier entry, the entry's 1-based batch position is
/// appended (`photo.avif`, `photo_2.avif`), counting further up in the
/// pathological case where the suffixed name is taken too.
pub fn container_name(original_name: &str, index: usize, taken: &HashSet<String>) -> String {
    let stem = file_stem(original_name);
    let candidate = format!("{}.{}", stem, TARGET_EXTENSION);
    if !taken.contains(&candidate) {
        return candidate;
    }

    let mut suffix = index + 1;
    loop {
        let candidate = format!("{}_{}.{}", stem, suffix, TARGET_EXTENSION);
        if !taken.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Build a ZIP archive containing all entries, in order
///
/// # Errors
///
/// Returns [`ArchiveError::Build`] if writing the container fails; nothing
/// is returned in that case, so the caller can never deliver a corrupt
/// archive.
pub fn build_archive(entries: &[ArchiveEntry]) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    // AVIF payloads are already compressed; deflating them again wastes time
    // for no size win.
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let mut taken: HashSet<String> = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        let name = container_name(&entry.original_name, index, &taken);

        writer
            .start_file(name.as_str(), options)
            .map_err(|e| ArchiveError::Build(format!("failed to start entry {}: {}", name, e)))?;
        writer
            .write_all(&entry.data)
            .map_err(|e| ArchiveError::Build(format!("failed to write entry {}: {}", name, e)))?;

        taken.insert(name);
    }

    let cursor = writer
        .finish()
        .map_err(|e| ArchiveError::Build(format!("failed to finish archive: {}", e)))?;

    tracing::debug!(
        entry_count = entries.len(),
        archive_size = cursor.get_ref().len(),
        "archive built"
    );

    Ok(cursor.into_inner())
}
