//! Core types for avif-batch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Unique identifier for a tracked batch entry
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl EntryId {
    /// Create a new EntryId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for EntryId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<EntryId> for u64 {
    fn from(id: EntryId) -> Self {
        id.0
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EntryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Unique identifier for a converted artifact in the file registry
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct ArtifactId(pub i64);

impl ArtifactId {
    /// Create a new ArtifactId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ArtifactId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ArtifactId> for i64 {
    fn from(id: ArtifactId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ArtifactId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Conversion status of a tracked file
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Added to the batch, waiting for conversion
    Pending,
    /// Currently being converted
    Converting,
    /// Successfully converted
    Converted,
    /// Conversion failed
    Error,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileStatus::Pending => "pending",
            FileStatus::Converting => "converting",
            FileStatus::Converted => "converted",
            FileStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Lifecycle state of a tracked file
///
/// Modeled as a tagged union so a conversion result can only exist on a
/// converted entry and an error message only on a failed one. Transitions are
/// strictly forward: `Pending -> Converting -> Converted | Error`, and the
/// two final states are terminal for the entry (re-adding the same file
/// creates a new, independent entry).
#[derive(Clone, Debug, PartialEq)]
pub enum FileState {
    /// Waiting in the batch, not yet picked up by a conversion run
    Pending,
    /// Conversion request in flight
    Converting,
    /// Conversion succeeded, artifact metadata attached
    Converted(ConvertedArtifact),
    /// Conversion failed with a human-readable message
    Error {
        /// Why the conversion failed
        message: String,
    },
}

impl FileState {
    /// The status discriminant for this state
    pub fn status(&self) -> FileStatus {
        match self {
            FileState::Pending => FileStatus::Pending,
            FileState::Converting => FileStatus::Converting,
            FileState::Converted(_) => FileStatus::Converted,
            FileState::Error { .. } => FileStatus::Error,
        }
    }

    /// The conversion result, if this entry has been converted
    pub fn result(&self) -> Option<&ConvertedArtifact> {
        match self {
            FileState::Converted(artifact) => Some(artifact),
            _ => None,
        }
    }

    /// The error message, if this entry failed
    pub fn error_message(&self) -> Option<&str> {
        match self {
            FileState::Error { message } => Some(message),
            _ => None,
        }
    }
}

/// A user-submitted source file: original bytes plus metadata
#[derive(Clone, Debug, PartialEq)]
pub struct SourceFile {
    /// Original filename as submitted (e.g. "photo.jpg")
    pub name: String,
    /// MIME type reported for the file (e.g. "image/jpeg")
    pub content_type: String,
    /// Raw file bytes, shared with the entry's preview
    pub data: Arc<Vec<u8>>,
}

impl SourceFile {
    /// Create a new source file
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: Arc::new(data),
        }
    }

    /// Size of the file in bytes
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Whether the MIME type or filename extension indicates a JPEG image
    ///
    /// Accepts `image/jpeg` as well as a `.jpg`/`.jpeg` extension
    /// (case-insensitive), so files arriving without a usable MIME type are
    /// still recognized.
    pub fn is_jpeg(&self) -> bool {
        if self.content_type == "image/jpeg" {
            return true;
        }
        let lower = self.name.to_lowercase();
        lower.ends_with(".jpg") || lower.ends_with(".jpeg")
    }

    /// Filename without its final extension
    ///
    /// A name without any dot is returned unchanged, so "photo" still maps
    /// to "photo.avif" rather than ".avif".
    pub fn stem(&self) -> &str {
        file_stem(&self.name)
    }
}

/// Filename without its final extension (the whole name if there is none)
pub(crate) fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Metadata for a successfully converted artifact
///
/// This is also the JSON shape returned by `POST /api/v1/convert` and
/// `GET /api/v1/recent`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedArtifact {
    /// Registry-assigned artifact identifier
    pub id: ArtifactId,
    /// Original filename (e.g. "photo.jpg")
    pub original_name: String,
    /// Converted filename with the target extension (e.g. "photo.avif")
    pub converted_name: String,
    /// Size of the original file in bytes
    pub original_size: u64,
    /// Size of the converted file in bytes
    pub converted_size: u64,
    /// Size reduction as a percentage in [0, 100]
    pub savings_percent: u8,
    /// Retrieval locator for the converted bytes (origin-relative URL)
    pub url: String,
}

/// Size reduction as a percentage, rounded to the nearest integer
///
/// Floored at 0: a converted artifact that is larger than its original
/// reports 0% savings rather than a negative number.
pub fn savings_percent(original_size: u64, converted_size: u64) -> u8 {
    if original_size == 0 {
        return 0;
    }
    let ratio = converted_size as f64 / original_size as f64;
    let percent = ((1.0 - ratio) * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

/// Raw converted bytes retrieved from the conversion service
#[derive(Clone, Debug)]
pub struct RetrievedArtifact {
    /// Suggested filename for the artifact
    pub filename: String,
    /// MIME type of the artifact
    pub content_type: String,
    /// Converted file bytes
    pub data: Arc<Vec<u8>>,
}

/// A file ready to hand to the embedding UI for download
#[derive(Clone, Debug)]
pub struct Delivery {
    /// Filename to save the download as
    pub filename: String,
    /// MIME type of the payload
    pub content_type: String,
    /// Payload bytes
    pub data: Arc<Vec<u8>>,
}

/// Snapshot of one tracked batch entry
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct TrackedFileInfo {
    /// Entry identifier
    pub id: EntryId,
    /// Original filename
    pub name: String,
    /// Size of the source file in bytes
    pub size: u64,
    /// Current conversion status
    pub status: FileStatus,
    /// Conversion result, present only when status is `converted`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ConvertedArtifact>,
    /// Error message, present only when status is `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate statistics over the current batch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BatchStats {
    /// Total number of tracked entries
    pub total: usize,
    /// Entries waiting for conversion
    pub pending: usize,
    /// Entries currently converting
    pub converting: usize,
    /// Successfully converted entries
    pub converted: usize,
    /// Failed entries
    pub failed: usize,
    /// Sum of original sizes over converted entries, in bytes
    pub original_bytes: u64,
    /// Sum of converted sizes over converted entries, in bytes
    pub converted_bytes: u64,
    /// Aggregate size reduction over converted entries, in [0, 100]
    pub savings_percent: u8,
}

/// Outcome of one `convert_all` run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of entries processed in this run
    pub total: usize,
    /// Entries that converted successfully
    pub converted: usize,
    /// Entries that failed
    pub failed: usize,
}

/// Event emitted during the batch conversion lifecycle
///
/// Events carry every user-visible notice the orchestrator produces
/// (rejections, per-file outcomes, batch-level notices), so the embedding
/// UI can render them without polling.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A file passed validation and was added to the batch
    FileAdded {
        /// Entry ID
        id: EntryId,
        /// Original filename
        name: String,
    },

    /// A candidate file was rejected by validation
    FileRejected {
        /// Filename of the rejected candidate
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// An entry was removed from the batch
    FileRemoved {
        /// Entry ID
        id: EntryId,
        /// Original filename
        name: String,
    },

    /// The batch was cleared back to its initial empty state
    Reset,

    /// Conversion of an entry started
    ConversionStarted {
        /// Entry ID
        id: EntryId,
        /// Original filename
        name: String,
    },

    /// An entry was successfully converted
    Converted {
        /// Entry ID
        id: EntryId,
        /// Original filename
        name: String,
        /// Size reduction achieved, in [0, 100]
        savings_percent: u8,
    },

    /// Conversion of an entry failed
    ConversionFailed {
        /// Entry ID
        id: EntryId,
        /// Original filename
        name: String,
        /// Human-readable failure message
        error: String,
    },

    /// `convert_all` was invoked with no pending entries
    NothingToConvert,

    /// A conversion run finished
    BatchComplete {
        /// Entries converted in this run
        converted: usize,
        /// Entries failed in this run
        failed: usize,
    },

    /// A download was requested but no entry is converted yet
    NoConvertedFiles,

    /// A download was requested for an entry that is not converted
    DownloadUnavailable {
        /// Entry ID
        id: EntryId,
        /// Current status of the entry
        status: FileStatus,
    },

    /// A combined archive was built for download
    ArchiveBuilt {
        /// Number of files inside the archive
        entry_count: usize,
        /// Size of the archive in bytes
        archive_size: u64,
    },

    /// Building the combined archive failed
    ArchiveFailed {
        /// Why the archive could not be built
        error: String,
    },
}

/// Timestamp type used for registry records
pub type Timestamp = DateTime<Utc>;
