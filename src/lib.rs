//! # avif-batch
//!
//! Embeddable backend library for batch JPEG to AVIF conversion.
//!
//! ## Design Philosophy
//!
//! avif-batch is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Composable** - The conversion service is a trait; run it in-process
//!   or point the same orchestrator at a remote instance's REST API
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use avif_batch::{BatchConverter, Config, FileRegistry, LocalConversionService, SourceFile};
//!
//! #[tokio::main]
//! async fn main() -> avif_batch::Result<()> {
//!     let config = Config::default();
//!     let registry = FileRegistry::new();
//!     let service = Arc::new(LocalConversionService::new(&config, registry));
//!     let converter = BatchConverter::new(config, service)?;
//!
//!     // Subscribe to events
//!     let mut events = converter.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Queue files and convert them one at a time, in order
//!     let jpeg = std::fs::read("photo.jpg")?;
//!     converter
//!         .add_files(vec![SourceFile::new("photo.jpg", "image/jpeg", jpeg)])
//!         .await;
//!     converter.convert_all().await?;
//!
//!     // Bundle everything converted into one archive
//!     let archive = converter.download_all().await?;
//!     std::fs::write(&archive.filename, archive.data.as_ref())?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Combined archive building
pub mod archive;
/// JPEG to AVIF transcoding
pub mod codec;
/// Configuration types
pub mod config;
/// Batch conversion orchestrator (decomposed into focused submodules)
pub mod converter;
/// Error types
pub mod error;
/// Revocable preview handles
pub mod preview;
/// In-memory artifact registry
pub mod registry;
/// Conversion service implementations
pub mod service;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use codec::AvifCodec;
pub use config::{ApiConfig, Config, DeliveryConfig, EncodingConfig, LimitsConfig};
pub use converter::BatchConverter;
pub use error::{
    ApiError, ArchiveError, BatchError, CodecError, ConvertError, Error, ErrorDetail, Result,
    ToHttpStatus,
};
pub use preview::{PreviewHandle, PreviewId, PreviewStore};
pub use registry::{FileRegistry, NewImage, StoredImage};
pub use service::{
    AVIF_CONTENT_TYPE, ConversionService, HttpConversionClient, LocalConversionService,
};
pub use types::{
    ArtifactId, BatchStats, BatchSummary, ConvertedArtifact, Delivery, EntryId, Event, FileState,
    FileStatus, RetrievedArtifact, SourceFile, TrackedFileInfo, savings_percent,
};

/// Helper function to run the API server with graceful signal handling.
///
/// Waits for a termination signal and then aborts the server task.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use avif_batch::{Config, FileRegistry, LocalConversionService, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> avif_batch::Result<()> {
///     let config = Arc::new(Config::default());
///     let registry = FileRegistry::new();
///     let service = Arc::new(LocalConversionService::new(&config, registry));
///
///     let server = avif_batch::api::spawn_api_server(service, config);
///     run_with_shutdown(server).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(mut server: tokio::task::JoinHandle<Result<()>>) -> Result<()> {
    tokio::select! {
        result = &mut server => match result {
            Ok(outcome) => outcome,
            Err(e) => Err(Error::ApiServerError(format!("API server task failed: {}", e))),
        },
        _ = wait_for_signal() => {
            server.abort();
            Ok(())
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
