//! Shared test helpers: a scriptable conversion service and fixture files.

use crate::config::Config;
use crate::converter::BatchConverter;
use crate::error::ConvertError;
use crate::service::ConversionService;
use crate::types::{
    ArtifactId, ConvertedArtifact, RetrievedArtifact, SourceFile, savings_percent,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted outcome for one source filename
enum MockOutcome {
    /// Succeed with this converted size
    Succeed { converted_size: u64 },
    /// Fail with this message
    Fail { message: String },
}

/// A scriptable ConversionService for orchestrator tests
///
/// Outcomes are keyed by source filename; unscripted files succeed with a
/// converted size of half the original. The service records call order and
/// tracks the maximum number of concurrent conversions it ever saw, which
/// the sequential-invariant tests assert on.
pub(crate) struct MockConversionService {
    outcomes: Mutex<HashMap<String, MockOutcome>>,
    calls: Mutex<Vec<String>>,
    artifacts: Mutex<HashMap<ArtifactId, RetrievedArtifact>>,
    next_artifact_id: AtomicI64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fail_fetches: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl MockConversionService {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            artifacts: Mutex::new(HashMap::new()),
            next_artifact_id: AtomicI64::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            fail_fetches: AtomicBool::new(false),
            delay: Mutex::new(None),
        })
    }

    /// Script a successful conversion with the given converted size
    pub(crate) fn succeed_with(&self, name: &str, converted_size: u64) {
        self.outcomes.lock().unwrap().insert(
            name.to_string(),
            MockOutcome::Succeed { converted_size },
        );
    }

    /// Script a failure with the given message
    pub(crate) fn fail_with(&self, name: &str, message: &str) {
        self.outcomes.lock().unwrap().insert(
            name.to_string(),
            MockOutcome::Fail {
                message: message.to_string(),
            },
        );
    }

    /// Make every subsequent fetch fail with a retrieval error
    pub(crate) fn fail_fetches(&self) {
        self.fail_fetches.store(true, Ordering::SeqCst);
    }

    /// Hold each conversion open for this long before resolving
    pub(crate) fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Source filenames in the order they were converted
    pub(crate) fn call_order(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// The maximum number of conversions that were ever in flight at once
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConversionService for MockConversionService {
    async fn convert(&self, source: &SourceFile) -> Result<ConvertedArtifact, ConvertError> {
        self.calls.lock().unwrap().push(source.name.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        // Keep the request open long enough for an accidental second
        // in-flight conversion to show up in max_in_flight.
        tokio::time::sleep(delay.unwrap_or(Duration::from_millis(2))).await;

        let outcome = {
            let outcomes = self.outcomes.lock().unwrap();
            match outcomes.get(&source.name) {
                Some(MockOutcome::Fail { message }) => Err(message.clone()),
                Some(MockOutcome::Succeed { converted_size }) => Ok(*converted_size),
                None => Ok(source.size() / 2),
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let converted_size = match outcome {
            Ok(size) => size,
            Err(message) => return Err(ConvertError::ServiceError(message)),
        };

        let id = ArtifactId(self.next_artifact_id.fetch_add(1, Ordering::SeqCst) + 1);
        let converted_name = format!("{}.avif", source.stem());

        self.artifacts.lock().unwrap().insert(
            id,
            RetrievedArtifact {
                filename: converted_name.clone(),
                content_type: "image/avif".to_string(),
                data: Arc::new(vec![0u8; converted_size as usize]),
            },
        );

        Ok(ConvertedArtifact {
            id,
            original_name: source.name.clone(),
            converted_name,
            original_size: source.size(),
            converted_size,
            savings_percent: savings_percent(source.size(), converted_size),
            url: format!("/api/v1/download/{}", id),
        })
    }

    async fn fetch(&self, id: ArtifactId) -> Result<RetrievedArtifact, ConvertError> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(ConvertError::RetrievalError(format!(
                "artifact {} unreadable",
                id
            )));
        }
        self.artifacts
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| ConvertError::RetrievalError(format!("artifact {} not found", id)))
    }
}

/// A pending JPEG candidate of the given size
pub(crate) fn jpeg_candidate(name: &str, size: usize) -> SourceFile {
    SourceFile::new(name, "image/jpeg", vec![0u8; size])
}

/// A small valid JPEG generated in memory, for tests that exercise the real
/// codec
pub(crate) fn tiny_jpeg() -> Vec<u8> {
    let img = image::RgbImage::from_fn(16, 16, |x, y| {
        image::Rgb([(x * 12) as u8, (y * 12) as u8, 96])
    });
    let mut out = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 85);
    encoder
        .encode(img.as_raw(), 16, 16, image::ColorType::Rgb8)
        .unwrap();
    out
}

/// Helper to create a test BatchConverter driven by a mock service.
/// Returns the converter and the mock for scripting and inspection.
pub(crate) fn create_test_converter() -> (BatchConverter, Arc<MockConversionService>) {
    let mut config = Config::default();
    // Keep staggered-download tests fast
    config.delivery.download_stagger_ms = 1;

    let service = MockConversionService::new();
    let converter = BatchConverter::new(config, service.clone()).unwrap();
    (converter, service)
}
