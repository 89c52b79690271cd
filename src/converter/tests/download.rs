use super::*;
use crate::error::{BatchError, Error};
use std::collections::HashSet;
use std::io::Cursor;

async fn converted_pair() -> (crate::BatchConverter, Vec<crate::types::EntryId>) {
    let (converter, service) = create_test_converter();
    service.succeed_with("beach.jpg", 400);
    service.succeed_with("forest.jpg", 300);

    converter
        .add_files(vec![
            jpeg_candidate("beach.jpg", 1000),
            jpeg_candidate("forest.jpg", 1000),
        ])
        .await;
    converter.convert_all().await.unwrap();

    let ids = converter.files().await.into_iter().map(|f| f.id).collect();
    (converter, ids)
}

// --- download_one() ---

#[tokio::test]
async fn download_one_delivers_converted_artifact() {
    let (converter, ids) = converted_pair().await;

    let delivery = converter.download_one(ids[0]).await.unwrap();

    assert_eq!(delivery.filename, "beach.avif");
    assert_eq!(delivery.content_type, "image/avif");
    assert_eq!(delivery.data.len(), 400);
}

#[tokio::test]
async fn download_one_on_pending_entry_fails_reported() {
    let (converter, _service) = create_test_converter();
    converter.add_files(vec![jpeg_candidate("photo.jpg", 64)]).await;
    let id = converter.files().await[0].id;

    let mut events = converter.subscribe();
    let result = converter.download_one(id).await;

    match result {
        Err(Error::Batch(BatchError::NotConverted { status, .. })) => {
            assert_eq!(status, FileStatus::Pending);
        }
        other => panic!("expected NotConverted, got: {:?}", other.map(|_| ())),
    }

    assert!(
        drain_events(&mut events)
            .iter()
            .any(|e| matches!(e, Event::DownloadUnavailable { .. })),
        "the refusal must be reported"
    );
}

#[tokio::test]
async fn download_one_unknown_entry_is_not_found() {
    let (converter, _service) = create_test_converter();

    let result = converter.download_one(crate::types::EntryId(7)).await;
    assert!(matches!(
        result,
        Err(Error::Batch(BatchError::EntryNotFound { .. }))
    ));
}

#[tokio::test]
async fn download_one_surfaces_retrieval_failure() {
    let (converter, service) = create_test_converter();
    converter.add_files(vec![jpeg_candidate("photo.jpg", 1000)]).await;
    converter.convert_all().await.unwrap();
    let id = converter.files().await[0].id;

    // Conversion succeeded, but the artifact can no longer be fetched
    service.fail_fetches();

    let result = converter.download_one(id).await;
    assert!(matches!(
        result,
        Err(Error::Convert(crate::error::ConvertError::RetrievalError(_)))
    ));

    // The entry itself stays converted
    assert_eq!(converter.files().await[0].status, FileStatus::Converted);
}

// --- download_all() (archive path) ---

#[tokio::test]
async fn download_all_builds_archive_with_swapped_extensions() {
    let (converter, _ids) = converted_pair().await;

    let delivery = converter.download_all().await.unwrap();

    assert_eq!(delivery.filename, "converted_images.zip");
    assert_eq!(delivery.content_type, "application/zip");

    let mut zip = zip::ZipArchive::new(Cursor::new(delivery.data.as_ref().clone())).unwrap();
    assert_eq!(zip.len(), 2, "archive must contain exactly the converted entries");

    let names: Vec<String> = (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(names, vec!["beach.avif", "forest.avif"]);
}

#[tokio::test]
async fn download_all_skips_unconverted_entries() {
    let (converter, service) = create_test_converter();
    service.fail_with("bad.jpg", "boom");

    converter
        .add_files(vec![
            jpeg_candidate("good.jpg", 1000),
            jpeg_candidate("bad.jpg", 1000),
        ])
        .await;
    converter.convert_all().await.unwrap();

    let delivery = converter.download_all().await.unwrap();

    let zip = zip::ZipArchive::new(Cursor::new(delivery.data.as_ref().clone())).unwrap();
    assert_eq!(zip.len(), 1, "failed entries must not appear in the archive");
}

#[tokio::test]
async fn download_all_with_nothing_converted_fails_reported() {
    let (converter, _service) = create_test_converter();
    converter.add_files(vec![jpeg_candidate("photo.jpg", 64)]).await;

    let mut events = converter.subscribe();
    let result = converter.download_all().await;

    assert!(matches!(
        result,
        Err(Error::Batch(BatchError::NoConvertedFiles))
    ));
    assert!(
        drain_events(&mut events)
            .iter()
            .any(|e| matches!(e, Event::NoConvertedFiles)),
        "the refusal must be reported"
    );
}

#[tokio::test]
async fn download_all_fails_whole_archive_on_unreadable_artifact() {
    let (converter, service) = create_test_converter();
    converter
        .add_files(vec![
            jpeg_candidate("a.jpg", 1000),
            jpeg_candidate("b.jpg", 1000),
        ])
        .await;
    converter.convert_all().await.unwrap();

    service.fail_fetches();

    let mut events = converter.subscribe();
    let result = converter.download_all().await;

    assert!(
        matches!(
            result,
            Err(Error::Archive(crate::error::ArchiveError::ArtifactUnreadable { .. }))
        ),
        "a partial archive must never be delivered"
    );
    assert!(
        drain_events(&mut events)
            .iter()
            .any(|e| matches!(e, Event::ArchiveFailed { .. })),
        "the archive failure must surface as a single batch-level notice"
    );
}

#[tokio::test]
async fn download_all_dedupes_duplicate_names_in_archive() {
    let (converter, _service) = create_test_converter();

    // Same source name twice: two independent entries
    converter
        .add_files(vec![
            jpeg_candidate("photo.jpg", 1000),
            jpeg_candidate("photo.jpg", 1000),
        ])
        .await;
    converter.convert_all().await.unwrap();

    let delivery = converter.download_all().await.unwrap();
    let mut zip = zip::ZipArchive::new(Cursor::new(delivery.data.as_ref().clone())).unwrap();

    let names: HashSet<String> = (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(names.len(), 2, "in-container names must be distinct");
    assert!(names.contains("photo.avif"));
    assert!(names.contains("photo_2.avif"));
}

#[tokio::test]
async fn archive_delivery_round_trips_through_disk() {
    let (converter, _ids) = converted_pair().await;

    let delivery = converter.download_all().await.unwrap();

    // Write the archive the way an embedding application would, then make
    // sure what landed on disk is a readable container
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(&delivery.filename);
    tokio::fs::write(&path, delivery.data.as_ref()).await.unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let zip = zip::ZipArchive::new(file).unwrap();
    assert_eq!(zip.len(), 2);
}

// --- download_all_staggered() ---

#[tokio::test]
async fn staggered_download_delivers_each_converted_entry() {
    let (converter, _ids) = converted_pair().await;

    let deliveries = converter.download_all_staggered().await.unwrap();

    assert_eq!(deliveries.len(), 2);
    assert_eq!(deliveries[0].filename, "beach.avif");
    assert_eq!(deliveries[1].filename, "forest.avif");
}

#[tokio::test]
async fn staggered_download_with_nothing_converted_fails() {
    let (converter, _service) = create_test_converter();

    let result = converter.download_all_staggered().await;
    assert!(matches!(
        result,
        Err(Error::Batch(BatchError::NoConvertedFiles))
    ));
}
