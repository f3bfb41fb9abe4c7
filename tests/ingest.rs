mod common;

use bytes::Bytes;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use nova_data_service::catalog::{ColumnType, DatasetStatus};
use nova_data_service::database::MetadataStore;
use nova_data_service::error::NovaError;
use nova_data_service::ingest::IngestionCoordinator;

use common::{harness, init_test_logging, test_user, FailingContentStore, FlakyMetadataStore};

#[tokio::test]
async fn ingesting_a_simple_file_records_summary_and_column_metadata() {
    init_test_logging();

    // Given: a two-column CSV with two data rows
    let h = harness();
    let csv = "name,age\nAlice,30\nBob,25\n";

    // When: the file is ingested
    let dataset = h
        .engine
        .upload(test_user(), "people.csv", Bytes::from(csv))
        .await
        .expect("ingestion should succeed");

    // Then: the summary record reflects the file
    assert_eq!(dataset.name, "people.csv");
    assert_eq!(dataset.user_id, test_user());
    assert_eq!(dataset.file_size, csv.len() as i64);
    assert_eq!(dataset.row_count, 2);
    assert_eq!(dataset.column_count, 2);
    assert_eq!(dataset.status, DatasetStatus::Ready);
    assert!(
        dataset.file_path.starts_with(&test_user().to_string()),
        "file path should be namespaced by the uploader: {}",
        dataset.file_path
    );
    assert!(dataset.file_path.ends_with("_people.csv"));

    // And: the raw bytes are durably stored at the recorded path
    let stored = h
        .content
        .get(&dataset.file_path)
        .await
        .expect("stored bytes should be readable");
    assert_eq!(stored, Bytes::from(csv));

    // And: per-column metadata matches the inferred types and samples
    let columns = h
        .metadata
        .list_columns(dataset.id)
        .await
        .expect("columns should be readable");
    assert_eq!(columns.len(), 2);

    assert_eq!(columns[0].column_name, "name");
    assert_eq!(columns[0].position, 0);
    assert_eq!(columns[0].data_type, ColumnType::Text);
    assert_eq!(columns[0].sample_values, vec!["Alice", "Bob"]);

    assert_eq!(columns[1].column_name, "age");
    assert_eq!(columns[1].position, 1);
    assert_eq!(columns[1].data_type, ColumnType::Numeric);
    assert_eq!(columns[1].sample_values, vec!["30", "25"]);
}

#[tokio::test]
async fn blank_lines_are_excluded_from_the_row_count() {
    init_test_logging();

    let h = harness();

    let dataset = h
        .engine
        .upload(test_user(), "gaps.csv", Bytes::from("a,b\n1,2\n\n3,4\n"))
        .await
        .expect("ingestion should succeed");

    assert_eq!(dataset.row_count, 2);
}

#[tokio::test]
async fn date_columns_are_classified_as_date() {
    init_test_logging();

    let h = harness();
    let csv = "day,note\n2024-01-01,first\n2024-02-15,second\n";

    let dataset = h
        .engine
        .upload(test_user(), "days.csv", Bytes::from(csv))
        .await
        .expect("ingestion should succeed");

    let columns = h.metadata.list_columns(dataset.id).await.unwrap();
    assert_eq!(columns[0].data_type, ColumnType::Date);
    assert_eq!(columns[1].data_type, ColumnType::Text);
}

#[tokio::test]
async fn at_most_five_sample_values_are_retained_per_column() {
    init_test_logging();

    let h = harness();
    let csv = "n\n1\n2\n3\n4\n5\n6\n7\n";

    let dataset = h
        .engine
        .upload(test_user(), "numbers.csv", Bytes::from(csv))
        .await
        .expect("ingestion should succeed");

    let columns = h.metadata.list_columns(dataset.id).await.unwrap();
    assert_eq!(columns[0].sample_values, vec!["1", "2", "3", "4", "5"]);
}

#[tokio::test]
async fn duplicate_header_names_keep_distinct_positions() {
    init_test_logging();

    let h = harness();
    let csv = "id,value,id\n1,a,2\n";

    let dataset = h
        .engine
        .upload(test_user(), "dup.csv", Bytes::from(csv))
        .await
        .expect("ingestion should succeed");

    let columns = h.metadata.list_columns(dataset.id).await.unwrap();
    assert_eq!(columns.len(), 3);
    assert_eq!(columns[0].column_name, "id");
    assert_eq!(columns[2].column_name, "id");
    assert_eq!(columns[0].position, 0);
    assert_eq!(columns[2].position, 2);
}

#[tokio::test]
async fn empty_payload_is_rejected_before_any_side_effect() {
    init_test_logging();

    let h = harness();

    let result = h
        .engine
        .upload(test_user(), "empty.csv", Bytes::new())
        .await;

    assert!(matches!(result, Err(NovaError::InvalidInput { .. })));
    assert!(h.metadata.list_datasets(test_user()).await.unwrap().is_empty());
    assert_eq!(h.metadata.column_insert_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn storage_failure_leaves_no_metadata_behind() {
    init_test_logging();

    // Given: a coordinator whose content store always fails
    let metadata = Arc::new(FlakyMetadataStore::new());
    let coordinator =
        IngestionCoordinator::new(Arc::new(FailingContentStore), metadata.clone());

    // When: an otherwise valid file is ingested
    let result = coordinator
        .ingest(test_user(), "doomed.csv", Bytes::from("a,b\n1,2\n"))
        .await;

    // Then: the failure is fatal and nothing was persisted
    assert!(matches!(result, Err(NovaError::StorageWriteFailed { .. })));
    assert!(metadata.list_datasets(test_user()).await.unwrap().is_empty());
    assert_eq!(metadata.column_insert_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn dataset_insert_failure_is_fatal() {
    init_test_logging();

    let h = harness();
    h.metadata.fail_dataset_insert.store(true, Ordering::SeqCst);

    let result = h
        .engine
        .upload(test_user(), "fatal.csv", Bytes::from("a,b\n1,2\n"))
        .await;

    assert!(matches!(result, Err(NovaError::MetadataWriteFailed { .. })));
    assert_eq!(h.metadata.column_insert_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn column_metadata_failure_still_returns_the_dataset() {
    init_test_logging();

    // Given: the column batch insert is going to fail
    let h = harness();
    h.metadata.fail_column_insert.store(true, Ordering::SeqCst);

    // When: a valid file is ingested
    let dataset = h
        .engine
        .upload(test_user(), "partial.csv", Bytes::from("a,b\n1,2\n"))
        .await
        .expect("ingestion should still succeed");

    // Then: the dataset record exists and its metadata set is empty
    let datasets = h.metadata.list_datasets(test_user()).await.unwrap();
    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0].id, dataset.id);
    assert!(h.metadata.list_columns(dataset.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn repeated_uploads_of_the_same_file_create_fresh_datasets() {
    init_test_logging();

    let h = harness();
    let csv = "a\n1\n";

    let first = h
        .engine
        .upload(test_user(), "same.csv", Bytes::from(csv))
        .await
        .unwrap();
    let second = h
        .engine
        .upload(test_user(), "same.csv", Bytes::from(csv))
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(h.metadata.list_datasets(test_user()).await.unwrap().len(), 2);
}
