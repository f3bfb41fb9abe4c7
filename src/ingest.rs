use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::{ColumnMetadata, Dataset, DatasetStatus};
use crate::database::MetadataStore;
use crate::error::NovaError;
use crate::infer::infer_column_type;
use crate::storage::ContentStore;
use crate::tabulate::tabulate;

/// At most this many sample values are retained and examined per column.
pub const SAMPLE_LIMIT: usize = 5;

/// Upload size ceiling, enforced at the receiving boundary rather than
/// inside the pipeline.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Orchestrates the upload-to-metadata pipeline: persist raw bytes,
/// tabulate, record the dataset summary, then sample and classify each
/// column. Single pass, no retries, no partial-completion recovery.
pub struct IngestionCoordinator {
    content: Arc<dyn ContentStore>,
    metadata: Arc<dyn MetadataStore>,
}

impl IngestionCoordinator {
    pub fn new(content: Arc<dyn ContentStore>, metadata: Arc<dyn MetadataStore>) -> Self {
        Self { content, metadata }
    }

    /// Ingests one uploaded file on behalf of `user_id`.
    ///
    /// A storage failure aborts before any metadata exists; a dataset-insert
    /// failure leaves the stored bytes orphaned (accepted, never reconciled
    /// here); a column-metadata failure is logged and swallowed, so the
    /// dataset record still reaches the caller.
    pub async fn ingest(
        &self,
        user_id: Uuid,
        file_name: &str,
        bytes: Bytes,
    ) -> Result<Dataset, NovaError> {
        if bytes.is_empty() {
            return Err(NovaError::InvalidInput {
                message: "No file provided".to_string(),
            });
        }

        let file_path = format!(
            "{}/{}_{}",
            user_id,
            Utc::now().timestamp_millis(),
            file_name
        );
        self.content
            .put(&file_path, bytes.clone(), "text/csv")
            .await?;

        let text = String::from_utf8_lossy(&bytes);
        let table = tabulate(&text);

        let now = Utc::now();
        let dataset = Dataset {
            id: Uuid::new_v4(),
            user_id,
            name: file_name.to_string(),
            file_path,
            file_size: bytes.len() as i64,
            row_count: table.row_count() as i32,
            column_count: table.column_count() as i32,
            status: DatasetStatus::Ready,
            created_at: now,
            updated_at: now,
        };
        self.metadata.insert_dataset(&dataset).await?;

        let columns: Vec<ColumnMetadata> = table
            .headers()
            .iter()
            .enumerate()
            .map(|(position, column_name)| {
                let sample_values = table.column_samples(position, SAMPLE_LIMIT);
                let data_type = infer_column_type(&sample_values);
                ColumnMetadata {
                    dataset_id: dataset.id,
                    position: position as i32,
                    column_name: column_name.clone(),
                    data_type,
                    sample_values,
                }
            })
            .collect();

        if let Err(e) = self.metadata.insert_columns(&columns).await {
            warn!(
                "Column metadata insert failed for dataset {}: {}",
                dataset.id, e
            );
        }

        info!(
            "Ingested dataset {} ({} rows, {} columns)",
            dataset.id, dataset.row_count, dataset.column_count
        );

        Ok(dataset)
    }
}
