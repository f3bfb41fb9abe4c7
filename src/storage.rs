use async_trait::async_trait;
use bytes::Bytes;
use object_store::{
    aws::AmazonS3Builder, gcp::GoogleCloudStorageBuilder, memory::InMemory,
    path::Path as ObjectPath, Attribute, Attributes, ObjectStore, PutOptions, PutPayload,
};
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::error::NovaError;

/// Durable store for raw uploaded file bytes.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn put(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<(), NovaError>;
}

/// Content store backed by an `object_store` implementation, selected by
/// the scheme of the configured storage URL.
pub struct ObjectStoreContent {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreContent {
    pub fn from_url(storage_url: &str) -> Result<Self, NovaError> {
        let url = Url::parse(storage_url).map_err(|e| NovaError::ConfigError {
            message: format!("Invalid storage URL '{}': {}", storage_url, e),
        })?;

        let store: Arc<dyn ObjectStore> = match url.scheme() {
            "gs" => {
                let bucket = url.host_str().ok_or_else(|| NovaError::ConfigError {
                    message: "Invalid GCS URL: missing bucket".to_string(),
                })?;
                create_gcs_store(bucket)?
            }
            "s3" => {
                let bucket = url.host_str().ok_or_else(|| NovaError::ConfigError {
                    message: "Invalid S3 URL: missing bucket".to_string(),
                })?;

                info!("Creating S3 client for bucket: {}", bucket);
                let s3_store = AmazonS3Builder::new()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(|e| NovaError::ConfigError {
                        message: format!("Failed to create S3 client: {}", e),
                    })?;

                Arc::new(s3_store)
            }
            "memory" => Arc::new(InMemory::new()),
            scheme => {
                return Err(NovaError::ConfigError {
                    message: format!("Unsupported storage scheme: {}", scheme),
                });
            }
        };

        Ok(Self { store })
    }

    /// In-memory store for development and tests.
    pub fn memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
        }
    }

    pub async fn get(&self, path: &str) -> Result<Bytes, NovaError> {
        let location = ObjectPath::from(path);
        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| NovaError::IoError {
                message: format!("Failed to read {}: {}", path, e),
            })?;

        result.bytes().await.map_err(|e| NovaError::IoError {
            message: format!("Failed to read {}: {}", path, e),
        })
    }
}

#[async_trait]
impl ContentStore for ObjectStoreContent {
    async fn put(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<(), NovaError> {
        let location = ObjectPath::from(path);

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let mut options = PutOptions::default();
        options.attributes = attributes;

        self.store
            .put_opts(&location, PutPayload::from(bytes), options)
            .await
            .map_err(|e| NovaError::StorageWriteFailed {
                message: format!("Failed to write {}: {}", path, e),
            })?;

        Ok(())
    }
}

fn create_gcs_store(bucket_name: &str) -> Result<Arc<dyn ObjectStore>, NovaError> {
    info!("Creating GCS client for bucket: {}", bucket_name);

    let mut builder = GoogleCloudStorageBuilder::new().with_bucket_name(bucket_name);

    if let Ok(service_account_path) = std::env::var("GOOGLE_APPLICATION_CREDENTIALS") {
        builder = builder.with_service_account_path(service_account_path);
    }

    let store = builder.build().map_err(|e| NovaError::ConfigError {
        message: format!(
            "Failed to create GCS client for bucket '{}': {}",
            bucket_name, e
        ),
    })?;

    Ok(Arc::new(store))
}
