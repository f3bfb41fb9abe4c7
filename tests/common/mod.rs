#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use uuid::Uuid;

use nova_data_service::assistant::CompletionGateway;
use nova_data_service::auth::StaticResolver;
use nova_data_service::catalog::{ColumnMetadata, Dataset, Insight};
use nova_data_service::database::{MemoryMetadataStore, MetadataStore};
use nova_data_service::engine::NovaEngine;
use nova_data_service::error::NovaError;
use nova_data_service::storage::{ContentStore, ObjectStoreContent};

pub const TEST_TOKEN: &str = "test-token";

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

pub fn test_user() -> Uuid {
    Uuid::from_u128(0x4e4f56415f544553545f55534552)
}

/// Content store whose writes always fail, for exercising the
/// storage-failure path.
pub struct FailingContentStore;

#[async_trait]
impl ContentStore for FailingContentStore {
    async fn put(&self, path: &str, _bytes: Bytes, _content_type: &str) -> Result<(), NovaError> {
        Err(NovaError::StorageWriteFailed {
            message: format!("injected failure writing {}", path),
        })
    }
}

/// Metadata store wrapping the in-memory one with per-call failure
/// injection and call counters. `fail_next_insight_insert` arms a single
/// failure and clears itself, so later inserts in the same run succeed.
pub struct FlakyMetadataStore {
    inner: MemoryMetadataStore,
    pub fail_dataset_insert: AtomicBool,
    pub fail_column_insert: AtomicBool,
    pub fail_next_insight_insert: AtomicBool,
    pub column_insert_calls: AtomicUsize,
    pub insight_insert_calls: AtomicUsize,
}

impl FlakyMetadataStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryMetadataStore::new(),
            fail_dataset_insert: AtomicBool::new(false),
            fail_column_insert: AtomicBool::new(false),
            fail_next_insight_insert: AtomicBool::new(false),
            column_insert_calls: AtomicUsize::new(0),
            insight_insert_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MetadataStore for FlakyMetadataStore {
    async fn insert_dataset(&self, dataset: &Dataset) -> Result<(), NovaError> {
        if self.fail_dataset_insert.load(Ordering::SeqCst) {
            return Err(NovaError::MetadataWriteFailed {
                message: "injected dataset insert failure".to_string(),
            });
        }
        self.inner.insert_dataset(dataset).await
    }

    async fn insert_columns(&self, columns: &[ColumnMetadata]) -> Result<(), NovaError> {
        self.column_insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_column_insert.load(Ordering::SeqCst) {
            return Err(NovaError::ColumnMetadataWriteFailed {
                message: "injected column insert failure".to_string(),
            });
        }
        self.inner.insert_columns(columns).await
    }

    async fn get_dataset(&self, dataset_id: Uuid) -> Result<Option<Dataset>, NovaError> {
        self.inner.get_dataset(dataset_id).await
    }

    async fn list_datasets(&self, user_id: Uuid) -> Result<Vec<Dataset>, NovaError> {
        self.inner.list_datasets(user_id).await
    }

    async fn list_columns(&self, dataset_id: Uuid) -> Result<Vec<ColumnMetadata>, NovaError> {
        self.inner.list_columns(dataset_id).await
    }

    async fn insert_insight(&self, insight: &Insight) -> Result<(), NovaError> {
        self.insight_insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_insight_insert.swap(false, Ordering::SeqCst) {
            return Err(NovaError::MetadataWriteFailed {
                message: "injected insight insert failure".to_string(),
            });
        }
        self.inner.insert_insight(insight).await
    }

    async fn list_insights(&self, dataset_id: Uuid) -> Result<Vec<Insight>, NovaError> {
        self.inner.list_insights(dataset_id).await
    }
}

/// Completion gateway answering with a fixed reply, recording every
/// prompt it was handed.
pub struct ScriptedGateway {
    reply: String,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedGateway {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn last_user_message(&self) -> Option<String> {
        let calls = self.calls.lock().expect("gateway call log poisoned");
        calls.last().map(|(_, user)| user.clone())
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, NovaError> {
        let mut calls = self.calls.lock().expect("gateway call log poisoned");
        calls.push((system_prompt.to_string(), user_message.to_string()));
        Ok(self.reply.clone())
    }
}

/// Fully wired engine over in-memory collaborators, with handles kept for
/// assertions.
pub struct TestHarness {
    pub engine: Arc<NovaEngine>,
    pub content: Arc<ObjectStoreContent>,
    pub metadata: Arc<FlakyMetadataStore>,
    pub gateway: Arc<ScriptedGateway>,
}

pub fn harness() -> TestHarness {
    harness_with_reply("Your data looks healthy overall.")
}

pub fn harness_with_reply(reply: &str) -> TestHarness {
    let content = Arc::new(ObjectStoreContent::memory());
    let metadata = Arc::new(FlakyMetadataStore::new());
    let gateway = Arc::new(ScriptedGateway::new(reply));
    let resolver = Arc::new(StaticResolver::new(TEST_TOKEN, test_user()));

    let engine = Arc::new(NovaEngine::new(
        content.clone(),
        metadata.clone(),
        resolver,
        gateway.clone(),
    ));

    TestHarness {
        engine,
        content,
        metadata,
        gateway,
    }
}
