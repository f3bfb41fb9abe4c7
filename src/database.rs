use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{
    pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager},
    AsyncPgConnection, RunQueryDsl,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::catalog::{ColumnMetadata, Dataset, Insight};
use crate::error::NovaError;
use crate::models::*;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Relational store for dataset summaries, column metadata, and insights.
///
/// Per-record atomicity is assumed of every implementation; no method spans
/// a cross-record transaction, matching the ingestion contract where each
/// write either lands or fails on its own.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn insert_dataset(&self, dataset: &Dataset) -> Result<(), NovaError>;

    /// Inserts all column records as one batch.
    async fn insert_columns(&self, columns: &[ColumnMetadata]) -> Result<(), NovaError>;

    async fn get_dataset(&self, dataset_id: Uuid) -> Result<Option<Dataset>, NovaError>;

    async fn list_datasets(&self, user_id: Uuid) -> Result<Vec<Dataset>, NovaError>;

    async fn list_columns(&self, dataset_id: Uuid) -> Result<Vec<ColumnMetadata>, NovaError>;

    async fn insert_insight(&self, insight: &Insight) -> Result<(), NovaError>;

    async fn list_insights(&self, dataset_id: Uuid) -> Result<Vec<Insight>, NovaError>;
}

#[derive(Clone)]
pub struct PgMetadataStore {
    pool: Pool<AsyncPgConnection>,
}

impl PgMetadataStore {
    pub async fn new(database_url: &str) -> Result<Self, NovaError> {
        let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = Pool::builder(config)
            .build()
            .map_err(|e| NovaError::ConfigError {
                message: format!("Failed to create database pool: {}", e),
            })?;

        let store = Self { pool };
        store.run_migrations(database_url)?;

        Ok(store)
    }

    fn run_migrations(&self, database_url: &str) -> Result<(), NovaError> {
        use diesel::Connection;
        use diesel::PgConnection;

        // diesel_migrations does not support async connections yet, so
        // migrations run over a synchronous one.
        let mut connection =
            PgConnection::establish(database_url).map_err(|e| NovaError::ConfigError {
                message: format!("Failed to establish connection for migrations: {}", e),
            })?;

        connection
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| NovaError::ConfigError {
                message: format!("Failed to run migrations: {}", e),
            })?;

        Ok(())
    }

    async fn connection(
        &self,
    ) -> Result<diesel_async::pooled_connection::deadpool::Object<AsyncPgConnection>, NovaError>
    {
        self.pool.get().await.map_err(|e| NovaError::ConfigError {
            message: format!("Failed to get database connection: {}", e),
        })
    }
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    async fn insert_dataset(&self, dataset: &Dataset) -> Result<(), NovaError> {
        use crate::schema::datasets::dsl::datasets;

        info!("Inserting dataset {} ({})", dataset.name, dataset.id);
        let mut conn = self.connection().await?;

        let new_dataset = NewDatasetRow::from(dataset);
        diesel::insert_into(datasets)
            .values(&new_dataset)
            .execute(&mut conn)
            .await
            .map_err(|e| NovaError::MetadataWriteFailed {
                message: format!("Failed to insert dataset: {}", e),
            })?;

        Ok(())
    }

    async fn insert_columns(&self, columns: &[ColumnMetadata]) -> Result<(), NovaError> {
        use crate::schema::dataset_columns::dsl::dataset_columns;

        let mut conn = self.connection().await?;

        let new_columns: Vec<NewDatasetColumnRow> =
            columns.iter().map(NewDatasetColumnRow::from).collect();
        diesel::insert_into(dataset_columns)
            .values(&new_columns)
            .execute(&mut conn)
            .await
            .map_err(|e| NovaError::ColumnMetadataWriteFailed {
                message: format!("Failed to insert column metadata: {}", e),
            })?;

        Ok(())
    }

    async fn get_dataset(&self, dataset_id: Uuid) -> Result<Option<Dataset>, NovaError> {
        use crate::schema::datasets::dsl::*;

        let mut conn = self.connection().await?;

        let dataset = datasets
            .filter(id.eq(dataset_id))
            .get_result::<DatasetRow>(&mut conn)
            .await
            .optional()
            .map_err(|e| NovaError::MetadataReadFailed {
                message: format!("Failed to fetch dataset: {}", e),
            })?;

        Ok(dataset.map(|d| d.into()))
    }

    async fn list_datasets(&self, owner: Uuid) -> Result<Vec<Dataset>, NovaError> {
        use crate::schema::datasets::dsl::*;

        let mut conn = self.connection().await?;

        let rows = datasets
            .filter(user_id.eq(owner))
            .order(created_at.desc())
            .get_results::<DatasetRow>(&mut conn)
            .await
            .map_err(|e| NovaError::MetadataReadFailed {
                message: format!("Failed to fetch datasets: {}", e),
            })?;

        Ok(rows.into_iter().map(|d| d.into()).collect())
    }

    async fn list_columns(&self, dataset: Uuid) -> Result<Vec<ColumnMetadata>, NovaError> {
        use crate::schema::dataset_columns::dsl::*;

        let mut conn = self.connection().await?;

        let rows = dataset_columns
            .filter(dataset_id.eq(dataset))
            .order(position.asc())
            .get_results::<DatasetColumnRow>(&mut conn)
            .await
            .map_err(|e| NovaError::MetadataReadFailed {
                message: format!("Failed to fetch column metadata: {}", e),
            })?;

        Ok(rows.into_iter().map(|c| c.into()).collect())
    }

    async fn insert_insight(&self, insight: &Insight) -> Result<(), NovaError> {
        use crate::schema::insights::dsl::insights;

        let mut conn = self.connection().await?;

        let new_insight = NewInsightRow::from(insight);
        diesel::insert_into(insights)
            .values(&new_insight)
            .execute(&mut conn)
            .await
            .map_err(|e| NovaError::MetadataWriteFailed {
                message: format!("Failed to insert insight: {}", e),
            })?;

        Ok(())
    }

    async fn list_insights(&self, dataset: Uuid) -> Result<Vec<Insight>, NovaError> {
        use crate::schema::insights::dsl::*;

        let mut conn = self.connection().await?;

        let rows = insights
            .filter(dataset_id.eq(dataset))
            .order(created_at.desc())
            .get_results::<InsightRow>(&mut conn)
            .await
            .map_err(|e| NovaError::MetadataReadFailed {
                message: format!("Failed to fetch insights: {}", e),
            })?;

        Ok(rows.into_iter().map(|i| i.into()).collect())
    }
}

/// In-memory metadata store for development and tests.
#[derive(Default)]
pub struct MemoryMetadataStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    datasets: Vec<Dataset>,
    columns: Vec<ColumnMetadata>,
    insights: Vec<Insight>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn insert_dataset(&self, dataset: &Dataset) -> Result<(), NovaError> {
        let mut state = self.state.lock().expect("metadata store lock poisoned");
        state.datasets.push(dataset.clone());
        Ok(())
    }

    async fn insert_columns(&self, columns: &[ColumnMetadata]) -> Result<(), NovaError> {
        let mut state = self.state.lock().expect("metadata store lock poisoned");
        state.columns.extend_from_slice(columns);
        Ok(())
    }

    async fn get_dataset(&self, dataset_id: Uuid) -> Result<Option<Dataset>, NovaError> {
        let state = self.state.lock().expect("metadata store lock poisoned");
        Ok(state
            .datasets
            .iter()
            .find(|d| d.id == dataset_id)
            .cloned())
    }

    async fn list_datasets(&self, user_id: Uuid) -> Result<Vec<Dataset>, NovaError> {
        let state = self.state.lock().expect("metadata store lock poisoned");
        let mut datasets: Vec<Dataset> = state
            .datasets
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        datasets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(datasets)
    }

    async fn list_columns(&self, dataset_id: Uuid) -> Result<Vec<ColumnMetadata>, NovaError> {
        let state = self.state.lock().expect("metadata store lock poisoned");
        let mut columns: Vec<ColumnMetadata> = state
            .columns
            .iter()
            .filter(|c| c.dataset_id == dataset_id)
            .cloned()
            .collect();
        columns.sort_by_key(|c| c.position);
        Ok(columns)
    }

    async fn insert_insight(&self, insight: &Insight) -> Result<(), NovaError> {
        let mut state = self.state.lock().expect("metadata store lock poisoned");
        state.insights.push(insight.clone());
        Ok(())
    }

    async fn list_insights(&self, dataset_id: Uuid) -> Result<Vec<Insight>, NovaError> {
        let state = self.state.lock().expect("metadata store lock poisoned");
        let mut insights: Vec<Insight> = state
            .insights
            .iter()
            .filter(|i| i.dataset_id == dataset_id)
            .cloned()
            .collect();
        insights.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(insights)
    }
}
