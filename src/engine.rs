use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::assistant::{
    extract_chart_spec, ChartOutcome, ChartSpec, CompletionGateway, ANALYST_SYSTEM_PROMPT,
    ASSISTANT_SYSTEM_PROMPT,
};
use crate::auth::IdentityResolver;
use crate::catalog::{ColumnMetadata, Dataset, Insight};
use crate::database::MetadataStore;
use crate::error::NovaError;
use crate::ingest::IngestionCoordinator;
use crate::storage::ContentStore;

/// At most this many insights are persisted per generation run.
pub const MAX_INSIGHTS: usize = 5;

pub struct QueryReply {
    pub response: String,
    pub chart: Option<ChartSpec>,
}

/// Service facade composing the ingestion pipeline, the metadata store,
/// the identity resolver, and the completion gateway. Every operation
/// takes its caller identity explicitly; nothing is read from ambient
/// session state.
pub struct NovaEngine {
    ingestion: IngestionCoordinator,
    metadata: Arc<dyn MetadataStore>,
    resolver: Arc<dyn IdentityResolver>,
    gateway: Arc<dyn CompletionGateway>,
}

impl NovaEngine {
    pub fn new(
        content: Arc<dyn ContentStore>,
        metadata: Arc<dyn MetadataStore>,
        resolver: Arc<dyn IdentityResolver>,
        gateway: Arc<dyn CompletionGateway>,
    ) -> Self {
        Self {
            ingestion: IngestionCoordinator::new(content, metadata.clone()),
            metadata,
            resolver,
            gateway,
        }
    }

    pub async fn authorize(&self, bearer_token: Option<&str>) -> Result<Uuid, NovaError> {
        let token = bearer_token.ok_or(NovaError::Unauthorized)?;
        self.resolver.resolve(token).await
    }

    pub async fn upload(
        &self,
        user_id: Uuid,
        file_name: &str,
        bytes: Bytes,
    ) -> Result<Dataset, NovaError> {
        self.ingestion.ingest(user_id, file_name, bytes).await
    }

    /// Passes the user's message through to the assistant and attaches a
    /// chart when one can be extracted from the reply. A fallback chart
    /// still counts as a chart; a rejected reply carries none.
    pub async fn query(&self, message: &str) -> Result<QueryReply, NovaError> {
        let response = self
            .gateway
            .complete(ASSISTANT_SYSTEM_PROMPT, message)
            .await?;

        let chart = match extract_chart_spec(&response) {
            ChartOutcome::Parsed(spec) => Some(spec),
            ChartOutcome::Fallback(spec) => Some(spec),
            ChartOutcome::Rejected => None,
        };

        Ok(QueryReply { response, chart })
    }

    /// Generates and persists up to [`MAX_INSIGHTS`] insights for one of
    /// the caller's datasets. An insert failure skips that insight only.
    pub async fn generate_insights(
        &self,
        user_id: Uuid,
        dataset_id: Uuid,
    ) -> Result<Vec<Insight>, NovaError> {
        let dataset = self.dataset_owned_by(user_id, dataset_id).await?;
        let columns = self.metadata.list_columns(dataset_id).await?;

        let prompt = build_insight_prompt(&dataset, &columns);
        let reply = self.gateway.complete(ANALYST_SYSTEM_PROMPT, &prompt).await?;

        let mut insights = Vec::new();
        let lines = reply
            .lines()
            .filter(|line| !line.trim().is_empty())
            .take(MAX_INSIGHTS);
        for (index, line) in lines.enumerate() {
            let content = strip_list_prefix(line);
            if content.is_empty() {
                continue;
            }

            let insight = Insight {
                id: Uuid::new_v4(),
                user_id,
                dataset_id,
                title: format!("Insight {}", index + 1),
                content: content.to_string(),
                insight_type: "auto".to_string(),
                created_at: Utc::now(),
            };

            match self.metadata.insert_insight(&insight).await {
                Ok(()) => insights.push(insight),
                Err(e) => warn!("Skipping insight for dataset {}: {}", dataset_id, e),
            }
        }

        info!(
            "Generated {} insights for dataset {}",
            insights.len(),
            dataset_id
        );
        Ok(insights)
    }

    pub async fn list_datasets(&self, user_id: Uuid) -> Result<Vec<Dataset>, NovaError> {
        self.metadata.list_datasets(user_id).await
    }

    pub async fn list_columns(
        &self,
        user_id: Uuid,
        dataset_id: Uuid,
    ) -> Result<Vec<ColumnMetadata>, NovaError> {
        self.dataset_owned_by(user_id, dataset_id).await?;
        self.metadata.list_columns(dataset_id).await
    }

    pub async fn list_insights(
        &self,
        user_id: Uuid,
        dataset_id: Uuid,
    ) -> Result<Vec<Insight>, NovaError> {
        self.dataset_owned_by(user_id, dataset_id).await?;
        self.metadata.list_insights(dataset_id).await
    }

    async fn dataset_owned_by(
        &self,
        user_id: Uuid,
        dataset_id: Uuid,
    ) -> Result<Dataset, NovaError> {
        let dataset = self.metadata.get_dataset(dataset_id).await?;
        match dataset {
            Some(dataset) if dataset.user_id == user_id => Ok(dataset),
            _ => Err(NovaError::DatasetNotFound {
                dataset_id: dataset_id.to_string(),
            }),
        }
    }
}

fn build_insight_prompt(dataset: &Dataset, columns: &[ColumnMetadata]) -> String {
    let column_list = columns
        .iter()
        .map(|c| format!("{} ({})", c.column_name, c.data_type))
        .collect::<Vec<_>>()
        .join(", ");
    let sample_lines = columns
        .iter()
        .map(|c| format!("{}: {:?}", c.column_name, c.sample_values))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze this dataset and generate 3-5 key insights:\n\n\
         Dataset: {}\nRows: {}\nColumns: {}\n\n\
         Sample values:\n{}\n\n\
         Provide insights about:\n\
         1. Data distribution patterns\n\
         2. Potential trends or correlations\n\
         3. Data quality observations\n\
         4. Recommended visualizations\n\
         5. Business implications\n\n\
         Format each insight as a separate, concise observation.",
        dataset.name, dataset.row_count, column_list, sample_lines
    )
}

/// Strips a leading `1. `-style list marker from one reply line.
fn strip_list_prefix(line: &str) -> &str {
    let trimmed = line.trim();
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = trimmed[digits..].strip_prefix('.') {
            return rest.trim();
        }
    }
    trimmed
}
