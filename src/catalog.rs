use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DatasetStatus {
    Pending,
    Ready,
    Failed,
}

impl DatasetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetStatus::Pending => "pending",
            DatasetStatus::Ready => "ready",
            DatasetStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "pending" => DatasetStatus::Pending,
            "ready" => DatasetStatus::Ready,
            _ => DatasetStatus::Failed,
        }
    }
}

impl std::fmt::Display for DatasetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Date,
    Text,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Date => "date",
            ColumnType::Text => "text",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "numeric" => ColumnType::Numeric,
            "date" => ColumnType::Date,
            _ => ColumnType::Text,
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Summary record for one uploaded CSV file. Created once the raw bytes are
/// durably stored; only the status and count fields are ever expected to
/// change, and deletion is an external concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub file_path: String,
    pub file_size: i64,
    pub row_count: i32,
    pub column_count: i32,
    pub status: DatasetStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-column metadata captured at ingestion time. `position` preserves the
/// header order and keeps duplicate column names distinguishable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub dataset_id: Uuid,
    pub position: i32,
    pub column_name: String,
    pub data_type: ColumnType,
    pub sample_values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub id: Uuid,
    pub user_id: Uuid,
    pub dataset_id: Uuid,
    pub title: String,
    pub content: String,
    pub insight_type: String,
    pub created_at: DateTime<Utc>,
}
