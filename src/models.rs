use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::catalog::{ColumnMetadata, ColumnType, Dataset, DatasetStatus, Insight};
use crate::schema::{dataset_columns, datasets, insights};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = datasets)]
#[diesel(primary_key(id))]
pub struct DatasetRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub file_path: String,
    pub file_size: i64,
    pub row_count: i32,
    pub column_count: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = datasets)]
pub struct NewDatasetRow<'a> {
    pub id: &'a Uuid,
    pub user_id: &'a Uuid,
    pub name: &'a str,
    pub file_path: &'a str,
    pub file_size: i64,
    pub row_count: i32,
    pub column_count: i32,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Dataset> for NewDatasetRow<'a> {
    fn from(dataset: &'a Dataset) -> Self {
        NewDatasetRow {
            id: &dataset.id,
            user_id: &dataset.user_id,
            name: &dataset.name,
            file_path: &dataset.file_path,
            file_size: dataset.file_size,
            row_count: dataset.row_count,
            column_count: dataset.column_count,
            status: dataset.status.as_str(),
            created_at: dataset.created_at,
            updated_at: dataset.updated_at,
        }
    }
}

impl From<DatasetRow> for Dataset {
    fn from(row: DatasetRow) -> Self {
        Dataset {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            file_path: row.file_path,
            file_size: row.file_size,
            row_count: row.row_count,
            column_count: row.column_count,
            status: DatasetStatus::parse(&row.status),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(table_name = dataset_columns)]
#[diesel(belongs_to(DatasetRow, foreign_key = dataset_id))]
#[diesel(primary_key(dataset_id, position))]
pub struct DatasetColumnRow {
    pub dataset_id: Uuid,
    pub position: i32,
    pub column_name: String,
    pub data_type: String,
    pub sample_values: Vec<String>,
}

#[derive(Insertable)]
#[diesel(table_name = dataset_columns)]
pub struct NewDatasetColumnRow<'a> {
    pub dataset_id: &'a Uuid,
    pub position: i32,
    pub column_name: &'a str,
    pub data_type: &'a str,
    pub sample_values: &'a Vec<String>,
}

impl<'a> From<&'a ColumnMetadata> for NewDatasetColumnRow<'a> {
    fn from(column: &'a ColumnMetadata) -> Self {
        NewDatasetColumnRow {
            dataset_id: &column.dataset_id,
            position: column.position,
            column_name: &column.column_name,
            data_type: column.data_type.as_str(),
            sample_values: &column.sample_values,
        }
    }
}

impl From<DatasetColumnRow> for ColumnMetadata {
    fn from(row: DatasetColumnRow) -> Self {
        ColumnMetadata {
            dataset_id: row.dataset_id,
            position: row.position,
            column_name: row.column_name,
            data_type: ColumnType::parse(&row.data_type),
            sample_values: row.sample_values,
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(table_name = insights)]
#[diesel(belongs_to(DatasetRow, foreign_key = dataset_id))]
#[diesel(primary_key(id))]
pub struct InsightRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub dataset_id: Uuid,
    pub title: String,
    pub content: String,
    pub insight_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = insights)]
pub struct NewInsightRow<'a> {
    pub id: &'a Uuid,
    pub user_id: &'a Uuid,
    pub dataset_id: &'a Uuid,
    pub title: &'a str,
    pub content: &'a str,
    pub insight_type: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a Insight> for NewInsightRow<'a> {
    fn from(insight: &'a Insight) -> Self {
        NewInsightRow {
            id: &insight.id,
            user_id: &insight.user_id,
            dataset_id: &insight.dataset_id,
            title: &insight.title,
            content: &insight.content,
            insight_type: &insight.insight_type,
            created_at: insight.created_at,
        }
    }
}

impl From<InsightRow> for Insight {
    fn from(row: InsightRow) -> Self {
        Insight {
            id: row.id,
            user_id: row.user_id,
            dataset_id: row.dataset_id,
            title: row.title,
            content: row.content,
            insight_type: row.insight_type,
            created_at: row.created_at,
        }
    }
}
