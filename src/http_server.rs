use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, HeaderMap};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::catalog::{ColumnMetadata, Dataset, Insight};
use crate::engine::NovaEngine;
use crate::error::NovaError;
use crate::ingest::MAX_UPLOAD_BYTES;

pub struct HttpServer {
    engine: Arc<NovaEngine>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub data: Dataset,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub response: String,
    pub metadata: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<crate::assistant::ChartSpec>,
}

#[derive(Debug, Deserialize)]
pub struct InsightsRequest {
    #[serde(rename = "dataSourceId")]
    pub data_source_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<Insight>,
}

impl HttpServer {
    pub fn new(engine: Arc<NovaEngine>) -> Self {
        Self { engine }
    }

    pub fn router(&self) -> Router {
        router(self.engine.clone())
    }

    pub async fn start(&self, addr: SocketAddr) -> Result<(), NovaError> {
        info!("Starting NOVA HTTP server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

pub fn router(engine: Arc<NovaEngine>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/upload", post(handle_upload))
        .route("/query", post(handle_query))
        .route("/insights", post(handle_insights))
        .route("/datasets", get(handle_list_datasets))
        .route("/datasets/{dataset_id}/columns", get(handle_list_columns))
        .route("/datasets/{dataset_id}/insights", get(handle_list_insights))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn handle_upload(
    State(engine): State<Arc<NovaEngine>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, NovaError> {
    let user_id = engine.authorize(bearer_token(&headers)).await?;

    let mut file_bytes: Option<Bytes> = None;
    let mut part_file_name: Option<String> = None;
    let mut declared_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| NovaError::InvalidInput {
            message: format!("Malformed multipart body: {}", e),
        })?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                part_file_name = field.file_name().map(str::to_string);
                file_bytes =
                    Some(
                        field
                            .bytes()
                            .await
                            .map_err(|e| NovaError::InvalidInput {
                                message: format!("Failed to read file payload: {}", e),
                            })?,
                    );
            }
            Some("fileName") => {
                declared_name = Some(field.text().await.map_err(|e| NovaError::InvalidInput {
                    message: format!("Failed to read fileName field: {}", e),
                })?);
            }
            _ => {}
        }
    }

    let bytes = file_bytes.ok_or_else(|| NovaError::InvalidInput {
        message: "No file provided".to_string(),
    })?;
    let file_name = declared_name
        .or(part_file_name)
        .unwrap_or_else(|| "upload.csv".to_string());

    let dataset = engine.upload(user_id, &file_name, bytes).await?;
    Ok(Json(UploadResponse { data: dataset }))
}

async fn handle_query(
    State(engine): State<Arc<NovaEngine>>,
    headers: HeaderMap,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, NovaError> {
    engine.authorize(bearer_token(&headers)).await?;

    let reply = engine.query(&request.message).await?;
    Ok(Json(QueryResponse {
        response: reply.response,
        metadata: serde_json::json!({}),
        chart: reply.chart,
    }))
}

async fn handle_insights(
    State(engine): State<Arc<NovaEngine>>,
    headers: HeaderMap,
    Json(request): Json<InsightsRequest>,
) -> Result<Json<InsightsResponse>, NovaError> {
    let user_id = engine.authorize(bearer_token(&headers)).await?;

    let insights = engine
        .generate_insights(user_id, request.data_source_id)
        .await?;
    Ok(Json(InsightsResponse { insights }))
}

async fn handle_list_datasets(
    State(engine): State<Arc<NovaEngine>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Dataset>>, NovaError> {
    let user_id = engine.authorize(bearer_token(&headers)).await?;

    let datasets = engine.list_datasets(user_id).await?;
    Ok(Json(datasets))
}

async fn handle_list_columns(
    State(engine): State<Arc<NovaEngine>>,
    headers: HeaderMap,
    Path(dataset_id): Path<Uuid>,
) -> Result<Json<Vec<ColumnMetadata>>, NovaError> {
    let user_id = engine.authorize(bearer_token(&headers)).await?;

    let columns = engine.list_columns(user_id, dataset_id).await?;
    Ok(Json(columns))
}

async fn handle_list_insights(
    State(engine): State<Arc<NovaEngine>>,
    headers: HeaderMap,
    Path(dataset_id): Path<Uuid>,
) -> Result<Json<InsightsResponse>, NovaError> {
    let user_id = engine.authorize(bearer_token(&headers)).await?;

    let insights = engine.list_insights(user_id, dataset_id).await?;
    Ok(Json(InsightsResponse { insights }))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
