use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NovaError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Dataset not found: {dataset_id}")]
    DatasetNotFound { dataset_id: String },

    #[error("Storage write failed: {message}")]
    StorageWriteFailed { message: String },

    #[error("Metadata write failed: {message}")]
    MetadataWriteFailed { message: String },

    #[error("Column metadata write failed: {message}")]
    ColumnMetadataWriteFailed { message: String },

    #[error("Metadata read failed: {message}")]
    MetadataReadFailed { message: String },

    #[error("Completion gateway error: {message}")]
    GatewayError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl From<std::io::Error> for NovaError {
    fn from(err: std::io::Error) -> Self {
        NovaError::IoError {
            message: err.to_string(),
        }
    }
}

impl NovaError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            NovaError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            NovaError::Unauthorized => StatusCode::UNAUTHORIZED,
            NovaError::DatasetNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for NovaError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}
