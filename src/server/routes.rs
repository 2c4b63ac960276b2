use axum::{
    extract::{Multipart, Path, State},
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use crate::server::AppState;
use crate::store::ArtifactKind;
use crate::{convert, query, Error};

/// Error body shape shared by every failing response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler-level errors, mapped onto HTTP statuses by `IntoResponse`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No file uploaded")]
    MissingFilePart,

    #[error("No selected file")]
    EmptyFilename,

    #[error("Invalid upload request: {0}")]
    InvalidRequest(String),

    #[error("Invalid file type")]
    UnsupportedFormat,

    #[error("CSV conversion failed: {0}")]
    ConversionFailed(String),

    #[error("Missing uuid or query")]
    MissingParameter,

    #[error("Database not found")]
    ArtifactNotFound,

    #[error("Only SELECT queries are allowed")]
    QueryRejected,

    #[error("{0}")]
    QueryExecution(String),

    #[error("{0}")]
    SchemaRead(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingFilePart
            | Self::EmptyFilename
            | Self::InvalidRequest(_)
            | Self::UnsupportedFormat
            | Self::MissingParameter
            | Self::QueryRejected
            | Self::QueryExecution(_) => StatusCode::BAD_REQUEST,
            Self::ArtifactNotFound => StatusCode::NOT_FOUND,
            Self::ConversionFailed(_) | Self::SchemaRead(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub uuid: Uuid,
}

#[derive(Deserialize)]
pub struct QueryRequest {
    pub uuid: Option<String>,
    pub query: Option<String>,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub results: Vec<Vec<serde_json::Value>>,
}

#[derive(Serialize)]
pub struct SchemaResponse {
    pub schema: Vec<query::TableSchema>,
}

pub async fn home() -> &'static str {
    "Server is up and running"
}

pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string).unwrap_or_default();
        if filename.is_empty() {
            return Err(ApiError::EmptyFilename);
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        upload = Some((filename, data));
        break;
    }
    let (filename, data) = upload.ok_or(ApiError::MissingFilePart)?;

    let kind = ArtifactKind::from_filename(&filename).ok_or(ApiError::UnsupportedFormat)?;

    let id = Uuid::new_v4();
    state
        .store
        .save(id, kind, &data)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    tracing::info!(uuid = %id, kind = kind.as_str(), bytes = data.len(), "Stored upload");

    if kind == ArtifactKind::Csv {
        let csv_path = state.store.artifact_path(id, ArtifactKind::Csv);
        let db_path = state.store.artifact_path(id, ArtifactKind::Sqlite);
        match convert::csv_to_sqlite(&csv_path, &db_path) {
            Ok(rows) => {
                tracing::info!(uuid = %id, rows, "Converted CSV upload");
                // The source CSV is transient; a failed delete is left for the sweep.
                if let Err(err) = state.store.remove(id, ArtifactKind::Csv) {
                    tracing::warn!(uuid = %id, error = %err, "Failed to remove CSV after conversion");
                }
            }
            Err(err) => {
                tracing::error!(uuid = %id, error = %err, "CSV conversion failed");
                return Err(ApiError::ConversionFailed(err.to_string()));
            }
        }
    }

    Ok(Json(UploadResponse { uuid: id }))
}

pub async fn execute_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let (uuid, sql) = match (request.uuid, request.query) {
        (Some(uuid), Some(sql)) if !uuid.is_empty() && !sql.is_empty() => (uuid, sql),
        _ => return Err(ApiError::MissingParameter),
    };

    if !query::is_select(&sql) {
        return Err(ApiError::QueryRejected);
    }

    let id = Uuid::parse_str(&uuid).map_err(|_| ApiError::ArtifactNotFound)?;
    if !state.store.contains(id, ArtifactKind::Sqlite) {
        return Err(ApiError::ArtifactNotFound);
    }

    let db_path = state.store.artifact_path(id, ArtifactKind::Sqlite);
    let results = query::execute_query(&db_path, &sql).map_err(|err| match err {
        Error::ArtifactNotFound(_) => ApiError::ArtifactNotFound,
        other => ApiError::QueryExecution(other.to_string()),
    })?;

    Ok(Json(QueryResponse { results }))
}

pub async fn get_schema(
    State(state): State<Arc<AppState>>,
    Path(uuid): Path<String>,
) -> Result<Json<SchemaResponse>, ApiError> {
    let id = Uuid::parse_str(&uuid).map_err(|_| ApiError::ArtifactNotFound)?;
    if !state.store.contains(id, ArtifactKind::Sqlite) {
        return Err(ApiError::ArtifactNotFound);
    }

    let db_path = state.store.artifact_path(id, ArtifactKind::Sqlite);
    let schema = query::read_schema(&db_path).map_err(|err| match err {
        Error::ArtifactNotFound(_) => ApiError::ArtifactNotFound,
        other => ApiError::SchemaRead(other.to_string()),
    })?;

    Ok(Json(SchemaResponse { schema }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MissingFilePart.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::UnsupportedFormat.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::QueryRejected.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::ArtifactNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::ConversionFailed("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::SchemaRead("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_messages_match_response_bodies() {
        assert_eq!(ApiError::MissingFilePart.to_string(), "No file uploaded");
        assert_eq!(ApiError::ArtifactNotFound.to_string(), "Database not found");
        assert_eq!(
            ApiError::QueryRejected.to_string(),
            "Only SELECT queries are allowed"
        );
    }
}
