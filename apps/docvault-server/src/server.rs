//! HTTP server and route handlers

use anyhow::{Context, Result};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::str::FromStr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use docvault_core::{DocumentId, ServerConfig, UploadedFile};
use docvault_pipeline::{IngestError, ListError, RemoveError};

use crate::app::AppState;

pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub async fn run(self) -> Result<()> {
        let addr = self.config.address();
        let app = build_router(self.state);

        info!("HTTP server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .context("Failed to bind HTTP server")?;

        axum::serve(listener, app.into_make_service())
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/documents", post(upload_document).get(list_documents))
        .route("/api/documents/:id", axum::routing::delete(delete_document))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// JSON error body with a stable machine-readable code
fn error_response(status: StatusCode, code: &str, message: String) -> Response {
    (status, Json(json!({ "error": code, "message": message }))).into_response()
}

// Route handlers

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "service": "DocVault",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn upload_document(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut upload: Option<UploadedFile> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "malformed_multipart",
                    e.to_string(),
                )
            }
        };

        if field.name() != Some("document") {
            continue;
        }

        let name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        match field.bytes().await {
            Ok(bytes) => {
                upload = Some(UploadedFile {
                    name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
                break;
            }
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "malformed_multipart",
                    e.to_string(),
                )
            }
        }
    }

    let Some(upload) = upload else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "missing_file",
            "No file uploaded under multipart field 'document'".to_string(),
        );
    };

    match state.pipeline.ingest(upload).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => {
            let status = match &e {
                IngestError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
                IngestError::ExtractionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
                IngestError::ArchiveFailed(_) | IngestError::PersistFailed(_) => {
                    StatusCode::BAD_GATEWAY
                }
            };
            error_response(status, e.error_code(), e.to_string())
        }
    }
}

async fn list_documents(State(state): State<AppState>) -> Response {
    match state.pipeline.list().await {
        Ok(records) => Json(records).into_response(),
        Err(e @ ListError::StoreUnavailable(_)) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, e.error_code(), e.to_string())
        }
    }
}

async fn delete_document(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(id) = DocumentId::from_str(&id) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            format!("Not a valid document id: {}", id),
        );
    };

    match state.pipeline.remove(id).await {
        Ok(true) => Json(json!({ "message": "Document deleted successfully" })).into_response(),
        Ok(false) => error_response(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("No document with id {}", id),
        ),
        Err(e) => {
            let status = match &e {
                RemoveError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                RemoveError::ArchiveDeleteFailed(_) | RemoveError::PersistDeleteFailed(_) => {
                    StatusCode::BAD_GATEWAY
                }
            };
            error_response(status, e.error_code(), e.to_string())
        }
    }
}
