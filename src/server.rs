//! HTTP surface of the pipeline.
//!
//! Three POST endpoints drive the pipeline, and the uploads directory is
//! served statically so the remote diarization service can fetch waveforms
//! by public URL.

use crate::config::Settings;
use crate::error::TolkError;
use crate::pipeline::Pipeline;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

/// Shared application state.
struct AppState {
    pipeline: Pipeline,
}

/// Run the HTTP server until shutdown.
pub async fn run_server(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(settings)?;
    let uploads_dir = pipeline.uploads_dir().to_path_buf();

    let state = Arc::new(AppState { pipeline });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/process-audio", post(process_audio))
        .route("/combine-speeches", post(combine_speeches))
        .route("/analyze-interview", post(analyze_interview))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Listening on http://{}", addr);
    info!("Endpoints: POST /process-audio, POST /combine-speeches, POST /analyze-interview");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct FilenameRequest {
    filename: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessResponse {
    success: bool,
    result: Vec<crate::alignment::AlignedEntry>,
    saved_file: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CombineResponse {
    success: bool,
    message: String,
    output_file: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    success: bool,
    analysis: String,
    updated_file: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Map a pipeline error onto an HTTP response.
///
/// Validation problems are the caller's fault (400), missing references are
/// 404, everything else is an opaque 500 with the message as detail.
fn error_response(err: TolkError) -> Response {
    match err {
        TolkError::Validation(message) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: message,
                details: None,
            }),
        )
            .into_response(),
        TolkError::NotFound(message) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: message,
                details: None,
            }),
        )
            .into_response(),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Processing failed".to_string(),
                details: Some(other.to_string()),
            }),
        )
            .into_response(),
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn process_audio(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FilenameRequest>,
) -> Response {
    match state.pipeline.process(req.filename.as_deref()).await {
        Ok(outcome) => Json(ProcessResponse {
            success: true,
            result: outcome.result,
            saved_file: outcome.saved_file,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn combine_speeches(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FilenameRequest>,
) -> Response {
    match state.pipeline.combine_saved(req.filename.as_deref()) {
        Ok(output_file) => Json(CombineResponse {
            success: true,
            message: "Speeches combined successfully".to_string(),
            output_file,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn analyze_interview(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FilenameRequest>,
) -> Response {
    let filename = req.filename.clone();
    match state.pipeline.analyze_saved(req.filename.as_deref()).await {
        Ok(analysis) => Json(AnalyzeResponse {
            success: true,
            analysis,
            updated_file: filename.unwrap_or_default(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}
