//! HTTP request handlers for the scan and analyze API.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::ai::AnalysisStatus;
use crate::error::AnalyzerError;
use crate::github::GitHubRepo;
use crate::store::ScanOutcome;

use super::auth::require_basic_auth;
use super::AppState;

/// Build the axum router with all routes
pub(super) fn router(state: Arc<AppState>) -> axum::Router {
    use axum::routing::{get, post};
    use tower_http::trace::TraceLayer;

    axum::Router::new()
        .route("/", get(root))
        .route("/scan", post(scan))
        .route("/analyze", post(analyze))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Error response body
#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

fn error_response(status: StatusCode, detail: String) -> Response {
    (status, Json(ErrorBody { detail })).into_response()
}

/// Status for errors that are not the caller's fault
fn server_status(err: &AnalyzerError) -> StatusCode {
    match err {
        AnalyzerError::Http(_) | AnalyzerError::Json(_) | AnalyzerError::Timestamp(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// -- / --

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Welcome to the GitHub Issue Analyzer API" }))
}

// -- /scan --

#[derive(Deserialize)]
struct ScanRequest {
    repo: String,
}

#[derive(Serialize)]
struct ScanErrorBody {
    #[serde(flatten)]
    outcome: ScanOutcome,
    detail: String,
}

async fn scan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScanRequest>,
) -> Result<Json<ScanOutcome>, Response> {
    match state.orchestrator.scan(&req.repo).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(err) => {
            let status = if err.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                tracing::error!("Scan of {} failed: {}", req.repo, err);
                server_status(&err)
            };
            let body = ScanErrorBody {
                outcome: ScanOutcome::failed(&GitHubRepo::normalize(&req.repo)),
                detail: err.to_string(),
            };
            Err((status, Json(body)).into_response())
        }
    }
}

// -- /analyze --

#[derive(Deserialize)]
struct AnalyzeRequest {
    repo: String,
    prompt: String,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    repo: String,
    analysis: String,
    batches: usize,
    failed_batches: usize,
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, Response> {
    let analysis = match state.orchestrator.analyze(&req.repo, &req.prompt).await {
        Ok(analysis) => analysis,
        Err(err @ (AnalyzerError::RepoNotCached(_) | AnalyzerError::NoIssuesCached(_))) => {
            return Err(error_response(StatusCode::NOT_FOUND, err.to_string()));
        }
        Err(err) => {
            tracing::error!("Analysis of {} failed: {}", req.repo, err);
            return Err(error_response(server_status(&err), err.to_string()));
        }
    };

    if let AnalysisStatus::Unavailable { reason } = &analysis.status {
        return Err(error_response(
            StatusCode::BAD_GATEWAY,
            format!("LLM analysis unavailable: {}", reason),
        ));
    }

    Ok(Json(AnalyzeResponse {
        failed_batches: analysis.failed_batches(),
        repo: analysis.repo,
        analysis: analysis.text,
        batches: analysis.batches,
    }))
}
