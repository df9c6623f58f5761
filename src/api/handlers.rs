//! HTTP request handlers.
//!
//! Ordinary scoring conditions (no history, no model) never surface as HTTP
//! errors; callers always get a structured score record. Only malformed
//! requests are rejected.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;
use tracing::error;

use crate::api::server::RiskServer;
use crate::api::types::{ErrorResponse, ScoreRequest};
use crate::scoring::ScoreRecord;
use crate::storage::ReportRow;

/// Dashboard "reports" listing size.
const REPORTS_LIMIT: i64 = 20;

pub async fn home(State(state): State<Arc<RiskServer>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "backend running",
        "model_loaded": state.service.model_loaded(),
        "model_version": state.service.model_version(),
    }))
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn score_wallet(
    State(state): State<Arc<RiskServer>>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreRecord>, (StatusCode, Json<ErrorResponse>)> {
    if request.wallet.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "wallet must not be empty".to_string(),
                code: "INVALID_WALLET".to_string(),
            }),
        ));
    }

    Ok(Json(state.service.score(&request.wallet).await))
}

/// Recent transactions for the dashboard. A storage error degrades to an
/// empty listing instead of failing the page.
pub async fn list_reports(State(state): State<Arc<RiskServer>>) -> Json<Vec<ReportRow>> {
    match state.store.recent_reports(REPORTS_LIMIT).await {
        Ok(reports) => Json(reports),
        Err(err) => {
            error!(error = %err, "reports query failed");
            Json(Vec::new())
        }
    }
}
