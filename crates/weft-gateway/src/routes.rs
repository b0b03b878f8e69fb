use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use weft_core::error::WeftError;

use crate::state::AppState;

// GET /api/health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Deserialize)]
pub struct RunRequest {
    #[serde(rename = "graphJson")]
    pub graph: weft_engine::Graph,
}

#[derive(Serialize)]
pub struct RunResponse {
    pub response: String,
    pub steps: Vec<String>,
}

// POST /api/run — execute a workflow graph and return the final value
// plus the full ordered trace.
pub async fn run(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Json<RunResponse>, (StatusCode, Json<serde_json::Value>)> {
    // A body axum cannot deserialize still gets the {"error": ...} envelope.
    let Json(body) = payload.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": rejection.body_text() })),
        )
    })?;
    info!(nodes = body.graph.nodes.len(), edges = body.graph.edges.len(), "Run requested");

    match state.executor.execute(&body.graph).await {
        Ok(outcome) => Ok(Json(RunResponse {
            response: outcome.response,
            steps: outcome.steps,
        })),
        Err(e) => {
            error!(error = %e, "Run failed");
            Err(error_response(&e))
        }
    }
}

fn error_response(e: &WeftError) -> (StatusCode, Json<serde_json::Value>) {
    (status_for(e), Json(serde_json::json!({ "error": e.to_string() })))
}

/// Caller mistakes (malformed graphs, missing keys) map to 400, bad
/// credentials to 401, everything else is a server-side failure.
fn status_for(e: &WeftError) -> StatusCode {
    match e {
        WeftError::GraphStructure(_) | WeftError::NodeNotFound(_) | WeftError::Configuration(_) => {
            StatusCode::BAD_REQUEST
        }
        WeftError::Authentication(_) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
