//! One function per §6 operation, called by the router — `agtrace-runtime`'s
//! one-function-per-op shape applied to HTTP handlers.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use ghost_types::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::envelope::ok;
use crate::error::ApiError;
use crate::state::AppState;

const MAX_BATCH_SIZE: usize = 100;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestResponse {
    accepted: usize,
    batch_id: Uuid,
}

/// POST /ingest-events
pub async fn ingest_events(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<ghost_types::SecureEventBatch>,
) -> Result<Response, ApiError> {
    if batch.events.is_empty() {
        return Err(ApiError::new(ErrorCode::InvalidBatch, "batch has no events"));
    }
    if batch.events.len() > MAX_BATCH_SIZE {
        return Err(ApiError::new(ErrorCode::BatchTooLarge, format!("batch has {} events, max is {MAX_BATCH_SIZE}", batch.events.len())));
    }
    if !state.rate_limiter.try_accept(&batch.device_fingerprint, batch.events.len() as u32) {
        return Err(ApiError::new(ErrorCode::RateLimitExceeded, "device exceeded 1000 events/minute"));
    }

    let org_ids: BTreeSet<String> = batch.events.iter().map(|e| e.org_id.clone()).collect();
    for event in &batch.events {
        state
            .store
            .insert_secure_event(event, &batch.device_fingerprint, batch.batch_id)
            .map_err(|err| ApiError::new(ErrorCode::InsertFailed, err.to_string()))?;
    }

    // G never fails the 202 due to H: pattern detection runs fire-and-forget,
    // one task per distinct orgId in the batch.
    for org_id in org_ids {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(err) = ghost_cluster::detect_patterns(&state.store, state.llm.as_ref(), &org_id).await {
                tracing::warn!(%org_id, %err, "pattern detection failed after ingestion");
            }
        });
    }

    Ok(ok(StatusCode::ACCEPTED, IngestResponse { accepted: batch.events.len(), batch_id: batch.batch_id }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternDetectorRequest {
    org_id: String,
    #[serde(default)]
    #[allow(dead_code)]
    batch_id: Option<Uuid>,
    #[serde(default)]
    #[allow(dead_code)]
    trigger: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PatternDetectorResponse {
    patterns_found: usize,
    patterns: Vec<ghost_types::DetectedPattern>,
}

/// POST /pattern-detector
pub async fn pattern_detector(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PatternDetectorRequest>,
) -> Result<Response, ApiError> {
    if request.org_id.trim().is_empty() {
        return Err(ApiError::new(ErrorCode::MissingOrg, "orgId is required"));
    }
    let patterns = ghost_cluster::detect_patterns(&state.store, state.llm.as_ref(), &request.org_id).await?;
    Ok(ok(StatusCode::OK, PatternDetectorResponse { patterns_found: patterns.len(), patterns }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GhostExecutorRequest {
    ghost_id: Option<Uuid>,
    #[serde(default)]
    parameters: Value,
    #[serde(default = "default_trigger")]
    trigger: String,
}

fn default_trigger() -> String {
    "manual".to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GhostExecutorResponse {
    execution_id: Uuid,
    status: &'static str,
    steps: Vec<ghost_types::ExecutionStep>,
}

fn execution_status_str(status: ghost_types::ExecutionStatus) -> &'static str {
    match status {
        ghost_types::ExecutionStatus::Running => "running",
        ghost_types::ExecutionStatus::Completed => "completed",
        ghost_types::ExecutionStatus::Failed => "failed",
        ghost_types::ExecutionStatus::Cancelled => "cancelled",
    }
}

/// POST /ghost-executor
pub async fn ghost_executor(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GhostExecutorRequest>,
) -> Result<Response, ApiError> {
    let ghost_id = request.ghost_id.ok_or_else(|| ApiError::new(ErrorCode::MissingGhost, "ghostId is required"))?;
    let result = ghost_engine::run_ghost(&state.store, state.llm.as_ref(), ghost_id, request.parameters, &request.trigger).await?;
    Ok(ok(
        StatusCode::OK,
        GhostExecutorResponse {
            execution_id: result.execution_id,
            status: execution_status_str(result.status),
            steps: result.steps,
        },
    ))
}

#[derive(Deserialize)]
pub struct ApproveGhostRequest {
    ghost_id: Option<Uuid>,
    action: Option<String>,
    decision_note: Option<String>,
    approved_by: Option<String>,
}

#[derive(Serialize)]
struct ApproveGhostResponse {
    success: bool,
    new_status: &'static str,
    version: u32,
}

fn ghost_status_str(status: ghost_types::GhostStatus) -> &'static str {
    match status {
        ghost_types::GhostStatus::PendingApproval => "pending_approval",
        ghost_types::GhostStatus::Approved => "approved",
        ghost_types::GhostStatus::Active => "active",
        ghost_types::GhostStatus::Paused => "paused",
        ghost_types::GhostStatus::Archived => "archived",
    }
}

/// POST /approve-ghost
pub async fn approve_ghost(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ApproveGhostRequest>,
) -> Result<Response, ApiError> {
    let ghost_id = request.ghost_id.ok_or_else(|| ApiError::new(ErrorCode::MissingGhost, "ghost_id is required"))?;
    let action = request.action.ok_or_else(|| ApiError::new(ErrorCode::MissingGhost, "action is required"))?;
    let approved_by = request.approved_by.as_deref().unwrap_or("unknown");

    let ghost = match action.as_str() {
        "approve" => state.store.approve_ghost(ghost_id, approved_by, request.decision_note.as_deref()),
        "reject" => state.store.reject_ghost(ghost_id, approved_by, request.decision_note.as_deref()),
        "pause" => state.store.pause_ghost(ghost_id),
        "activate" => state.store.activate_ghost(ghost_id),
        "archive" => state.store.archive_ghost(ghost_id),
        other => return Err(ApiError::new(ErrorCode::MissingGhost, format!("invalid action: {other}"))),
    }
    .map_err(|err| match err {
        ghost_store::Error::NotFound(what) => ApiError::new(ErrorCode::GhostNotFound, what),
        other => ApiError::new(ErrorCode::InternalError, other.to_string()),
    })?;

    Ok(ok(
        StatusCode::OK,
        ApproveGhostResponse { success: true, new_status: ghost_status_str(ghost.status), version: ghost.version },
    ))
}
