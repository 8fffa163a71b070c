// Modified: 2026-03-14

//! Workflow activity endpoints.
//!
//! The external workflow coordinator drives long-running scans and
//! remediations by calling these idempotent activities. Ingest, execute,
//! and rollback already have first-class endpoints; the remaining
//! activity surface lives here.

use crate::error::{ApiError, ApiResult};
use crate::handlers::tenant_from_headers;
use crate::state::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use privguard_core::types::ScanStatus;
use privguard_core::{EntityId, Timestamp};
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub scan_id: EntityId,
    pub from: String,
    pub to: String,
}

/// POST /api/v1/activities/transition-scan: CAS-backed and retriable
pub async fn transition_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TransitionRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let tenant = tenant_from_headers(&headers);
    let from = ScanStatus::from_str(&request.from).map_err(ApiError::from)?;
    let to = ScanStatus::from_str(&request.to).map_err(ApiError::from)?;

    state
        .activities
        .transition_scan_state(tenant, request.scan_id, from, to)
        .await?;
    Ok(Json(serde_json::json!({ "scan_id": request.scan_id, "status": to })))
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub scan_id: EntityId,
}

/// POST /api/v1/activities/sync-to-graph: idempotent batch reconcile
pub async fn sync_to_graph(
    State(state): State<AppState>,
    Json(request): Json<SyncRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let synced = state.activities.sync_to_graph(request.scan_id).await?;
    Ok(Json(serde_json::json!({ "scan_id": request.scan_id, "assets_synced": synced })))
}

#[derive(Debug, Deserialize)]
pub struct CloseExposureRequest {
    pub finding_id: EntityId,
    pub at: Option<Timestamp>,
}

/// POST /api/v1/activities/close-exposure: exposure-window finalizer
pub async fn close_exposure(
    State(state): State<AppState>,
    Json(request): Json<CloseExposureRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let at = request.at.unwrap_or_else(privguard_core::utils::current_timestamp);
    state
        .activities
        .close_exposure_window(request.finding_id, at)
        .await?;
    Ok(Json(serde_json::json!({ "finding_id": request.finding_id, "closed_at": at })))
}
