// Modified: 2026-03-14

//! Remediation endpoints: execute, rollback, preview, history.

use crate::error::{ApiError, ApiResult};
use crate::handlers::tenant_from_headers;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use privguard_core::types::RemediationActionType;
use privguard_core::{EntityId, Error, RemediationAction, RemediationPreview};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ExecuteRequest {
    #[validate(length(min = 1, message = "at least one finding id is required"))]
    pub finding_ids: Vec<EntityId>,
    pub action_type: String,
    #[validate(length(min = 1))]
    pub actor: String,
}

/// Per-finding outcome of a bulk execute
#[derive(Debug, Serialize)]
pub struct ExecuteOutcome {
    pub finding_id: EntityId,
    pub action: Option<RemediationAction>,
    pub error: Option<String>,
}

/// POST /api/v1/remediation/execute
pub async fn execute(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ExecuteRequest>,
) -> ApiResult<Json<Vec<ExecuteOutcome>>> {
    request
        .validate()
        .map_err(|e| ApiError(Error::validation(e.to_string())))?;
    let tenant = tenant_from_headers(&headers);
    let action_type =
        RemediationActionType::from_str(&request.action_type).map_err(ApiError::from)?;

    let mut outcomes = Vec::with_capacity(request.finding_ids.len());
    for finding_id in request.finding_ids {
        match state
            .orchestrator
            .execute(tenant, finding_id, action_type, &request.actor)
            .await
        {
            Ok(action) => outcomes.push(ExecuteOutcome {
                finding_id,
                action: Some(action),
                error: None,
            }),
            Err(e) => outcomes.push(ExecuteOutcome {
                finding_id,
                action: None,
                error: Some(e.to_string()),
            }),
        }
    }
    Ok(Json(outcomes))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RollbackRequest {
    pub action_id: EntityId,
    #[validate(length(min = 1))]
    pub actor: String,
}

/// POST /api/v1/remediation/rollback: permitted only from COMPLETED
pub async fn rollback(
    State(state): State<AppState>,
    Json(request): Json<RollbackRequest>,
) -> ApiResult<Json<RemediationAction>> {
    request
        .validate()
        .map_err(|e| ApiError(Error::validation(e.to_string())))?;
    let action = state
        .orchestrator
        .rollback(request.action_id, &request.actor)
        .await?;
    Ok(Json(action))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PreviewRequest {
    #[validate(length(min = 1, message = "at least one finding id is required"))]
    pub finding_ids: Vec<EntityId>,
    pub action_type: String,
}

/// POST /api/v1/remediation/preview: read-only impact estimate
pub async fn preview(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PreviewRequest>,
) -> ApiResult<Json<RemediationPreview>> {
    request
        .validate()
        .map_err(|e| ApiError(Error::validation(e.to_string())))?;
    let tenant = tenant_from_headers(&headers);
    let action_type =
        RemediationActionType::from_str(&request.action_type).map_err(ApiError::from)?;
    let preview = state
        .orchestrator
        .preview(tenant, &request.finding_ids, action_type)
        .await?;
    Ok(Json(preview))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub asset_id: Option<EntityId>,
    pub finding_id: Option<EntityId>,
}

/// GET /api/v1/remediation/history?asset_id=…|finding_id=…
pub async fn history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<RemediationAction>>> {
    let tenant = tenant_from_headers(&headers);
    let actions = state
        .orchestrator
        .history(tenant, query.asset_id, query.finding_id)
        .await?;
    Ok(Json(actions))
}
