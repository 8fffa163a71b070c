// Modified: 2026-03-14

//! Scan run query and cancellation endpoints.

use crate::error::{ApiError, ApiResult};
use crate::handlers::{page_of, tenant_from_headers};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use catalog_store::ScanRunRepo;
use privguard_core::types::ScanStatus;
use privguard_core::{EntityId, Error, Paged, ScanFilter, ScanRun};
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
pub struct ScanListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    pub profile: Option<String>,
    pub host: Option<String>,
}

/// GET /api/v1/scans
pub async fn list_scans(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ScanListQuery>,
) -> ApiResult<Json<Paged<ScanRun>>> {
    let tenant = tenant_from_headers(&headers);
    let status = query
        .status
        .as_deref()
        .map(ScanStatus::from_str)
        .transpose()
        .map_err(ApiError::from)?;

    let filter = ScanFilter {
        status,
        profile_name: query.profile,
        host: query.host,
    };

    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    let page = ScanRunRepo::list(
        &mut conn,
        tenant,
        &filter,
        page_of(query.page, query.per_page),
    )
    .await?;
    Ok(Json(page))
}

/// GET /api/v1/scans/:id
pub async fn get_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<ScanRun>> {
    let tenant = tenant_from_headers(&headers);
    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    let run = ScanRunRepo::get(&mut conn, tenant, id)
        .await?
        .ok_or_else(|| Error::not_found(format!("scan run {id}")))?;
    Ok(Json(run))
}

/// GET /api/v1/scans/:id/transitions: immutable state-change audit
pub async fn scan_transitions(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<Vec<privguard_core::ScanStateTransition>>> {
    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    let transitions = ScanRunRepo::transitions(&mut conn, id).await?;
    Ok(Json(transitions))
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub cancelled_by: String,
}

/// POST /api/v1/scans/:id/cancel: permitted only from pending or running
pub async fn cancel_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<EntityId>,
    Json(request): Json<CancelRequest>,
) -> ApiResult<Json<ScanRun>> {
    let tenant = tenant_from_headers(&headers);
    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    ScanRunRepo::cancel(&mut conn, tenant, id, &request.cancelled_by).await?;
    let run = ScanRunRepo::get(&mut conn, tenant, id)
        .await?
        .ok_or_else(|| Error::not_found(format!("scan run {id}")))?;
    Ok(Json(run))
}
