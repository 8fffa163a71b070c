// Modified: 2026-03-14

//! Finding catalog query endpoints.

use crate::error::{ApiError, ApiResult};
use crate::handlers::{page_of, tenant_from_headers};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use catalog_store::{ClassificationRepo, FindingRepo, ReviewRepo};
use privguard_core::types::Severity;
use privguard_core::{EntityId, Error, Finding, FindingDetail, FindingFilter, Paged};
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
pub struct FindingListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub scan_run_id: Option<EntityId>,
    pub asset_id: Option<EntityId>,
    pub pattern: Option<String>,
    pub severity: Option<String>,
}

/// GET /api/v1/findings
pub async fn list_findings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FindingListQuery>,
) -> ApiResult<Json<Paged<Finding>>> {
    let tenant = tenant_from_headers(&headers);
    let severity = query
        .severity
        .as_deref()
        .map(Severity::from_str)
        .transpose()
        .map_err(ApiError::from)?;

    let filter = FindingFilter {
        scan_run_id: query.scan_run_id,
        asset_id: query.asset_id,
        pattern_name: query.pattern,
        severity,
        include_deleted: false,
    };

    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    let page = FindingRepo::list(
        &mut conn,
        tenant,
        &filter,
        page_of(query.page, query.per_page),
    )
    .await?;
    Ok(Json(page))
}

/// GET /api/v1/findings/:id: the finding with its classification and
/// review state, joined at query time
pub async fn get_finding(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<FindingDetail>> {
    let tenant = tenant_from_headers(&headers);
    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;

    let finding = FindingRepo::get(&mut conn, tenant, id)
        .await?
        .ok_or_else(|| Error::not_found(format!("finding {id}")))?;
    let classification = ClassificationRepo::get_for_finding(&mut conn, id).await?;
    let review = ReviewRepo::get_for_finding(&mut conn, id).await?;

    Ok(Json(FindingDetail {
        finding,
        classification,
        review,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub status: String,
    pub reviewed_by: String,
    pub comments: Option<String>,
}

/// POST /api/v1/findings/:id/review: record a human review decision
pub async fn review_finding(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<EntityId>,
    Json(request): Json<ReviewRequest>,
) -> ApiResult<Json<privguard_core::ReviewState>> {
    let tenant = tenant_from_headers(&headers);
    let status =
        privguard_core::types::ReviewStatus::from_str(&request.status).map_err(ApiError::from)?;

    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    FindingRepo::get(&mut conn, tenant, id)
        .await?
        .ok_or_else(|| Error::not_found(format!("finding {id}")))?;

    ReviewRepo::set_status(
        &mut conn,
        id,
        status,
        &request.reviewed_by,
        request.comments.as_deref(),
    )
    .await?;
    let review = ReviewRepo::get_for_finding(&mut conn, id)
        .await?
        .ok_or_else(|| Error::not_found(format!("review state for finding {id}")))?;
    Ok(Json(review))
}
