// Modified: 2026-03-14

//! Lineage query endpoints.

use crate::error::{ApiError, ApiResult};
use crate::handlers::tenant_from_headers;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use privguard_core::models::graph::{LineageFilter, LineageView};
use privguard_core::types::Severity;
use privguard_core::PiiSummaryRow;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
pub struct LineageQuery {
    pub system: Option<String>,
    pub risk: Option<String>,
    pub category: Option<String>,
}

/// GET /api/v1/lineage: System -> Asset -> PII_Category hierarchy.
/// When the graph store is down the response carries an explicit
/// `unavailable` status.
pub async fn hierarchy(
    State(state): State<AppState>,
    Query(query): Query<LineageQuery>,
) -> ApiResult<Json<LineageView>> {
    let risk = query
        .risk
        .as_deref()
        .map(Severity::from_str)
        .transpose()
        .map_err(ApiError::from)?;

    let filter = LineageFilter {
        system: query.system,
        risk,
        category: query.category,
    };
    let view = state.lineage.hierarchy(&filter).await?;
    Ok(Json(view))
}

/// GET /api/v1/lineage/summary: per-PII-type totals from the catalog
pub async fn pii_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<PiiSummaryRow>>> {
    let tenant = tenant_from_headers(&headers);
    let rows = state.lineage.pii_summary(tenant).await?;
    Ok(Json(rows))
}
