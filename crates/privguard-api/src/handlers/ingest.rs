// Modified: 2026-03-14

//! Verified-findings ingestion endpoints.

use crate::error::ApiResult;
use crate::handlers::tenant_from_headers;
use crate::state::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use ingestion::{ScannerReport, SdkReport};
use privguard_core::IngestSummary;

/// POST /api/v1/ingest: source-family-grouped scanner report
pub async fn ingest_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(report): Json<ScannerReport>,
) -> ApiResult<Json<IngestSummary>> {
    let tenant = tenant_from_headers(&headers);
    let batch = report.into_batch(tenant)?;
    let summary = state.pipeline.ingest(batch).await?;
    Ok(Json(summary))
}

/// POST /api/v1/ingest/sdk: flat SDK-verified form; behavior identical
/// except the validation-gate fields are mandatory per finding
pub async fn ingest_sdk(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(report): Json<SdkReport>,
) -> ApiResult<Json<IngestSummary>> {
    let tenant = tenant_from_headers(&headers);
    let scan_id = report.scan_id;
    let batch = report.into_batch(tenant)?;

    let summary = match scan_id {
        Some(scan_id) => state.pipeline.ingest_into(scan_id, batch).await?,
        None => state.pipeline.ingest(batch).await?,
    };
    Ok(Json(summary))
}
