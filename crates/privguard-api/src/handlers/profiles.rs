// Modified: 2026-03-14

//! Source profile endpoints.
//!
//! Connection configuration arrives in plaintext over the authenticated
//! channel, is encrypted immediately, and is never serialized back out.

use crate::error::{ApiError, ApiResult};
use crate::handlers::tenant_from_headers;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Json;
use catalog_store::ProfileRepo;
use privguard_core::types::{SourceType, ValidationStatus};
use privguard_core::utils::{current_timestamp, generate_uuid};
use privguard_core::{EntityId, Error, SourceProfile};
use serde::Deserialize;
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProfileRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub source_type: String,
    /// Connection configuration; encrypted before it touches the catalog
    pub config: serde_json::Value,
}

/// POST /api/v1/profiles
pub async fn create_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateProfileRequest>,
) -> ApiResult<Json<SourceProfile>> {
    request
        .validate()
        .map_err(|e| ApiError(Error::validation(e.to_string())))?;
    let tenant = tenant_from_headers(&headers);
    let source_type = SourceType::from_str(&request.source_type).map_err(ApiError::from)?;

    let plaintext = serde_json::to_string(&request.config).map_err(Error::from)?;
    let encrypted_config = state.cipher.encrypt(&plaintext)?;

    let now = current_timestamp();
    let profile = SourceProfile {
        id: generate_uuid(),
        tenant_id: tenant.tenant_id,
        name: request.name,
        source_type,
        encrypted_config,
        validation_status: ValidationStatus::Pending,
        disabled_at: None,
        created_at: now,
        updated_at: now,
    };

    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    ProfileRepo::insert(&mut conn, &profile).await?;
    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub struct ValidationRequest {
    pub status: String,
}

/// POST /api/v1/profiles/:id/validation: record a validation outcome
pub async fn set_validation(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(request): Json<ValidationRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let status = ValidationStatus::from_str(&request.status).map_err(ApiError::from)?;
    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    ProfileRepo::set_validation_status(&mut conn, id, status).await?;
    Ok(Json(serde_json::json!({ "id": id, "validation_status": request.status })))
}

/// DELETE /api/v1/profiles/:id: soft-disable
pub async fn disable_profile(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<serde_json::Value>> {
    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    ProfileRepo::disable(&mut conn, id).await?;
    Ok(Json(serde_json::json!({ "id": id, "disabled": true })))
}
