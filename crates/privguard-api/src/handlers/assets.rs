// Modified: 2026-03-14

//! Asset catalog query endpoints.

use crate::error::ApiResult;
use crate::handlers::{page_of, tenant_from_headers};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use privguard_core::{Asset, AssetFilter, EntityId, Error, Paged};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AssetListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub asset_type: Option<String>,
    pub host: Option<String>,
    pub environment: Option<String>,
    pub min_risk: Option<i32>,
}

/// GET /api/v1/assets
pub async fn list_assets(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AssetListQuery>,
) -> ApiResult<Json<Paged<Asset>>> {
    let tenant = tenant_from_headers(&headers);
    let filter = AssetFilter {
        asset_type: query.asset_type,
        host: query.host,
        environment: query.environment,
        min_risk: query.min_risk,
        include_deleted: false,
    };

    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    let page = state
        .assets
        .list(&mut conn, tenant, &filter, page_of(query.page, query.per_page))
        .await?;
    Ok(Json(page))
}

/// GET /api/v1/assets/:id
pub async fn get_asset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<Asset>> {
    let tenant = tenant_from_headers(&headers);
    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    let asset = state
        .assets
        .get(&mut conn, tenant, id)
        .await?
        .ok_or_else(|| Error::not_found(format!("asset {id}")))?;
    Ok(Json(asset))
}

/// DELETE /api/v1/assets/:id: soft delete; findings stay until hard
/// deletion cascades them
pub async fn delete_asset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<serde_json::Value>> {
    let tenant = tenant_from_headers(&headers);
    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    state
        .assets
        .get(&mut conn, tenant, id)
        .await?
        .ok_or_else(|| Error::not_found(format!("asset {id}")))?;
    catalog_store::AssetRepo::soft_delete(&mut conn, id).await?;
    Ok(Json(serde_json::json!({ "id": id, "deleted": true })))
}

#[derive(Debug, Deserialize)]
pub struct RelationshipRequest {
    pub target_asset_id: EntityId,
    pub relationship_type: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// POST /api/v1/assets/:id/relationships: upsert a typed edge
pub async fn add_relationship(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<EntityId>,
    Json(request): Json<RelationshipRequest>,
) -> ApiResult<Json<privguard_core::AssetRelationship>> {
    let tenant = tenant_from_headers(&headers);
    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    state
        .assets
        .get(&mut conn, tenant, id)
        .await?
        .ok_or_else(|| Error::not_found(format!("asset {id}")))?;

    let relationship = catalog_store::RelationshipRepo::upsert(
        &mut conn,
        id,
        request.target_asset_id,
        &request.relationship_type,
        &request.metadata,
    )
    .await?;
    Ok(Json(relationship))
}

/// GET /api/v1/assets/:id/relationships
pub async fn list_relationships(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<Vec<privguard_core::AssetRelationship>>> {
    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    let relationships = catalog_store::RelationshipRepo::for_asset(&mut conn, id).await?;
    Ok(Json(relationships))
}
