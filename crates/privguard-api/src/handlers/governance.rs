// Modified: 2026-03-14

//! Policy and consent endpoints.
//!
//! Policies are declarative condition/action documents; executing one
//! applies its configured remediation action to the given findings and
//! records a PolicyExecution per finding. Consent is keyed by
//! (data_subject_id, pii_type).

use crate::error::{ApiError, ApiResult};
use crate::handlers::tenant_from_headers;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Json;
use catalog_store::PolicyRepo;
use privguard_core::types::RemediationActionType;
use privguard_core::utils::{current_timestamp, generate_uuid};
use privguard_core::{ConsentRecord, EntityId, Error, Policy, PolicyExecution, Timestamp};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePolicyRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    pub conditions: serde_json::Value,
    /// Must carry an `action_type` recognized by the orchestrator
    pub actions: serde_json::Value,
}

/// POST /api/v1/policies
pub async fn create_policy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreatePolicyRequest>,
) -> ApiResult<Json<Policy>> {
    request
        .validate()
        .map_err(|e| ApiError(Error::validation(e.to_string())))?;
    let tenant = tenant_from_headers(&headers);

    let policy = Policy {
        id: generate_uuid(),
        tenant_id: tenant.tenant_id,
        name: request.name,
        description: request.description,
        conditions: request.conditions,
        actions: request.actions,
        is_active: true,
        created_at: current_timestamp(),
    };

    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    PolicyRepo::insert(&mut conn, &policy).await?;
    Ok(Json(policy))
}

/// GET /api/v1/policies: active policies in the tenant scope
pub async fn list_policies(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Policy>>> {
    let tenant = tenant_from_headers(&headers);
    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    let policies = PolicyRepo::list_active(&mut conn, tenant).await?;
    Ok(Json(policies))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ExecutePolicyRequest {
    #[validate(length(min = 1, message = "at least one finding id is required"))]
    pub finding_ids: Vec<EntityId>,
    #[validate(length(min = 1))]
    pub actor: String,
}

#[derive(Debug, Serialize)]
pub struct PolicyExecutionOutcome {
    pub finding_id: EntityId,
    pub outcome: String,
    pub detail: Option<String>,
}

/// POST /api/v1/policies/:id/execute: apply the policy's configured
/// action to each finding, recording an execution row per finding
pub async fn execute_policy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(policy_id): Path<EntityId>,
    Json(request): Json<ExecutePolicyRequest>,
) -> ApiResult<Json<Vec<PolicyExecutionOutcome>>> {
    request
        .validate()
        .map_err(|e| ApiError(Error::validation(e.to_string())))?;
    let tenant = tenant_from_headers(&headers);

    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    let policy = PolicyRepo::get(&mut conn, tenant, policy_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("policy {policy_id}")))?;

    let action_type = policy
        .actions
        .get("action_type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::validation("policy actions carry no action_type"))
        .and_then(RemediationActionType::from_str)
        .map_err(ApiError::from)?;

    let mut outcomes = Vec::with_capacity(request.finding_ids.len());
    for finding_id in request.finding_ids {
        let result = state
            .orchestrator
            .execute(tenant, finding_id, action_type, &request.actor)
            .await;

        let (outcome, detail) = match &result {
            Ok(_) => ("applied".to_string(), None),
            Err(e) => ("failed".to_string(), Some(e.to_string())),
        };
        PolicyRepo::record_execution(
            &mut conn,
            &PolicyExecution {
                id: generate_uuid(),
                policy_id,
                finding_id,
                outcome: outcome.clone(),
                detail: detail.clone(),
                executed_at: current_timestamp(),
            },
        )
        .await?;
        outcomes.push(PolicyExecutionOutcome {
            finding_id,
            outcome,
            detail,
        });
    }
    Ok(Json(outcomes))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConsentRequest {
    #[validate(length(min = 1))]
    pub data_subject_id: String,
    #[validate(length(min = 1))]
    pub pii_type: String,
    pub given_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub withdrawn_at: Option<Timestamp>,
}

/// POST /api/v1/consent: upsert on (data_subject_id, pii_type)
pub async fn upsert_consent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ConsentRequest>,
) -> ApiResult<Json<ConsentRecord>> {
    request
        .validate()
        .map_err(|e| ApiError(Error::validation(e.to_string())))?;
    let tenant = tenant_from_headers(&headers);

    let record = ConsentRecord {
        id: generate_uuid(),
        tenant_id: tenant.tenant_id,
        data_subject_id: request.data_subject_id,
        pii_type: request.pii_type,
        given_at: request.given_at,
        expires_at: request.expires_at,
        withdrawn_at: request.withdrawn_at,
    };

    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    PolicyRepo::upsert_consent(&mut conn, &record).await?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct ConsentQuery {
    pub data_subject_id: String,
    pub pii_type: String,
}

/// GET /api/v1/consent?data_subject_id=…&pii_type=…
pub async fn get_consent(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::extract::Query(query): axum::extract::Query<ConsentQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let tenant = tenant_from_headers(&headers);
    let mut conn = state.pool.inner().acquire().await.map_err(Error::from)?;
    let record =
        PolicyRepo::get_consent(&mut conn, tenant, &query.data_subject_id, &query.pii_type)
            .await?;

    let now = current_timestamp();
    Ok(Json(match record {
        Some(record) => {
            let effective = record.is_effective(now);
            serde_json::json!({ "record": record, "effective": effective })
        }
        None => serde_json::json!({ "record": null, "effective": false }),
    }))
}
