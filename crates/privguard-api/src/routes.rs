// Modified: 2026-03-14

//! Route table for the Privguard API.

use crate::handlers;
use crate::state::AppState;
use axum::routing::{delete, get, post};
use axum::Router;

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/v1/ingest", post(handlers::ingest::ingest_report))
        .route("/api/v1/ingest/sdk", post(handlers::ingest::ingest_sdk))
        .route("/api/v1/scans", get(handlers::scans::list_scans))
        .route("/api/v1/scans/:id", get(handlers::scans::get_scan))
        .route(
            "/api/v1/scans/:id/transitions",
            get(handlers::scans::scan_transitions),
        )
        .route("/api/v1/scans/:id/cancel", post(handlers::scans::cancel_scan))
        .route("/api/v1/assets", get(handlers::assets::list_assets))
        .route(
            "/api/v1/assets/:id",
            get(handlers::assets::get_asset).delete(handlers::assets::delete_asset),
        )
        .route(
            "/api/v1/assets/:id/relationships",
            get(handlers::assets::list_relationships).post(handlers::assets::add_relationship),
        )
        .route("/api/v1/findings", get(handlers::findings::list_findings))
        .route("/api/v1/findings/:id", get(handlers::findings::get_finding))
        .route(
            "/api/v1/findings/:id/review",
            post(handlers::findings::review_finding),
        )
        .route(
            "/api/v1/policies",
            get(handlers::governance::list_policies).post(handlers::governance::create_policy),
        )
        .route(
            "/api/v1/policies/:id/execute",
            post(handlers::governance::execute_policy),
        )
        .route(
            "/api/v1/consent",
            get(handlers::governance::get_consent).post(handlers::governance::upsert_consent),
        )
        .route("/api/v1/profiles", post(handlers::profiles::create_profile))
        .route(
            "/api/v1/profiles/:id/validation",
            post(handlers::profiles::set_validation),
        )
        .route(
            "/api/v1/profiles/:id",
            delete(handlers::profiles::disable_profile),
        )
        .route("/api/v1/lineage", get(handlers::lineage::hierarchy))
        .route("/api/v1/lineage/summary", get(handlers::lineage::pii_summary))
        .route(
            "/api/v1/remediation/execute",
            post(handlers::remediation::execute),
        )
        .route(
            "/api/v1/remediation/rollback",
            post(handlers::remediation::rollback),
        )
        .route(
            "/api/v1/remediation/preview",
            post(handlers::remediation::preview),
        )
        .route(
            "/api/v1/remediation/history",
            get(handlers::remediation::history),
        )
        .route(
            "/api/v1/activities/transition-scan",
            post(handlers::activities::transition_scan),
        )
        .route(
            "/api/v1/activities/sync-to-graph",
            post(handlers::activities::sync_to_graph),
        )
        .route(
            "/api/v1/activities/close-exposure",
            post(handlers::activities::close_exposure),
        )
        .with_state(state)
}
