// Modified: 2026-03-14

//! Request handlers.
//!
//! The authentication middleware (external) resolves the caller; handlers
//! only read the tenant header it injects. Absence of the header is the
//! legacy single-tenant context.

pub mod activities;
pub mod assets;
pub mod findings;
pub mod governance;
pub mod health;
pub mod ingest;
pub mod lineage;
pub mod profiles;
pub mod remediation;
pub mod scans;

use axum::http::HeaderMap;
use privguard_core::TenantContext;

/// Tenant scope from the `x-tenant-id` header the auth layer sets
pub fn tenant_from_headers(headers: &HeaderMap) -> TenantContext {
    headers
        .get("x-tenant-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .map(TenantContext::new)
        .unwrap_or_else(TenantContext::legacy)
}

/// Build a clamped page from optional query parameters
pub fn page_of(page: Option<u32>, per_page: Option<u32>) -> privguard_core::Page {
    privguard_core::Page {
        page: page.unwrap_or(1),
        per_page: per_page.unwrap_or(50),
    }
    .clamped()
}
