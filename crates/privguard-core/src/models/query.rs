// Modified: 2026-03-14

//! Query filters and pagination types shared by the repositories and the
//! HTTP layer. Queries are implicitly tenant-filtered by the caller's
//! tenant context; legacy null-tenant rows remain visible read-only.

use crate::types::{EntityId, ScanStatus, Severity, TenantId};
use serde::{Deserialize, Serialize};

/// Tenant scope propagated from the authentication middleware down every
/// call path. `None` is the legacy single-tenant context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant_id: Option<TenantId>,
}

impl TenantContext {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id: Some(tenant_id),
        }
    }

    pub fn legacy() -> Self {
        Self { tenant_id: None }
    }
}

/// Pagination request with sane bounds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 50,
        }
    }
}

impl Page {
    pub const MAX_PER_PAGE: u32 = 500;

    /// Clamp per_page into [1, MAX_PER_PAGE] and page to >= 1
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        let p = self.clamped();
        i64::from(p.page - 1) * i64::from(p.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.clamped().per_page)
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Paged<T> {
    pub fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        let page = page.clamped();
        Self {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
        }
    }
}

/// Filters for scan run listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanFilter {
    pub status: Option<ScanStatus>,
    pub profile_name: Option<String>,
    pub host: Option<String>,
}

/// Filters for asset listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetFilter {
    pub asset_type: Option<String>,
    pub host: Option<String>,
    pub environment: Option<String>,
    pub min_risk: Option<i32>,
    /// Include soft-deleted rows
    pub include_deleted: bool,
}

/// Filters for finding listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindingFilter {
    pub scan_run_id: Option<EntityId>,
    pub asset_id: Option<EntityId>,
    pub pattern_name: Option<String>,
    pub severity: Option<Severity>,
    /// Include soft-deleted rows
    pub include_deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamping() {
        let page = Page {
            page: 0,
            per_page: 10_000,
        }
        .clamped();
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, Page::MAX_PER_PAGE);
    }

    #[test]
    fn test_page_offset() {
        let page = Page {
            page: 3,
            per_page: 50,
        };
        assert_eq!(page.offset(), 100);
        assert_eq!(page.limit(), 50);
    }
}
