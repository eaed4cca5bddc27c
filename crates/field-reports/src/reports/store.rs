//! Ports onto the external stores the pipeline consumes.
//!
//! Tenants, salesmen, and visits live in a hosted relational store owned by
//! the main application; the reporting core only reads them. The send log is
//! the one table this core writes, and its `(tenant, date, kind)` uniqueness
//! constraint is the cross-process mutual-exclusion primitive for
//! once-per-day dispatch.

use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{ReportKind, Salesman, Tenant, TenantId, Visit};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Read access to the tenant roster.
pub trait TenantDirectory: Send + Sync {
    fn active_tenants(&self) -> Result<Vec<Tenant>, StoreError>;
}

/// Read access to visits and salesmen for one tenant.
pub trait VisitStore: Send + Sync {
    /// Visit rows created within `[from, to)`. Soft-deleted rows may be
    /// included; exclusion is the aggregation layer's responsibility.
    fn visits_between(
        &self,
        tenant: &TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Visit>, StoreError>;

    fn roster(&self, tenant: &TenantId) -> Result<Vec<Salesman>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SendLogError {
    #[error("report already recorded for this tenant and date")]
    AlreadySent,
    #[error("send log unavailable: {0}")]
    Unavailable(String),
}

/// The once-per-day dispatch guard.
pub trait SendLog: Send + Sync {
    /// Claim the `(tenant, date, kind)` slot. `AlreadySent` maps the store's
    /// uniqueness violation; any other failure is `Unavailable`.
    fn record(&self, tenant: &TenantId, date: NaiveDate, kind: ReportKind)
        -> Result<(), SendLogError>;

    /// Read-only probe used by dry runs, which must not consume the slot.
    fn already_sent(
        &self,
        tenant: &TenantId,
        date: NaiveDate,
        kind: ReportKind,
    ) -> Result<bool, SendLogError>;
}
