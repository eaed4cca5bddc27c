//! The daily reporting pipeline: tenant-local calendars, visit aggregation,
//! send gating, message rendering, and WhatsApp dispatch.

pub mod clock;
pub mod currency;
pub mod dispatch;
pub mod domain;
pub mod gate;
pub mod message;
pub mod runner;
pub mod stats;
pub mod store;

pub use domain::{ReportKind, Salesman, SalesmanId, Tenant, TenantId, Visit, VisitChannel};
pub use runner::{ReportRunner, RunOptions, RunSummary};
