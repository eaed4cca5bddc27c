//! Per-tenant, per-day send gating.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::clock;
use super::domain::{ReportKind, Tenant, Visit};
use super::store::{SendLog, SendLogError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadySent,
    Weekend,
    NoVisits,
    LogUnavailable,
}

impl SkipReason {
    pub const fn label(self) -> &'static str {
        match self {
            Self::AlreadySent => "already_sent",
            Self::Weekend => "weekend",
            Self::NoVisits => "no_visits",
            Self::LogUnavailable => "log_unavailable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Skip(SkipReason),
}

/// Decides whether a report run may proceed for one tenant today.
///
/// The lock claim happens before the weekend and activity checks; a claimed
/// day stays claimed even when a later check rejects it. The log entry marks
/// "a run committed to this tenant-day", not "messages went out". On a
/// send-log infrastructure failure the gate fails closed.
pub struct SendGate<L> {
    log: Arc<L>,
    kind: ReportKind,
}

impl<L: SendLog> SendGate<L> {
    pub fn new(log: Arc<L>) -> Self {
        Self {
            log,
            kind: ReportKind::Daily,
        }
    }

    /// Run the gating sequence: lock claim (unless `force`), weekend policy,
    /// then zero-activity check. Dry runs probe the lock without claiming it.
    pub fn check(
        &self,
        tenant: &Tenant,
        visits: &[Visit],
        now: DateTime<Utc>,
        force: bool,
        dry_run: bool,
    ) -> GateDecision {
        let date = clock::local_date_at(now, &tenant.timezone);

        if !force {
            let claim = if dry_run {
                match self.log.already_sent(&tenant.id, date, self.kind) {
                    Ok(true) => Err(SendLogError::AlreadySent),
                    Ok(false) => Ok(()),
                    Err(err) => Err(err),
                }
            } else {
                self.log.record(&tenant.id, date, self.kind)
            };

            match claim {
                Ok(()) => {}
                Err(SendLogError::AlreadySent) => {
                    return GateDecision::Skip(SkipReason::AlreadySent)
                }
                Err(SendLogError::Unavailable(_)) => {
                    return GateDecision::Skip(SkipReason::LogUnavailable)
                }
            }
        }

        let weekday = clock::local_weekday_at(now, &tenant.timezone);
        if tenant.is_weekend(weekday) {
            return GateDecision::Skip(SkipReason::Weekend);
        }

        if !visits.iter().any(|visit| !visit.deleted) {
            return GateDecision::Skip(SkipReason::NoVisits);
        }

        GateDecision::Proceed
    }
}
