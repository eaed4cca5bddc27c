//! One full report run: enumerate tenants, gate, aggregate, render, dispatch.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::clock;
use super::domain::{normalize_phone, Salesman, Tenant, TenantId};
use super::gate::{GateDecision, SendGate, SkipReason};
use super::message;
use super::stats::aggregate;
use super::store::{SendLog, StoreError, TenantDirectory, VisitStore};
use crate::reports::dispatch::MessageDispatcher;

/// Parameters for one run. The tenant and recipient filters replace the old
/// per-recipient one-off scripts: one entry point, narrowed as needed.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Only process tenants configured with exactly this IANA zone string.
    pub tz_filter: Option<String>,
    /// Bypass the send-log claim; weekend and zero-activity checks still apply.
    pub force: bool,
    /// Probe the lock instead of claiming it, and log instead of dispatching.
    pub dry_run: bool,
    /// Only process these tenants.
    pub tenant_filter: Option<Vec<TenantId>>,
    /// Redirect every rendered message to these numbers instead of the
    /// recipient's own phone.
    pub recipient_override: Option<Vec<String>>,
}

/// Tenant names bucketed by the reason they were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipBuckets {
    pub weekend: Vec<String>,
    pub no_visits: Vec<String>,
    pub already_sent: Vec<String>,
    pub lock_unavailable: Vec<String>,
}

impl SkipBuckets {
    fn push(&mut self, reason: SkipReason, tenant_name: &str) {
        let bucket = match reason {
            SkipReason::Weekend => &mut self.weekend,
            SkipReason::NoVisits => &mut self.no_visits,
            SkipReason::AlreadySent => &mut self.already_sent,
            SkipReason::LogUnavailable => &mut self.lock_unavailable,
        };
        bucket.push(tenant_name.to_string());
    }
}

/// Structured tally returned to the triggering caller.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub success: bool,
    /// UTC date of the triggering request; recipients see tenant-local dates.
    pub date: NaiveDate,
    pub dry_run: bool,
    /// Tenants considered after filters.
    pub tenants: usize,
    pub sent: u32,
    /// Messages a dry run would have dispatched.
    pub would_send: u32,
    pub failed: u32,
    pub skipped: SkipBuckets,
}

impl RunSummary {
    fn new(date: NaiveDate, dry_run: bool) -> Self {
        Self {
            success: true,
            date,
            dry_run,
            tenants: 0,
            sent: 0,
            would_send: 0,
            failed: 0,
            skipped: SkipBuckets::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("tenant enumeration failed: {0}")]
    TenantEnumeration(#[source] StoreError),
}

/// Orchestrates the per-tenant pipeline. Failures below tenant enumeration
/// are isolated: a failing store read or recipient send is counted and the
/// run moves on.
pub struct ReportRunner<T, V, L, D> {
    tenants: Arc<T>,
    visits: Arc<V>,
    gate: SendGate<L>,
    dispatcher: Arc<D>,
}

impl<T, V, L, D> ReportRunner<T, V, L, D>
where
    T: TenantDirectory,
    V: VisitStore,
    L: SendLog,
    D: MessageDispatcher,
{
    pub fn new(tenants: Arc<T>, visits: Arc<V>, send_log: Arc<L>, dispatcher: Arc<D>) -> Self {
        Self {
            tenants,
            visits,
            gate: SendGate::new(send_log),
            dispatcher,
        }
    }

    pub async fn run(&self, options: &RunOptions) -> Result<RunSummary, RunError> {
        self.run_at(Utc::now(), options).await
    }

    /// Run against an explicit trigger instant.
    pub async fn run_at(
        &self,
        now: DateTime<Utc>,
        options: &RunOptions,
    ) -> Result<RunSummary, RunError> {
        let tenants = self
            .tenants
            .active_tenants()
            .map_err(RunError::TenantEnumeration)?;

        let mut summary = RunSummary::new(now.date_naive(), options.dry_run);

        for tenant in &tenants {
            if let Some(tz) = &options.tz_filter {
                if tenant.timezone != *tz {
                    continue;
                }
            }
            if let Some(filter) = &options.tenant_filter {
                if !filter.contains(&tenant.id) {
                    continue;
                }
            }

            summary.tenants += 1;
            self.process_tenant(tenant, now, options, &mut summary).await;
        }

        info!(
            tenants = summary.tenants,
            sent = summary.sent,
            failed = summary.failed,
            dry_run = summary.dry_run,
            "report run finished"
        );
        Ok(summary)
    }

    async fn process_tenant(
        &self,
        tenant: &Tenant,
        now: DateTime<Utc>,
        options: &RunOptions,
        summary: &mut RunSummary,
    ) {
        let local_date = clock::local_date_at(now, &tenant.timezone);
        let (from, to) = clock::day_window(local_date, &tenant.timezone);

        let visits = match self.visits.visits_between(&tenant.id, from, to) {
            Ok(visits) => visits,
            Err(err) => {
                warn!(tenant = %tenant.name, error = %err, "failed to load visits");
                summary.failed += 1;
                return;
            }
        };

        match self
            .gate
            .check(tenant, &visits, now, options.force, options.dry_run)
        {
            GateDecision::Proceed => {}
            GateDecision::Skip(reason) => {
                info!(tenant = %tenant.name, reason = reason.label(), "tenant skipped");
                summary.skipped.push(reason, &tenant.name);
                return;
            }
        }

        let roster = match self.visits.roster(&tenant.id) {
            Ok(roster) => roster,
            Err(err) => {
                warn!(tenant = %tenant.name, error = %err, "failed to load roster");
                summary.failed += 1;
                return;
            }
        };

        let stats = aggregate(&visits);

        let field_agents: Vec<&Salesman> = roster
            .iter()
            .filter(|s| s.active && !s.deleted && !s.is_admin)
            .collect();

        for salesman in &field_agents {
            let Some(row) = stats.get(&salesman.id) else {
                continue;
            };
            let body = message::salesman_message(&salesman.name, row, tenant, local_date);
            self.deliver(&salesman.phone, &body, options, summary).await;
        }

        let mut inactive: Vec<String> = field_agents
            .iter()
            .filter(|s| !stats.contains_key(&s.id))
            .map(|s| s.name.clone())
            .collect();
        inactive.sort();

        let team_body = message::admin_message(&stats, &inactive, tenant, local_date);
        for admin in roster.iter().filter(|s| s.active && !s.deleted && s.is_admin) {
            self.deliver(&admin.phone, &team_body, options, summary).await;
        }
    }

    async fn deliver(
        &self,
        phone: &str,
        body: &str,
        options: &RunOptions,
        summary: &mut RunSummary,
    ) {
        let recipients: Vec<&str> = match &options.recipient_override {
            Some(numbers) => numbers.iter().map(String::as_str).collect(),
            None => vec![phone],
        };

        for recipient in recipients {
            if options.dry_run {
                if normalize_phone(recipient).is_empty() {
                    warn!(to = %recipient, "recipient not dialable");
                    summary.failed += 1;
                    continue;
                }
                info!(to = %recipient, chars = body.len(), "dry run, send suppressed");
                summary.would_send += 1;
                continue;
            }

            match self.dispatcher.send(recipient, body).await {
                Ok(receipt) => {
                    info!(to = %recipient, message_id = %receipt.message_id, "message sent");
                    summary.sent += 1;
                }
                Err(err) => {
                    warn!(to = %recipient, error = %err, "message failed");
                    summary.failed += 1;
                }
            }
        }
    }
}
