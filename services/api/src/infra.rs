use chrono::{DateTime, NaiveDate, Utc};
use field_reports::reports::dispatch::WhatsAppDispatcher;
use field_reports::reports::domain::{ReportKind, Salesman, Tenant, TenantId, Visit};
use field_reports::reports::store::{
    SendLog, SendLogError, StoreError, TenantDirectory, VisitStore,
};
use field_reports::reports::ReportRunner;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) tenants: Arc<InMemoryTenantDirectory>,
    pub(crate) visits: Arc<InMemoryVisitStore>,
    pub(crate) send_log: Arc<InMemorySendLog>,
    pub(crate) dispatcher: Arc<WhatsAppDispatcher>,
}

impl AppState {
    pub(crate) fn runner(
        &self,
    ) -> ReportRunner<InMemoryTenantDirectory, InMemoryVisitStore, InMemorySendLog, WhatsAppDispatcher>
    {
        ReportRunner::new(
            self.tenants.clone(),
            self.visits.clone(),
            self.send_log.clone(),
            self.dispatcher.clone(),
        )
    }
}

pub(crate) struct InMemoryTenantDirectory {
    tenants: Mutex<Vec<Tenant>>,
}

impl InMemoryTenantDirectory {
    pub(crate) fn new(tenants: Vec<Tenant>) -> Self {
        Self {
            tenants: Mutex::new(tenants),
        }
    }
}

impl TenantDirectory for InMemoryTenantDirectory {
    fn active_tenants(&self) -> Result<Vec<Tenant>, StoreError> {
        let guard = self.tenants.lock().expect("tenant mutex poisoned");
        Ok(guard.iter().filter(|tenant| tenant.active).cloned().collect())
    }
}

pub(crate) struct InMemoryVisitStore {
    salesmen: Mutex<Vec<Salesman>>,
    visits: Mutex<Vec<Visit>>,
}

impl InMemoryVisitStore {
    pub(crate) fn new(salesmen: Vec<Salesman>, visits: Vec<Visit>) -> Self {
        Self {
            salesmen: Mutex::new(salesmen),
            visits: Mutex::new(visits),
        }
    }
}

impl VisitStore for InMemoryVisitStore {
    fn visits_between(
        &self,
        tenant: &TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Visit>, StoreError> {
        let guard = self.visits.lock().expect("visit mutex poisoned");
        Ok(guard
            .iter()
            .filter(|visit| {
                visit.tenant_id == *tenant && visit.created_at >= from && visit.created_at < to
            })
            .cloned()
            .collect())
    }

    fn roster(&self, tenant: &TenantId) -> Result<Vec<Salesman>, StoreError> {
        let guard = self.salesmen.lock().expect("salesman mutex poisoned");
        Ok(guard
            .iter()
            .filter(|salesman| salesman.tenant_id == *tenant)
            .cloned()
            .collect())
    }
}

/// Send-log table stand-in; the set insert plays the role of the unique
/// constraint, so concurrent runners sharing this store still get
/// exactly-once semantics per tenant-day.
#[derive(Default)]
pub(crate) struct InMemorySendLog {
    entries: Mutex<HashSet<(TenantId, NaiveDate, ReportKind)>>,
}

impl SendLog for InMemorySendLog {
    fn record(
        &self,
        tenant: &TenantId,
        date: NaiveDate,
        kind: ReportKind,
    ) -> Result<(), SendLogError> {
        let mut guard = self.entries.lock().expect("send log mutex poisoned");
        if guard.insert((tenant.clone(), date, kind)) {
            Ok(())
        } else {
            Err(SendLogError::AlreadySent)
        }
    }

    fn already_sent(
        &self,
        tenant: &TenantId,
        date: NaiveDate,
        kind: ReportKind,
    ) -> Result<bool, SendLogError> {
        let guard = self.entries.lock().expect("send log mutex poisoned");
        Ok(guard.contains(&(tenant.clone(), date, kind)))
    }
}
