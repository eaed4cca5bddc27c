//! Fixture data for local serving and CLI runs.
//!
//! Production deployments point `APP_SEED_FILE` at an export of the hosted
//! store; without one, a small two-tenant demo data set is used so the
//! pipeline can be exercised end to end.

use chrono::Utc;
use field_reports::error::AppError;
use field_reports::reports::domain::{
    Salesman, SalesmanId, Tenant, TenantId, Visit, VisitChannel,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub(crate) struct SeedData {
    pub(crate) tenants: Vec<Tenant>,
    pub(crate) salesmen: Vec<Salesman>,
    #[serde(default)]
    pub(crate) visits: Vec<Visit>,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum SeedError {
    #[error("seed file unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("seed file malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<SeedError> for AppError {
    fn from(value: SeedError) -> Self {
        AppError::Data(value.to_string())
    }
}

pub(crate) fn from_file(path: &Path) -> Result<SeedData, SeedError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn tenant(id: &str, name: &str, timezone: &str, weekend_days: Vec<u8>, symbol: &str, code: &str) -> Tenant {
    Tenant {
        id: TenantId(id.to_string()),
        name: name.to_string(),
        timezone: timezone.to_string(),
        weekend_days,
        currency_symbol: symbol.to_string(),
        currency_code: code.to_string(),
        active: true,
    }
}

fn salesman(id: &str, tenant_id: &str, name: &str, phone: &str, is_admin: bool) -> Salesman {
    Salesman {
        id: SalesmanId(id.to_string()),
        tenant_id: TenantId(tenant_id.to_string()),
        name: name.to_string(),
        phone: phone.to_string(),
        active: true,
        is_admin,
        deleted: false,
    }
}

fn visit(
    tenant_id: &str,
    salesman_id: &str,
    name: &str,
    channel: VisitChannel,
    value: Option<i64>,
    branch: &str,
) -> Visit {
    Visit {
        tenant_id: TenantId(tenant_id.to_string()),
        salesman_id: SalesmanId(salesman_id.to_string()),
        salesman_name: name.to_string(),
        channel,
        order_value: value,
        created_at: Utc::now(),
        branch: Some(branch.to_string()),
        new_customer: false,
        deleted: false,
    }
}

/// Two tenants in different timezones with a day's worth of activity,
/// stamped at the current instant so every zone sees them as today.
pub(crate) fn demo() -> SeedData {
    SeedData {
        tenants: vec![
            tenant("t-acme", "Acme Traders", "Asia/Kolkata", vec![0], "₹", "INR"),
            tenant("t-gulf", "Gulf Hardware", "Asia/Dubai", vec![5, 6], "AED ", "AED"),
        ],
        salesmen: vec![
            salesman("s-ravi", "t-acme", "Ravi", "+91 95376 53927", false),
            salesman("s-kiran", "t-acme", "Kiran", "+91 90000 00001", false),
            salesman("s-meera", "t-acme", "Meera", "+91 90000 00002", true),
            salesman("s-omar", "t-gulf", "Omar", "+971 50 000 0001", false),
            salesman("s-huda", "t-gulf", "Huda", "+971 50 000 0002", true),
        ],
        visits: vec![
            visit("t-acme", "s-ravi", "Ravi", VisitChannel::Personal, Some(230_000), "Rajkot"),
            visit("t-acme", "s-ravi", "Ravi", VisitChannel::Personal, Some(230_000), "Rajkot"),
            visit("t-acme", "s-ravi", "Ravi", VisitChannel::Telephone, Some(48_000), "Rajkot"),
            visit("t-gulf", "s-omar", "Omar", VisitChannel::Telephone, Some(12_500), "Deira"),
            visit("t-gulf", "s-omar", "Omar", VisitChannel::Personal, None, "Deira"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_seed_is_consistent() {
        let seed = demo();
        assert_eq!(seed.tenants.len(), 2);
        for salesman in &seed.salesmen {
            assert!(seed
                .tenants
                .iter()
                .any(|tenant| tenant.id == salesman.tenant_id));
        }
        for visit in &seed.visits {
            assert!(seed
                .salesmen
                .iter()
                .any(|salesman| salesman.id == visit.salesman_id));
        }
    }

    #[test]
    fn seed_files_parse_from_json() {
        let raw = r#"{
            "tenants": [{
                "id": "t-1",
                "name": "Acme",
                "timezone": "Asia/Kolkata",
                "weekend_days": [0],
                "currency_symbol": "₹",
                "currency_code": "INR",
                "active": true
            }],
            "salesmen": [{
                "id": "s-1",
                "tenant_id": "t-1",
                "name": "Ravi",
                "phone": "+91 95376 53927",
                "active": true,
                "is_admin": false
            }]
        }"#;
        let seed: SeedData = serde_json::from_str(raw).expect("seed parses");
        assert_eq!(seed.tenants[0].id, TenantId("t-1".to_string()));
        assert_eq!(seed.salesmen[0].dialable().as_deref(), Some("919537653927"));
        assert!(seed.visits.is_empty());
    }
}
