use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SalesmanId(pub String);

/// A customer organization with its own timezone, weekend policy, and currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    /// IANA zone name, e.g. `Asia/Kolkata`. Unrecognized values degrade to UTC.
    pub timezone: String,
    /// Day-of-week indices considered non-working, 0 = Sunday .. 6 = Saturday.
    pub weekend_days: Vec<u8>,
    pub currency_symbol: String,
    pub currency_code: String,
    pub active: bool,
}

impl Tenant {
    pub fn is_weekend(&self, weekday: u8) -> bool {
        self.weekend_days.contains(&weekday)
    }
}

/// A field agent or admin belonging to exactly one tenant.
///
/// Admins receive the team report; everyone else receives their personal
/// performance report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Salesman {
    pub id: SalesmanId,
    pub tenant_id: TenantId,
    pub name: String,
    pub phone: String,
    pub active: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl Salesman {
    /// Phone number with `+` and whitespace stripped, if anything remains.
    pub fn dialable(&self) -> Option<String> {
        let digits = normalize_phone(&self.phone);
        if digits.is_empty() {
            None
        } else {
            Some(digits)
        }
    }
}

/// Strip the `+` prefix and embedded whitespace; the gateway expects bare
/// digit strings.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '+')
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitChannel {
    Personal,
    Telephone,
}

impl VisitChannel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Telephone => "telephone",
        }
    }
}

/// One sales activity record, immutable once aggregated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub tenant_id: TenantId,
    pub salesman_id: SalesmanId,
    pub salesman_name: String,
    pub channel: VisitChannel,
    /// Order value in whole currency units; absent means no order was booked.
    pub order_value: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub branch: Option<String>,
    /// Whether this visit was the customer's first recorded order.
    #[serde(default)]
    pub new_customer: bool,
    #[serde(default)]
    pub deleted: bool,
}

/// Kind marker recorded alongside each send-log entry so future report
/// cadences can share the same lock table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Daily,
}

impl ReportKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Daily => "daily",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_plus_and_whitespace() {
        assert_eq!(normalize_phone("+91 95376 53927"), "919537653927");
        assert_eq!(normalize_phone("  +1 555 010 9999 "), "15550109999");
        assert_eq!(normalize_phone("919537653927"), "919537653927");
    }

    #[test]
    fn dialable_rejects_empty_numbers() {
        let salesman = Salesman {
            id: SalesmanId("s-1".to_string()),
            tenant_id: TenantId("t-1".to_string()),
            name: "Ravi".to_string(),
            phone: " + ".to_string(),
            active: true,
            is_admin: false,
            deleted: false,
        };
        assert_eq!(salesman.dialable(), None);
    }

    #[test]
    fn weekend_lookup_uses_day_indices() {
        let tenant = Tenant {
            id: TenantId("t-1".to_string()),
            name: "Acme Traders".to_string(),
            timezone: "Asia/Kolkata".to_string(),
            weekend_days: vec![5, 6],
            currency_symbol: "₹".to_string(),
            currency_code: "INR".to_string(),
            active: true,
        };
        assert!(tenant.is_weekend(5));
        assert!(tenant.is_weekend(6));
        assert!(!tenant.is_weekend(0));
    }
}
