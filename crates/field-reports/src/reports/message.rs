//! Rendering of aggregated statistics into WhatsApp message bodies.
//!
//! Both renderers are pure: identical inputs produce byte-identical output.
//! Dates shown to recipients are always the tenant-local calendar date.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::currency::CurrencyFormatter;
use super::domain::{SalesmanId, Tenant};
use super::stats::{top_performers, DailyStats};

/// How many ranked salesmen the team report lists.
const TOP_PERFORMER_LIMIT: usize = 5;

/// How many inactive names are spelled out before collapsing into "+N more".
const INACTIVE_LIST_LIMIT: usize = 3;

fn format_date(date: NaiveDate) -> String {
    date.format("%-d %b %Y").to_string()
}

fn medal(rank: usize) -> &'static str {
    match rank {
        0 => "🥇",
        1 => "🥈",
        2 => "🥉",
        _ => "🏅",
    }
}

fn count_noun(count: u32, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Personal performance report for one field salesman.
pub fn salesman_message(
    name: &str,
    stats: &DailyStats,
    tenant: &Tenant,
    date: NaiveDate,
) -> String {
    let money = CurrencyFormatter::for_tenant(tenant);
    let mut lines = Vec::new();

    lines.push(format!("📊 *Daily Summary — {}*", format_date(date)));
    lines.push(format!("Hi {name}, here is your activity for today:"));
    lines.push(String::new());
    lines.push(format!(
        "🚶 Personal visits: {} ({})",
        stats.personal.count,
        money.format(stats.personal.revenue)
    ));
    if let Some(avg) = stats.personal.average() {
        lines.push(format!("   Avg per visit: {}", money.format(avg)));
    }
    lines.push(format!(
        "📞 Telephone calls: {} ({})",
        stats.telephone.count,
        money.format(stats.telephone.revenue)
    ));
    if let Some(avg) = stats.telephone.average() {
        lines.push(format!("   Avg per call: {}", money.format(avg)));
    }
    lines.push(format!(
        "💰 Total business: {}",
        money.format(stats.total_revenue())
    ));
    lines.push(format!(
        "🆕 New customers: {} | Repeat: {}",
        stats.new_customers, stats.repeat_customers
    ));
    if let Some(branch) = &stats.branch {
        lines.push(format!("🏭 Branch: {branch}"));
    }

    // Presentation nudge, not policy: heavy phone days prompt a reminder that
    // in-person visits close bigger orders.
    if stats.telephone.count > 2 * stats.personal.count {
        lines.push(String::new());
        lines.push(
            "💡 Strong calling today — try to balance with more personal visits.".to_string(),
        );
    }

    lines.join("\n")
}

/// Team report sent to tenant admins: totals, ranked performers, and the
/// names of salesmen with no recorded activity.
pub fn admin_message(
    stats: &BTreeMap<SalesmanId, DailyStats>,
    inactive: &[String],
    tenant: &Tenant,
    date: NaiveDate,
) -> String {
    let money = CurrencyFormatter::for_tenant(tenant);
    let mut lines = Vec::new();

    let personal_count: u32 = stats.values().map(|row| row.personal.count).sum();
    let personal_revenue: i64 = stats.values().map(|row| row.personal.revenue).sum();
    let telephone_count: u32 = stats.values().map(|row| row.telephone.count).sum();
    let telephone_revenue: i64 = stats.values().map(|row| row.telephone.revenue).sum();

    lines.push(format!(
        "📊 *Team Summary — {} — {}*",
        tenant.name,
        format_date(date)
    ));
    lines.push(String::new());
    lines.push(format!(
        "👥 Active today: {} of {} salesmen",
        stats.len(),
        stats.len() + inactive.len()
    ));
    lines.push(format!(
        "🚶 Personal visits: {} ({})",
        personal_count,
        money.format(personal_revenue)
    ));
    lines.push(format!(
        "📞 Telephone calls: {} ({})",
        telephone_count,
        money.format(telephone_revenue)
    ));
    lines.push(format!(
        "💰 Total business: {}",
        money.format(personal_revenue + telephone_revenue)
    ));

    let ranked = top_performers(stats, TOP_PERFORMER_LIMIT);
    if !ranked.is_empty() {
        lines.push(String::new());
        lines.push("🏆 Top performers:".to_string());
        for (rank, (_, row)) in ranked.iter().enumerate() {
            lines.push(format!(
                "{} {} — {} ({})",
                medal(rank),
                row.salesman_name,
                money.format(row.total_revenue()),
                count_noun(row.total_count(), "activity", "activities")
            ));
        }
    }

    if !inactive.is_empty() {
        lines.push(String::new());
        let listed: Vec<&str> = inactive
            .iter()
            .take(INACTIVE_LIST_LIMIT)
            .map(String::as_str)
            .collect();
        let overflow = inactive.len().saturating_sub(INACTIVE_LIST_LIMIT);
        if overflow > 0 {
            lines.push(format!(
                "⚠️ No activity today: {} +{} more",
                listed.join(", "),
                overflow
            ));
        } else {
            lines.push(format!("⚠️ No activity today: {}", listed.join(", ")));
        }
    }

    lines.join("\n")
}
