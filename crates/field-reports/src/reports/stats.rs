//! Reduction of raw visit rows into per-salesman daily statistics.

use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{SalesmanId, Visit, VisitChannel};

/// Count and revenue subtotal for one visit channel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    pub count: u32,
    pub revenue: i64,
}

impl ChannelStats {
    fn add(&mut self, revenue: i64) {
        self.count += 1;
        self.revenue += revenue;
    }

    /// Mean order value, rounded to the nearest whole unit. `None` for an
    /// empty channel so callers cannot divide by zero.
    pub fn average(&self) -> Option<i64> {
        if self.count == 0 {
            return None;
        }
        Some((self.revenue as f64 / self.count as f64).round() as i64)
    }
}

/// Per-salesman statistics for one tenant-local calendar day.
#[derive(Debug, Default, Clone, Serialize)]
pub struct DailyStats {
    pub salesman_name: String,
    pub personal: ChannelStats,
    pub telephone: ChannelStats,
    pub new_customers: u32,
    pub repeat_customers: u32,
    /// Branch attributed by majority vote over the day's visits; ties resolve
    /// to the lexicographically smallest branch label.
    pub branch: Option<String>,
}

impl DailyStats {
    pub fn total_count(&self) -> u32 {
        self.personal.count + self.telephone.count
    }

    pub fn total_revenue(&self) -> i64 {
        self.personal.revenue + self.telephone.revenue
    }
}

/// Reduce visits into per-salesman stats.
///
/// Soft-deleted rows are skipped, absent order values count as zero, and the
/// output is independent of input ordering. Salesmen without any live visit
/// in the input do not appear; the caller computes the inactive complement
/// against the roster when it needs one.
pub fn aggregate(visits: &[Visit]) -> BTreeMap<SalesmanId, DailyStats> {
    let mut rows: BTreeMap<SalesmanId, DailyStats> = BTreeMap::new();
    let mut branch_votes: BTreeMap<SalesmanId, BTreeMap<String, u32>> = BTreeMap::new();

    for visit in visits.iter().filter(|v| !v.deleted) {
        let row = rows.entry(visit.salesman_id.clone()).or_default();
        if row.salesman_name.is_empty() {
            row.salesman_name = visit.salesman_name.clone();
        }

        let revenue = visit.order_value.unwrap_or(0);
        match visit.channel {
            VisitChannel::Personal => row.personal.add(revenue),
            VisitChannel::Telephone => row.telephone.add(revenue),
        }

        if visit.new_customer {
            row.new_customers += 1;
        } else {
            row.repeat_customers += 1;
        }

        if let Some(branch) = &visit.branch {
            *branch_votes
                .entry(visit.salesman_id.clone())
                .or_default()
                .entry(branch.clone())
                .or_insert(0) += 1;
        }
    }

    for (salesman, votes) in branch_votes {
        if let Some(row) = rows.get_mut(&salesman) {
            row.branch = majority_branch(&votes);
        }
    }

    rows
}

/// Highest-voted branch; on equal counts the ascending key order of the vote
/// map makes the lexicographically smallest label win.
fn majority_branch(votes: &BTreeMap<String, u32>) -> Option<String> {
    let mut best: Option<(&String, u32)> = None;
    for (branch, count) in votes {
        match best {
            Some((_, top)) if *count <= top => {}
            _ => best = Some((branch, *count)),
        }
    }
    best.map(|(branch, _)| branch.clone())
}

/// Salesmen ranked descending by revenue, ties broken by descending activity
/// count, truncated to `limit`.
pub fn top_performers(
    stats: &BTreeMap<SalesmanId, DailyStats>,
    limit: usize,
) -> Vec<(&SalesmanId, &DailyStats)> {
    let mut ranked: Vec<_> = stats.iter().collect();
    ranked.sort_by(|a, b| {
        b.1.total_revenue()
            .cmp(&a.1.total_revenue())
            .then(b.1.total_count().cmp(&a.1.total_count()))
    });
    ranked.truncate(limit);
    ranked
}
