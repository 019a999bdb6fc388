//! Derivation of chart-ready analytics from a user's consumption records.
//!
//! Everything here is a pure computation over already-validated records: the
//! caller fetches the rows (scoped to one owner) and supplies the wall-clock
//! time explicitly, so results are deterministic under test.

use std::collections::BTreeMap;

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::domain::{ConsumptionKind, ConsumptionRecord};

/// Per-kind totals. Serializes with all three utilities present even when a
/// kind never occurs in the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KindTotals {
    pub electricity: f64,
    pub water: f64,
    pub gas: f64,
}

impl KindTotals {
    fn add(&mut self, kind: ConsumptionKind, amount: f64) {
        match kind {
            ConsumptionKind::Electricity => self.electricity += amount,
            ConsumptionKind::Water => self.water += amount,
            ConsumptionKind::Gas => self.gas += amount,
        }
    }

    fn sum(&self) -> f64 {
        self.electricity + self.water + self.gas
    }
}

/// One month of the chart series. Not persisted; rebuilt on every call.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyBucket {
    /// Month key in "YYYY-MM" form; lexicographic order is chronological.
    pub month: String,
    pub total: f64,
    pub electricity: f64,
    pub water: f64,
    pub gas: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub total_consumption: f64,
    pub average_monthly: f64,
    pub current_month_total: f64,
    pub last_month_total: f64,
    pub monthly_data: Vec<MonthlyBucket>,
    pub total_records: usize,
    pub consumption_by_type: KindTotals,
}

/// (year, month-number); tuple ordering is chronological.
type MonthKey = (i32, u8);

fn month_key(ts: OffsetDateTime) -> MonthKey {
    (ts.year(), u8::from(ts.month()))
}

fn prior_month(key: MonthKey) -> MonthKey {
    match key {
        (year, 1) => (year - 1, 12),
        (year, month) => (year, month - 1),
    }
}

fn format_month(key: MonthKey) -> String {
    format!("{:04}-{:02}", key.0, key.1)
}

/// Compute the analytics summary for one user's records.
///
/// - Grand total, per-kind totals and the record count cover every record.
/// - The monthly series covers records from the first day of the month
///   containing `now - 365 days` onward, grouped by calendar month and
///   ordered ascending.
/// - Current/last month totals always reflect the true calendar months
///   around `now`, independent of the series window.
/// - `average_monthly` divides the grand total by the number of distinct
///   months present in the series (0 when the series is empty).
///
/// A timestamp exactly on a month start belongs to that month.
pub fn compute_analytics(records: &[ConsumptionRecord], now: OffsetDateTime) -> AnalyticsSummary {
    let current = month_key(now);
    let prior = prior_month(current);
    // Chart window opens at the month containing now - 365d, matching the
    // month granularity of the series itself.
    let window_start = month_key(now - Duration::days(365));

    let mut total_consumption = 0.0;
    let mut consumption_by_type = KindTotals::default();
    let mut current_month_total = 0.0;
    let mut last_month_total = 0.0;
    let mut months: BTreeMap<MonthKey, KindTotals> = BTreeMap::new();

    for record in records {
        let key = month_key(record.ts);

        total_consumption += record.amount;
        consumption_by_type.add(record.kind, record.amount);

        if key == current {
            current_month_total += record.amount;
        } else if key == prior {
            last_month_total += record.amount;
        }

        if key >= window_start {
            months.entry(key).or_default().add(record.kind, record.amount);
        }
    }

    let monthly_data: Vec<MonthlyBucket> = months
        .into_iter()
        .map(|(key, kinds)| MonthlyBucket {
            month: format_month(key),
            total: kinds.sum(),
            electricity: kinds.electricity,
            water: kinds.water,
            gas: kinds.gas,
        })
        .collect();

    let average_monthly = if monthly_data.is_empty() {
        0.0
    } else {
        total_consumption / monthly_data.len() as f64
    };

    AnalyticsSummary {
        total_consumption,
        average_monthly,
        current_month_total,
        last_month_total,
        monthly_data,
        total_records: records.len(),
        consumption_by_type,
    }
}
